use chrono::NaiveDateTime;

use crate::db::{connect_db, ContactMethod, Database, NewProduct, NewSupplier};

/// Fresh in-memory database with the full schema applied.
pub async fn init_test_db() -> Database {
    let pool = connect_db("sqlite::memory:", 1)
        .await
        .expect("failed to create in-memory database");
    let db = Database::new(pool);
    db.migrate().await.expect("failed to run migrations");
    db
}

/// A WhatsApp supplier with a two-product catalog.
pub fn sample_supplier(name: &str) -> NewSupplier {
    NewSupplier {
        name: name.to_string(),
        contact_method: ContactMethod::Whatsapp,
        contact_info: "+39 333 1234567".to_string(),
        message_template: None,
        products: vec![
            NewProduct {
                name: "Bistecca di manzo".to_string(),
                unit: "kg".to_string(),
                default_quantity: Some(3.0),
                price: Some(25.0),
                notes: None,
            },
            NewProduct {
                name: "Pollo intero".to_string(),
                unit: "pezzi".to_string(),
                default_quantity: Some(2.0),
                price: Some(8.5),
                notes: None,
            },
        ],
    }
}

/// `YYYY-MM-DD HH:MM` as a local timestamp.
pub fn placed_at(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").expect("invalid test timestamp")
}
