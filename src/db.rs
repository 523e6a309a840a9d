// Database related types and functions

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

pub mod database;
pub mod orders;
pub mod suppliers;
pub mod tokens;
pub mod types;

pub use database::Database;
pub use orders::{Order, OrderFilter, OrderItem, OrderStats};
pub use suppliers::{NewProduct, NewSupplier, Supplier, SupplierProduct, SupplierUpdate};
pub use tokens::TokenRecord;
pub use types::{ContactMethod, OrderId, OrderStatus, ProductId, RestaurantId, SupplierId};

pub fn prepare_sqlite_url(url: &str) -> String {
    if url.starts_with("sqlite:") && !url.contains("mode=") && !url.contains(":memory:") {
        if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        }
    } else {
        url.to_string()
    }
}

pub async fn connect_db(db_url: &str, max_connections: u32) -> Result<Pool<Sqlite>> {
    tracing::debug!(db_url = %db_url, max_connections, "Connecting to database");
    Ok(SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?)
}

pub(crate) fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
