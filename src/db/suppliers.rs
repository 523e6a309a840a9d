use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::{ContactMethod, Database, ProductId, RestaurantId, SupplierId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub contact_method: ContactMethod,
    pub contact_info: String,
    pub message_template: Option<String>,
    pub is_active: bool,
    pub products: Vec<SupplierProduct>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Supplier {
    /// Active catalog entry with the given id.
    pub fn product(&self, id: ProductId) -> Option<&SupplierProduct> {
        self.products.iter().find(|p| p.id == id && p.is_active)
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierProduct {
    pub id: ProductId,
    pub supplier_id: SupplierId,
    pub name: String,
    pub unit: String,
    pub default_quantity: Option<f64>,
    pub price: Option<f64>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub sort_order: i64,
}

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: SupplierId,
    name: String,
    contact_method: ContactMethod,
    contact_info: String,
    message_template: Option<String>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl SupplierRow {
    fn with_products(self, products: Vec<SupplierProduct>) -> Supplier {
        Supplier {
            id: self.id,
            name: self.name,
            contact_method: self.contact_method,
            contact_info: self.contact_info,
            message_template: self.message_template,
            is_active: self.is_active,
            products,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub default_quantity: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact_method: ContactMethod,
    pub contact_info: String,
    #[serde(default)]
    pub message_template: Option<String>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

/// Partial update; `None` leaves a field unchanged. A present product list
/// replaces the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SupplierUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_method: Option<ContactMethod>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub message_template: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<NewProduct>>,
}

const SUPPLIER_COLUMNS: &str = "id, name, contact_method, contact_info, message_template, \
                                is_active, created_at, updated_at";

async fn insert_products(
    conn: &mut SqliteConnection,
    supplier: SupplierId,
    products: &[NewProduct],
) -> Result<()> {
    for (index, product) in products.iter().enumerate() {
        sqlx::query(
            "INSERT INTO supplier_products \
             (supplier_id, name, unit, default_quantity, price, notes, sort_order) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(supplier)
        .bind(product.name.trim())
        .bind(product.unit.trim())
        .bind(product.default_quantity.unwrap_or(1.0))
        .bind(product.price.unwrap_or(0.0))
        .bind(product.notes.as_deref())
        .bind(index as i64)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

impl Database {
    pub async fn create_supplier(
        &self,
        restaurant: RestaurantId,
        new: &NewSupplier,
        now: i64,
    ) -> Result<Supplier> {
        tracing::debug!(
            restaurant_id = restaurant.0,
            name = %new.name,
            products = new.products.len(),
            "Creating supplier"
        );
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            "INSERT INTO suppliers \
             (restaurant_id, name, contact_method, contact_info, message_template, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(restaurant)
        .bind(new.name.trim())
        .bind(new.contact_method)
        .bind(new.contact_info.trim())
        .bind(new.message_template.as_deref())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let id = SupplierId(result.last_insert_rowid());
        insert_products(&mut *tx, id, &new.products).await?;
        tx.commit().await?;

        self.get_supplier(restaurant, id)
            .await?
            .ok_or_else(|| anyhow!("supplier {id} missing after insert"))
    }

    async fn products_for(&self, supplier: SupplierId) -> Result<Vec<SupplierProduct>> {
        sqlx::query_as(
            "SELECT id, supplier_id, name, unit, default_quantity, price, notes, is_active, sort_order \
             FROM supplier_products WHERE supplier_id = ? ORDER BY sort_order, id",
        )
        .bind(supplier)
        .fetch_all(self.pool())
        .await
        .map_err(Into::into)
    }

    /// Active suppliers of a restaurant, alphabetically.
    pub async fn list_suppliers(&self, restaurant: RestaurantId) -> Result<Vec<Supplier>> {
        tracing::trace!(restaurant_id = restaurant.0, "Listing suppliers");
        let rows: Vec<SupplierRow> = sqlx::query_as(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers \
             WHERE restaurant_id = ? AND is_active = 1 ORDER BY name COLLATE NOCASE, id"
        ))
        .bind(restaurant)
        .fetch_all(self.pool())
        .await?;

        let mut suppliers = Vec::with_capacity(rows.len());
        for row in rows {
            let products = self.products_for(row.id).await?;
            suppliers.push(row.with_products(products));
        }
        Ok(suppliers)
    }

    pub async fn get_supplier(
        &self,
        restaurant: RestaurantId,
        id: SupplierId,
    ) -> Result<Option<Supplier>> {
        tracing::trace!(restaurant_id = restaurant.0, supplier_id = id.0, "Fetching supplier");
        let row: Option<SupplierRow> = sqlx::query_as(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ? AND restaurant_id = ?"
        ))
        .bind(id)
        .bind(restaurant)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => {
                let products = self.products_for(row.id).await?;
                Ok(Some(row.with_products(products)))
            }
            None => Ok(None),
        }
    }

    /// Apply a partial update. Returns `None` when the supplier does not
    /// belong to the restaurant.
    pub async fn update_supplier(
        &self,
        restaurant: RestaurantId,
        id: SupplierId,
        update: &SupplierUpdate,
        now: i64,
    ) -> Result<Option<Supplier>> {
        tracing::debug!(
            restaurant_id = restaurant.0,
            supplier_id = id.0,
            replace_products = update.products.is_some(),
            "Updating supplier"
        );
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            "UPDATE suppliers SET \
             name = COALESCE(?, name), \
             contact_method = COALESCE(?, contact_method), \
             contact_info = COALESCE(?, contact_info), \
             message_template = COALESCE(?, message_template), \
             updated_at = ? \
             WHERE id = ? AND restaurant_id = ?",
        )
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.contact_method)
        .bind(update.contact_info.as_deref().map(str::trim))
        .bind(update.message_template.as_deref())
        .bind(now)
        .bind(id)
        .bind(restaurant)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(supplier_id = id.0, "Supplier not found for update");
            return Ok(None);
        }

        if let Some(products) = &update.products {
            sqlx::query("DELETE FROM supplier_products WHERE supplier_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_products(&mut *tx, id, products).await?;
        }
        tx.commit().await?;

        self.get_supplier(restaurant, id).await
    }

    /// Soft delete: the supplier stays referenced by its past orders.
    pub async fn deactivate_supplier(
        &self,
        restaurant: RestaurantId,
        id: SupplierId,
        now: i64,
    ) -> Result<u64> {
        tracing::debug!(restaurant_id = restaurant.0, supplier_id = id.0, "Deactivating supplier");
        let result = sqlx::query(
            "UPDATE suppliers SET is_active = 0, updated_at = ? \
             WHERE id = ? AND restaurant_id = ? AND is_active = 1",
        )
        .bind(now)
        .bind(id)
        .bind(restaurant)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }
}
