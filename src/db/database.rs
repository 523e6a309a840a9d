use anyhow::Result;
use sqlx::{Pool, Sqlite};

/// Cloneable handle to the supplier/order store.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::debug!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
