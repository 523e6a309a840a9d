use super::{Database, RestaurantId};
use anyhow::Result;

const TOKEN_COLUMNS: &str = "id, restaurant_id, token, issued_at, last_used_at, revoked_at";

/// An API bearer token issued to one restaurant.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub id: i64,
    pub restaurant_id: RestaurantId,
    pub token: String,
    pub issued_at: i64,
    pub last_used_at: Option<i64>,
    pub revoked_at: Option<i64>,
}

impl TokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

impl Database {
    pub async fn create_token(
        &self,
        restaurant: RestaurantId,
        token: &str,
        issued_at: i64,
    ) -> Result<TokenRecord> {
        let record: TokenRecord = sqlx::query_as(&format!(
            "INSERT INTO tokens (restaurant_id, token, issued_at) VALUES (?, ?, ?) \
             RETURNING {TOKEN_COLUMNS}"
        ))
        .bind(restaurant)
        .bind(token)
        .bind(issued_at)
        .fetch_one(self.pool())
        .await?;
        tracing::debug!(
            restaurant_id = restaurant.0,
            token_id = record.id,
            issued_at,
            "Issued API token"
        );
        Ok(record)
    }

    /// Newest first; tokens issued in the same second keep insertion order reversed.
    pub async fn list_tokens(&self, restaurant: RestaurantId) -> Result<Vec<TokenRecord>> {
        let tokens: Vec<TokenRecord> = sqlx::query_as(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE restaurant_id = ? \
             ORDER BY issued_at DESC, id DESC"
        ))
        .bind(restaurant)
        .fetch_all(self.pool())
        .await?;
        tracing::trace!(restaurant_id = restaurant.0, count = tokens.len(), "Listed tokens");
        Ok(tokens)
    }

    /// Returns `false` when the restaurant has no active token with this value.
    pub async fn revoke_token(
        &self,
        restaurant: RestaurantId,
        token: &str,
        revoked_at: i64,
    ) -> Result<bool> {
        let revoked: Option<i64> = sqlx::query_scalar(
            "UPDATE tokens SET revoked_at = ? \
             WHERE restaurant_id = ? AND token = ? AND revoked_at IS NULL \
             RETURNING id",
        )
        .bind(revoked_at)
        .bind(restaurant)
        .bind(token)
        .fetch_optional(self.pool())
        .await?;
        match revoked {
            Some(token_id) => {
                tracing::debug!(restaurant_id = restaurant.0, token_id, "Revoked API token")
            }
            None => tracing::debug!(restaurant_id = restaurant.0, "No active token to revoke"),
        }
        Ok(revoked.is_some())
    }

    /// Resolve an active token to its restaurant, stamping `last_used_at` in the same statement.
    pub async fn use_token(&self, token: &str, used_at: i64) -> Result<Option<RestaurantId>> {
        let restaurant: Option<RestaurantId> = sqlx::query_scalar(
            "UPDATE tokens SET last_used_at = ? \
             WHERE token = ? AND revoked_at IS NULL \
             RETURNING restaurant_id",
        )
        .bind(used_at)
        .bind(token)
        .fetch_optional(self.pool())
        .await?;
        if let Some(restaurant) = restaurant {
            tracing::trace!(restaurant_id = restaurant.0, used_at, "Token used");
        }
        Ok(restaurant)
    }
}
