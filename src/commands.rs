use std::io::Read;

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::api::token_preview;
use crate::cli::{ParseArgs, TokenCommand};
use crate::db::{now_timestamp, Database, RestaurantId, TokenRecord};
use crate::messages::{TOKENS_EMPTY, TOKEN_ISSUED, TOKEN_NOT_FOUND, TOKEN_REVOKED};
use crate::parser::parse_order_text;

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_optional_timestamp(timestamp: Option<i64>, fallback: &str) -> String {
    timestamp
        .and_then(|value| chrono::DateTime::<chrono::Utc>::from_timestamp(value, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| fallback.to_string())
}

fn format_token_list(tokens: &[TokenRecord]) -> String {
    tokens
        .iter()
        .map(|token| {
            let issued = format_timestamp(token.issued_at);
            let last_used = format_optional_timestamp(token.last_used_at, "never");
            let revoked = format_optional_timestamp(token.revoked_at, "not revoked");
            let marker = if token.is_revoked() { " (revoked)" } else { "" };
            format!(
                "{}{marker}\n  issued: {issued}\n  last used: {last_used}\n  revoked: {revoked}",
                token.token
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn issue_token(db: &Database, restaurant: RestaurantId) -> Result<String> {
    let token = generate_token();
    let issued_at = now_timestamp();
    let preview = token_preview(&token);
    tracing::debug!(
        restaurant_id = restaurant.0,
        token_preview = %preview,
        "Issuing token"
    );
    let record = db.create_token(restaurant, &token, issued_at).await?;
    Ok(format!("{TOKEN_ISSUED}\n{}", record.token))
}

pub async fn list_tokens(db: &Database, restaurant: RestaurantId) -> Result<String> {
    let tokens = db.list_tokens(restaurant).await?;
    if tokens.is_empty() {
        return Ok(TOKENS_EMPTY.to_string());
    }
    Ok(format_token_list(&tokens))
}

pub async fn revoke_token(db: &Database, restaurant: RestaurantId, token: &str) -> Result<String> {
    let token = token.trim();
    let revoked_at = now_timestamp();
    let preview = token_preview(token);
    tracing::debug!(
        restaurant_id = restaurant.0,
        token_preview = %preview,
        "Revoking token"
    );
    let revoked = db.revoke_token(restaurant, token, revoked_at).await?;
    Ok(if revoked { TOKEN_REVOKED } else { TOKEN_NOT_FOUND }.to_string())
}

pub async fn run_token_command(db: &Database, command: TokenCommand) -> Result<String> {
    match command {
        TokenCommand::Issue(args) => issue_token(db, RestaurantId(args.restaurant)).await,
        TokenCommand::List(args) => list_tokens(db, RestaurantId(args.restaurant)).await,
        TokenCommand::Revoke(args) => {
            revoke_token(db, RestaurantId(args.restaurant), &args.token).await
        }
    }
}

/// Render the lines recognised in `text`, as plain text or a JSON array.
pub fn format_parsed(text: &str, json: bool) -> Result<String> {
    let lines = parse_order_text(text);
    if json {
        return serde_json::to_string_pretty(&lines).context("failed to serialize parsed lines");
    }
    Ok(lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn run_parse_command(args: &ParseArgs) -> Result<String> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };
    format_parsed(&text, args.json)
}
