//! Shared text: supplier messages and CLI output.
//!
//! Keep user-facing strings in this module so they stay in one place and are
//! easy to update or translate.

pub const ORDER_DETAILS_PLACEHOLDER: &str = "{ORDER_DETAILS}";

pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "Buongiorno,\n\nvorremmo effettuare il seguente ordine:\n\n{ORDER_DETAILS}\n\nGrazie,\n[NOME_RISTORANTE]";

pub const NOTES_HEADER: &str = "Note aggiuntive:";

pub fn order_line_text(name: &str, quantity: &str, unit: Option<&str>) -> String {
    let line = format!("- {name}: {quantity} {}", unit.unwrap_or(""));
    line.trim_end().to_string()
}

pub const TOKEN_ISSUED: &str = "Issued a new API token. Keep it secret:";
pub const TOKENS_EMPTY: &str = "No tokens have been issued for this restaurant.";
pub const TOKEN_REVOKED: &str = "Token revoked.";
pub const TOKEN_NOT_FOUND: &str = "Token not found or already revoked.";
