//! Assembling order lines from a supplier catalog, parsed text and free-text
//! custom items.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{ProductId, Supplier, SupplierId};
use crate::parser::{ParsedLine, DEFAULT_QUANTITY, DEFAULT_UNIT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_name: String,
    pub quantity: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl OrderLine {
    pub fn custom(name: &str) -> Self {
        Self {
            product_name: name.trim().to_string(),
            quantity: DEFAULT_QUANTITY.to_string(),
            unit: Some(DEFAULT_UNIT.to_string()),
            price: None,
        }
    }
}

impl From<ParsedLine> for OrderLine {
    fn from(line: ParsedLine) -> Self {
        Self {
            product_name: line.name,
            quantity: line.quantity,
            unit: Some(line.unit),
            price: None,
        }
    }
}

/// A catalog product picked for an order. Without a quantity the product's
/// default quantity is used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductSelection {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderDraft {
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub selections: Vec<ProductSelection>,
    /// Free text, one item per line, each ordered as a single piece.
    #[serde(default)]
    pub custom_items: Option<String>,
    #[serde(default)]
    pub parsed_items: Vec<ParsedLine>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderDraft {
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref().filter(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("order has no items")]
    NoItems,
    #[error("product {0} is not in the supplier catalog")]
    UnknownProduct(ProductId),
    #[error("supplier {0} is no longer active")]
    InactiveSupplier(SupplierId),
}

impl OrderError {
    /// Stable code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::NoItems => "no_items",
            OrderError::UnknownProduct(_) => "unknown_product",
            OrderError::InactiveSupplier(_) => "inactive_supplier",
        }
    }
}

fn format_default_quantity(quantity: Option<f64>) -> String {
    match quantity {
        Some(q) if q > 0.0 => {
            if q.fract() == 0.0 {
                format!("{}", q as i64)
            } else {
                q.to_string()
            }
        }
        _ => DEFAULT_QUANTITY.to_string(),
    }
}

/// Build the order lines for `draft` against `supplier`'s catalog.
///
/// Catalog selections come first, then parsed items, then custom lines.
pub fn compose_lines(supplier: &Supplier, draft: &OrderDraft) -> Result<Vec<OrderLine>, OrderError> {
    if !supplier.is_active {
        return Err(OrderError::InactiveSupplier(supplier.id));
    }

    let mut lines = Vec::new();

    for selection in &draft.selections {
        let product = supplier
            .product(selection.product_id)
            .ok_or(OrderError::UnknownProduct(selection.product_id))?;
        let quantity = match selection.quantity.as_deref().map(str::trim) {
            Some("") => continue,
            Some(q) => q.to_string(),
            None => format_default_quantity(product.default_quantity),
        };
        lines.push(OrderLine {
            product_name: product.name.clone(),
            quantity,
            unit: Some(product.unit.clone()),
            price: product.price.filter(|p| *p > 0.0),
        });
    }

    lines.extend(
        draft
            .parsed_items
            .iter()
            .filter(|item| !item.name.trim().is_empty())
            .cloned()
            .map(OrderLine::from),
    );

    if let Some(custom) = &draft.custom_items {
        lines.extend(
            custom
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(OrderLine::custom),
        );
    }

    if lines.is_empty() {
        return Err(OrderError::NoItems);
    }
    Ok(lines)
}

/// Numeric value of a free-text quantity. `NaN` and `inf` are not quantities.
fn parse_quantity(quantity: &str) -> Option<f64> {
    quantity
        .trim()
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite())
}

/// Price times quantity when the quantity is numeric, otherwise the plain
/// price.
pub fn line_subtotal(line: &OrderLine) -> Option<f64> {
    let price = line.price?;
    Some(match parse_quantity(&line.quantity) {
        Some(qty) => price * qty,
        None => price,
    })
}

/// `(total_items, total_amount)` for a set of lines.
pub fn order_totals(lines: &[OrderLine]) -> (i64, f64) {
    let amount = lines.iter().filter_map(line_subtotal).sum();
    (lines.len() as i64, amount)
}
