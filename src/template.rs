//! Rendering the order message sent to a supplier.

use crate::messages::{
    order_line_text, DEFAULT_MESSAGE_TEMPLATE, NOTES_HEADER, ORDER_DETAILS_PLACEHOLDER,
};
use crate::order::OrderLine;

/// The block substituted for `{ORDER_DETAILS}`: one `- name: qty unit` line
/// per item, followed by the notes verbatim unless they are blank.
pub fn format_order_details(lines: &[OrderLine], notes: Option<&str>) -> String {
    let mut details = lines
        .iter()
        .map(|line| order_line_text(&line.product_name, &line.quantity, line.unit.as_deref()))
        .collect::<Vec<_>>()
        .join("\n");

    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        details.push_str(&format!("\n\n{NOTES_HEADER}\n{notes}"));
    }
    details
}

/// Fill the supplier template (or the default one) with the order details.
/// Only the first placeholder is replaced.
pub fn render_message(template: Option<&str>, lines: &[OrderLine], notes: Option<&str>) -> String {
    let template = template
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_MESSAGE_TEMPLATE);
    let details = format_order_details(lines, notes);
    tracing::trace!(lines = lines.len(), "Rendering order message");
    template.replacen(ORDER_DETAILS_PLACEHOLDER, &details, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<OrderLine> {
        vec![
            OrderLine {
                product_name: "Bistecca di manzo".to_string(),
                quantity: "2".to_string(),
                unit: Some("kg".to_string()),
                price: Some(25.0),
            },
            OrderLine {
                product_name: "Limoni".to_string(),
                quantity: "3".to_string(),
                unit: None,
                price: None,
            },
        ]
    }

    #[test]
    fn details_without_unit_have_no_trailing_space() {
        let text = format_order_details(&lines(), None);
        assert_eq!(text, "- Bistecca di manzo: 2 kg\n- Limoni: 3");
    }

    #[test]
    fn details_append_notes() {
        let text = format_order_details(&lines()[..1], Some("Consegna entro le 11:00"));
        assert_eq!(
            text,
            "- Bistecca di manzo: 2 kg\n\nNote aggiuntive:\nConsegna entro le 11:00"
        );
    }

    #[test]
    fn notes_are_appended_verbatim() {
        let text = format_order_details(&lines()[1..], Some("  Citofonare\n  al retro"));
        assert_eq!(text, "- Limoni: 3\n\nNote aggiuntive:\n  Citofonare\n  al retro");
        assert_eq!(format_order_details(&lines()[1..], Some(" \n ")), "- Limoni: 3");
    }

    #[test]
    fn blank_template_falls_back_to_default() {
        let message = render_message(Some("  "), &lines()[..1], None);
        assert!(message.starts_with("Buongiorno,"));
        assert!(message.contains("- Bistecca di manzo: 2 kg"));
        assert!(message.ends_with("[NOME_RISTORANTE]"));
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        let message = render_message(
            Some("{ORDER_DETAILS}\n--\n{ORDER_DETAILS}"),
            &lines()[1..],
            None,
        );
        assert_eq!(message, "- Limoni: 3\n--\n{ORDER_DETAILS}");
    }

    #[test]
    fn template_without_placeholder_is_unchanged() {
        let message = render_message(Some("Chiamateci"), &lines(), None);
        assert_eq!(message, "Chiamateci");
    }
}
