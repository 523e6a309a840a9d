use restock::messages::DEFAULT_MESSAGE_TEMPLATE;
use restock::template::format_order_details;
use restock::{render_message, OrderLine};

fn line(name: &str, quantity: &str, unit: &str) -> OrderLine {
    OrderLine {
        product_name: name.to_string(),
        quantity: quantity.to_string(),
        unit: Some(unit.to_string()),
        price: None,
    }
}

#[test]
fn default_template_message() {
    let lines = vec![line("Bistecca di manzo", "2", "kg"), line("Pollo intero", "4", "pezzi")];
    let message = render_message(None, &lines, Some("Consegna entro le 11:00"));
    assert_eq!(
        message,
        "Buongiorno,\n\nvorremmo effettuare il seguente ordine:\n\n\
         - Bistecca di manzo: 2 kg\n- Pollo intero: 4 pezzi\n\n\
         Note aggiuntive:\nConsegna entro le 11:00\n\nGrazie,\n[NOME_RISTORANTE]"
    );
}

#[test]
fn custom_template_keeps_surrounding_text() {
    let template = "Ciao Marco,\n{ORDER_DETAILS}\nA domani";
    let message = render_message(Some(template), &[line("Limoni", "2", "kg")], None);
    assert_eq!(message, "Ciao Marco,\n- Limoni: 2 kg\nA domani");
}

#[test]
fn blank_notes_are_omitted() {
    let details = format_order_details(&[line("Limoni", "2", "kg")], Some("  \n "));
    assert_eq!(details, "- Limoni: 2 kg");
}

#[test]
fn default_template_has_one_placeholder() {
    assert_eq!(DEFAULT_MESSAGE_TEMPLATE.matches("{ORDER_DETAILS}").count(), 1);
}
