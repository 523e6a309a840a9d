use proptest::prelude::*;
use restock::{parse_line, parse_order_text};

// Property: the parser never panics on arbitrary input
proptest! {
    #[test]
    fn prop_parse_line_no_panic(s in "(?s).*") {
        let _ = parse_line(&s);
    }

    #[test]
    fn prop_at_most_one_item_per_line(s in "(?s).{0,200}") {
        let lines = s.split('\n').filter(|l| !l.trim().is_empty()).count();
        prop_assert!(parse_order_text(&s).len() <= lines);
    }
}

fn order_line_strategy() -> impl Strategy<Value = (String, u32, String, String)> {
    (
        "[A-Z][a-z]{2,10}( [a-z]{2,8})?",
        1u32..500,
        prop::sample::select(vec!["kg", "g", "litri", "pezzi", "casse"]),
        prop::sample::select(vec![" - ", " ", " – "]),
    )
        .prop_map(|(name, qty, unit, sep)| (name, qty, unit.to_string(), sep.to_string()))
}

proptest! {
    #[test]
    fn prop_structured_lines_are_recognised((name, qty, unit, sep) in order_line_strategy()) {
        let line = format!("{name}{sep}{qty} {unit}");
        let parsed = parse_line(&line).unwrap();
        prop_assert_eq!(parsed.name, name);
        prop_assert_eq!(parsed.quantity, qty.to_string());
        prop_assert_eq!(parsed.unit, unit);
    }

    #[test]
    fn prop_parsed_names_are_trimmed(s in "[ \t]{0,3}[-*•]?[ ]{0,2}[A-Za-z ]{3,20}[ \t]{0,3}") {
        if let Some(parsed) = parse_line(&s) {
            prop_assert_eq!(parsed.name.trim(), parsed.name.as_str());
            prop_assert_eq!(parsed.unit, "pezzi");
        }
    }
}
