//! Property tests for the contribution parser.
//!
//! Arbitrary tab/newline soup must never panic or store an empty value.

use magic_contribution::parse_contribution;
use proptest::prelude::*;

fn line_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9 >]{0,6}", 1..6).prop_map(|fields| fields.join("\t"))
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => line_strategy(),
            1 => Just(">>>>".to_string()),
            1 => "[a-z_]{1,8}".prop_map(|name| format!("tab\t{}", name)),
        ],
        0..30,
    )
    .prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn prop_rows_never_hold_empty_values(text in text_strategy()) {
        let (contribution, _) = parse_contribution(&text);
        for (_, rows) in contribution.tables() {
            for row in rows {
                prop_assert!(row.iter().all(|(_, value)| !value.is_empty()));
                prop_assert!(row.iter().all(|(_, value)| value.trim() == value));
            }
        }
    }

    #[test]
    fn prop_every_empty_table_is_warned(text in text_strategy()) {
        let (contribution, diagnostics) = parse_contribution(&text);
        for (table, rows) in contribution.tables() {
            if rows.is_empty() {
                let expected = format!("No data values were found in the {} table.", table);
                prop_assert!(diagnostics.warnings().iter().any(|w| w.message == expected));
            }
        }
    }

    #[test]
    fn prop_parse_is_deterministic(text in text_strategy()) {
        let first = parse_contribution(&text);
        let second = parse_contribution(&text);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_banner_only_text_is_empty_without_diagnostics() {
    let (contribution, diagnostics) = parse_contribution("tab\tsites\n");
    assert!(contribution.is_empty());
    assert!(diagnostics.is_empty());
}
