//! Property-based tests for the tokenizer
//!
//! Lexing is idempotent under whitespace normalization: re-joining the emitted
//! tokens with single spaces and lexing again yields the same tokens.

use lslc::compiler::lexer::lex;
use proptest::prelude::*;

fn flat_tokens(source: &str) -> Vec<String> {
    lex(source)
        .map(|lines| {
            lines
                .into_iter()
                .flat_map(|line| line.tokens.into_iter().map(|t| t.text))
                .collect()
        })
        .unwrap_or_default()
}

/// Atomic tokens that never merge with a space-separated neighbour
fn atom_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_][a-z0-9_]{0,6}",
        "[0-9]{1,5}",
        "[0-9]{1,3}\\.[0-9]{1,3}",
        "\"[a-z ]{0,8}\"",
        prop::sample::select(vec![
            "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^", "~", ",", "@", "?", "[", "]", ";", "{",
            "}", "++", "--", "+=", "-=", "*=", "/=", "%=", "==", "!=", "<=", ">=", "<<", ">>", "&&", "||",
            "<<=", ">>=",
        ])
        .prop_map(str::to_owned),
    ]
}

fn separator_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![" ", "  ", "\t", " \t ", "\n"])
}

proptest! {
    #[test]
    fn prop_whitespace_normalization_round_trip(
        parts in prop::collection::vec((atom_strategy(), separator_strategy()), 1..30)
    ) {
        let source: String = parts.iter().map(|(atom, sep)| format!("{atom}{sep}")).collect();
        let first = flat_tokens(&source);
        let atoms: Vec<String> = parts.into_iter().map(|(atom, _)| atom).collect();
        prop_assert_eq!(&first, &atoms);

        let second = flat_tokens(&first.join(" "));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_integer_literals_stay_whole(n in 0u32..u32::MAX) {
        let text = n.to_string();
        prop_assert_eq!(flat_tokens(&text), vec![text]);
    }

    #[test]
    fn prop_exponent_literals_stay_whole(mantissa in 1u32..1000, exp in 1u32..40, neg in any::<bool>()) {
        let text = format!("{mantissa}e{}{exp}", if neg { "-" } else { "+" });
        prop_assert_eq!(flat_tokens(&text), vec![text]);
    }
}
