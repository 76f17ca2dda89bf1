//! Property tests for the lexer round-trip guarantee: the recorded slice
//! of any token, when relexed, yields the same kind and decoded value.

use mkc_lex::{Lexer, TokenKind};
use mkc_util::{FileId, Handler};
use proptest::prelude::*;

fn lex_kinds(src: &str) -> Vec<TokenKind> {
    let handler = Handler::new();
    Lexer::new(src, FileId::DUMMY, &handler)
        .tokenize()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

proptest! {
    #[test]
    fn identifiers_round_trip(name in "[a-zA-Z][a-zA-Z0-9_]{0,24}") {
        // Skip lexemes that are keywords; they reclassify by design.
        prop_assume!(TokenKind::keyword(&name).is_none());
        prop_assume!(name != "_");

        let handler = Handler::new();
        let tokens = Lexer::new(&name, FileId::DUMMY, &handler).tokenize();
        prop_assert!(!handler.has_errors());
        prop_assert_eq!(tokens.len(), 2);
        prop_assert_eq!(&tokens[0].text, &name);

        let relexed = lex_kinds(&tokens[0].text);
        prop_assert_eq!(&relexed[0], &tokens[0].kind);
    }

    #[test]
    fn integers_round_trip(value in 0i64..=i64::MAX) {
        let src = value.to_string();
        let handler = Handler::new();
        let tokens = Lexer::new(&src, FileId::DUMMY, &handler).tokenize();
        prop_assert!(!handler.has_errors());
        prop_assert_eq!(&tokens[0].kind, &TokenKind::Int(value));

        let relexed = lex_kinds(&tokens[0].text);
        prop_assert_eq!(&relexed[0], &tokens[0].kind);
    }

    #[test]
    fn lexer_never_panics(src in "\\PC{0,200}") {
        let handler = Handler::new();
        let tokens = Lexer::new(&src, FileId::DUMMY, &handler).tokenize();
        // The stream always terminates with exactly one EOF sentinel.
        prop_assert!(tokens.last().is_some_and(|t| t.is_eof()));
        prop_assert_eq!(tokens.iter().filter(|t| t.is_eof()).count(), 1);
    }
}
