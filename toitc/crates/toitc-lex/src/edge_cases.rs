//! Edge case tests for the scanner.
//!
//! These exercise the awkward corners: EOF behavior, interpolation mode
//! switches, attachment, and recovery from malformed input.

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use proptest::prelude::*;
    use toitc_util::diagnostic::Handler;
    use toitc_util::fs::StdFilesystem;
    use toitc_util::source::SourceManager;

    use crate::canon::SymbolCanonicalizer;
    use crate::scanner::{Scanner, ScannerState};
    use crate::token::Token;

    fn scan_all(text: &[u8]) -> (Vec<ScannerState>, usize) {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///e.toit", text.to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        let mut states = Vec::new();
        loop {
            let state = scanner.next();
            let token = state.token();
            states.push(state);
            if token == Token::Eos {
                break;
            }
        }
        (states, handler.error_count())
    }

    #[test]
    fn test_empty_input() {
        let (states, errors) = scan_all(b"");
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].token(), Token::Eos);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_identifier_at_eof_without_newline() {
        let (states, errors) = scan_all(b"foo");
        assert_eq!(states[0].token(), Token::Identifier);
        assert_eq!(states[1].token(), Token::Eos);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_lone_quote_at_eof() {
        let (states, errors) = scan_all(b"\"");
        assert_eq!(states[0].token(), Token::String);
        assert_eq!(states[0].data.unwrap().as_str(), "");
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_crlf_and_bare_cr_are_newlines() {
        let (states, errors) = scan_all(b"a\r\nb\rc");
        let tokens: Vec<_> = states.iter().map(|s| s.token()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier,
                Token::Newline,
                Token::Identifier,
                Token::Newline,
                Token::Identifier,
                Token::Eos,
            ]
        );
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_decrement_vs_named_argument_shape() {
        // The scanner always reports `--`; the parser decides whether it is
        // a named-argument prefix based on attachment.
        let (states, _) = scan_all(b"--name -- name");
        assert_eq!(states[0].token(), Token::Decrement);
        assert_eq!(states[1].token(), Token::Identifier);
        assert!(states[1].is_attached());
        assert_eq!(states[2].token(), Token::Decrement);
        assert_eq!(states[3].token(), Token::Identifier);
        assert!(!states[3].is_attached());
    }

    #[test]
    fn test_interpolation_with_parenthesized_expression() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///e.toit", b"\"v=$(1 + 2)!\"".to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);

        assert_eq!(scanner.next().token(), Token::StringPart);
        // After `$` the parser scans normally for `(expr)`.
        let next = scanner.next_interpolated_part();
        assert_eq!(next.token(), Token::Lparen);
        assert_eq!(scanner.next().token(), Token::Integer);
        assert_eq!(scanner.next().token(), Token::Add);
        assert_eq!(scanner.next().token(), Token::Integer);
        assert_eq!(scanner.next().token(), Token::Rparen);
        let end = scanner.next_string_part(false);
        assert_eq!(end.token(), Token::StringEnd);
        assert_eq!(end.data.unwrap().as_str(), "!");
    }

    #[test]
    fn test_multiline_interpolation() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///e.toit", b"\"\"\"a\n$x\nb\"\"\"".to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);

        assert_eq!(scanner.next().token(), Token::StringPartMultiLine);
        assert_eq!(scanner.next_interpolated_part().token(), Token::Identifier);
        let end = scanner.next_string_part(true);
        assert_eq!(end.token(), Token::StringEndMultiLine);
        assert_eq!(end.data.unwrap().as_str(), "\nb");
        assert_eq!(handler.error_count(), 0);
    }

    #[test]
    fn test_token_ranges_within_bounds() {
        let inputs: &[&[u8]] = &[
            b"class A:\n  foo: return 1\n",
            b"x := \"unterminated",
            b"'",
            b"/*",
            b"#[1,2,]",
            b"a \x07 b",
        ];
        for input in inputs {
            let (states, _) = scan_all(input);
            for state in &states {
                assert!(state.from <= state.to);
                assert!((state.to as usize) <= input.len() + 1);
            }
        }
    }

    proptest! {
        #[test]
        fn scanner_never_panics_and_terminates(input in proptest::collection::vec(any::<u8>(), 0..200)) {
            // Remove NULs so virtual sources stay well-formed; everything
            // else, including invalid UTF-8, must be survivable.
            let cleaned: Vec<u8> = input.into_iter().filter(|&b| b != 0).collect();
            let (states, _) = scan_all(&cleaned);
            prop_assert!(states.last().unwrap().token() == Token::Eos);
        }

        #[test]
        fn comments_strictly_sorted(input in "[ -~\n]{0,120}") {
            let fs = StdFilesystem::new();
            let mut manager = SourceManager::new(&fs);
            let source = manager.add_virtual_file("///p.toit", input.as_bytes().to_vec());
            let symbols = RefCell::new(SymbolCanonicalizer::new());
            let handler = Handler::new();
            let mut scanner = Scanner::new(&source, &symbols, &handler);
            loop {
                if scanner.next().token() == Token::Eos { break; }
            }
            for pair in scanner.comments().windows(2) {
                prop_assert!(pair[0].range.from().is_before(pair[1].range.from()));
            }
        }
    }
}
