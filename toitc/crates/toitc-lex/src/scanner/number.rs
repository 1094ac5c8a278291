//! Number literal scanning.
//!
//! Supported forms:
//! - decimal integers with `_` separators (a separator must be followed by
//!   a digit)
//! - `0x`/`0X` hexadecimal, `0b`/`0B` binary
//! - decimal floats `1.5e-17` and hexadecimal floats `0x7.abcP+3`
//!   (hexadecimal floats require an exponent)

use super::{is_binary_digit, is_decimal_digit, is_hex_digit, Scanner};
use crate::token::Token;

impl<'a> Scanner<'a> {
    /// Scans a number literal. `peek` is the current byte.
    pub(crate) fn scan_number(&mut self, peek: u8) -> Token {
        let begin = self.index;
        debug_assert!(is_decimal_digit(peek) || peek == b'.');

        let mut result = Token::Integer;
        let mut error_message: Option<&'static str> = None;

        let mut base = 10;
        let mut is_valid_digit: fn(u8) -> bool = is_decimal_digit;

        let mut peek = peek;
        if peek == b'0' && (self.look_ahead(1) == b'x' || self.look_ahead(1) == b'X') {
            self.advance();
            peek = self.advance();
            base = 16;
            is_valid_digit = is_hex_digit;
        } else if peek == b'0' && (self.look_ahead(1) == b'b' || self.look_ahead(1) == b'B') {
            self.advance();
            peek = self.advance();
            base = 2;
            is_valid_digit = is_binary_digit;
        }

        let mut has_digits = false;

        while is_valid_digit(peek) {
            peek = self.advance();
            has_digits = true;
            if peek == b'_' && is_valid_digit(self.look_ahead(1)) {
                peek = self.advance();
            }
        }

        // Decimal and hexadecimal floating point literals:
        //  - 1.5e-17
        //  - 0x7107.abcP+3
        if base >= 10 && peek == b'.' && is_valid_digit(self.look_ahead(1)) {
            peek = self.advance(); // The '.'.
            loop {
                peek = self.advance();
                has_digits = true;
                if peek == b'_' && is_valid_digit(self.look_ahead(1)) {
                    peek = self.advance();
                }
                if !is_valid_digit(peek) {
                    break;
                }
            }
            result = Token::Double;
        }

        if !has_digits {
            error_message = Some("Invalid number literal");
        } else if (base == 10 && (peek == b'e' || peek == b'E'))
            || (base == 16 && (peek == b'p' || peek == b'P'))
        {
            peek = self.advance();
            if peek == b'+' || peek == b'-' {
                peek = self.advance();
            }
            if !is_decimal_digit(peek) {
                error_message = Some("Invalid floating-point literal");
            } else {
                while is_decimal_digit(peek) {
                    peek = self.advance();
                    if peek == b'_' && is_decimal_digit(self.look_ahead(1)) {
                        peek = self.advance();
                    }
                }
                result = Token::Double;
            }
        } else if base == 16 && result == Token::Double {
            error_message = Some("Hexadecimal floating point numbers must have an exponent");
        }
        if error_message.is_none() && peek == b'_' {
            error_message = Some("Invalid number literal");
        }

        if let Some(message) = error_message {
            // Eat all digits that could have been part of the literal.
            let mut peek = self.peek();
            while peek == b'_'
                || is_hex_digit(peek)
                || (peek == b'.' && is_hex_digit(self.look_ahead(1)))
            {
                peek = self.advance();
            }
            self.report_error(begin, self.index, message);
        }

        self.data =
            Some(self.symbols.borrow_mut().canonicalize_number(&self.input[begin..self.index]));
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use toitc_util::diagnostic::Handler;
    use toitc_util::fs::StdFilesystem;
    use toitc_util::source::SourceManager;

    use crate::canon::SymbolCanonicalizer;
    use crate::scanner::Scanner;
    use crate::token::Token;

    fn scan_one(text: &str) -> (Token, String, usize) {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///n.toit", text.as_bytes().to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        let state = scanner.next();
        (state.token(), state.data.map(|s| s.as_str().to_string()).unwrap_or_default(), handler.error_count())
    }

    #[test]
    fn test_decimal_integer() {
        assert_eq!(scan_one("42"), (Token::Integer, "42".to_string(), 0));
    }

    #[test]
    fn test_separators() {
        assert_eq!(scan_one("1_000_000"), (Token::Integer, "1_000_000".to_string(), 0));
        // A separator must be followed by a digit.
        let (token, _, errors) = scan_one("1_");
        assert_eq!(token, Token::Integer);
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_hex_and_binary() {
        assert_eq!(scan_one("0xFF"), (Token::Integer, "0xFF".to_string(), 0));
        assert_eq!(scan_one("0b1010"), (Token::Integer, "0b1010".to_string(), 0));
        let (_, _, errors) = scan_one("0x");
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_decimal_float() {
        assert_eq!(scan_one("3.25"), (Token::Double, "3.25".to_string(), 0));
        assert_eq!(scan_one("1.5e-17"), (Token::Double, "1.5e-17".to_string(), 0));
        assert_eq!(scan_one("2E10"), (Token::Double, "2E10".to_string(), 0));
    }

    #[test]
    fn test_leading_dot_float() {
        assert_eq!(scan_one(".5"), (Token::Double, ".5".to_string(), 0));
    }

    #[test]
    fn test_hex_float_requires_exponent() {
        assert_eq!(scan_one("0x7p+3"), (Token::Double, "0x7p+3".to_string(), 0));
        let (token, _, errors) = scan_one("0x7107.abc");
        assert_eq!(token, Token::Double);
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_bad_exponent() {
        let (_, _, errors) = scan_one("1e+");
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_canonicalization_is_shared() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///n.toit", b"17 17".to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        let a = scanner.next();
        let b = scanner.next();
        assert_eq!(a.data, b.data);
    }
}
