//! String and character literal scanning, including interpolation parts.
//!
//! Inside a string, `$` starts an interpolation. The scanner does not
//! proceed past the `$`: it yields a `StringPart` state and waits for the
//! parser to request the continuation with the matching entry point. The
//! data payload of string states is the raw source text (escapes are not
//! processed here).

use toitc_util::symbol::symbols;

use super::{is_decimal_digit, is_letter, is_newline, Scanner};
use crate::token::Token;

impl<'a> Scanner<'a> {
    /// Scans a character literal `'x'` or `'\x'`.
    ///
    /// Also used for the format in interpolated strings. An unterminated
    /// literal yields an error and a substitute payload.
    pub(crate) fn scan_character(&mut self) -> Token {
        debug_assert!(self.peek() == b'\'');
        let begin = self.index + 1;
        loop {
            let peek = self.advance();
            if peek == b'\'' {
                self.data = Some(self.preserve_syntax(begin, self.index));
                self.advance();
                return Token::Character;
            } else if peek == b'\\' {
                self.advance();
            } else if self.at_eos() || is_newline(peek) {
                self.report_error(begin - 1, self.index, "Unterminated character");
                // Any character works as substitute; "1" is already interned.
                self.data = Some(symbols::ONE);
                return Token::Character;
            }
        }
    }

    /// Scans a string literal: `"..."` single-line or `"""..."""`
    /// multi-line. Stops at `$` with a `StringPart`/`StringPartMultiLine`.
    pub(crate) fn scan_string(&mut self) -> Token {
        debug_assert!(self.peek() == b'"');
        let mut is_multiline = false;

        let error_pos = self.index;
        let mut begin = self.index + 1;

        // Check whether we have a multi-line string.
        if self.look_ahead(1) == b'"' {
            self.advance();
            if self.look_ahead(1) == b'"' {
                self.advance();
                begin += 2;
                is_multiline = true;
            } else {
                // Just the empty string.
                self.data = Some(self.preserve_syntax(begin, self.index));
                self.advance();
                return Token::String;
            }
        }

        loop {
            let peek = self.advance();
            if peek == b'"' {
                let mut index = self.index;
                if is_multiline {
                    if self.look_ahead(1) != b'"' {
                        continue;
                    }
                    self.advance();
                    if self.look_ahead(1) != b'"' {
                        continue;
                    }
                    self.advance();
                    // Allow up to 5 double quotes, for triple quoted strings
                    // that end with two double quotes.
                    while self.index - index < 4 && self.look_ahead(1) == b'"' {
                        self.advance();
                    }
                    index = self.index - 2;
                    self.data = Some(self.preserve_syntax(begin, index));
                    self.advance();
                    return Token::StringMultiLine;
                }
                self.data = Some(self.preserve_syntax(begin, index));
                self.advance();
                return Token::String;
            } else if peek == b'\\' {
                self.advance();
            } else if peek == b'$' {
                self.data = Some(self.preserve_syntax(begin, self.index));
                self.advance();
                return if is_multiline { Token::StringPartMultiLine } else { Token::StringPart };
            } else if self.at_eos() || (!is_multiline && is_newline(peek)) {
                self.report_error(error_pos, self.index, "Unterminated string");
                self.data = Some(self.preserve_syntax(begin, self.index));
                return if is_multiline { Token::StringMultiLine } else { Token::String };
            }
        }
    }

    /// Resumes scanning a string after an interpolated expression.
    pub fn next_string_part(&mut self, is_multiline: bool) -> super::ScannerState {
        self.begin_part();
        let begin = self.index;
        loop {
            let peek = self.peek();
            if peek == b'"' {
                let mut index = self.index;
                if is_multiline {
                    if self.look_ahead(1) != b'"' {
                        self.advance();
                        continue;
                    }
                    self.advance();
                    if self.look_ahead(1) != b'"' {
                        self.advance();
                        continue;
                    }
                    self.advance();
                    // Allow up to 5 double quotes, for triple quoted strings
                    // that end with two double quotes.
                    while self.index - index < 4 && self.look_ahead(1) == b'"' {
                        self.advance();
                    }
                    index = self.index - 2;
                    self.data = Some(self.preserve_syntax(begin, index));
                    self.advance();
                    return self.create_state(Token::StringEndMultiLine);
                }
                self.data = Some(self.preserve_syntax(begin, index));
                self.advance();
                return self.create_state(Token::StringEnd);
            } else if peek == b'\\' {
                self.advance();
                self.advance();
            } else if peek == b'$' {
                self.data = Some(self.preserve_syntax(begin, self.index));
                self.advance();
                let token =
                    if is_multiline { Token::StringPartMultiLine } else { Token::StringPart };
                return self.create_state(token);
            } else if self.at_eos() || (!is_multiline && is_newline(peek)) {
                self.report_error(begin, self.index, "Unterminated string");
                self.data = Some(symbols::EMPTY_STRING);
                let token = if is_multiline { Token::StringEndMultiLine } else { Token::StringEnd };
                return self.create_state(token);
            } else {
                self.advance();
            }
        }
    }

    /// Scans a string-format spec inside `$(%<format> expr)`.
    ///
    /// The scanner only does a basic shape check, `[-^]?[0-9.]*<letter>`,
    /// which catches bad errors early and anchors later reporting.
    pub fn next_string_format_part(&mut self) -> super::ScannerState {
        self.begin_part();
        let begin = self.index;
        if self.peek() == b'-' || self.peek() == b'^' {
            self.index += 1;
        }
        let mut peek = self.peek();
        loop {
            if is_decimal_digit(peek) || peek == b'.' {
                peek = self.advance();
                continue;
            }
            if is_letter(peek) {
                peek = self.advance();
                if self.at_skippable_whitespace(peek) || self.at_eos() {
                    self.data = Some(self.preserve_syntax(begin, self.index));
                    return self.create_state(Token::String);
                }
            }
            let (from, to) = (begin, self.index);
            self.report_error(from, to, "Invalid format string");
            self.advance();
            self.data = Some(symbols::EMPTY_STRING);
            return self.create_state(Token::String);
        }
    }

    /// Marks the start of a continuation state (string part / format).
    fn begin_part(&mut self) {
        self.begin = self.index;
        self.last = self.index;
        self.data = None;
        self.is_lsp_selection = false;
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

    fn with_scanner<R>(text: &[u8], f: impl FnOnce(&mut Scanner<'_>, &Handler) -> R) -> R {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///s.toit", text.to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        f(&mut scanner, &handler)
    }

    #[test]
    fn test_simple_string() {
        with_scanner(b"\"hello\"", |scanner, handler| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::String);
            assert_eq!(state.data.unwrap().as_str(), "hello");
            assert_eq!(handler.error_count(), 0);
        });
    }

    #[test]
    fn test_empty_string() {
        with_scanner(b"\"\"", |scanner, _| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::String);
            assert_eq!(state.data.unwrap().as_str(), "");
        });
    }

    #[test]
    fn test_escapes_preserved() {
        with_scanner(br#""a\"b""#, |scanner, _| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::String);
            // Raw source text, escapes unprocessed.
            assert_eq!(state.data.unwrap().as_str(), "a\\\"b");
        });
    }

    #[test]
    fn test_unterminated_string() {
        with_scanner(b"\"abc", |scanner, handler| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::String);
            assert_eq!(handler.error_count(), 1);
        });
        with_scanner(b"\"abc\ndef\"", |scanner, handler| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::String);
            assert_eq!(handler.error_count(), 1);
        });
    }

    #[test]
    fn test_multiline_string() {
        with_scanner(b"\"\"\"a\nb\"\"\"", |scanner, _| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::StringMultiLine);
            assert_eq!(state.data.unwrap().as_str(), "a\nb");
        });
    }

    #[test]
    fn test_multiline_string_trailing_quotes() {
        // Two content quotes before the closing triple: """x""""" -> x""
        with_scanner(b"\"\"\"x\"\"\"\"\"", |scanner, _| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::StringMultiLine);
            assert_eq!(state.data.unwrap().as_str(), "x\"\"");
        });
    }

    #[test]
    fn test_interpolation_part() {
        with_scanner(b"\"x=$foo\"", |scanner, _| {
            let part = scanner.next();
            assert_eq!(part.token(), Token::StringPart);
            assert_eq!(part.data.unwrap().as_str(), "x=");
            // The parser requests the identifier after the `$`.
            let ident = scanner.next_interpolated_part();
            assert_eq!(ident.token(), Token::Identifier);
            assert_eq!(ident.data.unwrap().as_str(), "foo");
            let end = scanner.next_string_part(false);
            assert_eq!(end.token(), Token::StringEnd);
            assert_eq!(end.data.unwrap().as_str(), "");
        });
    }

    #[test]
    fn test_string_format_part() {
        with_scanner(b"%05.2f rest", |scanner, handler| {
            // The parser consumed "$(" and "%" already in real usage; here
            // we call the format scanner directly on "05.2f".
            scanner.advance_to(1);
            let state = scanner.next_string_format_part();
            assert_eq!(state.token(), Token::String);
            assert_eq!(state.data.unwrap().as_str(), "05.2f");
            assert_eq!(handler.error_count(), 0);
        });
    }

    #[test]
    fn test_invalid_format_part() {
        with_scanner(b"%@@ x", |scanner, handler| {
            scanner.advance_to(1);
            let state = scanner.next_string_format_part();
            assert_eq!(state.token(), Token::String);
            assert_eq!(handler.error_count(), 1);
        });
    }

    #[test]
    fn test_character_literal() {
        with_scanner(b"'a' '\\n'", |scanner, _| {
            let a = scanner.next();
            assert_eq!(a.token(), Token::Character);
            assert_eq!(a.data.unwrap().as_str(), "a");
            let n = scanner.next();
            assert_eq!(n.token(), Token::Character);
            assert_eq!(n.data.unwrap().as_str(), "\\n");
        });
    }

    #[test]
    fn test_unterminated_character() {
        with_scanner(b"'a", |scanner, handler| {
            let state = scanner.next();
            assert_eq!(state.token(), Token::Character);
            assert_eq!(state.data.unwrap().as_str(), "1");
            assert_eq!(handler.error_count(), 1);
        });
    }
}
