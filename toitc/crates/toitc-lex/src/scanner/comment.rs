//! Comment capture.
//!
//! Comments never become tokens. The scanner records them, in order of
//! appearance, for the toitdoc attacher. The recorded range includes the
//! leading delimiter bytes (`//`, `///`, `/*`, `/**`).

use super::{is_newline, Comment, Scanner};

impl<'a> Scanner<'a> {
    /// Captures a `//` comment. The scanner is at the second `/`.
    ///
    /// `///` comments are toitdoc comments; contiguous runs are merged into
    /// one block later, by the attacher.
    pub(crate) fn capture_single_line_comment(&mut self) {
        debug_assert!(self.peek() == b'/');
        let mut peek = self.advance();
        // The comment includes the '//'.
        let begin = self.index - 2;

        let is_toitdoc = peek == b'/';

        while !self.at_eos() && !is_newline(peek) {
            peek = self.advance();
        }

        self.comments.push(Comment {
            is_multiline: false,
            is_toitdoc,
            range: self.source.range(begin, self.index),
        });
    }

    /// Captures a `/* ... */` comment (supports nesting). The scanner is at
    /// the `*`.
    ///
    /// `/**`-comments (that are not just `/**/`) are toitdoc comments.
    pub(crate) fn capture_multi_line_comment(&mut self) {
        debug_assert!(self.peek() == b'*');
        let mut peek = self.advance();
        // The comment includes the '/*'.
        let begin = self.index - 2;

        let is_toitdoc = peek == b'*' && self.look_ahead(1) != b'/';

        let mut nesting_count = 1;
        while !self.at_eos() {
            if peek == b'*' {
                peek = self.advance();
                if peek == b'/' {
                    peek = self.advance();
                    nesting_count -= 1;
                    if nesting_count == 0 {
                        break;
                    }
                }
            } else if peek == b'/' {
                peek = self.advance();
                if peek == b'*' {
                    peek = self.advance();
                    nesting_count += 1;
                }
            } else if peek == b'\\' {
                peek = self.advance();
                if !self.at_eos() {
                    peek = self.advance();
                }
            } else {
                peek = self.advance();
            }
        }
        let _ = peek;

        if nesting_count != 0 {
            self.report_error(begin, self.index, "Unterminated multi-line comment");
        }

        self.comments.push(Comment {
            is_multiline: true,
            is_toitdoc,
            range: self.source.range(begin, self.index),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use toitc_util::diagnostic::Handler;
    use toitc_util::fs::StdFilesystem;
    use toitc_util::source::SourceManager;

    use crate::canon::SymbolCanonicalizer;
    use crate::scanner::{Comment, Scanner};
    use crate::token::Token;

    fn scan_comments(text: &[u8]) -> (Vec<Comment>, usize) {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///c.toit", text.to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        loop {
            if scanner.next().token() == Token::Eos {
                break;
            }
        }
        (scanner.comments().to_vec(), handler.error_count())
    }

    #[test]
    fn test_single_line_comment() {
        let (comments, errors) = scan_comments(b"a // hello\nb");
        assert_eq!(comments.len(), 1);
        assert!(!comments[0].is_multiline);
        assert!(!comments[0].is_toitdoc);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_toitdoc_single_line() {
        let (comments, _) = scan_comments(b"/// doc\nfoo:");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_toitdoc);
        assert!(!comments[0].is_multiline);
    }

    #[test]
    fn test_multi_line_comment() {
        let (comments, errors) = scan_comments(b"a /* x */ b");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_multiline);
        assert!(!comments[0].is_toitdoc);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_toitdoc_multi_line() {
        let (comments, _) = scan_comments(b"/** doc */\nfoo:");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_toitdoc);
        assert!(comments[0].is_multiline);
    }

    #[test]
    fn test_nested_comment() {
        let (comments, errors) = scan_comments(b"/* outer /* inner */ still */ x");
        assert_eq!(comments.len(), 1);
        assert_eq!(errors, 0);
    }

    #[test]
    fn test_unterminated_comment() {
        let (comments, errors) = scan_comments(b"/* never closed");
        assert_eq!(comments.len(), 1);
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_comments_sorted() {
        let (comments, _) = scan_comments(b"// a\n// b\n/* c */ x // d\n");
        assert!(comments.len() >= 3);
        for pair in comments.windows(2) {
            assert!(pair[0].range.from().is_before(pair[1].range.from()));
        }
    }

    #[test]
    fn test_comment_in_leading_whitespace_keeps_indentation() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///c.toit", b"a:\n  /* x */  b".to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        scanner.next(); // a
        scanner.next(); // :
        let newline = scanner.next();
        assert_eq!(newline.token(), Token::Newline);
        // Spaces before and after the inline comment both count.
        assert_eq!(newline.indentation, 4);
        assert_eq!(scanner.next().token(), Token::Identifier);
    }
}
