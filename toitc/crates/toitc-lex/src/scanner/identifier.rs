//! Identifier and keyword scanning.

use toitc_util::source::LSP_SELECTION_MARKER;

use super::{is_identifier_part, is_identifier_start, Scanner};
use crate::token::Token;

impl<'a> Scanner<'a> {
    /// Scans an identifier or keyword.
    ///
    /// If an [`LSP_SELECTION_MARKER`] byte is part of the identifier and the
    /// source confirms the offset, the marker is logically excised before
    /// canonicalization and the state is flagged as the LSP selection. A
    /// marker byte the source does not recognize terminates the identifier
    /// (and scans as an illegal byte on its own).
    pub(crate) fn scan_identifier(&mut self, peek: u8) -> Token {
        let begin = self.index;
        debug_assert!(is_identifier_start(peek));

        self.is_lsp_selection = false;
        let mut peek = peek;
        loop {
            if peek == LSP_SELECTION_MARKER {
                // If the marker sits at a location where it shouldn't be,
                // treat it as a non-identifier character. When it wasn't the
                // first character, the scanned identifier is returned first
                // and the main loop rediscovers the marker as illegal.
                if !self.source.is_lsp_marker_at(self.index) {
                    break;
                }
                self.is_lsp_selection = true;
            }
            peek = self.advance();
            if !is_identifier_part(peek) {
                break;
            }
        }

        if !self.is_lsp_selection && begin == self.index {
            debug_assert!(peek == LSP_SELECTION_MARKER);
            // We were hoping for an LSP selection, but discovered an illegal
            // character instead.
            return self.scan_single(Token::Illegal);
        }

        // Canonicalize with any marker removed. The symbol may have length
        // zero if the identifier was only the selection marker.
        let bytes = self.source.text_range_without_marker(begin, self.index);
        let token_symbol = self.symbols.borrow_mut().canonicalize_identifier(&bytes);
        self.data = Some(token_symbol.symbol);
        if self.is_lsp_selection && self.lsp_selection_is_identifier {
            // The selection wins over the stored kind: completions on a
            // keyword (e.g. `for`) should still treat it as an identifier.
            if token_symbol.kind != Token::Identifier {
                self.data = Some(token_symbol.kind.symbol());
            }
            return Token::Identifier;
        }
        token_symbol.kind
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use toitc_util::diagnostic::Handler;
    use toitc_util::fs::StdFilesystem;
    use toitc_util::source::{Source, SourceManager};

    use crate::canon::SymbolCanonicalizer;
    use crate::scanner::Scanner;
    use crate::token::Token;

    #[test]
    fn test_lsp_marker_in_identifier() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let plain = manager.add_virtual_file("///x.toit", b"foo bar".to_vec());
        let marked = Source::with_lsp_marker(&plain, 5);

        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&marked, &symbols, &handler);
        let foo = scanner.next();
        assert_eq!(foo.token(), Token::Identifier);
        assert!(!foo.is_lsp_selection());
        let bar = scanner.next();
        assert_eq!(bar.token(), Token::Identifier);
        assert!(bar.is_lsp_selection());
        // The marker is excised before canonicalization.
        assert_eq!(bar.data.unwrap().as_str(), "bar");
    }

    #[test]
    fn test_keyword_under_marker_in_completion_mode() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let plain = manager.add_virtual_file("///x.toit", b"for".to_vec());
        let marked = Source::with_lsp_marker(&plain, 3);

        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();

        // Default mode: the keyword stays a keyword.
        let mut scanner = Scanner::new(&marked, &symbols, &handler);
        assert_eq!(scanner.next().token(), Token::For);

        // Completion mode: the keyword becomes an identifier whose data is
        // the keyword's syntax.
        let mut scanner = Scanner::with_lsp_mode(&marked, true, &symbols, &handler);
        let state = scanner.next();
        assert_eq!(state.token(), Token::Identifier);
        assert!(state.is_lsp_selection());
        assert_eq!(state.data.unwrap().as_str(), "for");
    }

    #[test]
    fn test_unconfirmed_marker_is_illegal() {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        // A raw marker byte in the text that the source doesn't confirm.
        let source = manager.add_virtual_file("///x.toit", vec![b'a', b'b', 1, b'c']);

        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let mut scanner = Scanner::new(&source, &symbols, &handler);
        let ab = scanner.next();
        assert_eq!(ab.token(), Token::Identifier);
        assert_eq!(ab.data.unwrap().as_str(), "ab");
        assert_eq!(scanner.next().token(), Token::Illegal);
        assert_eq!(scanner.next().token(), Token::Identifier);
    }
}
