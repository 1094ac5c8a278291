//! The toitdoc mini-language parser.
//!
//! Toitdoc contents are a nested, indentation-sensitive mini-language:
//! sections introduced by `#`, itemized lists (`- `/`* `), triple-backtick
//! code sections, and paragraphs of inline text, `` `code` ``, `"text"`
//! (optionally with a `(url)` link), and `$`-references.
//!
//! A parallel construct stack drives a per-construct policy in `peek`:
//! single-line constructs end at the newline, delimited ones span newlines
//! (warning on reduced indentation), some allow blank lines, and some must
//! stay indented. When a newline is peeked, the next line's indentation is
//! computed once and a synthetic NUL is produced when the content is no
//! longer inside the current construct.
//!
//! All diagnostics from this parser arrive at warning severity: the sink
//! handed in is expected to be a
//! [`WarningFilter`](toitc_util::diagnostic::WarningFilter).

use std::cell::RefCell;

use toitc_lex::{is_identifier_start, Scanner, SymbolCanonicalizer};
use toitc_util::diagnostic::{Diagnostics, NullDiagnostics};
use toitc_util::source::SourceAccess;
use toitc_util::symbol::Symbol;

use super::node::*;
use super::source::ToitdocSource;
use crate::ast;
use crate::Parser;

fn is_newline(c: u8) -> bool {
    c == b'\r' || c == b'\n'
}

fn is_eol(c: u8) -> bool {
    c == b'\n' || c == 0
}

fn is_operator_start(c: u8) -> bool {
    matches!(
        c,
        b'=' | b'<' | b'>' | b'+' | b'-' | b'*' | b'/' | b'%' | b'~' | b'&' | b'|' | b'^' | b'['
    )
}

fn is_comment_start(c1: u8, c2: u8) -> bool {
    c1 == b'/' && (c2 == b'/' || c2 == b'*')
}

/// The constructs of the toitdoc mini-language, with their newline policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Construct {
    Contents,
    SectionTitle,
    Itemized,
    ItemStart,
    Item,
    Paragraph,
    CodeSection,
    Comment,
}

/// Parses one extracted toitdoc block.
pub struct ToitdocParser<'a> {
    toitdoc_source: &'a ToitdocSource<'a>,
    symbols: &'a RefCell<SymbolCanonicalizer>,
    diagnostics: &'a dyn Diagnostics,

    reference_asts: Vec<ast::ToitdocReference>,

    indentation_stack: Vec<i32>,
    construct_stack: Vec<Construct>,

    index: usize,
    line_indentation: i32,
    is_at_dedent: bool,
    /// The next index after a newline, memoized so the indentation after a
    /// newline is computed only once.
    next_index: Option<usize>,
    next_indentation: i32,
}

impl<'a> ToitdocParser<'a> {
    pub fn new(
        toitdoc_source: &'a ToitdocSource<'a>,
        symbols: &'a RefCell<SymbolCanonicalizer>,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self {
            toitdoc_source,
            symbols,
            diagnostics,
            reference_asts: Vec::new(),
            indentation_stack: Vec::new(),
            construct_stack: Vec::new(),
            index: 0,
            line_indentation: 0,
            is_at_dedent: false,
            next_index: None,
            next_indentation: -1,
        }
    }

    /// Parses the whole block.
    pub fn parse(mut self) -> Toitdoc {
        self.push_construct(Construct::Contents, -1);
        let mut sections = Vec::new();
        self.skip_initial_whitespace();
        while self.peek() != 0 {
            sections.push(self.parse_section());
        }
        self.pop_construct(Construct::Contents);
        let range = self.toitdoc_source.range(0, self.toitdoc_source.size());
        Toitdoc { contents: Contents { sections }, refs: self.reference_asts, range }
    }

    fn parse_section(&mut self) -> Section {
        debug_assert!(self.peek() != b' ' && self.peek() != 0);
        let mut statements = Vec::new();

        let mut title = None;
        let mut level = 0;
        if self.peek() == b'#' {
            self.push_construct(Construct::SectionTitle, self.line_indentation);
            while self.peek() == b'#' {
                level += 1;
                self.advance(1);
            }
            while self.peek() == b' ' {
                self.advance(1);
            }
            let begin = self.index;
            while self.peek() != 0 {
                self.advance(1);
            }
            title = Some(self.make_symbol(begin, self.index));
            self.pop_construct(Construct::SectionTitle);
        }
        self.skip_whitespace();
        while self.peek() != b'#' && self.peek() != 0 {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.skip_whitespace();
        }
        Section { title, level, statements }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        debug_assert!(self.peek() != b' ' && self.peek() != 0);

        if self.matches("```") {
            Some(Statement::CodeSection(self.parse_code_section()))
        } else if self.matches("- ") || self.matches("* ") {
            Some(Statement::Itemized(self.parse_itemized()))
        } else {
            self.parse_paragraph(-1).map(Statement::Paragraph)
        }
    }

    fn parse_code_section(&mut self) -> CodeSection {
        self.push_construct(Construct::CodeSection, self.line_indentation);
        self.advance_over("```");
        let begin = self.index;
        while self.peek() != 0 {
            if self.matches("```") {
                let end = self.index;
                self.advance_over("```");
                self.pop_construct(Construct::CodeSection);
                return CodeSection { code: self.make_symbol(begin, end) };
            }
            self.advance(1);
        }
        self.report_error(begin.saturating_sub(3), self.index, "Unterminated code section");
        let code = self.make_symbol(begin, self.index);
        self.pop_construct(Construct::CodeSection);
        CodeSection { code }
    }

    fn parse_itemized(&mut self) -> Itemized {
        self.push_construct(Construct::Itemized, self.line_indentation);
        debug_assert!(self.matches("- ") || self.matches("* "));
        let indentation = self.line_indentation;
        let mut items = Vec::new();

        loop {
            items.push(self.parse_item(indentation));
            self.skip_whitespace();
            if !(self.matches("- ") || self.matches("* ")) {
                break;
            }
        }
        self.pop_construct(Construct::Itemized);
        Itemized { items }
    }

    fn parse_item(&mut self, indentation: i32) -> Item {
        debug_assert!(self.matches("- ") || self.matches("* "));
        self.advance(2);

        let mut statements = Vec::new();

        {
            // Without a newline after the `- ` the first paragraph needs an
            // explicit indentation, and code sections or nested lists are
            // not yet allowed:
            //    - - foo   // not a list of lists
            //    - ```not a code section```
            // After a newline the regular line indentation takes over.
            self.push_construct(Construct::ItemStart, indentation);
            self.skip_whitespace();
            // The first paragraph's indentation starts after the '- ';
            // extra spaces are ignored.
            if let Some(first_paragraph) = self.parse_paragraph(indentation + 2) {
                statements.push(Statement::Paragraph(first_paragraph));
            }
            self.pop_construct(Construct::ItemStart);
        }
        self.push_construct(Construct::Item, indentation);
        self.skip_whitespace();
        while self.peek() != 0 {
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            self.skip_whitespace();
        }
        self.pop_construct(Construct::Item);
        Item { statements }
    }

    /// Parses a paragraph. Returns `None` when it contained only comments.
    fn parse_paragraph(&mut self, indentation_override: i32) -> Option<Paragraph> {
        let indentation =
            if indentation_override >= 0 { indentation_override } else { self.line_indentation };
        self.push_construct(Construct::Paragraph, indentation);

        let mut expressions: Vec<DocExpression> = Vec::new();

        let mut text_start = self.index;
        loop {
            let c = self.peek();
            let is_special_char = match c {
                0 => true,
                b'`' => true,
                b'"' => true,
                b'$' => {
                    // Allow `$5.2` or a lone `$` in text; only an
                    // identifier, a parenthesis, or an operator makes a ref.
                    self.look_ahead(1) == b'('
                        || is_identifier_start(self.look_ahead(1))
                        || (is_operator_start(self.look_ahead(1))
                            && !is_comment_start(self.look_ahead(1), self.look_ahead(2)))
                }
                b'/' => self.look_ahead(1) == b'*',
                b'\\' => {
                    // Ignore the escape at the end of a line; otherwise
                    // skip the escaped character.
                    if is_eol(self.look_ahead(1)) {
                        false
                    } else {
                        self.advance(2);
                        continue;
                    }
                }
                b'\'' => {
                    // Outside strings a single quote usually writes a
                    // character literal ('a', '\n'); treat it as an escape.
                    if is_eol(self.look_ahead(1)) {
                        false
                    } else if self.look_ahead(1) == b'\\' {
                        if is_eol(self.look_ahead(2)) {
                            false
                        } else if self.look_ahead(3) == b'\'' {
                            self.advance(3);
                            continue;
                        } else {
                            false
                        }
                    } else if self.look_ahead(2) == b'\'' {
                        self.advance(2);
                        continue;
                    } else {
                        false
                    }
                }
                _ => false,
            };

            if !is_special_char {
                self.advance(1);
                continue;
            }

            // Extract the text so far, then handle the special char.
            if text_start != self.index {
                let text = self.make_symbol(text_start, self.index);
                expressions.push(DocExpression::Text(Text { text }));
            }

            if c == 0 {
                break;
            }

            match c {
                b'`' => {
                    let code = self.parse_code();
                    expressions.push(DocExpression::Code(code));
                }
                b'"' => {
                    let expression = self.parse_string_or_link();
                    expressions.push(expression);
                }
                b'$' => {
                    let reference = self.parse_ref();
                    expressions.push(DocExpression::Ref(reference));
                }
                b'/' => {
                    debug_assert!(self.look_ahead(1) == b'*');
                    self.skip_comment(true);
                }
                _ => unreachable!("special characters are handled above"),
            }

            text_start = self.index;
        }

        debug_assert!(self.peek() == 0);
        self.pop_construct(Construct::Paragraph);

        // Combine adjacent texts into one.
        let mut combined: Vec<DocExpression> = Vec::new();
        for expression in expressions {
            if let DocExpression::Text(text) = &expression {
                if let Some(DocExpression::Text(last)) = combined.last_mut() {
                    let mut buffer = last.text.as_str().to_string();
                    buffer.push_str(text.text.as_str());
                    last.text = Symbol::intern(&buffer);
                    continue;
                }
            }
            combined.push(expression);
        }

        if combined.is_empty() {
            return None;
        }
        Some(Paragraph { expressions: combined })
    }

    fn parse_code(&mut self) -> Code {
        let text = self.parse_delimited(b'`', false, "Incomplete `code` segment");
        Code { text }
    }

    /// Parses a `"text"` string; a directly following `(url)` makes it a
    /// link.
    fn parse_string_or_link(&mut self) -> DocExpression {
        let text = self.parse_delimited(b'"', true, "Incomplete string");
        if self.peek() == b'(' {
            let begin = self.index;
            let mut lookahead = 1;
            loop {
                let c = self.look_ahead(lookahead);
                if c == b')' {
                    // A well-formed `(url)`: consume it.
                    self.advance(lookahead + 1);
                    let url = self.make_symbol(begin + 1, self.index - 1);
                    return DocExpression::Link(Link { text, url });
                }
                if c == 0 || c == b' ' || is_newline(c) {
                    break;
                }
                lookahead += 1;
            }
        }
        DocExpression::Text(Text { text })
    }

    /// Parses a delimited chunk. With `keep_delimiters_and_escapes` the
    /// delimiters and `\` escapes stay in the result; otherwise the
    /// delimiters are stripped and `\\`/`\<delimiter>` unescape.
    fn parse_delimited(
        &mut self,
        delimiter: u8,
        keep_delimiters_and_escapes: bool,
        error_message: &str,
    ) -> Symbol {
        debug_assert!(self.peek() == delimiter);
        let delimited_begin = self.index;
        let mut chunk_start =
            if keep_delimiters_and_escapes { self.index } else { self.index + 1 };
        let mut buffer = Vec::new();
        let mut c;
        loop {
            self.advance(1);
            c = self.peek();
            if c == b'\\' && (self.look_ahead(1) == b'\\' || self.look_ahead(1) == delimiter) {
                if keep_delimiters_and_escapes {
                    // Skip over the escaped character.
                    self.advance(2);
                } else {
                    buffer.extend_from_slice(&self.make_bytes(chunk_start, self.index));
                    self.advance(1);
                    chunk_start = self.index;
                    self.advance(1);
                }
            }
            if c == delimiter || c == 0 {
                break;
            }
        }

        let end_offset;
        if c != delimiter {
            self.report_error(delimited_begin, self.index, error_message);
            end_offset = self.index;
        } else {
            end_offset = if keep_delimiters_and_escapes { self.index + 1 } else { self.index };
            self.advance(1);
        }
        buffer.extend_from_slice(&self.make_bytes(chunk_start, end_offset));
        Symbol::synthetic(&buffer)
    }

    /// Parses a `$`-reference by handing the text to the main parser.
    ///
    /// The embedded scanner runs with a null diagnostics sink so its
    /// errors don't surface (this also means no complaints about tabs in
    /// signature references).
    fn parse_ref(&mut self) -> Ref {
        debug_assert!(self.peek() == b'$');
        let mut begin = self.index + 1;

        let is_parenthesized = self.look_ahead(1) == b'(';
        let null_diagnostics = NullDiagnostics::new();
        let mut scanner = Scanner::new(self.toitdoc_source, self.symbols, &null_diagnostics);
        scanner.advance_to(begin);
        let mut parser = Parser::new(self.toitdoc_source, scanner, self.diagnostics);
        let (ast_node, end_offset) = parser.parse_toitdoc_reference();
        self.index = end_offset;
        // Reset the newline memoization; the embedded parser moved us.
        self.is_at_dedent = false;
        self.next_index = None;
        self.next_indentation = -1;
        let id = self.reference_asts.len();
        self.reference_asts.push(ast_node);
        let mut end = self.index;
        if is_parenthesized {
            begin += 1;
            if self.look_behind() == b')' {
                end -= 1;
            }
        }
        Ref { id, text: self.make_symbol(begin, end) }
    }

    fn skip_comment(&mut self, should_report_error: bool) {
        self.push_construct(Construct::Comment, self.line_indentation);
        debug_assert!(self.look_ahead(0) == b'/' && self.look_ahead(1) == b'*');
        let begin = self.index;
        self.advance(2);
        loop {
            let c = self.peek();
            if c == 0 {
                break;
            } else if c == b'\\' {
                if self.look_ahead(1) != 0 {
                    self.advance(2);
                } else {
                    self.advance(1);
                }
            } else if c == b'*' && self.look_ahead(1) == b'/' {
                self.advance(2);
                self.pop_construct(Construct::Comment);
                return;
            } else {
                self.advance(1);
            }
        }
        if should_report_error {
            self.report_error(begin, self.index, "Unterminated comment");
        }
        self.pop_construct(Construct::Comment);
    }

    // ------------------------------------------------------------------
    // Scanning machinery
    // ------------------------------------------------------------------

    fn push_construct(&mut self, construct: Construct, indentation: i32) {
        self.indentation_stack.push(indentation);
        self.construct_stack.push(construct);
    }

    fn pop_construct(&mut self, construct: Construct) {
        debug_assert!(self.construct_stack.last() == Some(&construct));
        self.indentation_stack.pop();
        self.construct_stack.pop();
        // Make the next peek recompute whether we are at the end of the
        // current construct.
        self.is_at_dedent = false;
        self.next_index = None;
        self.next_indentation = -1;
    }

    fn make_symbol(&self, from: usize, to: usize) -> Symbol {
        Symbol::synthetic(&self.make_bytes(from, to))
    }

    /// Extracts text, squashing spaces and turning newlines into spaces
    /// where the current construct asks for it, and skipping each line's
    /// indentation.
    ///
    /// Works on raw bytes: the source is UTF-8 and multi-byte sequences
    /// must pass through untouched.
    fn make_bytes(&self, from: usize, to: usize) -> Vec<u8> {
        let (squash_spaces, replace_newlines_with_space) =
            match self.construct_stack.last().expect("inside a construct") {
                Construct::Contents | Construct::SectionTitle | Construct::Paragraph => {
                    (true, true)
                }
                Construct::CodeSection => (false, false),
                Construct::Comment
                | Construct::Itemized
                | Construct::ItemStart
                | Construct::Item => {
                    unreachable!("constructs without direct text")
                }
            };

        let text = self.toitdoc_source.text();
        let indentation = *self.indentation_stack.last().expect("inside a construct");
        let mut buffer = Vec::with_capacity(to - from);
        let mut last_was_space = false;
        let mut last_was_newline = false;
        let mut i = from;
        while i < to {
            if last_was_newline {
                last_was_newline = false;
                // Skip the indentation.
                for _ in 0..indentation.max(0) {
                    if text[i] != b' ' {
                        break;
                    }
                    i += 1;
                }
                if i >= to {
                    break;
                }
            }
            let mut c = text[i];
            if c == b'\n' && replace_newlines_with_space {
                c = b' ';
            }
            if c == b' ' && last_was_space && squash_spaces {
                i += 1;
                continue;
            }

            last_was_newline = c == b'\n';
            last_was_space = c == b' ';

            buffer.push(c);
            i += 1;
        }
        buffer
    }

    fn matches(&mut self, pattern: &str) -> bool {
        for (i, &byte) in pattern.as_bytes().iter().enumerate() {
            if self.look_ahead(i) != byte {
                return false;
            }
        }
        true
    }

    fn advance_over(&mut self, pattern: &str) {
        debug_assert!(self.matches(pattern));
        self.advance(pattern.len());
    }

    /// The current character, filtered through the construct policy.
    ///
    /// Never returns `\r`/`\n`: at a newline this computes the next line's
    /// indentation and yields either `' '` (still inside the construct) or
    /// NUL (the construct ends here).
    fn peek(&mut self) -> u8 {
        let construct = *self.construct_stack.last().expect("inside a construct");

        // Policies:
        // - single-line constructs end at the newline,
        // - delimited constructs may violate indentation (with an error),
        // - some constructs allow empty lines,
        // - some must be indented deeper than the construct itself.
        let (is_single_line, is_delimited, allows_empty_line, must_be_indented) = match construct {
            Construct::SectionTitle | Construct::ItemStart => (true, false, false, true),
            Construct::CodeSection => (false, true, true, false),
            Construct::Contents => (false, false, true, false),
            Construct::Itemized => (false, false, true, false),
            Construct::Item => (false, false, true, true),
            Construct::Paragraph => (false, false, false, true),
            Construct::Comment => {
                return self.toitdoc_source.text()[self.index];
            }
        };

        if self.is_at_dedent {
            return 0;
        }
        let text = self.toitdoc_source.text();
        debug_assert!(self.index <= self.toitdoc_source.size());
        let c = text[self.index];
        if !is_newline(c) {
            return c;
        }

        // This branch always returns ' ' or NUL, never a newline; callers
        // can probe for whitespace by checking for spaces only.
        if is_single_line {
            return 0;
        }
        if self.next_index.is_some() {
            // The indentation was already computed once; we know we are not
            // at a dedent.
            return b' ';
        }
        let mut next_index =
            if c == b'\r' && text[self.index + 1] == b'\n' { self.index + 2 } else { self.index + 1 };
        let mut next_indentation = 0;
        let mut skipped_over_multiple_lines = false;
        // Only spaces count as indentation here; tabs would need a width.
        while text[next_index] == b' ' || is_newline(text[next_index]) {
            if is_newline(text[next_index]) {
                skipped_over_multiple_lines = true;
                next_indentation = 0;
            } else {
                next_indentation += 1;
            }
            if text[next_index] == b'\r' && text[next_index + 1] == b'\n' {
                next_index += 2;
            } else {
                next_index += 1;
            }
        }
        self.next_index = Some(next_index);
        self.next_indentation = next_indentation;

        if skipped_over_multiple_lines && !allows_empty_line {
            self.is_at_dedent = true;
            return 0;
        }
        let construct_indentation = *self.indentation_stack.last().expect("inside a construct");
        if next_indentation < construct_indentation {
            if is_delimited {
                if text[next_index] != 0 {
                    let range = self.toitdoc_source.range(self.index, self.index + 1);
                    self.diagnostics.report_error(range, "Bad indentation".to_string());
                }
                b' '
            } else {
                self.is_at_dedent = true;
                0
            }
        } else if next_indentation == construct_indentation {
            if must_be_indented {
                self.is_at_dedent = true;
                0
            } else {
                b' '
            }
        } else {
            b' '
        }
    }

    /// The raw character `n` ahead (`n == 0` goes through [`Self::peek`]).
    fn look_ahead(&mut self, n: usize) -> u8 {
        if n == 0 {
            return self.peek();
        }
        *self.toitdoc_source.text().get(self.index + n).unwrap_or(&0)
    }

    fn look_behind(&self) -> u8 {
        if self.index == 0 {
            return 0;
        }
        self.toitdoc_source.text()[self.index - 1]
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            let c = self.peek();
            if c == 0 {
                self.is_at_dedent = false;
                return;
            }
            if let Some(next_index) = self.next_index {
                self.index = next_index;
                self.line_indentation = self.next_indentation;
                self.next_index = None;
                self.next_indentation = -1;
            } else {
                self.index += 1;
            }
        }
    }

    fn skip_initial_whitespace(&mut self) {
        let text = self.toitdoc_source.text();
        let mut initial_indentation = 0;
        while text[initial_indentation] == b' ' {
            initial_indentation += 1;
        }
        self.line_indentation = initial_indentation as i32;
        self.skip_whitespace();
    }

    fn skip_whitespace(&mut self) {
        while self.peek() == b' ' {
            self.advance(1);
        }
    }

    fn report_error(&mut self, from: usize, to: usize, message: &str) {
        // The sink is expected to demote this to a warning.
        let range = self.toitdoc_source.range(from, to);
        self.diagnostics.report_error(range, message.to_string());
    }
}
