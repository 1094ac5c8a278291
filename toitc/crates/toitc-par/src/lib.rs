//! toitc-par - Parser (Syntactic Analyzer)
//!
//! A recursive-descent parser for an indentation-sensitive language, built
//! around an explicit *indentation stack*: every open construct records the
//! column it started at, and a `Newline` whose next line starts at or below
//! the top frame's column is rewritten - on read, by the parser - into a
//! `Dedent`, the universal construct terminator.
//!
//! The parser never aborts on malformed input. Every construct has a
//! skip-to-terminator recovery strategy, and a sentinel `Error` expression
//! is produced wherever an expression was required; the resulting AST is
//! always well-formed.
//!
//! Components:
//! - [`indent`] - the indentation stack
//! - [`queue`] - the scanner state queue (bounded lookahead)
//! - [`ast`] - node definitions and visitor
//! - [`toitdoc`] - the toitdoc mini-language parser and attacher
//! - [`printer`] - a textual AST renderer for debugging

pub mod ast;
pub mod indent;
pub mod printer;
pub mod queue;
pub mod toitdoc;

mod edge_cases;
mod expr;
mod items;
mod reference;
mod stmt;

use toitc_lex::{Scanner, ScannerState, Token};
use toitc_util::diagnostic::Diagnostics;
use toitc_util::source::SourceAccess;
use toitc_util::span::Range;
use toitc_util::symbol::Symbol;

use crate::indent::{ConstructKind, IndentationStack};
use crate::queue::ScannerStateQueue;

/// Default bound for tree height and indentation-stack depth.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 2000;

/// Whether `token` ends the current expression.
pub(crate) fn is_delimiter(token: Token, allow_colon: bool, allow_semicolon: bool) -> bool {
    if !allow_colon && token == Token::Colon {
        return true;
    }
    if !allow_semicolon && token == Token::Semicolon {
        return true;
    }
    matches!(
        token,
        Token::Dedent
            | Token::Comma
            | Token::Rparen
            | Token::Rbrace
            | Token::Rbrack
            | Token::Else
            | Token::Conditional
            | Token::Finally
            | Token::Slice
            | Token::Eos
    )
}

/// Whether `token` ends the current call's argument list.
pub(crate) fn is_call_delimiter(token: Token, allow_colon: bool) -> bool {
    is_delimiter(token, allow_colon, false)
        || token == Token::LogicalOr
        || token == Token::LogicalAnd
}

pub(crate) fn is_eol(token: Token) -> bool {
    matches!(token, Token::Newline | Token::Dedent | Token::Eos)
}

/// A range from the previous range's end to the end of line. If that range
/// would be empty, returns `eol` itself.
pub(crate) fn eol_range(previous: Range, eol: Range) -> Range {
    if !previous.to().is_before(eol.to()) {
        return eol;
    }
    Range::new(previous.to(), eol.from())
}

/// The parser state for one token: the scanner state plus the
/// (possibly rewritten) token and newline tracking.
#[derive(Clone, Copy)]
pub(crate) struct State {
    pub scanner_state: ScannerState,
    /// Mostly redundant with the scanner's token, except that `Newline` and
    /// `Eos` may have been switched to `Dedent`.
    pub token: Token,
    pub at_newline: bool,
}

impl State {
    fn invalid() -> State {
        State { scanner_state: ScannerState::invalid(), token: Token::Dedent, at_newline: true }
    }

    fn is_valid(&self) -> bool {
        self.scanner_state.is_valid()
    }

    fn mark_invalid(&mut self) {
        self.scanner_state.mark_invalid();
    }
}

/// The parser.
pub struct Parser<'a> {
    pub(crate) source: &'a dyn SourceAccess,
    pub(crate) diagnostics: &'a dyn Diagnostics,

    pub(crate) queue: ScannerStateQueue<'a>,
    /// Cache of the current parser state; fully determined by the current
    /// scanner state.
    current_state: State,

    pub(crate) indentation_stack: IndentationStack,

    pub(crate) encountered_stack_overflow: bool,
    max_recursion_depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser reading tokens from the given scanner.
    ///
    /// The scanner must have been created over `source`.
    pub fn new<S: SourceAccess>(
        source: &'a S,
        scanner: Scanner<'a>,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        Self::with_max_recursion_depth(source, scanner, diagnostics, DEFAULT_MAX_RECURSION_DEPTH)
    }

    /// Creates a parser with a custom recursion bound.
    pub fn with_max_recursion_depth<S: SourceAccess>(
        source: &'a S,
        scanner: Scanner<'a>,
        diagnostics: &'a dyn Diagnostics,
        max_recursion_depth: usize,
    ) -> Self {
        Self {
            source,
            diagnostics,
            queue: ScannerStateQueue::new(scanner),
            current_state: State::invalid(),
            indentation_stack: IndentationStack::new(),
            encountered_stack_overflow: false,
            max_recursion_depth,
        }
    }

    pub(crate) fn report_error(&mut self, range: Range, message: impl Into<String>) {
        self.diagnostics.report_error(range, message.into());
    }

    pub(crate) fn report_error_here(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.report_error(range, message);
    }

    // ========================================================================
    // STATE ACCESS
    // ========================================================================

    /// Returns the n'th state after the current one, without dropping
    /// newlines.
    ///
    /// `Newline`/`Eos` tokens are rewritten to `Dedent` depending on the
    /// indentation stack; the `at_newline` field is set from the preceding
    /// state. Since this buffers scanner states, one must not peek into
    /// states where the scanner mode is switched (string interpolation).
    pub(crate) fn peek_state(&mut self, n: isize) -> State {
        if n == 0 && self.current_state.is_valid() {
            return self.current_state;
        }
        self.compute_state(n)
    }

    fn compute_state(&mut self, n: isize) -> State {
        let scanner_state = self.queue.get(n);
        let mut token = scanner_state.token();
        let mut at_newline = false;

        match token {
            Token::Eos | Token::Newline => {
                if self.indentation_stack.is_empty() {
                    // No multiline construct: just deal with the next token
                    // (and let a plain EOS terminate parsing).
                } else {
                    let next_state = self.queue.get(n + 1);
                    let old_indentation = scanner_state.indentation as i32;
                    if (next_state.indentation as i32) > old_indentation {
                        // Increasing the indentation is ok.
                    } else if (next_state.indentation as i32) == old_indentation
                        && self.indentation_stack.top_indentation() < old_indentation
                    {
                        // Still indented.
                    } else {
                        // A dedent: close the current multiline construct.
                        token = Token::Dedent;
                    }
                }
            }
            _ => {
                let previous = self.queue.get(n - 1);
                at_newline = previous.token() == Token::Newline;
            }
        }

        State { scanner_state, token, at_newline }
    }

    /// The current state, scanning if necessary. Skips over `Newline`
    /// states (their effect survives in `at_newline`).
    pub(crate) fn current_state(&mut self) -> State {
        if !self.current_state.is_valid() {
            self.current_state = self.compute_state(0);
            if self.current_state.token == Token::Newline {
                self.consume();
                self.current_state = self.compute_state(0);
            }
        }
        self.current_state
    }

    /// The current token.
    pub(crate) fn current_token(&mut self) -> Token {
        self.current_state().token
    }

    /// The token after the current token.
    pub(crate) fn peek_token(&mut self) -> Token {
        self.peek_state(1).token
    }

    /// The indentation of the current line. All tokens in a line share it.
    pub(crate) fn current_indentation(&mut self) -> i32 {
        self.current_state().scanner_state.indentation as i32
    }

    /// The indentation of the token following the current dedent.
    pub(crate) fn indentation_after_dedent(&mut self) -> i32 {
        debug_assert!(self.current_state().token == Token::Dedent);
        self.peek_state(1).scanner_state.indentation as i32
    }

    /// The range of the current token. `Newline`/`Dedent`/`Eos` ranges are
    /// shortened to at most one character.
    pub(crate) fn current_range(&mut self) -> Range {
        let state = self.current_state();
        let (from, to) = state.scanner_state.range();
        if is_eol(state.token) {
            let mut shortened_to = to.min(from + 1);
            let text = self.source.text();
            if shortened_to > 0
                && text[shortened_to] == b'\n'
                && text[shortened_to - 1] == b'\r'
            {
                shortened_to += 1;
            }
            return self.source.range(from, shortened_to);
        }
        self.source.range(from, to)
    }

    /// Like [`Parser::current_range`], but never invokes the scanner.
    pub(crate) fn current_range_safe(&mut self) -> Range {
        if self.current_state.is_valid() || self.queue.buffered_count() > 0 {
            self.current_range()
        } else {
            self.queue.scanner().current_range()
        }
    }

    /// The range of the previous token.
    pub(crate) fn previous_range(&mut self) -> Range {
        let previous = self.queue.get(-1);
        let (from, to) = previous.range();
        self.source.range(from, to)
    }

    /// The previous token.
    pub(crate) fn previous_token(&mut self) -> Token {
        self.queue.get(-1).token()
    }

    /// The data symbol of the current token (falling back to the token's
    /// syntax).
    pub(crate) fn current_token_data(&mut self) -> Symbol {
        let state = self.current_state();
        match state.scanner_state.data {
            Some(data) => data,
            None => state.token.symbol(),
        }
    }

    /// The current token, treating a delimiter at the construct's own level
    /// as current: delimiters are allowed at the same level as the
    /// construct, so this may look behind a `Dedent`.
    pub(crate) fn current_token_if_delimiter(&mut self) -> Token {
        let kind = self.current_token();
        if kind == Token::Dedent
            && self.current_indentation() == self.indentation_stack.top_indentation()
        {
            return self.peek_token();
        }
        kind
    }

    /// Whether the current token starts a line.
    pub(crate) fn at_newline(&mut self) -> bool {
        self.current_state().at_newline
    }

    /// Whether the current token is directly attached to the previous one
    /// (no whitespace in between).
    pub(crate) fn is_current_token_attached(&mut self) -> bool {
        let state = self.current_state();
        if state.token == Token::Dedent || state.token == Token::Eos {
            return false;
        }
        !state.at_newline && state.scanner_state.is_attached()
    }

    /// Whether the next token is attached to the current one.
    pub(crate) fn is_next_token_attached(&mut self) -> bool {
        let next_state = self.peek_state(1);
        match next_state.token {
            Token::Newline | Token::Eos | Token::Dedent => false,
            _ => next_state.scanner_state.is_attached(),
        }
    }

    /// Consumes the current state.
    ///
    /// Does *not* automatically fetch the next state, so the scanner mode
    /// can be switched in between (string interpolation).
    pub(crate) fn consume(&mut self) {
        debug_assert!(self.current_state.is_valid());
        self.current_state.mark_invalid();
        self.queue.consume();
    }

    /// Consumes the current token if it has the given kind.
    pub(crate) fn optional(&mut self, kind: Token) -> bool {
        if self.current_token() != kind {
            return false;
        }
        self.consume();
        true
    }

    /// Consumes the given delimiter, also when it sits at the construct's
    /// own indentation level behind a dedent.
    pub(crate) fn optional_delimiter(&mut self, kind: Token) -> bool {
        if self.current_token() == kind {
            self.delimit_with(kind);
            return true;
        }
        if self.current_token() == Token::Dedent
            && self.current_indentation() == self.indentation_stack.top_indentation()
            && self.peek_token() == kind
        {
            self.delimit_with(kind);
            return true;
        }
        false
    }

    // ========================================================================
    // SCANNER MODE SWITCHES
    // ========================================================================

    /// Requests the identifier (or fallback) after a `$` in a string.
    pub(crate) fn scan_interpolated_part(&mut self) {
        debug_assert!(!self.current_state.is_valid());
        self.queue.buffer_interpolated_part();
    }

    /// Requests the string continuation after an interpolated expression.
    pub(crate) fn scan_string_part(&mut self, is_multiline: bool) {
        debug_assert!(!self.current_state.is_valid());
        self.queue.buffer_string_part(is_multiline);
    }

    /// Requests a `%`-format spec inside `$(...)`.
    pub(crate) fn scan_string_format_part(&mut self) {
        debug_assert!(!self.current_state.is_valid());
        self.queue.buffer_string_format_part();
    }

    pub(crate) fn scanner_peek(&mut self) -> u8 {
        self.scanner_look_ahead(0)
    }

    pub(crate) fn scanner_look_ahead(&mut self, n: usize) -> u8 {
        debug_assert!(!self.current_state.is_valid());
        self.queue.scanner_look_ahead(n)
    }

    /// Discards all buffered scanner states (including the current one).
    ///
    /// When a string interpolation encounters an error, buffered states
    /// would interfere with scanning the rest of the string; dropping them
    /// lets the scanner continue. This may discard too much (even closing
    /// quotes), but recovery inside broken interpolations is best-effort.
    pub(crate) fn discard_buffered_scanner_states(&mut self) {
        if self.current_state.is_valid() {
            self.consume();
            debug_assert!(!self.current_state.is_valid());
        }
        self.queue.discard_buffered();
    }

    // ========================================================================
    // MULTILINE CONSTRUCTS
    // ========================================================================

    /// Opens a multiline construct at the current indentation: tokens at or
    /// below this column will read as `Dedent`.
    pub(crate) fn start_multiline_construct(&mut self, kind: ConstructKind) {
        let indentation = self.current_indentation();
        self.start_multiline_construct_at(kind, indentation);
    }

    /// Opens a multiline construct at the given indentation.
    pub(crate) fn start_multiline_construct_at(&mut self, kind: ConstructKind, indentation: i32) {
        self.check_indentation_stack_depth();
        let range = self.current_range_safe();
        self.indentation_stack.push(indentation, kind, range);
    }

    /// Consumes the given delimiter token, allowing it to sit at the same
    /// level as the construct, and allowing the line after it to indent
    /// less than the delimiter (but not less than the construct).
    ///
    /// The individual delimited sections do not depend on each other with
    /// respect to indentation:
    ///
    /// ```text
    /// if foo
    ///     and bar:
    ///   gee 1 2
    /// ```
    pub(crate) fn delimit_with(&mut self, token: Token) {
        debug_assert!(self.current_token_if_delimiter() == token);
        let construct_indentation = self.indentation_stack.top_indentation();
        if self.current_token() == Token::Dedent
            && self.indentation_after_dedent() == construct_indentation
        {
            // Allow delimiters at the same level as the construct.
            self.consume();
        }
        debug_assert!(self.current_token() == token);
        self.consume();
        if self.current_token() == Token::Dedent
            && self.indentation_after_dedent() > construct_indentation
        {
            self.consume();
        }
    }

    /// Skips forward to the given delimiter, a dedent, or a line that isn't
    /// plausibly part of the signature anymore. Returns whether the
    /// delimiter was found (and consumed).
    pub(crate) fn skip_to_body(&mut self, delimiter: Token) -> bool {
        loop {
            if self.at_newline()
                && self.current_indentation() < self.indentation_stack.top_indentation() + 4
            {
                break;
            }
            if self.current_token() == Token::Dedent {
                break;
            }
            if self.current_token() == delimiter {
                break;
            }
            self.consume();
        }
        self.optional(delimiter)
    }

    /// Skips to the dedent that closes the current construct.
    pub(crate) fn skip_to_dedent(&mut self) {
        debug_assert!(!self.indentation_stack.is_empty());
        while self.current_token() != Token::Dedent
            || (self.current_state().scanner_state.indentation as i32)
                > self.indentation_stack.top_indentation()
        {
            debug_assert!(self.current_token() != Token::Eos);
            self.consume();
        }
    }

    pub(crate) fn skip_to_end_of_multiline_construct(&mut self) {
        self.skip_to_dedent();
    }

    /// Closes a multiline construct, consuming the dedent when no enclosing
    /// construct still needs it.
    pub(crate) fn end_multiline_construct(&mut self, kind: ConstructKind) {
        self.end_multiline_construct_impl(kind, false);
    }

    /// Like [`Parser::end_multiline_construct`], but reports an error and
    /// skips if the construct doesn't end at a dedent.
    pub(crate) fn end_multiline_construct_at_dedent(&mut self, kind: ConstructKind) {
        self.end_multiline_construct_impl(kind, true);
    }

    fn end_multiline_construct_impl(&mut self, kind: ConstructKind, must_finish_with_dedent: bool) {
        debug_assert!(self.indentation_stack.top_kind() == kind);
        if must_finish_with_dedent
            && self.current_token() != Token::Dedent
            && self.current_token() != Token::Eos
        {
            self.report_error_here("Not at dedent");
            self.skip_to_dedent();
        }
        let construct_indentation = self.indentation_stack.pop();
        if self.current_token() == Token::Dedent {
            let next_indentation = self.peek_state(1).scanner_state.indentation as i32;
            if self.indentation_stack.is_empty()
                || self.indentation_stack.top_indentation() < next_indentation
            {
                self.consume();
                debug_assert!(next_indentation <= construct_indentation);
            }
        }
        let _ = construct_indentation;
    }

    /// Replaces the top frame's kind, preserving its indentation.
    ///
    /// Multiline constructs move through explicit phases this way, e.g.
    /// `DeclarationSignature -> Declaration` and the ternary's
    /// `Conditional -> ConditionalThen -> ConditionalElse -> Conditional`.
    pub(crate) fn switch_multiline_construct(&mut self, from: ConstructKind, to: ConstructKind) {
        debug_assert!(self.indentation_stack.top_kind() == from);
        let indentation = self.indentation_stack.pop();
        let range = self.current_range_safe();
        self.indentation_stack.push(indentation, to, range);
    }

    /// Opens a bracketed construct and consumes its start token.
    pub(crate) fn start_delimited(
        &mut self,
        kind: ConstructKind,
        start_token: Token,
        end_token: Token,
    ) {
        let indentation = self.current_state().scanner_state.indentation as i32;
        let range = self.current_range();
        self.indentation_stack.push_delimited(indentation, kind, end_token, range);
        debug_assert!(self.current_token() == start_token);
        self.consume();
    }

    /// Closes a bracketed construct. Returns whether an error was found
    /// (missing end token).
    ///
    /// On a missing end token, recovery first looks for the token later on
    /// the same line, then skips to the dedent.
    pub(crate) fn end_delimited(&mut self, kind: ConstructKind, end_token: Token) -> bool {
        self.end_delimited_impl(kind, end_token, true, true)
    }

    pub(crate) fn end_delimited_impl(
        &mut self,
        kind: ConstructKind,
        end_token: Token,
        try_to_recover: bool,
        report_error_on_missing_delimiter: bool,
    ) -> bool {
        debug_assert!(self.indentation_stack.top_end_token() == end_token);
        if self.current_token() == Token::Dedent
            && self.current_token_if_delimiter() == end_token
        {
            // Allow delimited sections to end at the level they started:
            //
            // foo := [
            //   1,
            //   2,
            // ]
            self.consume();
        }

        let mut encountered_error = false;

        if self.current_token() != end_token {
            let start_range = self.indentation_stack.top_start_range();
            encountered_error = true;
            if report_error_on_missing_delimiter && !self.encountered_stack_overflow {
                let range = start_range.extend_to(self.current_range().from());
                self.report_error(range, format!("Missing closing '{}'", end_token.syntax()));
            }
            // Try to find the token on the same line.
            if try_to_recover {
                loop {
                    let token = self.current_token();
                    if token == end_token || is_eol(token) {
                        break;
                    }
                    self.consume();
                }
            }
        }

        if self.current_token() == end_token {
            self.end_multiline_construct(kind);
            self.consume();
        } else {
            // The error was reported above.
            if try_to_recover {
                self.skip_to_dedent();
            }
            self.end_multiline_construct(kind);
        }
        encountered_error
    }

    // ========================================================================
    // COLON CONSUMPTION
    // ========================================================================

    /// Whether the current call is allowed to consume a `:` or `::`.
    ///
    /// Called when a call encounters a colon followed by a sufficiently
    /// indented newline, so the colon could open a block argument:
    ///
    /// ```text
    /// foo bar:
    ///   block_body
    /// ```
    ///
    /// There may be multiple candidates (`x := true ? foo:` ...); the
    /// *first* colon-consuming construct on the call's line wins, unless a
    /// separating construct (block, delimited, literal, try) sits in
    /// between. The difference between `:` and `::` is that constructs like
    /// `if`/`while` don't consume double-colons, so a call on the same line
    /// wins those.
    pub(crate) fn allowed_to_consume(&mut self, token: Token) -> bool {
        let stack = &self.indentation_stack;

        debug_assert!(token == Token::Colon || token == Token::DoubleColon);
        debug_assert!(!stack.is_empty());
        debug_assert!(stack.top_kind() == ConstructKind::Call);

        let top_indentation = stack.top_indentation();

        // Skip the call entry itself.
        for i in (1..stack.len().saturating_sub(1)).rev() {
            // Only look at constructs on the same line.
            if stack.indentation_at(i) != top_indentation {
                break;
            }

            match stack.kind_at(i) {
                ConstructKind::Import
                | ConstructKind::Export
                | ConstructKind::Class
                | ConstructKind::Primitive
                | ConstructKind::DeclarationSignature => unreachable!("not expression contexts"),

                ConstructKind::IfBody
                | ConstructKind::WhileBody
                | ConstructKind::ForInit
                | ConstructKind::ForCondition
                | ConstructKind::ForBody
                | ConstructKind::ConditionalElse
                | ConstructKind::Declaration
                | ConstructKind::Assignment
                | ConstructKind::Logical
                | ConstructKind::Sequence
                | ConstructKind::Conditional => continue,

                ConstructKind::IfCondition
                | ConstructKind::WhileCondition
                | ConstructKind::ForUpdate
                | ConstructKind::ConditionalThen => {
                    if token == Token::DoubleColon {
                        continue;
                    }
                    return false;
                }

                ConstructKind::Call => return false,

                ConstructKind::Block
                | ConstructKind::Delimited
                | ConstructKind::Literal
                | ConstructKind::Try => return true,
            }
        }
        true
    }

    /// Whether some enclosing construct consumes the given delimiter.
    ///
    /// `next_line_indentation` is required for `:` (pass `-1` when there is
    /// no next line). Used for better error messages; may be conservative.
    pub(crate) fn consumer_exists(&mut self, token: Token, next_line_indentation: i32) -> bool {
        debug_assert!(is_delimiter(token, false, false) || token == Token::DoubleColon);
        debug_assert!(next_line_indentation >= -1);
        debug_assert!(token != Token::Colon || next_line_indentation >= 0);

        if token == Token::Dedent {
            return true;
        }
        if token == Token::Semicolon {
            return true;
        }

        let stack = &self.indentation_stack;
        for i in (1..stack.len()).rev() {
            match stack.kind_at(i) {
                ConstructKind::Import | ConstructKind::Export | ConstructKind::Primitive => {
                    unreachable!("not expression contexts")
                }

                ConstructKind::IfBody => {
                    if token == Token::Else {
                        return true;
                    }
                    continue;
                }

                ConstructKind::WhileBody
                | ConstructKind::ForBody
                | ConstructKind::ConditionalElse
                | ConstructKind::Declaration
                | ConstructKind::Assignment
                | ConstructKind::Logical
                | ConstructKind::Block
                | ConstructKind::Sequence
                | ConstructKind::Conditional => continue,

                ConstructKind::DeclarationSignature
                | ConstructKind::ConditionalThen
                | ConstructKind::WhileCondition
                | ConstructKind::ForUpdate
                | ConstructKind::IfCondition => {
                    if token == Token::Colon {
                        return true;
                    }
                    // A missing `:` will be an error, but don't consume a
                    // token while there might still be a consumer.
                    continue;
                }

                ConstructKind::Class => return false,

                ConstructKind::Call => {
                    if token == Token::Colon || token == Token::DoubleColon {
                        if next_line_indentation == -1 {
                            continue;
                        }
                        if stack.indentation_at(i) >= next_line_indentation {
                            continue;
                        }
                        return true;
                    }
                    continue;
                }

                ConstructKind::ForInit | ConstructKind::ForCondition => {
                    if token == Token::Semicolon {
                        return true;
                    }
                    if token == Token::Colon {
                        return false;
                    }
                    continue;
                }

                ConstructKind::Try => {
                    if token == Token::Finally {
                        return true;
                    }
                    if token == Token::Colon {
                        return false;
                    }
                    continue;
                }

                ConstructKind::Literal => {
                    if token == Token::Comma {
                        return true;
                    }
                    // Conservative: colons are allowed inside sets/maps so a
                    // map key can end with a colon.
                    if token == Token::Colon && stack.end_token_at(i) == Token::Rbrace {
                        return true;
                    }
                    if token == Token::Colon {
                        return false;
                    }
                    if stack.end_token_at(i) == token {
                        return true;
                    }
                    continue;
                }

                ConstructKind::Delimited => {
                    if token == Token::Colon {
                        return false;
                    }
                    if stack.end_token_at(i) == token {
                        return true;
                    }
                    continue;
                }
            }
        }
        false
    }

    // ========================================================================
    // RESOURCE GUARDS
    // ========================================================================

    /// Checks the tree height of a parsed unit; reports a single fatal
    /// error when the bound is exceeded. Returns false in that case.
    pub(crate) fn check_tree_height(&mut self, unit: &ast::Unit) -> bool {
        struct TreeHeightChecker<'d> {
            max_height: usize,
            diagnostics: &'d dyn Diagnostics,
            current_height: usize,
            reported_error: bool,
        }

        impl<'d> TreeHeightChecker<'d> {
            fn check_height(&mut self, range: Range) -> bool {
                if self.reported_error {
                    return false;
                }
                if self.current_height >= self.max_height {
                    self.diagnostics.report_error(
                        range,
                        format!("Maximal recursion depth exceeded {}", self.max_height),
                    );
                    self.reported_error = true;
                    return false;
                }
                true
            }
        }

        impl<'d> ast::Visitor for TreeHeightChecker<'d> {
            fn visit_declaration(&mut self, node: &ast::Declaration) {
                if self.check_height(node.range()) {
                    self.current_height += 1;
                    ast::walk_declaration(self, node);
                    self.current_height -= 1;
                }
            }

            fn visit_expression(&mut self, node: &ast::Expression) {
                if self.check_height(node.range()) {
                    self.current_height += 1;
                    ast::walk_expression(self, node);
                    self.current_height -= 1;
                }
            }

            fn visit_sequence(&mut self, node: &ast::Sequence) {
                if self.check_height(node.range) {
                    self.current_height += 1;
                    ast::walk_sequence(self, node);
                    self.current_height -= 1;
                }
            }
        }

        let mut checker = TreeHeightChecker {
            max_height: self.max_recursion_depth,
            diagnostics: self.diagnostics,
            current_height: 0,
            reported_error: false,
        };
        use ast::Visitor as _;
        checker.visit_unit(unit);
        !checker.reported_error
    }

    /// Bounds the indentation-stack depth. On overflow, reports once and
    /// advances the scanner to EOF so parsing winds down.
    pub(crate) fn check_indentation_stack_depth(&mut self) {
        if !self.encountered_stack_overflow
            && self.indentation_stack.len() > self.max_recursion_depth
        {
            let range = self.current_range_safe();
            self.report_error(
                range,
                format!("Maximal recursion depth exceeded {}", self.max_recursion_depth),
            );
            self.encountered_stack_overflow = true;
            // Move to the end of the file to stop scanning it.
            let size = self.source.size();
            self.queue.scanner_mut().advance_to(size);
        }
    }
}

/// A lookahead cursor over parser states that skips newlines.
///
/// Used where the grammar needs unbounded peeking (types, block
/// parameters, block-vs-construct colon decisions) without consuming.
pub(crate) struct ParserPeeker<'p, 'a> {
    parser: &'p mut Parser<'a>,
    n: isize,
}

impl<'p, 'a> ParserPeeker<'p, 'a> {
    pub(crate) fn new(parser: &'p mut Parser<'a>) -> Self {
        Self { parser, n: 0 }
    }

    pub(crate) fn current_state(&mut self) -> State {
        while self.parser.peek_state(self.n).token == Token::Newline {
            self.n += 1;
        }
        self.parser.peek_state(self.n)
    }

    pub(crate) fn current_token(&mut self) -> Token {
        self.current_state().token
    }

    pub(crate) fn consume(&mut self) {
        self.n += 1;
    }
}
