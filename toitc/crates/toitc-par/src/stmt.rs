//! Statement-position parsing: sequences, control flow, blocks and lambdas.

use toitc_lex::Token;
use toitc_util::span::Range;

use crate::ast::*;
use crate::indent::ConstructKind;
use crate::{is_delimiter, is_eol, Parser, ParserPeeker};

impl<'a> Parser<'a> {
    /// Parses a `:` block or `::` lambda, including optional `|params|`.
    ///
    /// The construct is opened at `indentation` (the enclosing call's
    /// column), not at the colon's own column.
    pub(crate) fn parse_block_or_lambda(&mut self, indentation: i32) -> Expression {
        debug_assert!(
            self.current_token() == Token::Colon || self.current_token() == Token::DoubleColon
        );
        let mut range = self.current_range();

        self.start_multiline_construct_at(ConstructKind::Block, indentation);
        let is_block = self.current_token() == Token::Colon;
        self.consume();

        let parameters = self.parse_block_parameters();
        let body = self.parse_sequence();

        range = range.extend_to(self.current_range().from());
        self.end_multiline_construct(ConstructKind::Block);
        if is_block {
            Expression::Block(Box::new(Block { body, parameters, range }))
        } else {
            Expression::Lambda(Box::new(Lambda { body, parameters, range }))
        }
    }

    /// Parses a run of expressions at uniform indentation.
    pub(crate) fn parse_sequence(&mut self) -> Sequence {
        let range = self.current_range();

        // The multiline construct isn't strictly needed, but it improves
        // error recovery.
        let outer_indentation = self.indentation_stack.top_indentation();
        self.start_multiline_construct(ConstructKind::Sequence);
        let mut expressions = Vec::new();
        let mut expression_indent: i32 = -1;
        let can_be_at_newline = self.at_newline();
        let mut needs_to_be_at_newline = false;
        loop {
            // A sequence continues as long as the indentation is "correct".
            if self.current_token() == Token::Dedent
                && expression_indent >= 0
                && self.current_indentation() > outer_indentation
            {
                self.consume();
            }

            if self.current_token() == Token::Dedent {
                break;
            }

            if is_delimiter(self.current_token(), true, true) {
                let token = self.current_token();
                if !self.consumer_exists(token, -1) {
                    self.report_error_here("Unexpected delimiter");
                    self.skip_to_dedent();
                    continue;
                }
                break;
            }

            if self.current_token() == Token::Semicolon {
                self.consume();
                needs_to_be_at_newline = false;
                continue;
            }

            if self.at_newline() && !can_be_at_newline {
                break;
            }

            if self.at_newline() {
                if expression_indent == -1 {
                    expression_indent = self.current_indentation();
                } else if expression_indent != self.current_indentation() {
                    self.report_error_here(
                        "All expressions in a sequence must be indented the same way",
                    );
                }
            } else if needs_to_be_at_newline {
                if self.current_token() == Token::Colon {
                    // A colon followed by a newline is as if the colon was
                    // on the next line.
                    let next_token = self.peek_token();
                    if is_eol(next_token) {
                        break;
                    }
                }
                // For example, after a `break`:
                //
                //   while true:
                //     break 499
                //
                // Accepting `499` as a new expression would suggest it was
                // an argument to `break`; report instead.
                self.report_error_here("Missing semicolon or missing newline");
            }

            expressions.push(self.parse_expression_or_definition(true));
            needs_to_be_at_newline = true;
        }
        self.end_multiline_construct(ConstructKind::Sequence);
        Sequence { expressions, range }
    }

    /// Parses either a local definition (`name := ...`) or an expression.
    pub(crate) fn parse_expression_or_definition(&mut self, allow_colon: bool) -> Expression {
        if self.current_token() == Token::Identifier {
            let mut peeker = ParserPeeker::new(self);
            peeker.consume(); // The identifier.
            if peeker.current_token() == Token::Div {
                peeker.consume();
                let at_type = Self::peek_type(&mut peeker);
                if !at_type {
                    return self.parse_expression(allow_colon);
                }
            }
            let token = peeker.current_token();
            if token == Token::Define || token == Token::DefineFinal {
                return self.parse_definition(allow_colon);
            }
        }
        self.parse_expression(allow_colon)
    }

    /// Parses one expression (statement position).
    pub(crate) fn parse_expression(&mut self, allow_colon: bool) -> Expression {
        let range = self.current_range();
        match self.current_token() {
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            Token::Try => self.parse_try_finally(),
            Token::Return => {
                self.consume();
                if self.is_current_token_attached()
                    && self.current_token() == Token::Period
                    && self.is_next_token_attached()
                    && self.peek_token() == Token::Identifier
                {
                    self.consume(); // The '.'.
                    let label = Some(self.parse_identifier());
                    self.diagnostics.report_warning(
                        range,
                        "'return.label' is deprecated. Use 'continue.label' instead".to_string(),
                    );
                    let value = if !is_delimiter(self.current_token(), allow_colon, false) {
                        Some(self.parse_expression(allow_colon))
                    } else {
                        None
                    };
                    Expression::BreakContinue(Box::new(BreakContinue {
                        is_break: false,
                        value,
                        label,
                        range,
                    }))
                } else {
                    let value = if !is_delimiter(self.current_token(), allow_colon, false) {
                        Some(self.parse_expression(allow_colon))
                    } else {
                        None
                    };
                    Expression::Return(Box::new(Return { value, range }))
                }
            }
            Token::Break | Token::Continue => self.parse_break_continue(allow_colon),
            Token::Primitive => self.parse_call(allow_colon),
            _ => self.parse_conditional(allow_colon),
        }
    }

    /// Parses `name [/type] (:= | ::=) value`.
    pub(crate) fn parse_definition(&mut self, allow_colon: bool) -> Expression {
        debug_assert!(self.current_token() == Token::Identifier);
        let name = self.parse_identifier();
        let mut token = self.current_token();
        let mut type_annotation = None;
        if token == Token::Div {
            type_annotation = Some(self.parse_type(true));
            token = self.current_token();
        }
        // There must be a `:=` or `::=` soon, or we wouldn't have been
        // called.
        let mut reported_error =
            type_annotation.as_ref().map(|t| t.is_error()).unwrap_or(false);
        while token != Token::Define && token != Token::DefineFinal {
            // Ignore the rest of the presumed type and skip forward to the
            // define token.
            if !reported_error {
                self.report_error_here("Unexpected token while parsing definition");
                reported_error = true;
            }
            if token == Token::Eos || token == Token::Dedent {
                break;
            }
            self.consume();
            token = self.current_token();
        }
        let range = self.current_range();
        if token == Token::Define || token == Token::DefineFinal {
            self.consume();
        }
        let value = if self.current_token() == Token::Conditional {
            let undefined_range = self.current_range();
            self.consume();
            Expression::LiteralUndefined(LiteralUndefined { range: undefined_range })
        } else {
            self.parse_expression(allow_colon)
        };
        Expression::DeclarationLocal(Box::new(DeclarationLocal {
            kind: token,
            name,
            type_annotation,
            value,
            range,
        }))
    }

    /// Parses `if cond: yes [else: no]` (with else-if chains).
    pub(crate) fn parse_if(&mut self) -> Expression {
        debug_assert!(self.current_token() == Token::If);
        let range = self.current_range();
        self.start_multiline_construct(ConstructKind::IfCondition);
        self.consume();
        let condition = if self.current_token_if_delimiter() == Token::Colon {
            // Could be a block in condition position, but that's unlikely;
            // prefer assuming the condition is missing.
            self.report_error_here("Missing condition");
            Expression::Error(Error { range: self.current_range() })
        } else {
            self.parse_expression_or_definition(true)
        };
        if !self.optional_delimiter(Token::Colon) {
            self.report_error(range, "Missing colon for 'if' condition");
            // At a newline, indentation decides whether the following lines
            // are part of the `if`; otherwise skip to the construct's end so
            // the sequence reads an immediate dedent.
            if !self.at_newline() {
                self.skip_to_end_of_multiline_construct();
            }
        }
        self.switch_multiline_construct(ConstructKind::IfCondition, ConstructKind::IfBody);
        let yes = Expression::Sequence(Box::new(self.parse_sequence()));
        let mut no = None;
        if self.current_token() == Token::Dedent
            && self.peek_token() == Token::Else
            && self.indentation_stack.top_indentation() == self.current_indentation()
            && self.indentation_stack.is_outmost(ConstructKind::IfBody)
        {
            self.consume();
        }
        if self.current_token() == Token::Else {
            let current = self.current_range();
            let else_range = Range::new(current.to(), current.to());
            self.consume();
            if self.current_token() == Token::If {
                self.end_multiline_construct(ConstructKind::IfBody);
                no = Some(self.parse_if());
            } else {
                if !self.optional_delimiter(Token::Colon) {
                    // Just try to read the else block; correctly indented it
                    // will work.
                    self.report_error(else_range, "Missing colon for 'else'");
                }
                no = Some(Expression::Sequence(Box::new(self.parse_sequence())));
                self.end_multiline_construct(ConstructKind::IfBody);
            }
        } else {
            self.end_multiline_construct(ConstructKind::IfBody);
        }
        Expression::If(Box::new(If { expression: condition, yes, no, range }))
    }

    /// Parses `while cond: body`.
    pub(crate) fn parse_while(&mut self) -> Expression {
        debug_assert!(self.current_token() == Token::While);
        let range = self.current_range();
        self.start_multiline_construct(ConstructKind::WhileCondition);
        self.consume();
        let condition = if self.current_token_if_delimiter() == Token::Colon {
            self.report_error_here("Missing condition");
            Expression::Error(Error { range: self.current_range() })
        } else {
            self.parse_expression_or_definition(true)
        };
        if !self.optional_delimiter(Token::Colon) {
            self.report_error(range, "Missing colon for loop condition");
            // Just try to read the body.
        }
        self.switch_multiline_construct(ConstructKind::WhileCondition, ConstructKind::WhileBody);
        let body = Expression::Sequence(Box::new(self.parse_sequence()));
        self.end_multiline_construct(ConstructKind::WhileBody);
        Expression::While(Box::new(While { condition, body, range }))
    }

    /// Parses `for init; cond; update: body`.
    pub(crate) fn parse_for(&mut self) -> Expression {
        debug_assert!(self.current_token() == Token::For);
        let range = self.current_range();
        let mut error_range = range;
        self.start_multiline_construct(ConstructKind::ForInit);
        self.consume();
        let mut initializer = None;
        let mut condition = None;
        let mut update = None;

        let mut skip_to_body = false;

        if self.current_token_if_delimiter() != Token::Semicolon {
            error_range = self.current_range();
            initializer = Some(self.parse_expression_or_definition(true));
        }

        if !self.optional_delimiter(Token::Semicolon) {
            self.report_error(error_range, "Missing semicolon");
            condition = Some(Expression::Error(Error { range: self.current_range() }));
            update = Some(Expression::Error(Error { range: self.current_range() }));
            self.skip_to_body(Token::Colon);
            skip_to_body = true;
        }

        if !skip_to_body {
            self.switch_multiline_construct(ConstructKind::ForInit, ConstructKind::ForCondition);

            if self.current_token_if_delimiter() != Token::Semicolon {
                error_range = self.current_range();
                condition = Some(self.parse_expression(true));
            }

            if !self.optional_delimiter(Token::Semicolon) {
                self.report_error(error_range, "Missing semicolon");
                update = Some(Expression::Error(Error { range: self.current_range() }));
                self.skip_to_body(Token::Colon);
                skip_to_body = true;
            }
        }

        if !skip_to_body {
            self.switch_multiline_construct(ConstructKind::ForCondition, ConstructKind::ForUpdate);
            // Could be a block in update position; prefer assuming the
            // update is absent.
            if self.current_token_if_delimiter() != Token::Colon {
                error_range = self.current_range();
                update = Some(self.parse_expression(true));
            }
            if !self.optional_delimiter(Token::Colon) {
                self.report_error(error_range, "Missing colon");
                self.skip_to_body(Token::Colon);
            }
        }

        let top_kind = self.indentation_stack.top_kind();
        self.switch_multiline_construct(top_kind, ConstructKind::ForBody);
        let body = Expression::Sequence(Box::new(self.parse_sequence()));
        self.end_multiline_construct(ConstructKind::ForBody);
        Expression::For(Box::new(For { initializer, condition, update, body, range }))
    }

    /// Parses `try: body finally [|params|]: handler`.
    pub(crate) fn parse_try_finally(&mut self) -> Expression {
        debug_assert!(self.current_token() == Token::Try);
        let range = self.current_range();
        let mut error_range = range;
        self.start_multiline_construct(ConstructKind::Try);
        self.consume();
        let mut encountered_error = false;
        if self.current_token() == Token::Colon {
            self.consume();
        } else {
            self.report_error(
                Range::new(error_range.to(), error_range.to()),
                "Missing colon after 'try'",
            );
            encountered_error = true;
        }
        let body = self.parse_sequence();
        if self.current_token() == Token::Dedent
            && self.peek_token() == Token::Finally
            && self.indentation_stack.top_indentation() == self.current_indentation()
            && self.indentation_stack.is_outmost(ConstructKind::Try)
        {
            self.consume();
        }
        let mut handler_parameters = Vec::new();
        if self.current_token() == Token::Finally {
            error_range = self.current_range();
            self.consume();
            if self.current_token() == Token::Colon {
                self.delimit_with(Token::Colon);
            } else {
                self.report_error(
                    Range::new(error_range.to(), error_range.to()),
                    "Missing colon after finally",
                );
            }
            handler_parameters = self.parse_block_parameters();
        } else if !encountered_error {
            self.report_error_here("Missing 'finally' block");
        }
        let handler = self.parse_sequence();
        self.end_multiline_construct(ConstructKind::Try);
        Expression::TryFinally(Box::new(TryFinally { body, handler_parameters, handler, range }))
    }

    /// Parses `break`/`continue`, with optional `.label` and value.
    pub(crate) fn parse_break_continue(&mut self, allow_colon: bool) -> Expression {
        let range = self.current_range();
        let is_break = self.current_token() == Token::Break;
        self.consume();
        let mut label = None;
        if self.is_current_token_attached()
            && self.current_token() == Token::Period
            && self.is_next_token_attached()
            && self.peek_token() == Token::Identifier
        {
            self.consume(); // The '.'.
            label = Some(self.parse_identifier());
        }
        let value = if label.is_none() || is_delimiter(self.current_token(), allow_colon, false) {
            None
        } else {
            Some(self.parse_expression(allow_colon))
        };
        Expression::BreakContinue(Box::new(BreakContinue { is_break, value, label, range }))
    }
}
