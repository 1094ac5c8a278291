//! Expression parsing: conditionals, logical operators, calls, precedence
//! climbing, postfix operators, primaries, literals, and string
//! interpolation.

use toitc_lex::{is_identifier_part, Precedence, Token};
use toitc_util::span::Range;
use toitc_util::symbol::Symbol;

use crate::ast::*;
use crate::indent::ConstructKind;
use crate::{is_call_delimiter, is_eol, Parser, ParserPeeker};

impl<'a> Parser<'a> {
    /// Parses an identifier token into an identifier node.
    pub(crate) fn parse_identifier(&mut self) -> Identifier {
        debug_assert!(self.current_token() == Token::Identifier);
        let range = self.current_range();
        let data = self.current_token_data();
        let is_lsp_selection = self.current_state().scanner_state.is_lsp_selection();
        self.consume();
        Identifier { data, is_lsp_selection, range }
    }

    /// Parses a ternary chain: `cond ? yes : no`, right-associative.
    pub(crate) fn parse_conditional(&mut self, allow_colon: bool) -> Expression {
        self.start_multiline_construct(ConstructKind::Conditional);
        let mut result = self.parse_logical_spelled(allow_colon);
        while self.current_token() == Token::Conditional {
            result = self.parse_conditional_rest(result, allow_colon);
        }
        self.end_multiline_construct(ConstructKind::Conditional);
        result
    }

    /// Parses the `? yes : no` tail of a ternary.
    ///
    /// The colon is consumed via the `ConditionalThen -> ConditionalElse`
    /// construct switch, which defers block/lambda disambiguation to the
    /// else branch.
    fn parse_conditional_rest(&mut self, head: Expression, allow_colon: bool) -> Expression {
        debug_assert!(self.current_token() == Token::Conditional);
        debug_assert!(self.indentation_stack.top_kind() == ConstructKind::Conditional);
        let range = self.current_range();
        self.delimit_with(Token::Conditional);
        self.switch_multiline_construct(
            ConstructKind::Conditional,
            ConstructKind::ConditionalThen,
        );
        let yes = self.parse_expression(allow_colon);
        let mut no = None;
        if !self.optional_delimiter(Token::Colon) {
            self.report_error_here("Missing ':' in conditional expression");
            if self.current_token() == Token::Dedent {
                // Don't even try to read the 'no' part.
                no = Some(Expression::Error(Error { range }));
            }
        }
        self.switch_multiline_construct(
            ConstructKind::ConditionalThen,
            ConstructKind::ConditionalElse,
        );
        let no = no.unwrap_or_else(|| self.parse_expression(allow_colon));
        self.switch_multiline_construct(
            ConstructKind::ConditionalElse,
            ConstructKind::Conditional,
        );
        Expression::If(Box::new(If { expression: head, yes, no: Some(no), range }))
    }

    /// Parses spelled-out logical operators (`and`/`or`).
    ///
    /// Operands are collected first and joined afterwards: `and` binds
    /// tighter than `or`, and both are right-associative.
    pub(crate) fn parse_logical_spelled(&mut self, allow_colon: bool) -> Expression {
        self.start_multiline_construct(ConstructKind::Logical);

        let first = self.parse_not_spelled(allow_colon);
        if self.current_token() != Token::LogicalOr && self.current_token() != Token::LogicalAnd {
            self.end_multiline_construct(ConstructKind::Logical);
            return first;
        }

        struct LogicalEntry {
            node: Option<Expression>,
            kind: Token,
            range: Range,
        }

        let mut operands = vec![LogicalEntry {
            node: Some(first),
            kind: Token::Invalid,
            range: Range::invalid(),
        }];
        while self.current_token() == Token::LogicalOr
            || self.current_token() == Token::LogicalAnd
        {
            let token = self.current_token();
            let range = self.current_range();
            self.consume();
            operands.push(LogicalEntry {
                node: Some(self.parse_not_spelled(allow_colon)),
                kind: token,
                range,
            });
        }
        for j in 0..2 {
            // Join the 'and's first.
            let token = if j == 0 { Token::LogicalAnd } else { Token::LogicalOr };
            // Logical operations are right-associative.
            for i in (1..operands.len()).rev() {
                if operands[i].kind != token {
                    continue;
                }
                // There is always a left node: entry 0 remains.
                let mut left_index = i - 1;
                // Skip over already-merged entries (but not the first node).
                while left_index > 0 && operands[left_index].kind == Token::Invalid {
                    left_index -= 1;
                }
                let current = operands[i].node.take().expect("unmerged entry");
                let current_range = operands[i].range;
                let left = operands[left_index].node.take().expect("unmerged entry");
                operands[left_index].node = Some(Expression::Binary(Box::new(Binary {
                    kind: token,
                    left,
                    right: current,
                    range: current_range,
                })));
                operands[i].kind = Token::Invalid;
                operands[i].range = Range::invalid();
            }
        }
        self.end_multiline_construct(ConstructKind::Logical);
        operands[0].node.take().expect("joined result")
    }

    /// Parses a (possibly repeated) spelled-out `not`.
    fn parse_not_spelled(&mut self, allow_colon: bool) -> Expression {
        debug_assert!(self.indentation_stack.top_kind() == ConstructKind::Logical);
        if self.current_token() == Token::Not {
            let mut not_ranges = Vec::new();
            while self.current_token() == Token::Not {
                not_ranges.push(self.current_range());
                self.consume();
            }
            let mut left = self.parse_call(allow_colon);
            for range in not_ranges.into_iter().rev() {
                left = Expression::Unary(Box::new(Unary {
                    kind: Token::Not,
                    prefix: true,
                    expression: left,
                    range,
                }));
            }
            left
        } else {
            self.parse_call(allow_colon)
        }
    }

    /// Parses one call argument.
    ///
    /// `--name expr` and `--name` (boolean flag, `--no-name` inverted) are
    /// named arguments; the `--` must be attached to the identifier.
    fn parse_argument(&mut self, allow_colon: bool, full_expression: bool) -> Expression {
        let range = self.current_range();
        let mut name: Option<Identifier> = None;
        let mut is_boolean = false;
        let mut inverted = false;
        if self.current_token() == Token::Decrement
            && self.is_next_token_attached()
            && self.peek_token() == Token::Identifier
        {
            self.consume();
            let mut parsed = self.parse_identifier();
            if parsed.data == toitc_util::symbols::NO
                && self.is_current_token_attached()
                && self.current_token() == Token::Sub
                && self.is_next_token_attached()
                && self.peek_token() == Token::Identifier
            {
                // --no-foo
                inverted = true;
                self.consume(); // The '-'.
                parsed = self.parse_identifier();
            }
            name = Some(parsed);
            if self.current_token() != Token::Assign {
                is_boolean = true;
            } else {
                if inverted {
                    self.report_error_here("Can't have boolean flag with '='");
                }
                self.consume();
            }
        }
        let expression = if is_boolean {
            None
        } else if full_expression {
            Some(self.parse_expression(allow_colon))
        } else {
            Some(self.parse_precedence(Precedence::Assignment, allow_colon, false))
        };
        match name {
            None => expression.expect("non-named arguments always carry an expression"),
            Some(name) => Expression::NamedArgument(Box::new(NamedArgument {
                name,
                inverted,
                expression,
                range,
            })),
        }
    }

    /// Parses a call: `target arg*`.
    ///
    /// Arguments are consumed until a delimiter, a newline at the wrong
    /// indentation, or a colon this call isn't allowed to consume. Once an
    /// argument started on a newline, all further arguments must start on
    /// newlines with the same indentation.
    pub(crate) fn parse_call(&mut self, allow_colon: bool) -> Expression {
        self.start_multiline_construct(ConstructKind::Call);
        let range = self.current_range();
        let target;
        let mut is_call_primitive = false;
        if self.current_token() == Token::Assert {
            self.consume();
            target = Expression::identifier(Identifier::new(Token::Assert.symbol(), range));
        } else {
            is_call_primitive = self.current_token() == Token::Primitive;
            target = self.parse_precedence(Precedence::Assignment, allow_colon, is_call_primitive);
        }

        let mut arguments: Vec<Expression> = Vec::new();

        let mut must_be_at_newline = false;
        let mut arguments_indentation = -1;
        loop {
            let current = self.current_token();
            if is_call_delimiter(current, allow_colon) {
                break;
            } else if self.at_newline() {
                if arguments_indentation == -1 {
                    arguments_indentation = self.current_indentation();
                }
                if arguments_indentation != self.current_indentation() {
                    self.report_error_here("All arguments must have the same indentation.");
                }
                // No dedent was seen, so this expression is still at the
                // same level and is an argument to the call.
                arguments.push(self.parse_argument(allow_colon, true));
                // From now on, all arguments must be on new lines.
                must_be_at_newline = true;
            } else if (current == Token::Colon && allow_colon) || current == Token::DoubleColon {
                let token = current;
                if !self.allowed_to_consume(token) {
                    break;
                }
                let call_indentation = self.indentation_stack.top_indentation();
                // Check whether there is a dedent after the ':' (or after
                // its parameters); its depth decides whether the block
                // belongs to this call.
                let mut at_dedent = false;
                let mut next_indentation = -1;
                'peeking: {
                    let mut peeker = ParserPeeker::new(self);
                    peeker.consume(); // The ':'.
                    if peeker.current_token() == Token::BitOr {
                        peeker.consume();
                        // Skip the parameters; they don't count for
                        // indentation purposes.
                        while peeker.current_token() == Token::Identifier {
                            if !Self::peek_block_parameter(&mut peeker) {
                                break 'peeking;
                            }
                        }
                        if peeker.current_token() != Token::BitOr {
                            break 'peeking;
                        }
                        peeker.consume();
                    }
                    if peeker.current_token() == Token::Dedent {
                        at_dedent = true;
                        peeker.consume();
                        next_indentation = peeker.current_state().scanner_state.indentation as i32;
                    }
                }
                if !at_dedent {
                    arguments.push(self.parse_block_or_lambda(call_indentation));
                } else {
                    if !self.consumer_exists(token, next_indentation) {
                        let what = if token == Token::Colon { "blocks" } else { "lambdas" };
                        self.report_error_here(format!("Empty {} are not allowed", what));
                        arguments.push(self.parse_block_or_lambda(call_indentation));
                        continue;
                    }
                    break;
                }
            } else if !must_be_at_newline {
                arguments.push(self.parse_argument(allow_colon, false));
            } else {
                // For example:
                //
                //   while true:
                //     foo
                //       break 499
                self.report_error_here("Arguments must be separated by newlines");
                arguments.push(self.parse_argument(allow_colon, false));
            }
        }

        self.end_multiline_construct(ConstructKind::Call);
        if arguments.is_empty() && !is_call_primitive {
            return target;
        }
        Expression::Call(Box::new(Call { target, arguments, is_call_primitive, range }))
    }

    /// Precedence climbing over the binary/postfix operator table.
    pub(crate) fn parse_precedence(
        &mut self,
        precedence: Precedence,
        allow_colon: bool,
        is_call_primitive: bool,
    ) -> Expression {
        let mut expression;
        if is_call_primitive {
            debug_assert!(self.current_token() == Token::Primitive);
            let range = self.current_range();
            expression =
                Expression::identifier(Identifier::new(Token::Primitive.symbol(), range));
            self.consume();
        } else {
            expression = self.parse_unary(allow_colon);
        }

        let mut kind = self.current_token();
        let mut next = kind.precedence();
        let mut range = self.current_range();
        let mut level = next.level() as i32;
        'done: while level >= precedence.level() as i32 {
            while next.level() as i32 == level {
                if level == Precedence::Postfix.level() as i32 {
                    if !self.is_current_token_attached() {
                        // Postfix operands must be attached: an attached `[`
                        // is the index operator but a detached one starts a
                        // list literal, and an attached `.` is a dot access
                        // but a detached one may start a field-storing
                        // parameter.
                        break 'done;
                    }
                    expression = self.parse_postfix_rest(expression);
                } else if kind == Token::Sub {
                    let is_attached_to_previous = self.is_current_token_attached();
                    let is_attached_to_next = self.is_next_token_attached();
                    if !is_attached_to_previous && is_attached_to_next {
                        // A prefix minus.
                        break 'done;
                    }
                    if is_attached_to_previous || is_attached_to_next {
                        let warn_range = range.extend(self.current_range());
                        self.diagnostics.report_warning(
                            warn_range,
                            "Minus operator must be surrounded by spaces".to_string(),
                        );
                    }
                    self.consume();
                    let right = if self.at_newline() {
                        self.parse_expression(allow_colon)
                    } else {
                        self.parse_precedence(
                            Precedence::from_level((level + 1) as u8),
                            allow_colon,
                            false,
                        )
                    };
                    expression = Expression::Binary(Box::new(Binary {
                        kind,
                        left: expression,
                        right,
                        range,
                    }));
                } else {
                    self.consume();
                    // A definition allows the `?` undefined literal on the
                    // right-hand side; an assignment parses a complete
                    // expression; everything else climbs to the next level.
                    let right;
                    if (kind == Token::Define || kind == Token::DefineFinal)
                        && self.current_token() == Token::Conditional
                    {
                        let undefined_range = self.current_range();
                        right = Expression::LiteralUndefined(LiteralUndefined {
                            range: undefined_range,
                        });
                        self.consume();
                    } else if self.at_newline() {
                        right = self.parse_expression(allow_colon);
                    } else if level == Precedence::Assignment.level() as i32 {
                        // Switch temporarily to `Assignment` so blocks that
                        // follow are consumed by the right-hand side:
                        // `foo = bar: it` parses as `foo = (bar: it)`.
                        let old_kind = self.indentation_stack.top_kind();
                        self.switch_multiline_construct(old_kind, ConstructKind::Assignment);
                        right = self.parse_expression(allow_colon);
                        self.switch_multiline_construct(ConstructKind::Assignment, old_kind);
                    } else {
                        // An `is` followed by a `not` on the same line
                        // merges into one `is not` token.
                        if kind == Token::Is && self.current_token() == Token::Not {
                            self.consume();
                            kind = Token::IsNot;
                        }
                        right = self.parse_precedence(
                            Precedence::from_level((level + 1) as u8),
                            allow_colon,
                            false,
                        );
                    }
                    expression = Expression::Binary(Box::new(Binary {
                        kind,
                        left: expression,
                        right,
                        range,
                    }));
                }
                kind = self.current_token();
                next = kind.precedence();
                range = self.current_range();
            }
            level -= 1;
        }

        expression
    }

    /// Parses `head[...]` or `head[from..to]`. Returns the node and whether
    /// the closing bracket was missing.
    fn parse_postfix_index(&mut self, head: Expression) -> (Expression, bool) {
        let range = self.current_range();
        self.start_delimited(ConstructKind::Delimited, Token::Lbrack, Token::Rbrack);
        let result;
        if self.current_token_if_delimiter() == Token::Rbrack {
            self.report_error_here("Missing argument for indexing operator");
            result = Expression::Index(Box::new(Index {
                receiver: head,
                arguments: Vec::new(),
                range,
            }));
        } else {
            let first_argument = if self.current_token() != Token::Slice {
                Some(self.parse_expression(true))
            } else {
                None
            };
            if self.current_token() == Token::Slice {
                self.consume();
                let second_argument = if self.current_token_if_delimiter() != Token::Rbrack {
                    Some(self.parse_expression(true))
                } else {
                    None
                };
                result = Expression::IndexSlice(Box::new(IndexSlice {
                    receiver: head,
                    from: first_argument,
                    to: second_argument,
                    range,
                }));
            } else {
                let mut arguments = Vec::new();
                arguments.push(first_argument.expect("non-slice index has a first argument"));
                while self.optional_delimiter(Token::Comma) {
                    if self.current_token_if_delimiter() == Token::Rbrack {
                        break;
                    }
                    arguments.push(self.parse_expression(true));
                }
                result = Expression::Index(Box::new(Index { receiver: head, arguments, range }));
            }
        }
        let encountered_error = self.end_delimited(ConstructKind::Delimited, Token::Rbrack);
        (result, encountered_error)
    }

    /// Parses one postfix operation on `head`.
    fn parse_postfix_rest(&mut self, head: Expression) -> Expression {
        let kind = self.current_token();
        let range = self.current_range();
        debug_assert!(kind.precedence() == Precedence::Postfix || kind == Token::Period);
        if kind == Token::Period {
            self.consume();
            let name = if self.current_token() != Token::Identifier {
                if is_eol(self.current_token()) {
                    let previous = self.previous_range();
                    let current = self.current_range();
                    self.report_error(
                        crate::eol_range(previous, current),
                        "Incomplete expression",
                    );
                } else {
                    self.report_error_here("Expected identifier");
                }
                Identifier::new(toitc_util::symbols::EMPTY_STRING, self.current_range())
            } else {
                self.parse_identifier()
            };
            Expression::Dot(Box::new(Dot { receiver: head, name, range }))
        } else if kind == Token::Lbrack {
            let (result, _had_errors) = self.parse_postfix_index(head);
            result
        } else {
            debug_assert!(kind == Token::Increment || kind == Token::Decrement);
            self.consume();
            Expression::Unary(Box::new(Unary { kind, prefix: false, expression: head, range }))
        }
    }

    /// Parses a unary-prefixed expression.
    pub(crate) fn parse_unary(&mut self, allow_colon: bool) -> Expression {
        let kind = self.current_token();
        match kind {
            Token::Sub | Token::Increment | Token::Decrement | Token::BitNot => {
                let range = self.current_range();
                self.consume();
                if !self.is_current_token_attached() {
                    let full_range = range.extend(self.current_range());
                    self.report_error(
                        full_range,
                        format!("Can't have space between '{}' and the operand", kind.syntax()),
                    );
                }
                if kind == Token::Decrement {
                    let warn_range = range.extend(self.current_range());
                    self.diagnostics
                        .report_warning(warn_range, "Prefix decrement is deprecated".to_string());
                }
                if kind == Token::Sub
                    && (self.current_token() == Token::Integer
                        || self.current_token() == Token::Double)
                {
                    // Fold the minus into the literal.
                    let mut expression = self.parse_primary(allow_colon);
                    let extended = range.extend(expression.range());
                    match &mut expression {
                        Expression::LiteralInteger(literal) => literal.set_is_negated(true),
                        Expression::LiteralFloat(literal) => literal.set_is_negated(true),
                        _ => unreachable!("primary on Integer/Double tokens yields a literal"),
                    }
                    expression.set_range(extended);
                    return expression;
                }
                let expression = self.parse_precedence(Precedence::Postfix, allow_colon, false);
                Expression::Unary(Box::new(Unary { kind, prefix: true, expression, range }))
            }
            Token::Not => {
                self.report_error_here("'not' must be parenthesized when used at this location");
                let range = self.current_range();
                self.consume();
                let expression = self.parse_unary(allow_colon);
                Expression::Unary(Box::new(Unary {
                    kind: Token::Not,
                    prefix: true,
                    expression,
                    range,
                }))
            }
            _ => self.parse_primary(allow_colon),
        }
    }

    /// Parses a primary expression.
    pub(crate) fn parse_primary(&mut self, allow_colon: bool) -> Expression {
        let range = self.current_range();
        let token = self.current_token();
        if (allow_colon && token == Token::Colon) || token == Token::DoubleColon {
            let indentation = self.current_indentation();
            self.parse_block_or_lambda(indentation)
        } else if token == Token::Lparen {
            if self.is_current_token_attached() && self.previous_token() == Token::Identifier {
                self.diagnostics.report_warning(
                    range,
                    "Parenthesis should not be attached. Attempted call?".to_string(),
                );
            }
            self.start_delimited(ConstructKind::Delimited, Token::Lparen, Token::Rparen);
            let expression = self.parse_expression(true);
            self.end_delimited(ConstructKind::Delimited, Token::Rparen);
            Expression::Parenthesis(Box::new(Parenthesis { expression, range }))
        } else if token == Token::Identifier {
            Expression::identifier(self.parse_identifier())
        } else if token == Token::Integer {
            let data = self.current_token_data();
            self.consume();
            Expression::LiteralInteger(LiteralInteger::new(data, range))
        } else if token == Token::Double {
            let data = self.current_token_data();
            self.consume();
            Expression::LiteralFloat(LiteralFloat::new(data, range))
        } else if token == Token::String || token == Token::StringMultiLine {
            self.parse_string()
        } else if token == Token::StringPart || token == Token::StringPartMultiLine {
            self.parse_string_interpolate()
        } else if token == Token::Character {
            let data = self.current_token_data();
            self.consume();
            Expression::LiteralCharacter(LiteralCharacter { data, range })
        } else if self.optional(Token::True) {
            Expression::LiteralBoolean(LiteralBoolean { value: true, range })
        } else if self.optional(Token::False) {
            Expression::LiteralBoolean(LiteralBoolean { value: false, range })
        } else if self.optional(Token::Null) {
            Expression::LiteralNull(LiteralNull { range })
        } else if token == Token::Lbrack {
            self.parse_list()
        } else if token == Token::LsharpBrack {
            self.parse_byte_array()
        } else if token == Token::Lbrace {
            self.parse_map_or_set()
        } else if is_eol(token) {
            let previous = self.previous_range();
            let current = self.current_range();
            let error_range = crate::eol_range(previous, current);
            self.report_error(error_range, "Incomplete expression");
            self.skip_to_dedent();
            Expression::Error(Error { range: error_range })
        } else {
            self.report_error(range, format!("Unexpected {}", token.syntax()));
            self.skip_to_dedent();
            Expression::Error(Error { range })
        }
    }

    /// Parses a plain (non-interpolated) string literal.
    fn parse_string(&mut self) -> Expression {
        debug_assert!(
            self.current_token() == Token::String
                || self.current_token() == Token::StringMultiLine
        );
        let is_multiline = self.current_token() == Token::StringMultiLine;
        let range = self.current_range();
        let data = self.current_token_data();
        self.consume();
        Expression::LiteralString(LiteralString { data, is_multiline, range })
    }

    /// Parses an interpolated string.
    ///
    /// The scanner stopped at the first `$`; from here the parser drives
    /// the mode switches: `scan_interpolated_part` after each `$`,
    /// `scan_string_part` after each interpolated expression, and
    /// `scan_string_format_part` for `$(%format expr)`.
    fn parse_string_interpolate(&mut self) -> Expression {
        debug_assert!(
            self.current_token() == Token::StringPart
                || self.current_token() == Token::StringPartMultiLine
        );
        let start = self.current_range();
        let mut parts = Vec::new();
        let mut formats = Vec::new();
        let mut expressions = Vec::new();

        let is_multiline = self.current_token() == Token::StringPartMultiLine;
        let mut last_interpolated_was_identifier = false;
        let mut last_identifier_range = Range::invalid();
        let end_token = if is_multiline { Token::StringEndMultiLine } else { Token::StringEnd };
        let mut range = start;
        loop {
            let current_data = self.current_token_data();
            self.check_minus_after_identifier(
                last_interpolated_was_identifier,
                last_identifier_range,
                current_data,
            );
            parts.push(LiteralString { data: current_data, is_multiline, range });
            self.consume();
            last_interpolated_was_identifier = false;
            self.scan_interpolated_part();
            // We just passed the '$'.
            let mut format = None;
            let mut was_parenthesized = false;
            let mut expression;
            if self.current_token() == Token::Lparen {
                self.start_delimited(ConstructKind::Delimited, Token::Lparen, Token::Rparen);
                if self.current_token() == Token::Mod {
                    self.consume();
                    self.scan_string_format_part();
                    debug_assert!(self.current_token() == Token::String);
                    format = Some(LiteralString {
                        data: self.current_token_data(),
                        is_multiline: false,
                        range,
                    });
                    self.consume();
                }
                expression = self.parse_expression(true);
                was_parenthesized = true;
                let try_to_recover = false;
                let encountered_error = self.end_delimited_impl(
                    ConstructKind::Delimited,
                    Token::Rparen,
                    try_to_recover,
                    true,
                );
                if encountered_error {
                    self.discard_buffered_scanner_states();
                }
            } else if self.current_token() == Token::Identifier {
                let identifier = self.parse_identifier();
                last_identifier_range = identifier.range;
                last_interpolated_was_identifier = true;
                expression = Expression::identifier(identifier);
            } else {
                if self.current_token() == Token::Eos || self.current_token() == Token::Dedent {
                    self.report_error_here("Incomplete string interpolation");
                } else {
                    self.report_error_here("Illegal identifier");
                }
                let error_range = self.current_range();
                expression = Expression::LiteralString(LiteralString {
                    data: self.current_token_data(),
                    is_multiline,
                    range: error_range,
                });
                self.discard_buffered_scanner_states();
            }

            formats.push(format);

            if !was_parenthesized {
                // Postfix parts of an unparenthesized interpolation
                // (`$obj.field`, `$arr[i]`) are recognized by peeking at
                // the raw input; the scanner must not run ahead.
                loop {
                    if self.scanner_peek() == b'[' {
                        last_interpolated_was_identifier = false;
                        let (indexed, encountered_error) = self.parse_postfix_index(expression);
                        expression = indexed;
                        if encountered_error {
                            self.discard_buffered_scanner_states();
                            break; // Don't try to parse more postfixes.
                        }
                        continue; // Try for another postfix.
                    } else if self.scanner_look_ahead(0) == b'.'
                        && is_identifier_start_byte(self.scanner_look_ahead(1))
                    {
                        debug_assert!(self.current_token() == Token::Period);
                        // Ensure the current state is valid for consuming.
                        self.current_token();
                        self.consume();
                        self.scan_interpolated_part();
                        if self.current_token() == Token::Identifier
                            && self.is_current_token_attached()
                        {
                            let name = self.parse_identifier();
                            expression =
                                Expression::Dot(Box::new(Dot { receiver: expression, name, range }));
                            last_interpolated_was_identifier = true;
                            last_identifier_range = range;
                            continue; // Try for another postfix.
                        } else {
                            self.report_error_here("Non-identifier member name");
                            self.discard_buffered_scanner_states();
                        }
                    }
                    break;
                }
            }

            expressions.push(expression);
            self.scan_string_part(is_multiline);
            let kind = self.current_state().scanner_state.token();
            range = self.current_range();
            if kind == end_token {
                break;
            }
        }

        let current_data = self.current_token_data();
        self.check_minus_after_identifier(
            last_interpolated_was_identifier,
            last_identifier_range,
            current_data,
        );
        parts.push(LiteralString { data: current_data, is_multiline, range });
        self.consume();
        Expression::LiteralStringInterpolation(Box::new(LiteralStringInterpolation {
            parts,
            formats,
            expressions,
            range: start,
        }))
    }

    /// Warns about `"$id-suffix"`: the `-` reads as part of the identifier
    /// to humans, but parses as literal text.
    fn check_minus_after_identifier(
        &mut self,
        last_was_identifier: bool,
        last_identifier_range: Range,
        current_data: Symbol,
    ) {
        if !last_was_identifier {
            return;
        }
        let bytes = current_data.as_str().as_bytes();
        if bytes.first() == Some(&b'-') && bytes.get(1).is_some_and(|&b| is_identifier_part(b)) {
            self.diagnostics.report_warning(
                last_identifier_range,
                "Interpolated identifiers followed by '-' must be parenthesized".to_string(),
            );
        }
    }

    /// Parses `[a, b, c]`.
    fn parse_list(&mut self) -> Expression {
        let range = self.current_range();
        self.start_delimited(ConstructKind::Literal, Token::Lbrack, Token::Rbrack);
        let mut elements = Vec::new();
        loop {
            if self.current_token_if_delimiter() == Token::Rbrack {
                break;
            }
            elements.push(self.parse_expression(true));
            if !self.optional_delimiter(Token::Comma) {
                break;
            }
        }
        self.end_delimited(ConstructKind::Literal, Token::Rbrack);
        Expression::LiteralList(Box::new(LiteralList { elements, range }))
    }

    /// Parses `#[b, b, b]`, with a fast path for `integer,`/`character,`
    /// element runs.
    fn parse_byte_array(&mut self) -> Expression {
        let range = self.current_range();
        self.start_delimited(ConstructKind::Literal, Token::LsharpBrack, Token::Rbrack);
        let mut elements = Vec::new();
        loop {
            // Speed up parsing of large byte-array literals by recognizing
            // the common case without the whole expression machinery.
            let token = self.current_token();
            if token == Token::Integer && self.peek_token() == Token::Comma {
                let element_range = self.current_range();
                let data = self.current_token_data();
                self.consume();
                elements.push(Expression::LiteralInteger(LiteralInteger::new(
                    data,
                    element_range,
                )));
            } else if token == Token::Character && self.peek_token() == Token::Comma {
                let element_range = self.current_range();
                let data = self.current_token_data();
                self.consume();
                elements
                    .push(Expression::LiteralCharacter(LiteralCharacter { data, range: element_range }));
            } else {
                if self.current_token_if_delimiter() == Token::Rbrack {
                    break;
                }
                elements.push(self.parse_expression(true));
            }
            if !self.optional_delimiter(Token::Comma) {
                break;
            }
        }
        self.end_delimited(ConstructKind::Literal, Token::Rbrack);
        Expression::LiteralByteArray(Box::new(LiteralByteArray { elements, range }))
    }

    /// Parses `{a, b}` (set), `{k: v}` (map), `{}` (empty set), or `{:}`
    /// (empty map).
    fn parse_map_or_set(&mut self) -> Expression {
        let range = self.current_range();
        self.start_delimited(ConstructKind::Literal, Token::Lbrace, Token::Rbrace);

        if self.optional_delimiter(Token::Colon) {
            self.end_delimited(ConstructKind::Literal, Token::Rbrace);
            return Expression::LiteralMap(Box::new(LiteralMap {
                keys: Vec::new(),
                values: Vec::new(),
                range,
            }));
        } else if self.current_token_if_delimiter() == Token::Rbrace {
            self.end_delimited(ConstructKind::Literal, Token::Rbrace);
            return Expression::LiteralSet(Box::new(LiteralSet { elements: Vec::new(), range }));
        }

        let first = self.parse_expression(false);
        if self.current_token() == Token::Colon {
            let mut keys = vec![first];
            let mut values = Vec::new();
            self.consume();
            values.push(self.parse_expression(true));
            while self.optional_delimiter(Token::Comma) {
                if self.current_token_if_delimiter() == Token::Rbrace {
                    break;
                }
                keys.push(self.parse_expression(false));
                let mut has_colon = false;
                if self.current_token() == Token::Colon {
                    has_colon = true;
                    self.consume();
                } else {
                    self.report_error_here("Missing ':' to separate map key and value");
                }
                let value = if has_colon || self.current_token() != Token::Dedent {
                    self.parse_expression(true)
                } else {
                    Expression::Error(Error { range: self.current_range() })
                };
                values.push(value);
            }
            self.end_delimited(ConstructKind::Literal, Token::Rbrace);
            Expression::LiteralMap(Box::new(LiteralMap { keys, values, range }))
        } else {
            let mut elements = vec![first];
            while self.optional_delimiter(Token::Comma) {
                if self.current_token_if_delimiter() == Token::Rbrace {
                    break;
                }
                elements.push(self.parse_expression(false));
            }
            self.end_delimited(ConstructKind::Literal, Token::Rbrace);
            Expression::LiteralSet(Box::new(LiteralSet { elements, range }))
        }
    }
}

fn is_identifier_start_byte(byte: u8) -> bool {
    toitc_lex::is_identifier_start(byte)
}
