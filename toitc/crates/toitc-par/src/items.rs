//! Top-level parsing: units, imports, exports, classes, and declarations.

use toitc_lex::Token;
use toitc_util::symbol::symbols;

use crate::ast::*;
use crate::indent::ConstructKind;
use crate::toitdoc::attach_toitdoc;
use crate::{eol_range, is_eol, Parser, ParserPeeker};

pub(crate) fn is_operator_token(token: Token) -> bool {
    matches!(
        token,
        Token::Eq
            | Token::Lt
            | Token::Lte
            | Token::Gte
            | Token::Gt
            | Token::Add
            | Token::Sub
            | Token::Mul
            | Token::Div
            | Token::Mod
            | Token::BitNot
            | Token::BitAnd
            | Token::BitOr
            | Token::BitXor
            | Token::BitShr
            | Token::BitUshr
            | Token::BitShl
            | Token::Lbrack
    )
}

impl<'a> Parser<'a> {
    /// Parses a whole unit: `{import | export}* declaration*`.
    ///
    /// Toitdocs are attached before returning. On a fatal recursion-depth
    /// error the declarations are cleared (the scanner is already at EOF).
    pub fn parse_unit(&mut self) -> Unit {
        self.queue.scanner_mut().skip_hash_bang_line();

        let mut imports = Vec::new();
        let mut exports = Vec::new();
        let mut declarations: Vec<Declaration> = Vec::new();
        while self.current_token() != Token::Eos {
            if self.current_token() == Token::Import {
                if let Some(first) = declarations.first() {
                    let first_range = first.range();
                    self.diagnostics.start_group();
                    self.report_error_here("Imports must be before declarations");
                    self.diagnostics.report_note(first_range, "Earlier declaration".to_string());
                    self.diagnostics.end_group();
                }
                imports.push(self.parse_import());
                continue;
            }
            if self.current_token() == Token::Export {
                if let Some(first) = declarations.first() {
                    let first_range = first.range();
                    self.diagnostics.start_group();
                    self.report_error_here("Exports must be before declarations");
                    self.diagnostics.report_note(first_range, "Earlier declaration".to_string());
                    self.diagnostics.end_group();
                }
                exports.push(self.parse_export());
                continue;
            }
            let is_abstract = self.optional(Token::Abstract);
            if self.current_token() == Token::Class
                || (self.current_token() == Token::Identifier
                    && (self.current_token_data() == symbols::MONITOR
                        || self.current_token_data() == symbols::INTERFACE))
            {
                declarations.push(self.parse_class_interface_or_monitor(is_abstract));
            } else {
                declarations.push(self.parse_declaration(is_abstract));
            }
        }

        // Every construct opened during parsing has been closed again.
        debug_assert!(self.indentation_stack.is_empty());

        let mut unit = Unit {
            is_error_unit: false,
            imports,
            exports,
            declarations,
            toitdoc: None,
            range: self.source.range(0, 0),
        };
        let comments = self.queue.scanner().comments().to_vec();
        let canonicalizer = self.queue.scanner().symbols();
        attach_toitdoc(&mut unit, &comments, self.source, canonicalizer, self.diagnostics);
        if !self.check_tree_height(&unit) {
            // Clear the declarations to avoid follow-up stack overflows.
            unit.declarations = Vec::new();
        }
        unit
    }

    /// `import [.|..]* segment(.segment)* [as ident | show (ident+|*)]`
    pub(crate) fn parse_import(&mut self) -> Import {
        debug_assert!(self.current_token() == Token::Import);
        self.start_multiline_construct(ConstructKind::Import);
        let range = self.current_range();
        self.consume();

        let mut dot_outs = 0usize;
        let mut is_relative = false;
        let mut segments = Vec::new();
        if self.current_token() == Token::Period || self.current_token() == Token::Slice {
            is_relative = true;
            // The first dot only signals that the import is relative, so
            // one dot of the leading run doesn't count as a dot-out.
            let mut signed_dot_outs: isize = -1;
            while self.current_token() == Token::Period || self.current_token() == Token::Slice {
                signed_dot_outs += 1;
                if self.current_token() == Token::Slice {
                    signed_dot_outs += 1;
                }
                self.consume();
            }
            dot_outs = signed_dot_outs.max(0) as usize;
        }

        let mut missing_identifier = false;
        loop {
            if self.current_token() != Token::Identifier {
                missing_identifier = true;
                break;
            }
            segments.push(self.parse_identifier());
            if !self.optional(Token::Period) {
                break;
            }
        }

        let result = if missing_identifier {
            if is_eol(self.current_token()) {
                let previous = self.previous_range();
                let current = self.current_range();
                self.report_error(eol_range(previous, current), "Incomplete import clause");
            } else {
                self.report_error_here("Unexpected token. Missing identifier for import");
            }
            self.skip_to_end_of_multiline_construct();
            // Make the import relative, so no prefix is required.
            Import {
                is_relative: true,
                dot_outs: 0,
                segments: Vec::new(),
                prefix: None,
                show_identifiers: Vec::new(),
                show_all: false,
                range,
            }
        } else {
            let mut prefix = None;
            let mut show_identifiers = Vec::new();
            let mut show_all = false;

            if self.current_token() == Token::As {
                let as_range = self.current_range();
                self.consume();
                if self.current_token() == Token::Identifier {
                    prefix = Some(self.parse_identifier());
                } else {
                    self.report_error(as_range, "'as' must be followed by identifier");
                    prefix = Some(Identifier::new(symbols::EMPTY_STRING, as_range));
                    self.skip_to_end_of_multiline_construct();
                }
            } else if self.current_token() == Token::Identifier
                && self.current_token_data() == symbols::SHOW
            {
                let show_range = self.current_range();
                self.consume();
                if self.current_token() == Token::Identifier {
                    while self.current_token() == Token::Identifier {
                        show_identifiers.push(self.parse_identifier());
                    }
                } else if self.current_token() == Token::Mul {
                    self.consume();
                    show_all = true;
                } else {
                    // While there is an error, just assume all are visible.
                    show_all = true;
                    self.report_error(show_range, "'show' must be followed by '*' or identifiers");
                    self.skip_to_end_of_multiline_construct();
                }
            }
            Import { is_relative, dot_outs, segments, prefix, show_identifiers, show_all, range }
        };
        self.end_multiline_construct_at_dedent(ConstructKind::Import);
        result
    }

    /// `export ('*' | ident+)`
    pub(crate) fn parse_export(&mut self) -> Export {
        debug_assert!(self.current_token() == Token::Export);
        self.start_multiline_construct(ConstructKind::Export);
        let range = self.current_range();
        self.consume();

        let result = if self.current_token() == Token::Mul {
            self.consume();
            Export { identifiers: Vec::new(), export_all: true, range }
        } else if self.current_token() != Token::Identifier {
            if is_eol(self.current_token()) {
                let previous = self.previous_range();
                let current = self.current_range();
                self.report_error(eol_range(previous, current), "Incomplete export clause");
            } else {
                self.report_error_here("Expected export identifier");
            }
            self.skip_to_end_of_multiline_construct();
            Export { identifiers: Vec::new(), export_all: false, range }
        } else {
            let mut identifiers = Vec::new();
            while self.current_token() == Token::Identifier {
                identifiers.push(self.parse_identifier());
            }
            Export { identifiers, export_all: false, range }
        };
        self.end_multiline_construct_at_dedent(ConstructKind::Export);
        result
    }

    /// `[abstract] (class|monitor|interface) name [[extends] type]
    /// [implements type+]: member*`
    ///
    /// `monitor` and `interface` are canonicalized identifiers, not
    /// keywords. Neither may be abstract.
    pub(crate) fn parse_class_interface_or_monitor(&mut self, is_abstract: bool) -> Declaration {
        debug_assert!(
            self.current_token() == Token::Class
                || (self.current_token() == Token::Identifier
                    && (self.current_token_data() == symbols::INTERFACE
                        || self.current_token_data() == symbols::MONITOR))
        );

        let mut interfaces = Vec::new();
        let mut members = Vec::new();

        // Classes and monitors go over multiple lines.
        self.start_multiline_construct(ConstructKind::Class);

        let mut is_abstract = is_abstract;
        let mut is_monitor = false;
        let mut is_interface = false;
        if self.current_token() == Token::Identifier {
            is_monitor = self.current_token_data() == symbols::MONITOR;
            is_interface = self.current_token_data() == symbols::INTERFACE;
            if is_abstract {
                let what = if is_interface { "Interfaces" } else { "Monitors" };
                self.report_error_here(format!("{} can't be abstract", what));
                is_abstract = false;
            }
            self.consume();
        } else {
            debug_assert!(self.current_token() == Token::Class);
            self.consume();
        }

        let mut member_indentation: i32 = -1;

        let name;
        let mut super_class = None;
        if self.current_token() != Token::Identifier {
            let kind_name = if is_monitor {
                "monitor"
            } else if is_interface {
                "interface"
            } else {
                "class"
            };
            if is_eol(self.current_token()) {
                let previous = self.previous_range();
                let current = self.current_range();
                self.report_error(
                    eol_range(previous, current),
                    format!("Expected {} name", kind_name),
                );
            } else {
                self.report_error_here(format!("Expected {} name", kind_name));
            }
            let range = self.current_range();
            name = Identifier::new(symbols::EMPTY_STRING, range);
            // Skip to the body.
            if !self.skip_to_body(Token::Colon) {
                member_indentation = 2; // Assume members are indented by 2.
            }
        } else {
            name = self.parse_identifier();
            let mut requires_super = false;
            if self.current_token() == Token::Identifier
                && self.current_token_data() == symbols::EXTENDS
            {
                self.consume();
                requires_super = true;
            }
            if self.current_token() == Token::Identifier
                && self.current_token_data() != symbols::IMPLEMENTS
            {
                super_class = Some(self.parse_type(false));
            }
            if self.current_token() == Token::Identifier
                && self.current_token_data() == symbols::IMPLEMENTS
            {
                if super_class.is_none() && requires_super {
                    self.report_error_here("Missing super class");
                    // The error is reported; no super class needed anymore.
                    requires_super = false;
                }
                self.consume();
                loop {
                    interfaces.push(self.parse_type(false));
                    if self.current_token() != Token::Identifier {
                        break;
                    }
                }
            }

            if super_class.is_none() && requires_super {
                self.report_error_here("Missing super class");
            }

            if self.current_token() == Token::Colon {
                self.consume();
            } else {
                self.report_error_here("Missing colon to end class signature");
                member_indentation = 2; // Assume members are indented by 2.
            }
        }

        while self.current_token() != Token::Dedent {
            if member_indentation == -1 {
                if self.at_newline() {
                    member_indentation = self.current_indentation();
                }
            } else if self.current_indentation() != member_indentation {
                self.report_error_here("Members must have the same indentation");
            }
            members.push(self.parse_declaration(false));
        }
        self.end_multiline_construct_at_dedent(ConstructKind::Class);
        let range = name.range;
        Declaration::Class(Box::new(Class {
            name,
            super_class,
            interfaces,
            members,
            is_abstract,
            is_monitor,
            is_interface,
            toitdoc: None,
            range,
        }))
    }

    /// Parses a field or method declaration, at class or top level.
    ///
    /// Callers are free to consume any `abstract` keyword, but they aren't
    /// required to.
    pub(crate) fn parse_declaration(&mut self, is_abstract: bool) -> Declaration {
        self.start_multiline_construct(ConstructKind::DeclarationSignature);

        let mut is_abstract = is_abstract;
        let mut is_static = false;
        let mut is_setter = false;
        if !is_abstract && self.current_token() == Token::Abstract {
            self.consume();
            is_abstract = true;
        }
        if self.current_token() == Token::Static {
            self.consume();
            is_static = true;
        }
        let mut declaration_range = self.current_range();
        let mut name: Expression = if self.current_token() == Token::Identifier {
            Expression::identifier(self.parse_identifier())
        } else {
            if is_eol(self.current_token()) {
                let previous = self.previous_range();
                let current = self.current_range();
                declaration_range = eol_range(previous, current);
            }
            if is_eol(self.current_token()) || self.current_token() == Token::Colon {
                self.report_error(declaration_range, "Expected name of declaration");
                Expression::identifier(Identifier::new(symbols::EMPTY_STRING, declaration_range))
            } else {
                self.report_error(declaration_range, "Invalid name for declaration");
                let invalid_token = self.current_token();
                let range = self.current_range();
                self.consume();
                Expression::identifier(Identifier::new(invalid_token.symbol(), range))
            }
        };

        let name_is_operator_keyword =
            name.as_identifier().map(|id| id.data) == Some(symbols::OPERATOR);
        if name_is_operator_keyword {
            let token = self.current_token();
            let token_range = self.current_range();
            if is_operator_token(token) {
                let mut name_range = declaration_range.extend(self.current_range());
                if token != Token::Lbrack {
                    self.consume();
                    name = Expression::identifier(Identifier::new(token.symbol(), name_range));
                } else {
                    self.consume();
                    if self.current_token() == Token::Slice {
                        // The slice operator: [..]
                        if !self.is_current_token_attached() {
                            self.report_error_here("Can't have space between '[' and '..'");
                        }
                        self.consume();
                        if self.current_token() != Token::Rbrack {
                            self.report_error(token_range, "Missing closing ']'");
                            // Use the '[' as name, and consume everything
                            // attached to reduce follow-up errors.
                            while self.is_current_token_attached() {
                                self.consume();
                            }
                            name = Expression::identifier(Identifier::new(
                                token.symbol(),
                                name_range,
                            ));
                        } else {
                            if !self.is_current_token_attached() {
                                self.report_error_here("Can't have space between '..' and ']'");
                            }
                            name_range = name_range.extend(self.current_range());
                            self.consume();
                            name = Expression::identifier(Identifier::new(
                                symbols::INDEX_SLICE,
                                name_range,
                            ));
                        }
                    } else if self.current_token() != Token::Rbrack {
                        self.report_error(token_range, "Missing closing ']'");
                        while self.is_current_token_attached() {
                            self.consume();
                        }
                        name = Expression::identifier(Identifier::new(token.symbol(), name_range));
                    } else {
                        // Either `[]` or `[]=`.
                        if !self.is_current_token_attached() {
                            self.report_error_here("Can't have space between '[' and ']'");
                        }
                        name_range = name_range.extend(self.current_range());
                        self.consume();
                        if self.current_token() == Token::Assign {
                            if !self.is_current_token_attached() {
                                self.report_error_here("Can't have space between ']' and '='");
                            }
                            name_range = name_range.extend(self.current_range());
                            self.consume();
                            name = Expression::identifier(Identifier::new(
                                symbols::INDEX_PUT,
                                name_range,
                            ));
                        } else {
                            name = Expression::identifier(Identifier::new(
                                symbols::INDEX,
                                name_range,
                            ));
                        }
                    }
                }
                declaration_range = declaration_range.extend(name_range);
            } else {
                self.report_error_here("Invalid operator name");
            }
        } else if self.current_token() == Token::Assign && self.is_current_token_attached() {
            declaration_range = declaration_range.extend(self.current_range());
            self.consume();
            is_setter = true;
        } else if self.current_token() == Token::Div
            || self.current_token() == Token::Define
            || self.current_token() == Token::DefineFinal
            || self.current_token() == Token::Assign
        {
            // A field/global. (An unattached '=' lands here and is reported.)
            let mut has_initializer = true;
            let mut field_type = None;
            if self.current_token() == Token::Div {
                field_type = Some(self.parse_type(true));
            }
            let mut is_final = false;
            if self.current_token() == Token::Define || self.current_token() == Token::Assign {
                if self.current_token() == Token::Assign {
                    self.report_error_here("Unexpected token '='. Did you mean ':='?");
                }
                self.consume();
                self.switch_multiline_construct(
                    ConstructKind::DeclarationSignature,
                    ConstructKind::Declaration,
                );
            } else if self.current_token() == Token::DefineFinal {
                is_final = true;
                self.consume();
                self.switch_multiline_construct(
                    ConstructKind::DeclarationSignature,
                    ConstructKind::Declaration,
                );
            } else if field_type.is_some() {
                // A declaration with a type doesn't need an initializer.
                self.switch_multiline_construct(
                    ConstructKind::DeclarationSignature,
                    ConstructKind::Declaration,
                );
                has_initializer = false;
                is_final = true;
            } else {
                self.report_error_here("Missing ':=' or '::=' for field.");
                self.switch_multiline_construct(
                    ConstructKind::DeclarationSignature,
                    ConstructKind::Declaration,
                );
            }
            let mut initializer = None;
            if has_initializer {
                if self.current_token() == Token::Conditional {
                    let range = self.current_range();
                    initializer = Some(Expression::LiteralUndefined(LiteralUndefined { range }));
                    self.consume();
                } else {
                    initializer = Some(self.parse_expression(true));
                }
            }
            self.end_multiline_construct_at_dedent(ConstructKind::Declaration);
            let name_identifier = match name {
                Expression::Identifier(identifier) => *identifier,
                _ => Identifier::new(symbols::EMPTY_STRING, declaration_range),
            };
            return Declaration::Field(Box::new(Field {
                name: name_identifier,
                type_annotation: field_type,
                initializer,
                is_static,
                is_abstract,
                is_final,
                toitdoc: None,
                range: declaration_range,
            }));
        } else if self.current_token() == Token::Period && self.is_current_token_attached() {
            let period_range = self.current_range();
            // Must be a named constructor.
            self.consume();
            if !self.is_current_token_attached() || self.current_token() != Token::Identifier {
                // Assume the dot is spurious.
                self.report_error(declaration_range.extend(period_range), "Invalid member name");
            } else {
                let constructor_name = self.parse_identifier();
                let dot_range = declaration_range.extend(constructor_name.range);
                name = Expression::Dot(Box::new(Dot {
                    receiver: name,
                    name: constructor_name,
                    range: dot_range,
                }));
            }
        }

        let (return_type, parameters) = self.parse_parameters(true);

        let body;
        if self.current_token() == Token::Colon {
            self.consume();
            self.switch_multiline_construct(
                ConstructKind::DeclarationSignature,
                ConstructKind::Declaration,
            );
            // Interface members and abstract methods may not have bodies;
            // those errors are reported during resolution.
            body = Some(self.parse_sequence());
        } else if self.current_token() == Token::Dedent {
            self.switch_multiline_construct(
                ConstructKind::DeclarationSignature,
                ConstructKind::Declaration,
            );
            body = None;
        } else if self.at_newline() {
            self.report_error_here("Signatures and bodies must be separated by a `:`");
            self.switch_multiline_construct(
                ConstructKind::DeclarationSignature,
                ConstructKind::Declaration,
            );
            body = Some(self.parse_sequence());
        } else {
            let token_syntax = self.current_token().syntax();
            self.report_error_here(format!("Unexpected token: {}", token_syntax));
            while !(self.at_newline()
                && self.current_indentation() < self.indentation_stack.top_indentation() + 4)
                && self.current_token() != Token::Dedent
                && self.current_token() != Token::Colon
                && self.current_token() != Token::Define
                && self.current_token() != Token::DefineFinal
            {
                self.consume();
            }
            self.switch_multiline_construct(
                ConstructKind::DeclarationSignature,
                ConstructKind::Declaration,
            );

            if self.current_token() == Token::Dedent {
                body = None;
            } else if self.current_token() == Token::Colon
                || self.current_token() == Token::Define
                || self.current_token() == Token::DefineFinal
            {
                self.consume();
                body = Some(self.parse_sequence());
            } else {
                debug_assert!(self.at_newline());
                body = Some(self.parse_sequence());
            }
        }
        self.end_multiline_construct_at_dedent(ConstructKind::Declaration);
        Declaration::Method(Box::new(Method {
            name,
            return_type,
            is_setter,
            is_static,
            is_abstract,
            parameters,
            body,
            toitdoc: None,
            range: declaration_range,
        }))
    }

    /// Whether the peeker is looking at a type. Optimistic (may allow
    /// more), but reasonable from a user's point of view.
    pub(crate) fn peek_type(peeker: &mut ParserPeeker<'_, 'a>) -> bool {
        let mut expects_identifier = true;
        loop {
            let token = peeker.current_token();
            if expects_identifier {
                if token == Token::Identifier {
                    peeker.consume();
                    expects_identifier = false;
                    continue;
                }
                return false;
            }
            if token == Token::Period {
                peeker.consume();
                expects_identifier = true;
                continue;
            }
            if token == Token::Conditional {
                peeker.consume();
                return true;
            }
            return true;
        }
    }

    /// Parses a (dotted, possibly nullable) type.
    ///
    /// With `is_type_annotation`, the leading `/` or `->` is consumed and a
    /// trailing attached `?` makes the type nullable.
    pub(crate) fn parse_type(&mut self, is_type_annotation: bool) -> Expression {
        if is_type_annotation {
            debug_assert!(
                self.current_token() == Token::Div || self.current_token() == Token::Rarrow
            );
            self.consume();
        }
        let start_range = self.current_range();
        let mut type_expression: Option<Expression> = None;
        loop {
            if self.current_token() != Token::Identifier {
                self.report_error_here("Unexpected token while parsing type");
                let bad_type_range = start_range.extend_to(self.current_range().from());
                if let Some(type_expression) = type_expression {
                    return type_expression;
                }
                return Expression::Error(Error { range: bad_type_range });
            }
            let id = self.parse_identifier();
            if id.data == symbols::IMPLEMENTS || id.data == symbols::EXTENDS {
                self.report_error(
                    id.range,
                    format!("Unexpected token in type: '{}'", id.data),
                );
            }
            type_expression = Some(match type_expression {
                None => Expression::identifier(id),
                Some(receiver) => {
                    let range = id.range;
                    Expression::Dot(Box::new(Dot { receiver, name: id, range }))
                }
            });
            if self.is_current_token_attached() && self.current_token() == Token::Period {
                self.consume();
            } else {
                break;
            }
        }
        let type_expression = type_expression.expect("loop always assigns or returns");
        let mut type_range = type_expression.range();
        let mut is_nullable = false;
        if is_type_annotation
            && self.is_current_token_attached()
            && self.current_token() == Token::Conditional
        {
            type_range = type_range.extend(self.current_range());
            self.consume();
            is_nullable = true;
        }
        if is_nullable {
            return Expression::Nullable(Box::new(Nullable { type_expression, range: type_range }));
        }
        type_expression
    }

    /// Whether the peeker is looking at a block parameter.
    ///
    /// Block parameters have no default values and can't be named.
    pub(crate) fn peek_block_parameter(peeker: &mut ParserPeeker<'_, 'a>) -> bool {
        if peeker.current_token() != Token::Identifier {
            return false;
        }
        peeker.consume();
        if peeker.current_token() == Token::Div {
            peeker.consume();
            if !Self::peek_type(peeker) {
                return false;
            }
        }
        true
    }

    /// Parses a parameter list (and, when allowed, a `->` return type,
    /// which may appear between parameters).
    pub(crate) fn parse_parameters(
        &mut self,
        allow_return_type: bool,
    ) -> (Option<Expression>, Vec<Parameter>) {
        let mut return_type: Option<Expression> = None;
        let mut parameters = Vec::new();
        let declaration_indentation = self.indentation_stack.top_indentation();
        let mut reported_unusual_indentation = false;
        loop {
            let range = self.current_range();
            let unusual_indentation = self.at_newline()
                && self.current_indentation() < declaration_indentation + 4;
            let mut is_field_storing = false;
            let mut is_block = false;
            let mut is_bracket_block = false;
            let mut is_named = false;
            let mut name: Option<Identifier> = None;
            let mut default_value: Option<Expression> = None;
            if self.current_token() == Token::Lbrack {
                self.consume();
                is_bracket_block = true;
            }
            if self.current_token() == Token::Decrement {
                self.consume();
                if self.current_token() == Token::Identifier
                    || self.current_token() == Token::Period
                {
                    if !self.is_current_token_attached() {
                        self.report_error_here(
                            "Can't have space between '--' and the parameter name",
                        );
                    }
                    is_named = true;
                } else {
                    self.report_error_here("Missing parameter name");
                }
            }
            if is_bracket_block {
                is_block = true;
                let mut bad_name = false;
                if self.current_token() == Token::Identifier {
                    name = Some(self.parse_identifier());
                } else {
                    if self.current_token() == Token::Assign
                        || self.current_token() == Token::Rbrack
                    {
                        self.report_error_here("Missing parameter name");
                    } else {
                        self.report_error_here("Invalid parameter name");
                    }
                    bad_name = true;
                }
                if self.current_token() == Token::Assign {
                    self.consume();
                    default_value =
                        Some(self.parse_precedence(toitc_lex::Precedence::Postfix, true, false));
                }
                if self.current_token() != Token::Rbrack {
                    self.report_error_here("Missing ']' for block parameter");
                    while self.current_token() != Token::Rbrack
                        && self.current_token() != Token::Dedent
                        && self.current_token() != Token::Colon
                    {
                        self.consume();
                    }
                }
                if self.current_token() == Token::Rbrack {
                    self.consume();
                }
                // Don't pollute the rest of the compiler with invalid
                // parameter names; drop the parameter so far.
                if bad_name {
                    continue;
                }
            } else if self.current_token() == Token::Identifier
                || self.current_token() == Token::Period
            {
                if self.current_token() == Token::Identifier {
                    let parsed = self.parse_identifier();
                    if parsed.data == symbols::THIS {
                        if self.current_token() != Token::Period {
                            // 'this' as a parameter name is reported during
                            // resolution.
                            name = Some(parsed);
                        } else {
                            if !self.is_current_token_attached() {
                                self.report_error_here("Can't have space between 'this' and '.'");
                            }
                            self.consume();
                            if self.current_token() == Token::Identifier {
                                if !self.is_current_token_attached() {
                                    self.report_error_here(
                                        "Can't have space between '.' and the field name",
                                    );
                                }
                                is_field_storing = true;
                                name = Some(self.parse_identifier());
                            } else {
                                // Keep 'this' as name; it errors later.
                                name = Some(parsed);
                            }
                        }
                    } else {
                        name = Some(parsed);
                    }
                } else {
                    debug_assert!(self.current_token() == Token::Period);
                    self.consume();
                    if self.current_token() == Token::Identifier {
                        if !self.is_current_token_attached() {
                            self.report_error_here(
                                "Can't have space between '.' and the field name",
                            );
                        }
                        is_field_storing = true;
                        name = Some(self.parse_identifier());
                    } else {
                        self.report_error_here("Missing parameter name");
                        continue;
                    }
                }
            } else if self.current_token() == Token::Rarrow && allow_return_type {
                // The return type.
                if return_type.is_some() {
                    self.report_error_here("Return type is declared multiple times");
                }
                return_type = Some(self.parse_type(true));
                continue;
            } else {
                break;
            }
            let mut type_annotation = None;
            if self.current_token() == Token::Div {
                type_annotation = Some(self.parse_type(true));
            }
            // A default value may already have been parsed inside brackets;
            // resolution reports that case.
            if self.current_token() == Token::Assign {
                self.consume();
                default_value =
                    Some(self.parse_precedence(toitc_lex::Precedence::Postfix, true, false));
            }
            if unusual_indentation && !reported_unusual_indentation {
                debug_assert!(range.is_valid());
                self.diagnostics
                    .report_warning(range, "Unusual indentation for parameter".to_string());
                reported_unusual_indentation = true;
            }
            let name = name.expect("parameter name is set on all paths that reach here");
            let parameter_range = range.extend(name.range);
            parameters.push(Parameter {
                name,
                type_annotation,
                default_value,
                is_named,
                is_field_storing,
                is_block,
                range: parameter_range,
            });
        }
        (return_type, parameters)
    }

    /// Parses `|param ...|` block parameters (present on blocks/lambdas).
    pub(crate) fn parse_block_parameters(&mut self) -> Vec<Parameter> {
        if self.current_token() != Token::BitOr {
            return Vec::new();
        }
        self.start_delimited(ConstructKind::Delimited, Token::BitOr, Token::BitOr);
        let (_, parameters) = self.parse_parameters(false);
        if self.current_token() != Token::BitOr && !is_eol(self.current_token()) {
            self.report_error_here("Invalid parameter name");
            let try_to_recover = true;
            let report_error_on_missing = false;
            self.end_delimited_impl(
                ConstructKind::Delimited,
                Token::BitOr,
                try_to_recover,
                report_error_on_missing,
            );
        } else {
            self.end_delimited(ConstructKind::Delimited, Token::BitOr);
        }
        parameters
    }
}
