//! A textual AST renderer for debugging.
//!
//! This is not the language's formatter; it produces a canonicalized
//! rendering that is close enough to the surface syntax that well-formed
//! trees re-parse into structurally equivalent declarations.

use toitc_lex::Token;

use crate::ast::*;

/// Renders AST nodes as text.
#[derive(Default)]
pub struct AstPrinter {
    output: String,
    indentation: usize,
}

impl AstPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a whole unit.
    pub fn print_unit(mut self, unit: &Unit) -> String {
        for import in &unit.imports {
            self.print_import(import);
        }
        for export in &unit.exports {
            self.print_export(export);
        }
        for declaration in &unit.declarations {
            self.print_declaration(declaration);
        }
        self.output
    }

    /// Renders a single expression (mostly for tests).
    pub fn print_expression(mut self, expression: &Expression) -> String {
        self.emit_expression(expression);
        self.output
    }

    fn emit(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn emit_line_start(&mut self) {
        for _ in 0..self.indentation {
            self.output.push(' ');
        }
    }

    fn emit_newline(&mut self) {
        self.output.push('\n');
    }

    fn print_import(&mut self, import: &Import) {
        self.emit("import ");
        if import.is_relative {
            self.emit(".");
            for _ in 0..import.dot_outs {
                self.emit(".");
            }
        }
        for (i, segment) in import.segments.iter().enumerate() {
            if i != 0 {
                self.emit(".");
            }
            self.emit(segment.data.as_str());
        }
        if let Some(prefix) = &import.prefix {
            self.emit(" as ");
            self.emit(prefix.data.as_str());
        }
        if import.show_all {
            self.emit(" show *");
        } else if !import.show_identifiers.is_empty() {
            self.emit(" show");
            for shown in &import.show_identifiers {
                self.emit(" ");
                self.emit(shown.data.as_str());
            }
        }
        self.emit_newline();
    }

    fn print_export(&mut self, export: &Export) {
        self.emit("export");
        if export.export_all {
            self.emit(" *");
        } else {
            for identifier in &export.identifiers {
                self.emit(" ");
                self.emit(identifier.data.as_str());
            }
        }
        self.emit_newline();
    }

    fn print_declaration(&mut self, declaration: &Declaration) {
        match declaration {
            Declaration::Class(class) => self.print_class(class),
            Declaration::Field(field) => self.print_field(field),
            Declaration::Method(method) => self.print_method(method),
        }
    }

    fn print_class(&mut self, class: &Class) {
        self.emit_line_start();
        if class.is_abstract {
            self.emit("abstract ");
        }
        let keyword = if class.is_monitor {
            "monitor"
        } else if class.is_interface {
            "interface"
        } else {
            "class"
        };
        self.emit(keyword);
        self.emit(" ");
        self.emit(class.name.data.as_str());
        if let Some(super_class) = &class.super_class {
            self.emit(" extends ");
            self.emit_expression(super_class);
        }
        if !class.interfaces.is_empty() {
            self.emit(" implements");
            for interface in &class.interfaces {
                self.emit(" ");
                self.emit_expression(interface);
            }
        }
        self.emit(":");
        self.emit_newline();
        self.indentation += 2;
        for member in &class.members {
            self.print_declaration(member);
        }
        self.indentation -= 2;
    }

    fn print_field(&mut self, field: &Field) {
        self.emit_line_start();
        if field.is_static {
            self.emit("static ");
        }
        self.emit(field.name.data.as_str());
        if let Some(type_annotation) = &field.type_annotation {
            self.emit("/");
            self.emit_expression(type_annotation);
        }
        if let Some(initializer) = &field.initializer {
            self.emit(if field.is_final { " ::= " } else { " := " });
            self.emit_expression(initializer);
        }
        self.emit_newline();
    }

    fn print_method(&mut self, method: &Method) {
        self.emit_line_start();
        if method.is_abstract {
            self.emit("abstract ");
        }
        if method.is_static {
            self.emit("static ");
        }
        self.emit_expression(&method.name);
        if method.is_setter {
            self.emit("=");
        }
        for parameter in &method.parameters {
            self.emit(" ");
            self.print_parameter(parameter);
        }
        if let Some(return_type) = &method.return_type {
            self.emit(" -> ");
            self.emit_expression(return_type);
        }
        match &method.body {
            None => self.emit_newline(),
            Some(body) => {
                self.emit(":");
                self.emit_newline();
                self.indentation += 2;
                self.print_sequence_lines(body);
                self.indentation -= 2;
            }
        }
    }

    fn print_parameter(&mut self, parameter: &Parameter) {
        if parameter.is_block {
            self.emit("[");
        }
        if parameter.is_named {
            self.emit("--");
        }
        if parameter.is_field_storing {
            self.emit(".");
        }
        self.emit(parameter.name.data.as_str());
        if let Some(type_annotation) = &parameter.type_annotation {
            self.emit("/");
            self.emit_expression(type_annotation);
        }
        if let Some(default_value) = &parameter.default_value {
            self.emit("=");
            self.emit_expression(default_value);
        }
        if parameter.is_block {
            self.emit("]");
        }
    }

    fn print_sequence_lines(&mut self, sequence: &Sequence) {
        for expression in &sequence.expressions {
            self.emit_line_start();
            self.emit_expression(expression);
            self.emit_newline();
        }
    }

    fn emit_block_body(&mut self, parameters: &[Parameter], body: &Sequence, colon: &str) {
        self.emit(colon);
        if !parameters.is_empty() {
            self.emit(" |");
            for (i, parameter) in parameters.iter().enumerate() {
                if i != 0 {
                    self.emit(" ");
                }
                self.print_parameter(parameter);
            }
            self.emit("|");
        }
        self.emit_newline();
        self.indentation += 2;
        self.print_sequence_lines(body);
        self.indentation -= 2;
        // Continuation after a block body resumes at line indentation.
        self.emit_line_start();
    }

    fn emit_expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Error(_) => self.emit("<error>"),
            Expression::NamedArgument(named) => {
                self.emit("--");
                if named.inverted {
                    self.emit("no-");
                }
                self.emit(named.name.data.as_str());
                if let Some(value) = &named.expression {
                    self.emit("=");
                    self.emit_expression(value);
                }
            }
            Expression::BreakContinue(bc) => {
                self.emit(if bc.is_break { "break" } else { "continue" });
                if let Some(label) = &bc.label {
                    self.emit(".");
                    self.emit(label.data.as_str());
                }
                if let Some(value) = &bc.value {
                    self.emit(" ");
                    self.emit_expression(value);
                }
            }
            Expression::Parenthesis(parenthesis) => {
                self.emit("(");
                self.emit_expression(&parenthesis.expression);
                self.emit(")");
            }
            Expression::Block(block) => {
                self.emit_block_body(&block.parameters, &block.body, ":");
            }
            Expression::Lambda(lambda) => {
                self.emit_block_body(&lambda.parameters, &lambda.body, "::");
            }
            Expression::Sequence(sequence) => {
                self.emit_newline();
                self.indentation += 2;
                self.print_sequence_lines(sequence);
                self.indentation -= 2;
                self.emit_line_start();
            }
            Expression::DeclarationLocal(declaration) => {
                self.emit(declaration.name.data.as_str());
                if let Some(type_annotation) = &declaration.type_annotation {
                    self.emit("/");
                    self.emit_expression(type_annotation);
                }
                self.emit(if declaration.kind == Token::DefineFinal { " ::= " } else { " := " });
                self.emit_expression(&declaration.value);
            }
            Expression::If(node) => {
                self.emit("if ");
                self.emit_expression(&node.expression);
                self.emit(":");
                self.emit_body_expression(&node.yes);
                if let Some(no) = &node.no {
                    self.emit("else:");
                    self.emit_body_expression(no);
                }
            }
            Expression::While(node) => {
                self.emit("while ");
                self.emit_expression(&node.condition);
                self.emit(":");
                self.emit_body_expression(&node.body);
            }
            Expression::For(node) => {
                self.emit("for ");
                if let Some(initializer) = &node.initializer {
                    self.emit_expression(initializer);
                }
                self.emit("; ");
                if let Some(condition) = &node.condition {
                    self.emit_expression(condition);
                }
                self.emit("; ");
                if let Some(update) = &node.update {
                    self.emit_expression(update);
                }
                self.emit(":");
                self.emit_body_expression(&node.body);
            }
            Expression::TryFinally(node) => {
                self.emit("try:");
                self.emit_newline();
                self.indentation += 2;
                self.print_sequence_lines(&node.body);
                self.indentation -= 2;
                self.emit_line_start();
                self.emit("finally:");
                if !node.handler_parameters.is_empty() {
                    self.emit(" |");
                    for (i, parameter) in node.handler_parameters.iter().enumerate() {
                        if i != 0 {
                            self.emit(" ");
                        }
                        self.print_parameter(parameter);
                    }
                    self.emit("|");
                }
                self.emit_newline();
                self.indentation += 2;
                self.print_sequence_lines(&node.handler);
                self.indentation -= 2;
                self.emit_line_start();
            }
            Expression::Return(node) => {
                self.emit("return");
                if let Some(value) = &node.value {
                    self.emit(" ");
                    self.emit_expression(value);
                }
            }
            Expression::Unary(node) => {
                if node.prefix {
                    self.emit(node.kind.syntax());
                    if node.kind == Token::Not {
                        self.emit(" ");
                    }
                    self.emit_expression(&node.expression);
                } else {
                    self.emit_expression(&node.expression);
                    self.emit(node.kind.syntax());
                }
            }
            Expression::Binary(node) => {
                self.emit_expression(&node.left);
                self.emit(" ");
                self.emit(node.kind.syntax());
                self.emit(" ");
                self.emit_expression(&node.right);
            }
            Expression::Call(node) => {
                if node.is_call_primitive {
                    self.emit("#primitive");
                    if !matches!(&node.target, Expression::Identifier(id)
                        if id.data == Token::Primitive.symbol())
                    {
                        self.emit(" ");
                        self.emit_expression(&node.target);
                    }
                } else {
                    self.emit_expression(&node.target);
                }
                for argument in &node.arguments {
                    match argument {
                        Expression::Block(_) | Expression::Lambda(_) => {
                            self.emit_expression(argument)
                        }
                        _ => {
                            self.emit(" ");
                            self.emit_argument(argument);
                        }
                    }
                }
            }
            Expression::Dot(node) => {
                self.emit_expression(&node.receiver);
                self.emit(".");
                self.emit(node.name.data.as_str());
            }
            Expression::Index(node) => {
                self.emit_expression(&node.receiver);
                self.emit("[");
                for (i, argument) in node.arguments.iter().enumerate() {
                    if i != 0 {
                        self.emit(", ");
                    }
                    self.emit_expression(argument);
                }
                self.emit("]");
            }
            Expression::IndexSlice(node) => {
                self.emit_expression(&node.receiver);
                self.emit("[");
                if let Some(from) = &node.from {
                    self.emit_expression(from);
                }
                self.emit("..");
                if let Some(to) = &node.to {
                    self.emit_expression(to);
                }
                self.emit("]");
            }
            Expression::Identifier(identifier) => self.emit(identifier.data.as_str()),
            Expression::Nullable(nullable) => {
                self.emit_expression(&nullable.type_expression);
                self.emit("?");
            }
            Expression::LiteralNull(_) => self.emit("null"),
            Expression::LiteralUndefined(_) => self.emit("?"),
            Expression::LiteralBoolean(node) => {
                self.emit(if node.value { "true" } else { "false" })
            }
            Expression::LiteralInteger(node) => {
                if node.is_negated() {
                    self.emit("-");
                }
                self.emit(node.data.as_str());
            }
            Expression::LiteralCharacter(node) => {
                self.emit("'");
                self.emit(node.data.as_str());
                self.emit("'");
            }
            Expression::LiteralString(node) => self.emit_string(node),
            Expression::LiteralStringInterpolation(node) => {
                let quote = if node.parts[0].is_multiline { "\"\"\"" } else { "\"" };
                self.emit(quote);
                for (i, part) in node.parts.iter().enumerate() {
                    self.emit(part.data.as_str());
                    if i < node.expressions.len() {
                        self.emit("$(");
                        if let Some(format) = &node.formats[i] {
                            self.emit("%");
                            self.emit(format.data.as_str());
                            self.emit(" ");
                        }
                        self.emit_expression(&node.expressions[i]);
                        self.emit(")");
                    }
                }
                self.emit(quote);
            }
            Expression::LiteralFloat(node) => {
                if node.is_negated() {
                    self.emit("-");
                }
                self.emit(node.data.as_str());
            }
            Expression::LiteralArray(node) => {
                self.emit("[");
                self.emit_elements(&node.elements);
                self.emit("]");
            }
            Expression::LiteralList(node) => {
                self.emit("[");
                self.emit_elements(&node.elements);
                self.emit("]");
            }
            Expression::LiteralByteArray(node) => {
                self.emit("#[");
                self.emit_elements(&node.elements);
                self.emit("]");
            }
            Expression::LiteralSet(node) => {
                self.emit("{");
                self.emit_elements(&node.elements);
                self.emit("}");
            }
            Expression::LiteralMap(node) => {
                if node.keys.is_empty() {
                    self.emit("{:}");
                } else {
                    self.emit("{");
                    for (i, (key, value)) in node.keys.iter().zip(node.values.iter()).enumerate() {
                        if i != 0 {
                            self.emit(", ");
                        }
                        self.emit_expression(key);
                        self.emit(": ");
                        self.emit_expression(value);
                    }
                    self.emit("}");
                }
            }
        }
    }

    /// Emits a call argument, parenthesizing operator expressions so they
    /// don't merge with their neighbors when re-parsed.
    fn emit_argument(&mut self, argument: &Expression) {
        match argument {
            Expression::Binary(_) | Expression::Call(_) => {
                self.emit("(");
                self.emit_expression(argument);
                self.emit(")");
            }
            _ => self.emit_expression(argument),
        }
    }

    fn emit_body_expression(&mut self, body: &Expression) {
        match body {
            Expression::Sequence(sequence) => {
                self.emit_newline();
                self.indentation += 2;
                self.print_sequence_lines(sequence);
                self.indentation -= 2;
                self.emit_line_start();
            }
            _ => {
                self.emit(" ");
                self.emit_expression(body);
                self.emit(" ");
            }
        }
    }

    fn emit_elements(&mut self, elements: &[Expression]) {
        for (i, element) in elements.iter().enumerate() {
            if i != 0 {
                self.emit(", ");
            }
            self.emit_expression(element);
        }
    }

    fn emit_string(&mut self, node: &LiteralString) {
        let quote = if node.is_multiline { "\"\"\"" } else { "\"" };
        self.emit(quote);
        self.emit(node.data.as_str());
        self.emit(quote);
    }
}
