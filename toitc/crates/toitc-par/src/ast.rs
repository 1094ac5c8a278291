//! AST node definitions.
//!
//! The tree is an owned `Box`/`Vec` structure: a [`Unit`] owns every node
//! below it, and dropping the unit releases the whole tree. Every node
//! carries its source [`Range`].
//!
//! The tree is immutable once constructed, except for:
//! - toitdoc attachments, set by the attacher after parsing,
//! - unit declarations, cleared on a fatal recursion-depth error,
//! - [`If::set_no`] for else-branches grafted bottom-up,
//! - [`LiteralInteger::set_is_negated`]/[`LiteralFloat::set_is_negated`]
//!   when a leading `-` folds into the literal.

use toitc_lex::Token;
use toitc_util::span::Range;
use toitc_util::symbol::Symbol;

use crate::toitdoc::Toitdoc;

/// A parsed compilation unit.
pub struct Unit {
    /// Whether this unit stands in for a file that could not be loaded.
    pub is_error_unit: bool,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub declarations: Vec<Declaration>,
    /// The module-level toitdoc (the first unattached toitdoc in the file).
    pub toitdoc: Option<Toitdoc>,
    pub range: Range,
}

impl Unit {
    /// A unit representing a file that failed to load.
    pub fn error_unit() -> Unit {
        Unit {
            is_error_unit: true,
            imports: Vec::new(),
            exports: Vec::new(),
            declarations: Vec::new(),
            toitdoc: None,
            range: Range::invalid(),
        }
    }
}

/// `import [.|..]* segment(.segment)* [as prefix | show (ids|*)]`
pub struct Import {
    pub is_relative: bool,
    /// The number of dot-outs. `import ...foo` has 2: the first dot only
    /// signals that the import is relative.
    pub dot_outs: usize,
    pub segments: Vec<Identifier>,
    /// The `as` prefix, if any.
    pub prefix: Option<Identifier>,
    pub show_identifiers: Vec<Identifier>,
    pub show_all: bool,
    pub range: Range,
}

/// `export *` or `export ident+`
pub struct Export {
    pub identifiers: Vec<Identifier>,
    pub export_all: bool,
    pub range: Range,
}

/// A top-level or class-level declaration.
pub enum Declaration {
    Class(Box<Class>),
    Field(Box<Field>),
    Method(Box<Method>),
}

impl Declaration {
    pub fn range(&self) -> Range {
        match self {
            Declaration::Class(node) => node.range,
            Declaration::Field(node) => node.range,
            Declaration::Method(node) => node.range,
        }
    }

    pub fn toitdoc(&self) -> Option<&Toitdoc> {
        match self {
            Declaration::Class(node) => node.toitdoc.as_ref(),
            Declaration::Field(node) => node.toitdoc.as_ref(),
            Declaration::Method(node) => node.toitdoc.as_ref(),
        }
    }

    pub fn set_toitdoc(&mut self, toitdoc: Toitdoc) {
        match self {
            Declaration::Class(node) => node.toitdoc = Some(toitdoc),
            Declaration::Field(node) => node.toitdoc = Some(toitdoc),
            Declaration::Method(node) => node.toitdoc = Some(toitdoc),
        }
    }
}

/// `[abstract] (class|monitor|interface) name [[extends] type]
/// [implements type+]: member*`
pub struct Class {
    pub name: Identifier,
    /// Either an identifier or a prefixed identifier (a `Dot`).
    pub super_class: Option<Expression>,
    pub interfaces: Vec<Expression>,
    pub members: Vec<Declaration>,
    pub is_abstract: bool,
    pub is_monitor: bool,
    pub is_interface: bool,
    pub toitdoc: Option<Toitdoc>,
    pub range: Range,
}

/// A field or global: `name [/type] (:= expr | ::= expr | /type)`.
pub struct Field {
    pub name: Identifier,
    pub type_annotation: Option<Expression>,
    pub initializer: Option<Expression>,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_final: bool,
    pub toitdoc: Option<Toitdoc>,
    pub range: Range,
}

/// A method, global function, constructor, or setter.
pub struct Method {
    /// An `Identifier`, a `Dot` (named constructor), or `Error`.
    pub name: Expression,
    pub return_type: Option<Expression>,
    /// Whether the name carried an attached `=` suffix.
    pub is_setter: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub parameters: Vec<Parameter>,
    /// Missing for abstract/interface members.
    pub body: Option<Sequence>,
    pub toitdoc: Option<Toitdoc>,
    pub range: Range,
}

impl Method {
    /// The arity, including block parameters but not the implicit `this`.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// A parameter of a method, block, or lambda.
pub struct Parameter {
    pub name: Identifier,
    pub type_annotation: Option<Expression>,
    pub default_value: Option<Expression>,
    /// Introduced with `--`.
    pub is_named: bool,
    /// `this.x` or `.x` forms that store directly to a field.
    pub is_field_storing: bool,
    /// Bracket-wrapped block parameter.
    pub is_block: bool,
    pub range: Range,
}

/// An identifier use.
///
/// When `is_lsp_selection` is set, this identifier is the editor's cursor
/// target (accepted everywhere an identifier is accepted).
pub struct Identifier {
    pub data: Symbol,
    pub is_lsp_selection: bool,
    pub range: Range,
}

impl Identifier {
    pub fn new(data: Symbol, range: Range) -> Identifier {
        Identifier { data, is_lsp_selection: false, range }
    }
}

/// A toitdoc cross-reference (`$foo`, `$bar.baz=`, `$(name params)`).
pub struct ToitdocReference {
    /// Whether the reference was parenthesized and selects an overload by
    /// its full signature.
    pub is_signature_reference: bool,
    /// An `Identifier` (possibly an operator name), a `Dot`, or `Error`.
    pub target: Expression,
    /// Whether the target was suffixed with `=` (a setter).
    pub is_setter: bool,
    pub parameters: Vec<Parameter>,
    pub range: Range,
}

impl ToitdocReference {
    pub fn is_error(&self) -> bool {
        matches!(self.target, Expression::Error(_))
    }
}

/// Expressions (including statement-position constructs; the language is
/// expression oriented).
pub enum Expression {
    Error(Error),
    NamedArgument(Box<NamedArgument>),
    BreakContinue(Box<BreakContinue>),
    Parenthesis(Box<Parenthesis>),
    Block(Box<Block>),
    Lambda(Box<Lambda>),
    Sequence(Box<Sequence>),
    DeclarationLocal(Box<DeclarationLocal>),
    If(Box<If>),
    While(Box<While>),
    For(Box<For>),
    TryFinally(Box<TryFinally>),
    Return(Box<Return>),
    Unary(Box<Unary>),
    Binary(Box<Binary>),
    Call(Box<Call>),
    Dot(Box<Dot>),
    Index(Box<Index>),
    IndexSlice(Box<IndexSlice>),
    Identifier(Box<Identifier>),
    Nullable(Box<Nullable>),
    LiteralNull(LiteralNull),
    LiteralUndefined(LiteralUndefined),
    LiteralBoolean(LiteralBoolean),
    LiteralInteger(LiteralInteger),
    LiteralCharacter(LiteralCharacter),
    LiteralString(LiteralString),
    LiteralStringInterpolation(Box<LiteralStringInterpolation>),
    LiteralFloat(LiteralFloat),
    LiteralArray(Box<LiteralArray>),
    LiteralList(Box<LiteralList>),
    LiteralByteArray(Box<LiteralByteArray>),
    LiteralSet(Box<LiteralSet>),
    LiteralMap(Box<LiteralMap>),
}

impl Expression {
    /// The source range of this expression.
    pub fn range(&self) -> Range {
        match self {
            Expression::Error(node) => node.range,
            Expression::NamedArgument(node) => node.range,
            Expression::BreakContinue(node) => node.range,
            Expression::Parenthesis(node) => node.range,
            Expression::Block(node) => node.range,
            Expression::Lambda(node) => node.range,
            Expression::Sequence(node) => node.range,
            Expression::DeclarationLocal(node) => node.range,
            Expression::If(node) => node.range,
            Expression::While(node) => node.range,
            Expression::For(node) => node.range,
            Expression::TryFinally(node) => node.range,
            Expression::Return(node) => node.range,
            Expression::Unary(node) => node.range,
            Expression::Binary(node) => node.range,
            Expression::Call(node) => node.range,
            Expression::Dot(node) => node.range,
            Expression::Index(node) => node.range,
            Expression::IndexSlice(node) => node.range,
            Expression::Identifier(node) => node.range,
            Expression::Nullable(node) => node.range,
            Expression::LiteralNull(node) => node.range,
            Expression::LiteralUndefined(node) => node.range,
            Expression::LiteralBoolean(node) => node.range,
            Expression::LiteralInteger(node) => node.range,
            Expression::LiteralCharacter(node) => node.range,
            Expression::LiteralString(node) => node.range,
            Expression::LiteralStringInterpolation(node) => node.range,
            Expression::LiteralFloat(node) => node.range,
            Expression::LiteralArray(node) => node.range,
            Expression::LiteralList(node) => node.range,
            Expression::LiteralByteArray(node) => node.range,
            Expression::LiteralSet(node) => node.range,
            Expression::LiteralMap(node) => node.range,
        }
    }

    /// Sets the range (used when a prefix folds into the node).
    pub fn set_range(&mut self, range: Range) {
        match self {
            Expression::Error(node) => node.range = range,
            Expression::NamedArgument(node) => node.range = range,
            Expression::BreakContinue(node) => node.range = range,
            Expression::Parenthesis(node) => node.range = range,
            Expression::Block(node) => node.range = range,
            Expression::Lambda(node) => node.range = range,
            Expression::Sequence(node) => node.range = range,
            Expression::DeclarationLocal(node) => node.range = range,
            Expression::If(node) => node.range = range,
            Expression::While(node) => node.range = range,
            Expression::For(node) => node.range = range,
            Expression::TryFinally(node) => node.range = range,
            Expression::Return(node) => node.range = range,
            Expression::Unary(node) => node.range = range,
            Expression::Binary(node) => node.range = range,
            Expression::Call(node) => node.range = range,
            Expression::Dot(node) => node.range = range,
            Expression::Index(node) => node.range = range,
            Expression::IndexSlice(node) => node.range = range,
            Expression::Identifier(node) => node.range = range,
            Expression::Nullable(node) => node.range = range,
            Expression::LiteralNull(node) => node.range = range,
            Expression::LiteralUndefined(node) => node.range = range,
            Expression::LiteralBoolean(node) => node.range = range,
            Expression::LiteralInteger(node) => node.range = range,
            Expression::LiteralCharacter(node) => node.range = range,
            Expression::LiteralString(node) => node.range = range,
            Expression::LiteralStringInterpolation(node) => node.range = range,
            Expression::LiteralFloat(node) => node.range = range,
            Expression::LiteralArray(node) => node.range = range,
            Expression::LiteralList(node) => node.range = range,
            Expression::LiteralByteArray(node) => node.range = range,
            Expression::LiteralSet(node) => node.range = range,
            Expression::LiteralMap(node) => node.range = range,
        }
    }

    /// Convenience constructor for identifier expressions.
    pub fn identifier(identifier: Identifier) -> Expression {
        Expression::Identifier(Box::new(identifier))
    }

    /// The identifier inside, if this is one.
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Expression::Identifier(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Expression::Error(_))
    }
}

/// Sentinel for positions where an expression was required but could not be
/// parsed.
pub struct Error {
    pub range: Range,
}

/// `--name expr`, `--flag`, or `--no-flag`.
pub struct NamedArgument {
    pub name: Identifier,
    /// Whether the name was prefixed with `no-`.
    pub inverted: bool,
    /// Missing for boolean flags.
    pub expression: Option<Expression>,
    pub range: Range,
}

/// `break`/`continue`, optionally `.label`, optionally with a value.
pub struct BreakContinue {
    pub is_break: bool,
    pub value: Option<Expression>,
    pub label: Option<Identifier>,
    pub range: Range,
}

/// `(expr)`
pub struct Parenthesis {
    pub expression: Expression,
    pub range: Range,
}

/// `: body` with optional `|params|`.
pub struct Block {
    pub body: Sequence,
    pub parameters: Vec<Parameter>,
    pub range: Range,
}

/// `:: body` with optional `|params|`.
pub struct Lambda {
    pub body: Sequence,
    pub parameters: Vec<Parameter>,
    pub range: Range,
}

/// A run of expressions at uniform indentation.
pub struct Sequence {
    pub expressions: Vec<Expression>,
    pub range: Range,
}

/// `name [/type] (:= | ::=) value`
pub struct DeclarationLocal {
    /// `Token::Define` or `Token::DefineFinal`.
    pub kind: Token,
    pub name: Identifier,
    pub type_annotation: Option<Expression>,
    pub value: Expression,
    pub range: Range,
}

/// `if cond: yes [else: no]` and the `cond ? yes : no` ternary.
pub struct If {
    pub expression: Expression,
    pub yes: Expression,
    pub no: Option<Expression>,
    pub range: Range,
}

impl If {
    /// Grafts the else-branch (used by bottom-up else-if chains).
    pub fn set_no(&mut self, no: Expression) {
        debug_assert!(self.no.is_none());
        self.no = Some(no);
    }
}

/// `while cond: body`
pub struct While {
    pub condition: Expression,
    pub body: Expression,
    pub range: Range,
}

/// `for init; cond; update: body`
pub struct For {
    pub initializer: Option<Expression>,
    pub condition: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Expression,
    pub range: Range,
}

/// `try: body finally [|params|]: handler`
pub struct TryFinally {
    pub body: Sequence,
    pub handler_parameters: Vec<Parameter>,
    pub handler: Sequence,
    pub range: Range,
}

/// `return [value]`
pub struct Return {
    pub value: Option<Expression>,
    pub range: Range,
}

/// Prefix or postfix unary operation.
pub struct Unary {
    pub kind: Token,
    pub prefix: bool,
    pub expression: Expression,
    pub range: Range,
}

/// Binary operation.
pub struct Binary {
    pub kind: Token,
    pub left: Expression,
    pub right: Expression,
    pub range: Range,
}

/// `target arg*`
pub struct Call {
    pub target: Expression,
    pub arguments: Vec<Expression>,
    /// Whether this is a `#primitive` invocation.
    pub is_call_primitive: bool,
    pub range: Range,
}

/// `receiver.name`
pub struct Dot {
    pub receiver: Expression,
    pub name: Identifier,
    pub range: Range,
}

/// `receiver[arg, ...]`
pub struct Index {
    pub receiver: Expression,
    pub arguments: Vec<Expression>,
    pub range: Range,
}

/// `receiver[from..to]` (both bounds optional).
pub struct IndexSlice {
    pub receiver: Expression,
    pub from: Option<Expression>,
    pub to: Option<Expression>,
    pub range: Range,
}

/// `type?`
pub struct Nullable {
    pub type_expression: Expression,
    pub range: Range,
}

/// `null`
pub struct LiteralNull {
    pub range: Range,
}

/// The `?` "undefined" initializer.
pub struct LiteralUndefined {
    pub range: Range,
}

/// `true` / `false`
pub struct LiteralBoolean {
    pub value: bool,
    pub range: Range,
}

/// An integer literal; the payload is the canonicalized source text.
pub struct LiteralInteger {
    pub data: Symbol,
    is_negated: bool,
    pub range: Range,
}

impl LiteralInteger {
    pub fn new(data: Symbol, range: Range) -> LiteralInteger {
        LiteralInteger { data, is_negated: false, range }
    }

    pub fn is_negated(&self) -> bool {
        self.is_negated
    }

    pub fn set_is_negated(&mut self, value: bool) {
        self.is_negated = value;
    }
}

/// A character literal; the payload is the raw source text between quotes.
pub struct LiteralCharacter {
    pub data: Symbol,
    pub range: Range,
}

/// A string literal (or one part of an interpolated string).
pub struct LiteralString {
    pub data: Symbol,
    pub is_multiline: bool,
    pub range: Range,
}

/// `"a$(x)b"`: `parts` has one more entry than `expressions`; `formats[i]`
/// is the optional `%`-format of `expressions[i]`.
pub struct LiteralStringInterpolation {
    pub parts: Vec<LiteralString>,
    pub formats: Vec<Option<LiteralString>>,
    pub expressions: Vec<Expression>,
    pub range: Range,
}

/// A float literal; the payload is the canonicalized source text.
pub struct LiteralFloat {
    pub data: Symbol,
    is_negated: bool,
    pub range: Range,
}

impl LiteralFloat {
    pub fn new(data: Symbol, range: Range) -> LiteralFloat {
        LiteralFloat { data, is_negated: false, range }
    }

    pub fn is_negated(&self) -> bool {
        self.is_negated
    }

    pub fn set_is_negated(&mut self, value: bool) {
        self.is_negated = value;
    }
}

/// A fixed-size array literal (internal).
pub struct LiteralArray {
    pub elements: Vec<Expression>,
    pub range: Range,
}

/// `[a, b, c]`
pub struct LiteralList {
    pub elements: Vec<Expression>,
    pub range: Range,
}

/// `#[a, b, c]`
pub struct LiteralByteArray {
    pub elements: Vec<Expression>,
    pub range: Range,
}

/// `{a, b}` (note: `{}` is an empty set).
pub struct LiteralSet {
    pub elements: Vec<Expression>,
    pub range: Range,
}

/// `{k: v, ...}` (the empty map is `{:}`).
pub struct LiteralMap {
    pub keys: Vec<Expression>,
    pub values: Vec<Expression>,
    pub range: Range,
}

// ============================================================================
// VISITOR
// ============================================================================

/// A visitor over the AST.
///
/// Every `visit_*` method defaults to visiting the node's children, so an
/// implementation overriding nothing traverses the whole tree; override the
/// hooks you care about and call the matching `walk_*` to keep descending.
pub trait Visitor {
    fn visit_unit(&mut self, node: &Unit) {
        walk_unit(self, node);
    }
    fn visit_import(&mut self, node: &Import) {
        walk_import(self, node);
    }
    fn visit_export(&mut self, node: &Export) {
        let _ = node;
    }
    fn visit_declaration(&mut self, node: &Declaration) {
        walk_declaration(self, node);
    }
    fn visit_class(&mut self, node: &Class) {
        walk_class(self, node);
    }
    fn visit_field(&mut self, node: &Field) {
        walk_field(self, node);
    }
    fn visit_method(&mut self, node: &Method) {
        walk_method(self, node);
    }
    fn visit_parameter(&mut self, node: &Parameter) {
        walk_parameter(self, node);
    }
    fn visit_identifier(&mut self, node: &Identifier) {
        let _ = node;
    }
    fn visit_toitdoc_reference(&mut self, node: &ToitdocReference) {
        walk_toitdoc_reference(self, node);
    }
    fn visit_expression(&mut self, node: &Expression) {
        walk_expression(self, node);
    }
    fn visit_sequence(&mut self, node: &Sequence) {
        walk_sequence(self, node);
    }
}

pub fn walk_unit<V: Visitor + ?Sized>(visitor: &mut V, node: &Unit) {
    for import in &node.imports {
        visitor.visit_import(import);
    }
    for export in &node.exports {
        visitor.visit_export(export);
    }
    for declaration in &node.declarations {
        visitor.visit_declaration(declaration);
    }
}

pub fn walk_import<V: Visitor + ?Sized>(visitor: &mut V, node: &Import) {
    for segment in &node.segments {
        visitor.visit_identifier(segment);
    }
    if let Some(prefix) = &node.prefix {
        visitor.visit_identifier(prefix);
    }
    for shown in &node.show_identifiers {
        visitor.visit_identifier(shown);
    }
}

pub fn walk_declaration<V: Visitor + ?Sized>(visitor: &mut V, node: &Declaration) {
    match node {
        Declaration::Class(class) => visitor.visit_class(class),
        Declaration::Field(field) => visitor.visit_field(field),
        Declaration::Method(method) => visitor.visit_method(method),
    }
}

pub fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, node: &Class) {
    visitor.visit_identifier(&node.name);
    if let Some(super_class) = &node.super_class {
        visitor.visit_expression(super_class);
    }
    for interface in &node.interfaces {
        visitor.visit_expression(interface);
    }
    for member in &node.members {
        visitor.visit_declaration(member);
    }
}

pub fn walk_field<V: Visitor + ?Sized>(visitor: &mut V, node: &Field) {
    visitor.visit_identifier(&node.name);
    if let Some(type_annotation) = &node.type_annotation {
        visitor.visit_expression(type_annotation);
    }
    if let Some(initializer) = &node.initializer {
        visitor.visit_expression(initializer);
    }
}

pub fn walk_method<V: Visitor + ?Sized>(visitor: &mut V, node: &Method) {
    visitor.visit_expression(&node.name);
    if let Some(return_type) = &node.return_type {
        visitor.visit_expression(return_type);
    }
    for parameter in &node.parameters {
        visitor.visit_parameter(parameter);
    }
    if let Some(body) = &node.body {
        visitor.visit_sequence(body);
    }
}

pub fn walk_parameter<V: Visitor + ?Sized>(visitor: &mut V, node: &Parameter) {
    visitor.visit_identifier(&node.name);
    if let Some(type_annotation) = &node.type_annotation {
        visitor.visit_expression(type_annotation);
    }
    if let Some(default_value) = &node.default_value {
        visitor.visit_expression(default_value);
    }
}

pub fn walk_toitdoc_reference<V: Visitor + ?Sized>(visitor: &mut V, node: &ToitdocReference) {
    visitor.visit_expression(&node.target);
    for parameter in &node.parameters {
        visitor.visit_parameter(parameter);
    }
}

pub fn walk_sequence<V: Visitor + ?Sized>(visitor: &mut V, node: &Sequence) {
    for expression in &node.expressions {
        visitor.visit_expression(expression);
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, node: &Expression) {
    match node {
        Expression::Error(_) => {}
        Expression::NamedArgument(named) => {
            visitor.visit_identifier(&named.name);
            if let Some(expression) = &named.expression {
                visitor.visit_expression(expression);
            }
        }
        Expression::BreakContinue(bc) => {
            if let Some(label) = &bc.label {
                visitor.visit_identifier(label);
            }
            if let Some(value) = &bc.value {
                visitor.visit_expression(value);
            }
        }
        Expression::Parenthesis(parenthesis) => visitor.visit_expression(&parenthesis.expression),
        Expression::Block(block) => {
            for parameter in &block.parameters {
                visitor.visit_parameter(parameter);
            }
            visitor.visit_sequence(&block.body);
        }
        Expression::Lambda(lambda) => {
            for parameter in &lambda.parameters {
                visitor.visit_parameter(parameter);
            }
            visitor.visit_sequence(&lambda.body);
        }
        Expression::Sequence(sequence) => visitor.visit_sequence(sequence),
        Expression::DeclarationLocal(declaration) => {
            visitor.visit_identifier(&declaration.name);
            if let Some(type_annotation) = &declaration.type_annotation {
                visitor.visit_expression(type_annotation);
            }
            visitor.visit_expression(&declaration.value);
        }
        Expression::If(node) => {
            visitor.visit_expression(&node.expression);
            visitor.visit_expression(&node.yes);
            if let Some(no) = &node.no {
                visitor.visit_expression(no);
            }
        }
        Expression::While(node) => {
            visitor.visit_expression(&node.condition);
            visitor.visit_expression(&node.body);
        }
        Expression::For(node) => {
            if let Some(initializer) = &node.initializer {
                visitor.visit_expression(initializer);
            }
            if let Some(condition) = &node.condition {
                visitor.visit_expression(condition);
            }
            if let Some(update) = &node.update {
                visitor.visit_expression(update);
            }
            visitor.visit_expression(&node.body);
        }
        Expression::TryFinally(node) => {
            visitor.visit_sequence(&node.body);
            for parameter in &node.handler_parameters {
                visitor.visit_parameter(parameter);
            }
            visitor.visit_sequence(&node.handler);
        }
        Expression::Return(node) => {
            if let Some(value) = &node.value {
                visitor.visit_expression(value);
            }
        }
        Expression::Unary(node) => visitor.visit_expression(&node.expression),
        Expression::Binary(node) => {
            visitor.visit_expression(&node.left);
            visitor.visit_expression(&node.right);
        }
        Expression::Call(node) => {
            visitor.visit_expression(&node.target);
            for argument in &node.arguments {
                visitor.visit_expression(argument);
            }
        }
        Expression::Dot(node) => {
            visitor.visit_expression(&node.receiver);
            visitor.visit_identifier(&node.name);
        }
        Expression::Index(node) => {
            visitor.visit_expression(&node.receiver);
            for argument in &node.arguments {
                visitor.visit_expression(argument);
            }
        }
        Expression::IndexSlice(node) => {
            visitor.visit_expression(&node.receiver);
            if let Some(from) = &node.from {
                visitor.visit_expression(from);
            }
            if let Some(to) = &node.to {
                visitor.visit_expression(to);
            }
        }
        Expression::Identifier(identifier) => visitor.visit_identifier(identifier),
        Expression::Nullable(nullable) => visitor.visit_expression(&nullable.type_expression),
        Expression::LiteralNull(_)
        | Expression::LiteralUndefined(_)
        | Expression::LiteralBoolean(_)
        | Expression::LiteralInteger(_)
        | Expression::LiteralCharacter(_)
        | Expression::LiteralString(_)
        | Expression::LiteralFloat(_) => {}
        Expression::LiteralStringInterpolation(interpolation) => {
            for expression in &interpolation.expressions {
                visitor.visit_expression(expression);
            }
        }
        Expression::LiteralArray(array) => {
            for element in &array.elements {
                visitor.visit_expression(element);
            }
        }
        Expression::LiteralList(list) => {
            for element in &list.elements {
                visitor.visit_expression(element);
            }
        }
        Expression::LiteralByteArray(bytes) => {
            for element in &bytes.elements {
                visitor.visit_expression(element);
            }
        }
        Expression::LiteralSet(set) => {
            for element in &set.elements {
                visitor.visit_expression(element);
            }
        }
        Expression::LiteralMap(map) => {
            for (key, value) in map.keys.iter().zip(map.values.iter()) {
                visitor.visit_expression(key);
                visitor.visit_expression(value);
            }
        }
    }
}
