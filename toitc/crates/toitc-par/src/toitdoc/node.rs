//! Toitdoc node definitions.
//!
//! The structured form of a documentation comment: a list of sections, each
//! holding statements (code sections, itemized lists, paragraphs) built from
//! inline expressions (text, `code`, links, `$`-references).

use toitc_util::span::Range;
use toitc_util::symbol::Symbol;

use crate::ast;

/// A parsed toitdoc attached to a declaration (or the unit).
///
/// `$`-references inside the contents are stored as indices into `refs`,
/// which holds the AST produced by the main parser for each reference.
pub struct Toitdoc {
    pub contents: Contents,
    pub refs: Vec<ast::ToitdocReference>,
    /// The range of the comment text in the original source.
    pub range: Range,
}

/// The whole contents of a toitdoc block.
pub struct Contents {
    pub sections: Vec<Section>,
}

/// One section, introduced by `# title` (the first section of a comment has
/// no title).
pub struct Section {
    pub title: Option<Symbol>,
    /// How many `#` the title carried; 1 or more when a title is present.
    pub level: usize,
    pub statements: Vec<Statement>,
}

/// A toitdoc statement.
pub enum Statement {
    CodeSection(CodeSection),
    Itemized(Itemized),
    Paragraph(Paragraph),
}

/// A triple-backtick code block, kept verbatim.
pub struct CodeSection {
    pub code: Symbol,
}

/// A list of `-`/`*` items.
pub struct Itemized {
    pub items: Vec<Item>,
}

/// One list item; may hold nested statements.
pub struct Item {
    pub statements: Vec<Statement>,
}

/// A run of inline expressions.
pub struct Paragraph {
    pub expressions: Vec<DocExpression>,
}

/// An inline toitdoc expression.
pub enum DocExpression {
    Text(Text),
    Code(Code),
    Link(Link),
    Ref(Ref),
}

impl DocExpression {
    /// The surface text of the expression.
    pub fn text(&self) -> Symbol {
        match self {
            DocExpression::Text(node) => node.text,
            DocExpression::Code(node) => node.text,
            DocExpression::Link(node) => node.text,
            DocExpression::Ref(node) => node.text,
        }
    }

    /// A rendering suitable for warning messages.
    pub fn to_warning_string(&self) -> String {
        match self {
            DocExpression::Text(node) => node.text.as_str().to_string(),
            DocExpression::Code(node) => format!("`{}`", node.text),
            DocExpression::Link(node) => format!("'{}'", node.text),
            DocExpression::Ref(node) => format!("'{}'", node.text),
        }
    }
}

/// Plain text.
pub struct Text {
    pub text: Symbol,
}

/// Inline `` `code` ``.
pub struct Code {
    pub text: Symbol,
}

/// A `"text" (url)` link.
pub struct Link {
    pub text: Symbol,
    pub url: Symbol,
}

/// A `$`-reference, resolved through the main parser.
pub struct Ref {
    /// Index into the owning [`Toitdoc`]'s `refs`.
    pub id: usize,
    pub text: Symbol,
}

impl Paragraph {
    /// A rendering suitable for warning messages.
    pub fn to_warning_string(&self) -> String {
        self.expressions.iter().map(|e| e.to_warning_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_strings() {
        let text = DocExpression::Text(Text { text: Symbol::intern("hello ") });
        let code = DocExpression::Code(Code { text: Symbol::intern("x + 1") });
        let reference =
            DocExpression::Ref(Ref { id: 0, text: Symbol::intern("foo") });
        let paragraph = Paragraph { expressions: vec![text, code, reference] };
        assert_eq!(paragraph.to_warning_string(), "hello `x + 1`'foo'");
    }
}
