//! Toitdoc: the structured documentation-comment mini-language.
//!
//! `///` runs and `/** ... */` blocks are extracted into a synthetic source
//! whose offsets map back to the real file ([`source`]), parsed as a
//! nested, indentation-sensitive mini-language ([`parser`]), and attached
//! to their nearest following declaration ([`attacher`]).

mod attacher;
mod node;
mod parser;
mod source;

pub use attacher::attach_toitdoc;
pub use node::{
    Code, CodeSection, Contents, DocExpression, Item, Itemized, Link, Paragraph, Ref, Section,
    Statement, Text, Toitdoc,
};
pub use parser::ToitdocParser;
pub use source::{
    extract_multiline_comment_text, extract_singleline_comment_text, ToitdocSource,
    ToitdocTextBuilder,
};
