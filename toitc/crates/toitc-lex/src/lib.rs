//! toitc-lex - Lexical Analyzer (Scanner)
//!
//! The scanner for an indentation-sensitive language. It produces
//! [`ScannerState`] records rather than bare tokens: each state carries the
//! token kind, the token's offsets, an optional data symbol, the indentation
//! of its line, and whether the token was *attached* (no whitespace before
//! it) - the parser uses attachment to disambiguate operator clusters like
//! `foo.bar` vs `foo .bar` and `[..]`.
//!
//! Components:
//! - [`token`] - the token table with syntax and precedence
//! - [`canon`] - trie-based canonicalization of identifiers and numbers
//! - [`scanner`] - the scanner with its mode-switching entry points

pub mod canon;
pub mod scanner;
pub mod token;

mod edge_cases;

pub use canon::{SymbolCanonicalizer, TokenSymbol};
pub use scanner::{is_identifier_part, is_identifier_start, Comment, Scanner, ScannerState, TAB_WIDTH};
pub use token::{Precedence, Token};
