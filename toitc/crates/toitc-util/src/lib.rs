//! toitc-util - Core Utilities and Foundation Types
//!
//! Foundation types shared by every phase of the toitc front-end:
//!
//! - [`symbol`] - interned identifier/literal handles with identity equality
//! - [`span`] - the dense global position space and source ranges
//! - [`source`] - loaded file texts and the [`source::SourceManager`]
//! - [`diagnostic`] - severity-tagged diagnostics and sinks
//! - [`fs`] - the filesystem capability the source manager reads through
//!
//! The symbol table is process-global and thread-safe; everything else is
//! owned by a single compilation: one thread drives the scanner and parser
//! synchronously.

pub mod diagnostic;
pub mod fs;
pub mod source;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Diagnostics, Handler, NullDiagnostics, Severity, WarningFilter};
pub use fs::{Filesystem, Package, StdFilesystem};
pub use source::{
    is_virtual_file, LoadError, LoadResult, Location, Source, SourceAccess, SourceManager,
    LSP_SELECTION_MARKER, VIRTUAL_FILE_PREFIX,
};
pub use span::{Position, Range};
pub use symbol::{symbols, Symbol, KNOWN_SYMBOLS_TEXTS};
