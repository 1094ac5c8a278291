//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! The front-end reports diagnostics as `{severity, range, message}` records
//! through the [`Diagnostics`] trait. Sinks use interior mutability so that
//! reporting works through a shared reference; the parser, scanner, and
//! toitdoc machinery all hold `&dyn Diagnostics`.
//!
//! Grouping is supported (`start_group`/`end_group`) so a primary error can
//! be followed by notes with cross-references.
//!
//! # Examples
//!
//! ```
//! use toitc_util::diagnostic::{Diagnostics, Handler};
//! use toitc_util::span::Range;
//!
//! let handler = Handler::new();
//! handler.report_error(Range::invalid(), "unexpected token".to_string());
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::span::Range;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// An error that prevents compilation from succeeding.
    Error,
    /// A warning that doesn't prevent compilation.
    Warning,
    /// Additional information attached to a grouped diagnostic.
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with severity and location.
///
/// The range may be invalid for file-level problems (e.g. load errors).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level.
    pub severity: Severity,
    /// Source range the message points at.
    pub range: Range,
    /// The formatted message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(severity: Severity, range: Range, message: impl Into<String>) -> Self {
        Self { severity, range, message: message.into() }
    }

    /// Creates an error diagnostic.
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, range, message)
    }

    /// Creates a warning diagnostic.
    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, range, message)
    }

    /// Creates a note diagnostic.
    pub fn note(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Note, range, message)
    }
}

/// A sink for diagnostics.
///
/// Implementations must be usable through a shared reference (interior
/// mutability), since many collaborators hold the sink at once.
pub trait Diagnostics {
    /// Reports a single diagnostic.
    fn report(&self, diagnostic: Diagnostic);

    /// Starts a diagnostic group. The next error is the group's primary
    /// diagnostic; subsequent notes belong to it.
    fn start_group(&self) {}

    /// Ends the current diagnostic group.
    fn end_group(&self) {}

    /// Whether any error has been reported to this sink.
    fn encountered_error(&self) -> bool {
        false
    }

    /// Reports an error at the given range.
    fn report_error(&self, range: Range, message: String) {
        self.report(Diagnostic::error(range, message));
    }

    /// Reports a warning at the given range.
    fn report_warning(&self, range: Range, message: String) {
        self.report(Diagnostic::warning(range, message));
    }

    /// Reports a note at the given range.
    fn report_note(&self, range: Range, message: String) {
        self.report(Diagnostic::note(range, message));
    }
}

/// Collecting diagnostics sink.
///
/// Accumulates all reported diagnostics for later inspection or printing.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
    group_depth: Cell<u32>,
    errors: Cell<usize>,
    warnings: Cell<usize>,
}

impl Handler {
    /// Creates a new, empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }

    /// The number of reported errors.
    pub fn error_count(&self) -> usize {
        self.errors.get()
    }

    /// The number of reported warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.get()
    }

    /// All reported diagnostics, in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Clears all reported diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
        self.errors.set(0);
        self.warnings.set(0);
    }
}

impl Diagnostics for Handler {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.set(self.errors.get() + 1),
            Severity::Warning => self.warnings.set(self.warnings.get() + 1),
            Severity::Note => {}
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    fn start_group(&self) {
        self.group_depth.set(self.group_depth.get() + 1);
    }

    fn end_group(&self) {
        debug_assert!(self.group_depth.get() > 0);
        self.group_depth.set(self.group_depth.get().saturating_sub(1));
    }

    fn encountered_error(&self) -> bool {
        self.has_errors()
    }
}

/// A sink that drops everything.
///
/// The toitdoc-reference path scans with a `NullDiagnostics` so scanner
/// errors inside comments don't surface.
#[derive(Default)]
pub struct NullDiagnostics;

impl NullDiagnostics {
    /// Creates a new null sink.
    pub fn new() -> Self {
        Self
    }
}

impl Diagnostics for NullDiagnostics {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Severity-adjusting adapter: demotes errors to warnings.
///
/// Toitdoc contents should never fail a compilation; all diagnostics from
/// the toitdoc parser pass through this filter.
pub struct WarningFilter<'a> {
    wrapped: &'a dyn Diagnostics,
}

impl<'a> WarningFilter<'a> {
    /// Wraps the given sink.
    pub fn new(wrapped: &'a dyn Diagnostics) -> Self {
        Self { wrapped }
    }
}

impl<'a> Diagnostics for WarningFilter<'a> {
    fn report(&self, mut diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            diagnostic.severity = Severity::Warning;
        }
        self.wrapped.report(diagnostic);
    }

    fn start_group(&self) {
        self.wrapped.start_group();
    }

    fn end_group(&self) {
        self.wrapped.end_group();
    }

    fn encountered_error(&self) -> bool {
        self.wrapped.encountered_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Error), "error");
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Note), "note");
    }

    #[test]
    fn test_handler_counts() {
        let handler = Handler::new();
        assert!(!handler.has_errors());
        handler.report_error(Range::invalid(), "e".to_string());
        handler.report_warning(Range::invalid(), "w".to_string());
        handler.report_note(Range::invalid(), "n".to_string());
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.diagnostics().len(), 3);
    }

    #[test]
    fn test_handler_clear() {
        let handler = Handler::new();
        handler.report_error(Range::invalid(), "e".to_string());
        handler.clear();
        assert!(!handler.has_errors());
        assert!(handler.diagnostics().is_empty());
    }

    #[test]
    fn test_handler_groups() {
        let handler = Handler::new();
        handler.start_group();
        handler.report_error(Range::invalid(), "primary".to_string());
        handler.report_note(Range::invalid(), "related".to_string());
        handler.end_group();
        assert_eq!(handler.diagnostics().len(), 2);
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn test_null_diagnostics() {
        let null = NullDiagnostics::new();
        null.report_error(Range::invalid(), "dropped".to_string());
        assert!(!null.encountered_error());
    }

    #[test]
    fn test_warning_filter_demotes_errors() {
        let handler = Handler::new();
        let filter = WarningFilter::new(&handler);
        filter.report_error(Range::invalid(), "demoted".to_string());
        assert!(!handler.has_errors());
        assert_eq!(handler.warning_count(), 1);
        assert_eq!(handler.diagnostics()[0].severity, Severity::Warning);
    }

    #[test]
    fn test_warning_filter_keeps_notes() {
        let handler = Handler::new();
        let filter = WarningFilter::new(&handler);
        filter.report_note(Range::invalid(), "note".to_string());
        assert_eq!(handler.diagnostics()[0].severity, Severity::Note);
    }
}
