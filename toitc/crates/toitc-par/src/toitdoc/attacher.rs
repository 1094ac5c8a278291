//! Attaching toitdocs to declarations.
//!
//! After parsing, the sorted comments list is matched against the unit's
//! declarations: for each declaration the closest preceding comment is
//! found by binary search, checked for attachment (only whitespace and at
//! most one newline in between), widened over contiguous `///` runs, and
//! parsed into a [`Toitdoc`]. The first toitdoc in the file that is not
//! attached to any declaration becomes the unit's module toitdoc.

use std::cell::RefCell;

use toitc_lex::{Comment, SymbolCanonicalizer};
use toitc_util::diagnostic::{Diagnostics, WarningFilter};
use toitc_util::source::SourceAccess;
use toitc_util::span::Range;

use super::node::Toitdoc;
use super::parser::ToitdocParser;
use super::source::{extract_multiline_comment_text, extract_singleline_comment_text};
use crate::ast::{Declaration, Unit};

/// Manages all comments of a unit, finding toitdocs and associating them
/// with AST nodes.
pub(crate) struct CommentsManager<'a> {
    comments: &'a [Comment],
    source: &'a dyn SourceAccess,
    symbols: &'a RefCell<SymbolCanonicalizer>,
    diagnostics: &'a dyn Diagnostics,
    last_index: usize,
}

impl<'a> CommentsManager<'a> {
    pub(crate) fn new(
        comments: &'a [Comment],
        source: &'a dyn SourceAccess,
        symbols: &'a RefCell<SymbolCanonicalizer>,
        diagnostics: &'a dyn Diagnostics,
    ) -> Self {
        debug_assert!(is_sorted(comments));
        Self { comments, source, symbols, diagnostics, last_index: 0 }
    }

    /// The comment closest before the node, or `None` if none precedes it.
    ///
    /// The previous answer is cached; declaration lookups are mostly
    /// sorted, so the cache usually hits before the binary search runs.
    pub(crate) fn find_closest_before(&mut self, node_range: Range) -> Option<usize> {
        if self.comments.is_empty() {
            return None;
        }
        if node_range.is_before(self.comments[0].range) {
            return None;
        }
        let last = self.comments.len() - 1;
        if self.comments[last].range.is_before(node_range) {
            return Some(last);
        }

        if self.comments[self.last_index].range.is_before(node_range)
            && self
                .comments
                .get(self.last_index + 1)
                .is_some_and(|next| node_range.is_before(next.range))
        {
            return Some(self.last_index);
        }
        let mut start = 0;
        let mut end = last;
        while start < end {
            let mid = start + (end - start) / 2;
            if self.comments[mid].range.is_before(node_range) {
                if node_range.is_before(self.comments[mid + 1].range) {
                    self.last_index = mid;
                    return Some(mid);
                }
                start = mid + 1;
            } else {
                end = mid;
            }
        }
        None
    }

    fn is_attached_comments(&self, index1: usize, index2: usize) -> bool {
        self.is_attached(self.comments[index1].range, self.comments[index2].range, false)
    }

    /// Whether only whitespace plus at most one newline separates the two
    /// ranges.
    ///
    /// With `allow_modifiers`, one extra line without a `:` is tolerated
    /// between them. This is a workaround: declaration ranges don't include
    /// leading modifiers (like `static`), so the toitdoc of
    /// `/** doc */\nstatic foo:` would otherwise not attach. A `:` on that
    /// line would indicate a different declaration (`class A: foo:`).
    pub(crate) fn is_attached(
        &self,
        previous: Range,
        next: Range,
        allow_modifiers: bool,
    ) -> bool {
        let Some(start_offset) = self.source.offset_in_source(previous.to()) else {
            return false;
        };
        let Some(end_offset) = self.source.offset_in_source(next.from()) else {
            return false;
        };
        let text = self.source.text();
        let mut i = start_offset;
        while i < end_offset && text[i] == b' ' {
            i += 1;
        }
        if i == end_offset {
            return true;
        }
        if text[i] == b'\r' {
            i += 1;
        }
        if i == end_offset {
            return true;
        }
        if text[i] != b'\n' {
            return false;
        }
        i += 1;
        while i < end_offset && text[i] == b' ' {
            i += 1;
        }
        if i == end_offset {
            return true;
        }
        if !allow_modifiers {
            return false;
        }
        while i < end_offset {
            if text[i] == b'\n' || text[i] == b'\r' || text[i] == b':' {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Finds the toitdoc attached to a node at `node_range`, if any.
    ///
    /// The closest attached comment may be a plain comment; walking
    /// backwards over contiguous comments may still reach a toitdoc:
    ///
    /// ```text
    /// /** Toitdoc ... */
    /// // Some implementation comment.
    /// class SomeClass:
    /// ```
    pub(crate) fn find_for(&mut self, node_range: Range) -> Option<Toitdoc> {
        let closest = self.find_closest_before(node_range)?;
        if !self.is_attached(self.comments[closest].range, node_range, true) {
            return None;
        }
        let mut closest_toit = closest;
        loop {
            if self.comments[closest_toit].is_toitdoc {
                break;
            }
            if closest_toit == 0 {
                return None;
            }
            if !self.is_attached_comments(closest_toit - 1, closest_toit) {
                return None;
            }
            closest_toit -= 1;
        }
        Some(self.make_ast_toitdoc(closest_toit))
    }

    /// Extracts and parses the toitdoc anchored at `index`, widening
    /// single-line `///` comments over their contiguous run.
    pub(crate) fn make_ast_toitdoc(&mut self, index: usize) -> Toitdoc {
        let mut first_toit = index;
        let mut last_toit = index;
        if !self.comments[index].is_multiline {
            while first_toit > 0
                && !self.comments[first_toit - 1].is_multiline
                && self.comments[first_toit - 1].is_toitdoc
                && self.is_attached_comments(first_toit - 1, first_toit)
            {
                first_toit -= 1;
            }
            while last_toit < self.comments.len() - 1
                && !self.comments[last_toit + 1].is_multiline
                && self.comments[last_toit + 1].is_toitdoc
                && self.is_attached_comments(last_toit, last_toit + 1)
            {
                last_toit += 1;
            }
        }

        let range = self.comments[first_toit].range.extend(self.comments[last_toit].range);
        let from_offset =
            self.source.offset_in_source(range.from()).expect("comment is inside the source");
        let to_offset =
            self.source.offset_in_source(range.to()).expect("comment is inside the source");
        let collected = if self.comments[first_toit].is_multiline {
            extract_multiline_comment_text(self.source, from_offset, to_offset)
        } else {
            extract_singleline_comment_text(self.source, from_offset, to_offset)
        };
        ToitdocParser::new(&collected, self.symbols, self.diagnostics).parse()
    }
}

fn is_sorted(comments: &[Comment]) -> bool {
    comments.windows(2).all(|pair| pair[0].range.from().is_before(pair[1].range.from()))
}

/// Attaches toitdocs to the unit's declarations and class members, and
/// determines the unit's module toitdoc.
pub fn attach_toitdoc(
    unit: &mut Unit,
    comments: &[Comment],
    source: &dyn SourceAccess,
    symbols: &RefCell<SymbolCanonicalizer>,
    diagnostics: &dyn Diagnostics,
) {
    if comments.is_empty() {
        return;
    }
    // Toitdoc contents never fail a compilation.
    let toitdoc_diagnostics = WarningFilter::new(diagnostics);
    let mut manager = CommentsManager::new(comments, source, symbols, &toitdoc_diagnostics);

    let mut earliest_declaration: Option<usize> = None;
    for index in 0..unit.declarations.len() {
        let declaration_range = unit.declarations[index].range();
        let is_earlier = match earliest_declaration {
            None => true,
            Some(current) => declaration_range.is_before(unit.declarations[current].range()),
        };
        if is_earlier {
            earliest_declaration = Some(index);
        }

        match &mut unit.declarations[index] {
            Declaration::Class(class) => {
                class.toitdoc = manager.find_for(class.range);
                for member in &mut class.members {
                    let member_range = member.range();
                    if let Some(toitdoc) = manager.find_for(member_range) {
                        member.set_toitdoc(toitdoc);
                    }
                }
            }
            other => {
                let range = other.range();
                if let Some(toitdoc) = manager.find_for(range) {
                    other.set_toitdoc(toitdoc);
                }
            }
        }
    }

    for (index, comment) in comments.iter().enumerate() {
        if !comment.is_toitdoc {
            continue;
        }
        // This is the first toitdoc comment (the loop always breaks below).
        // It is the module comment if it sits before any declaration and
        // isn't already attached to one.
        let is_module_comment = match earliest_declaration {
            None => true,
            Some(earliest) => {
                let declaration = &unit.declarations[earliest];
                if declaration.range().is_before(comment.range) {
                    // The comment comes after the first declaration.
                    false
                } else {
                    match declaration.toitdoc() {
                        Some(toitdoc) => {
                            // A comment's range includes its delimiters; a
                            // toitdoc's range only the text. The comment is
                            // distinct only if it ends before the toitdoc
                            // begins.
                            comment.range.to().is_before(toitdoc.range.from())
                        }
                        None => true,
                    }
                }
            }
        };
        if is_module_comment {
            unit.toitdoc = Some(manager.make_ast_toitdoc(index));
        }
        break;
    }
}
