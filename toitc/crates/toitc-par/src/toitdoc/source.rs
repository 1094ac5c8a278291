//! The extracted text of a toitdoc comment, with a mapping back to the
//! original source.
//!
//! Toitdoc blocks are parsed from a cleaned-up text: `///` runs lose their
//! delimiters, `/** ... */` blocks lose their delimiters and leading
//! indentation. A [`ToitdocSource`] records, per line, where the cleaned
//! text came from, so diagnostics and reference ranges carry correct
//! positions in the real file.

use std::borrow::Cow;

use toitc_util::source::SourceAccess;
use toitc_util::span::{Position, Range};

/// All the toitdoc text, with a mapping to the underlying source.
pub struct ToitdocSource<'s> {
    source: &'s dyn SourceAccess,
    /// Cleaned text plus a NUL sentinel.
    text: Box<[u8]>,
    source_line_offsets: Vec<usize>,
    toitdoc_line_offsets: Vec<usize>,
}

impl<'s> ToitdocSource<'s> {
    fn new(
        source: &'s dyn SourceAccess,
        mut text: Vec<u8>,
        source_line_offsets: Vec<usize>,
        toitdoc_line_offsets: Vec<usize>,
    ) -> Self {
        debug_assert!(!source_line_offsets.is_empty());
        debug_assert_eq!(source_line_offsets.len(), toitdoc_line_offsets.len());
        text.push(0);
        Self { source, text: text.into_boxed_slice(), source_line_offsets, toitdoc_line_offsets }
    }

    /// Maps an offset in the toitdoc text to an offset in the source.
    pub fn source_offset_at(&self, offset: usize) -> usize {
        let last = *self.toitdoc_line_offsets.last().expect("at least one line");
        if offset >= last {
            let offset_in_line = offset - last;
            return self.source_line_offsets.last().expect("at least one line") + offset_in_line;
        }
        // Binary search for the line containing the offset.
        let mut start = 0;
        let mut end = self.toitdoc_line_offsets.len() - 1;
        loop {
            let mid = start + (end - start) / 2;
            if self.toitdoc_line_offsets[mid] <= offset
                && offset < self.toitdoc_line_offsets[mid + 1]
            {
                let offset_in_line = offset - self.toitdoc_line_offsets[mid];
                return self.source_line_offsets[mid] + offset_in_line;
            }
            if self.toitdoc_line_offsets[mid] > offset {
                end = mid;
            } else {
                start = mid + 1;
            }
        }
    }
}

impl SourceAccess for ToitdocSource<'_> {
    fn text(&self) -> &[u8] {
        &self.text
    }

    fn size(&self) -> usize {
        self.text.len() - 1
    }

    fn range(&self, from: usize, to: usize) -> Range {
        self.source.range(self.source_offset_at(from), self.source_offset_at(to))
    }

    fn is_lsp_marker_at(&self, offset: usize) -> bool {
        self.source.is_lsp_marker_at(self.source_offset_at(offset))
    }

    fn text_range_without_marker(&self, from: usize, to: usize) -> Cow<'_, [u8]> {
        // Within one line the cleaned text matches the source text, so the
        // source can serve the bytes (and strip any marker).
        let source_from = self.source_offset_at(from);
        let source_to = self.source_offset_at(to);
        match self.source.text_range_without_marker(source_from, source_to) {
            Cow::Borrowed(bytes) => Cow::Owned(bytes.to_vec()),
            Cow::Owned(bytes) => Cow::Owned(bytes),
        }
    }

    fn offset_in_source(&self, _position: Position) -> Option<usize> {
        // Not supported for extracted toitdoc text.
        unreachable!("offset_in_source is never queried on a toitdoc source")
    }
}

/// Collects the toitdoc text while maintaining the source mapping.
pub struct ToitdocTextBuilder<'s> {
    source: &'s dyn SourceAccess,
    source_from: usize,
    source_to: usize,
    text: Vec<u8>,
    source_line_offsets: Vec<usize>,
    toitdoc_line_offsets: Vec<usize>,
}

impl<'s> ToitdocTextBuilder<'s> {
    pub fn new(source: &'s dyn SourceAccess, source_from: usize, source_to: usize) -> Self {
        Self {
            source,
            source_from,
            source_to,
            text: Vec::new(),
            source_line_offsets: Vec::new(),
            toitdoc_line_offsets: Vec::new(),
        }
    }

    /// Adds the substring `source[from..to]` as one line. The range must
    /// not include the newline character; `from` becomes the line's source
    /// mapping anchor.
    pub fn add_line(&mut self, text: &[u8], from: usize, to: usize) {
        debug_assert!(self.source_from <= from && from <= self.source_to);
        // `from` can only equal source_to if the line is empty.
        debug_assert!(from != self.source_to || from == to);
        debug_assert!(to <= text.len());
        debug_assert!(!text[from..to].contains(&b'\n'));
        self.source_line_offsets.push(from);
        self.toitdoc_line_offsets.push(self.text.len());
        self.text.extend_from_slice(&text[from..to]);
        self.text.push(b'\n');
    }

    pub fn build(mut self) -> ToitdocSource<'s> {
        // Always ensure there is an entry in the offsets.
        if self.source_line_offsets.is_empty() {
            self.source_line_offsets.push(self.source_from);
            self.toitdoc_line_offsets.push(0);
            self.text.push(b'\n');
        }
        // Drop the trailing '\n' (it might not exist in the actual source);
        // on Windows also drop a '\r' so we don't end inside a "\r\n".
        self.text.pop();
        if self.text.last() == Some(&b'\r') {
            self.text.pop();
        }
        ToitdocSource::new(
            self.source,
            self.text,
            self.source_line_offsets,
            self.toitdoc_line_offsets,
        )
    }
}

/// Extracts the text of a `/** ... */` toitdoc.
///
/// The leading `/**`, the trailing `*/`, and up to the comment's own
/// indentation of leading spaces per line are stripped.
pub fn extract_multiline_comment_text<'s>(
    source: &'s dyn SourceAccess,
    from: usize,
    to: usize,
) -> ToitdocSource<'s> {
    let text = source.text();
    debug_assert!(text[from] == b'/' && text[from + 1] == b'*' && text[from + 2] == b'*');

    let mut indentation = 0;
    let mut i = from;
    while i > 0 && text[i - 1] == b' ' {
        indentation += 1;
        i -= 1;
    }
    // Trim the leading '/**' and trailing '*/'. A missing trailing '*/'
    // doesn't abort the extraction.
    let from = from + 3;
    let mut to = to;
    if to >= 2 && text[to - 2] == b'*' && text[to - 1] == b'/' {
        to -= 2;
    }
    let mut builder = ToitdocTextBuilder::new(source, from, to);
    let mut is_first_line = true;
    let mut line_start = from;
    let mut at_beginning_of_line = false; // Not needed for the first line.
    let mut i = from;
    while i < to {
        if at_beginning_of_line {
            at_beginning_of_line = false;
            for _ in 0..indentation {
                // Skip the indentation, unless it contains non-spaces.
                if text[i] == b' ' {
                    line_start += 1;
                    i += 1;
                } else {
                    break;
                }
            }
        }
        if i < to && text[i] == b'\n' {
            // Ignore the first newline if it came right after the '/**'.
            if !is_first_line || i != line_start {
                let end = if i > line_start && text[i - 1] == b'\r' { i - 1 } else { i };
                builder.add_line(text, line_start, end);
            }
            line_start = i + 1;
            at_beginning_of_line = true;
            is_first_line = false;
        }
        i += 1;
    }
    if is_first_line {
        // Usually something like `/** foo */`: just trim the whitespace.
        let mut line_start = line_start;
        let mut to = to;
        while line_start < to && text[line_start] == b' ' {
            line_start += 1;
        }
        while to > line_start && text[to - 1] == b' ' {
            to -= 1;
        }
        builder.add_line(text, line_start, to);
    } else if line_start != to {
        // The last line still contains content.
        builder.add_line(text, line_start, to);
    }

    builder.build()
}

/// Extracts the text of a contiguous run of `///` comments.
///
/// Each line loses its leading whitespace, the `///`, and one following
/// space.
pub fn extract_singleline_comment_text<'s>(
    source: &'s dyn SourceAccess,
    from: usize,
    to: usize,
) -> ToitdocSource<'s> {
    let text = source.text();
    let mut builder = ToitdocTextBuilder::new(source, from, to);

    let mut at_beginning_of_line = true;
    let mut line_start = from;
    // Single-line comments don't end with '\n'; treat `to` as one.
    let mut i = from;
    while i <= to {
        if at_beginning_of_line {
            // Skip whitespace; there must be a '/' at some point.
            while text[i] == b' ' {
                i += 1;
            }
            debug_assert!(text[i] == b'/' && text[i + 1] == b'/' && text[i + 2] == b'/');
            i += 3;
            if text[i] == b' ' {
                i += 1;
            }
            line_start = i;
            at_beginning_of_line = false;
        }
        if i == to || text[i] == b'\n' {
            let end = if i > line_start && text[i - 1] == b'\r' { i - 1 } else { i };
            builder.add_line(text, line_start, end);
            at_beginning_of_line = true;
            // Skip past the newline.
            i += 1;
            continue;
        }
        i += 1;
    }
    builder.build()
}
