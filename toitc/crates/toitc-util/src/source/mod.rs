//! Source module - loaded file texts and the position space.
//!
//! The [`SourceManager`] owns every loaded file and assigns each one a
//! contiguous block of global positions: a file of `size` bytes occupies
//! `[base, base + size]`. The extra position past the end allows errors to
//! point one past EOF (unterminated strings, comments, ...).
//!
//! [`SourceManager::compute_location`] maps a position back to
//! `(source, offset, line, column)` and caches the last lookup, which makes
//! sequential queries (diagnostics are mostly sorted) cheap.

use std::borrow::Cow;
use std::cell::RefCell;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::diagnostic::Diagnostics;
use crate::fs::{Filesystem, Package};
use crate::span::{Position, Range};

/// The marker byte editors inject to mark the cursor position.
///
/// Byte value 1 is not valid in Toit source, so the scanner can treat it as
/// a selection marker when the source confirms the offset.
pub const LSP_SELECTION_MARKER: u8 = 1;

/// What the scanner and parser need from a source of text.
///
/// Implemented by [`Source`] and by synthetic sources (the toitdoc parser
/// scans extracted comment text whose offsets map back to the real file).
pub trait SourceAccess {
    /// The source bytes, including a trailing NUL sentinel at
    /// `text()[size()]`.
    fn text(&self) -> &[u8];

    /// The size in bytes (sentinel excluded).
    fn size(&self) -> usize;

    /// The global range covering the offsets `[from, to]`.
    fn range(&self, from: usize, to: usize) -> Range;

    /// Whether the byte at `offset` is a recognized LSP selection marker.
    fn is_lsp_marker_at(&self, offset: usize) -> bool;

    /// The text `[from, to)` with any injected marker removed.
    fn text_range_without_marker(&self, from: usize, to: usize) -> Cow<'_, [u8]>;

    /// The offset of `position` in this source, or `None` if the position
    /// belongs to a different source.
    fn offset_in_source(&self, position: Position) -> Option<usize>;
}

impl<T: SourceAccess + ?Sized> SourceAccess for Arc<T> {
    fn text(&self) -> &[u8] {
        (**self).text()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn range(&self, from: usize, to: usize) -> Range {
        (**self).range(from, to)
    }

    fn is_lsp_marker_at(&self, offset: usize) -> bool {
        (**self).is_lsp_marker_at(offset)
    }

    fn text_range_without_marker(&self, from: usize, to: usize) -> Cow<'_, [u8]> {
        (**self).text_range_without_marker(from, to)
    }

    fn offset_in_source(&self, position: Position) -> Option<usize> {
        (**self).offset_in_source(position)
    }
}

/// A loaded source file.
///
/// The text is kept with a trailing NUL sentinel so the scanner may peek at
/// `text()[size()]` without bounds checks failing; the sentinel is not part
/// of the file.
///
/// A source may carry an LSP selection marker: a single marker byte injected
/// into the text at a host-chosen offset. Ranges produced by such a source
/// are mapped back to the unmarked file so diagnostics stay stable.
pub struct Source {
    absolute_path: String,
    package_id: String,
    error_path: String,
    /// File bytes plus one NUL sentinel.
    text: Box<[u8]>,
    /// Base offset in the global position space.
    base: i32,
    /// Offset of the injected LSP selection marker, if any.
    lsp_offset: Option<usize>,
}

impl Source {
    pub(crate) fn new(
        absolute_path: impl Into<String>,
        package_id: impl Into<String>,
        error_path: impl Into<String>,
        mut text: Vec<u8>,
        base: i32,
    ) -> Self {
        text.push(0);
        Self {
            absolute_path: absolute_path.into(),
            package_id: package_id.into(),
            error_path: error_path.into(),
            text: text.into_boxed_slice(),
            base,
            lsp_offset: None,
        }
    }

    /// Creates a copy of `wrapped` with an [`LSP_SELECTION_MARKER`] injected
    /// at `offset`. The new source shares the wrapped source's position
    /// space, so ranges refer to the unmarked file.
    pub fn with_lsp_marker(wrapped: &Source, offset: usize) -> Self {
        assert!(offset <= wrapped.size());
        let mut text = Vec::with_capacity(wrapped.size() + 2);
        text.extend_from_slice(&wrapped.text[..offset]);
        text.push(LSP_SELECTION_MARKER);
        text.extend_from_slice(&wrapped.text[offset..wrapped.size()]);
        let mut result = Self::new(
            wrapped.absolute_path.clone(),
            wrapped.package_id.clone(),
            wrapped.error_path.clone(),
            text,
            wrapped.base,
        );
        result.lsp_offset = Some(offset);
        result
    }

    /// The absolute path. Might be "" if the source was given directly.
    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    /// The id of the package this source comes from.
    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    /// The path shown to users in diagnostics.
    pub fn error_path(&self) -> &str {
        &self.error_path
    }

    /// The source bytes, including the NUL sentinel at `text()[size()]`.
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// The size of the source in bytes (marker included, sentinel excluded).
    pub fn size(&self) -> usize {
        self.text.len() - 1
    }

    /// The range covering `[from, to]`, in global positions.
    ///
    /// Offsets are in this source's text; for marker-carrying sources they
    /// are mapped back to the unmarked file.
    pub fn range(&self, from: usize, to: usize) -> Range {
        debug_assert!(from <= self.size() && to <= self.size());
        let (mut from, mut to) = (from, to);
        if let Some(marker) = self.lsp_offset {
            if from > marker {
                from -= 1;
            }
            if to > marker {
                to -= 1;
            }
        }
        Range::new(
            Position::from_token(self.base + from as i32),
            Position::from_token(self.base + to as i32),
        )
    }

    /// The offset of `position` in this source, or `None` if the position
    /// belongs to a different source.
    pub fn offset_in_source(&self, position: Position) -> Option<usize> {
        let token = position.token();
        if self.base <= token && token <= self.base + self.size() as i32 {
            let mut offset = (token - self.base) as usize;
            if let Some(marker) = self.lsp_offset {
                if offset >= marker {
                    offset += 1;
                }
            }
            Some(offset)
        } else {
            None
        }
    }

    /// Whether the byte at `offset` is a recognized LSP selection marker.
    pub fn is_lsp_marker_at(&self, offset: usize) -> bool {
        self.lsp_offset == Some(offset)
    }

    /// The text `[from, to)` with any injected marker removed.
    pub fn text_range_without_marker(&self, from: usize, to: usize) -> Cow<'_, [u8]> {
        debug_assert!(from <= to && to <= self.size());
        match self.lsp_offset {
            Some(marker) if from <= marker && marker < to => {
                let mut bytes = Vec::with_capacity(to - from - 1);
                bytes.extend_from_slice(&self.text[from..marker]);
                bytes.extend_from_slice(&self.text[marker + 1..to]);
                Cow::Owned(bytes)
            }
            _ => Cow::Borrowed(&self.text[from..to]),
        }
    }

    /// The base offset of this source in the global position space.
    pub fn base(&self) -> i32 {
        self.base
    }
}

impl SourceAccess for Source {
    fn text(&self) -> &[u8] {
        Source::text(self)
    }

    fn size(&self) -> usize {
        Source::size(self)
    }

    fn range(&self, from: usize, to: usize) -> Range {
        Source::range(self, from, to)
    }

    fn is_lsp_marker_at(&self, offset: usize) -> bool {
        Source::is_lsp_marker_at(self, offset)
    }

    fn text_range_without_marker(&self, from: usize, to: usize) -> Cow<'_, [u8]> {
        Source::text_range_without_marker(self, from, to)
    }

    fn offset_in_source(&self, position: Position) -> Option<usize> {
        Source::offset_in_source(self, position)
    }
}

/// The result of resolving a position to a concrete source location.
#[derive(Clone)]
pub struct Location {
    /// The owning source.
    pub source: Arc<Source>,
    /// Byte offset in the source.
    pub offset_in_source: usize,
    /// Offset in the line, 0-based.
    pub offset_in_line: usize,
    /// Line number, 1-based.
    pub line_number: usize,
    /// Byte offset of the start of the line.
    pub line_offset: usize,
}

/// Failure to load a source file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The path exists but is not a regular file.
    #[error("Not a regular file: '{0}'")]
    NotRegularFile(String),
    /// The path does not exist.
    #[error("File not found: '{0}'")]
    NotFound(String),
    /// Reading the file failed.
    #[error("Error while reading file: '{0}'")]
    FileError(String),
}

/// The outcome of [`SourceManager::load_file`].
///
/// The absolute path is always set, even in case of errors.
pub struct LoadResult {
    /// The path the load was attempted for.
    pub absolute_path: String,
    /// The loaded source, or the reason loading failed.
    pub result: Result<Arc<Source>, LoadError>,
}

impl LoadResult {
    /// Reports the load failure (if any) at the given range.
    pub fn report_error(&self, range: Range, diagnostics: &dyn Diagnostics) {
        if let Err(error) = &self.result {
            diagnostics.report_error(range, error.to_string());
        }
    }
}

struct LocationCache {
    source_index: Option<usize>,
    offset: i32,
    location: Option<Location>,
}

/// Owns all loaded sources and the global position space.
///
/// Not thread-safe; one compilation thread owns the manager.
pub struct SourceManager<'a> {
    filesystem: &'a dyn Filesystem,
    next_offset: i32,
    sources: Vec<Arc<Source>>,
    path_to_source: FxHashMap<String, usize>,
    cache: RefCell<LocationCache>,
}

/// Prefix marking paths that are not filesystem paths.
pub const VIRTUAL_FILE_PREFIX: &str = "///";

/// Whether the path denotes a virtual (host-injected) file.
pub fn is_virtual_file(path: &str) -> bool {
    path.starts_with(VIRTUAL_FILE_PREFIX)
}

impl<'a> SourceManager<'a> {
    /// Creates a manager reading through the given filesystem.
    pub fn new(filesystem: &'a dyn Filesystem) -> Self {
        Self {
            filesystem,
            next_offset: 0,
            sources: Vec::new(),
            path_to_source: FxHashMap::default(),
            cache: RefCell::new(LocationCache { source_index: None, offset: -1, location: None }),
        }
    }

    /// Whether the path has already been loaded.
    pub fn is_loaded(&self, path: &str) -> bool {
        self.path_to_source.contains_key(path)
    }

    /// Loads the given file, registering it on first sight.
    pub fn load_file(&mut self, path: &str, package: &Package) -> LoadResult {
        if let Some(&index) = self.path_to_source.get(path) {
            return LoadResult {
                absolute_path: path.to_string(),
                result: Ok(self.sources[index].clone()),
            };
        }
        if !self.filesystem.exists(path) {
            return LoadResult {
                absolute_path: path.to_string(),
                result: Err(LoadError::NotFound(path.to_string())),
            };
        }
        if !self.filesystem.is_regular_file(path) {
            return LoadResult {
                absolute_path: path.to_string(),
                result: Err(LoadError::NotRegularFile(path.to_string())),
            };
        }
        let Ok(buffer) = self.filesystem.read_content(path) else {
            return LoadResult {
                absolute_path: path.to_string(),
                result: Err(LoadError::FileError(path.to_string())),
            };
        };
        let (error_path, package_id) = if package.is_valid() {
            (package.build_error_path(path), package.id().to_string())
        } else {
            (path.to_string(), Package::ENTRY_PACKAGE_ID.to_string())
        };
        let source = self.register_source(path, &package_id, &error_path, buffer);
        LoadResult { absolute_path: path.to_string(), result: Ok(source) }
    }

    /// Registers a host-injected source (editor buffer, test input).
    ///
    /// The path conventionally starts with [`VIRTUAL_FILE_PREFIX`].
    pub fn add_virtual_file(&mut self, path: &str, text: impl Into<Vec<u8>>) -> Arc<Source> {
        self.register_source(path, Package::ENTRY_PACKAGE_ID, path, text.into())
    }

    fn register_source(
        &mut self,
        absolute_path: &str,
        package_id: &str,
        error_path: &str,
        text: Vec<u8>,
    ) -> Arc<Source> {
        let source = Arc::new(Source::new(
            absolute_path,
            package_id,
            error_path,
            text,
            self.next_offset,
        ));
        // Add one for the terminating position. This also allows errors to
        // point at the end of the file (unclosed strings, comments, ...).
        self.next_offset = source.base() + source.size() as i32 + 1;
        if !absolute_path.is_empty() {
            self.path_to_source.insert(absolute_path.to_string(), self.sources.len());
        }
        self.sources.push(source.clone());
        source
    }

    /// The source owning the given position.
    pub fn source_for_position(&self, position: Position) -> Arc<Source> {
        let token = position.token();
        assert!(0 <= token && token < self.next_offset);
        let mut start = 0;
        let mut end = self.sources.len() - 1;
        while start != end {
            let half = start + (end - start) / 2;
            let current = &self.sources[half];
            if token < current.base() {
                end = half - 1;
            } else if token > current.base() + current.size() as i32 {
                start = half + 1;
            } else {
                start = half;
                end = half;
            }
        }
        self.sources[start].clone()
    }

    /// Resolves a position to `(source, offset, line, column)`.
    ///
    /// The result of the previous query is cached; resolving monotonically
    /// increasing positions in the same source scans forward from the cached
    /// line instead of from the start of the file.
    pub fn compute_location(&self, position: Position) -> Location {
        let token = position.token();
        assert!(0 <= token && token < self.next_offset);

        let mut start_offset = 0usize;
        let mut line = 1usize;
        let mut line_start = 0usize;

        let mut cache = self.cache.borrow_mut();
        let mut entry: Option<Arc<Source>> = None;
        if let Some(index) = cache.source_index {
            let cached_source = &self.sources[index];
            if cache.offset >= 0
                && cached_source.base() <= token
                && token <= cached_source.base() + cached_source.size() as i32
            {
                entry = Some(cached_source.clone());
                if cache.offset < token {
                    if let Some(cached) = &cache.location {
                        start_offset = (cache.offset - cached_source.base()) as usize;
                        line = cached.line_number;
                        line_start = cached.line_offset;
                    }
                }
            }
        }
        let entry = entry.unwrap_or_else(|| self.source_for_position(position));

        let text = entry.text();
        let offset_in_source = (token - entry.base()) as usize;
        let mut i = start_offset;
        while i < offset_in_source {
            let mut c = text[i];
            if c == b'\r' && text[i + 1] == b'\n' {
                i += 1;
                c = b'\n';
            }
            if c == b'\n' {
                line_start = i + 1;
                line += 1;
            }
            i += 1;
        }

        let location = Location {
            source: entry.clone(),
            offset_in_source,
            offset_in_line: offset_in_source - line_start,
            line_number: line,
            line_offset: line_start,
        };
        cache.offset = token;
        cache.source_index = self.sources.iter().position(|s| Arc::ptr_eq(s, &entry));
        cache.location = Some(location.clone());
        location
    }
}
