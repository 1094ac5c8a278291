//! Span module - Source position tracking.
//!
//! This module provides the types for representing source code locations.
//! A [`Position`] is an opaque dense offset ("token offset") handed out by
//! the [`SourceManager`](crate::source::SourceManager): every registered
//! source file occupies a contiguous, non-overlapping block of positions,
//! so a position alone identifies both the file and the offset within it.
//!
//! # Examples
//!
//! ```
//! use toitc_util::span::{Position, Range};
//!
//! let from = Position::from_token(10);
//! let to = Position::from_token(20);
//! let range = Range::new(from, to);
//!
//! assert!(range.is_valid());
//! assert!(from.is_before(to));
//! ```

use std::fmt;

/// An opaque position in some registered source.
///
/// Positions are dense integers. The [`SourceManager`] assigns each file a
/// base offset and `base + size + 1` positions, so the position one past the
/// end of a file is valid and usable for error reporting at EOF.
///
/// An invalid position is explicitly representable, see [`Position::invalid`].
///
/// # Examples
///
/// ```
/// use toitc_util::span::Position;
///
/// let a = Position::from_token(3);
/// let b = Position::from_token(7);
/// assert!(a.is_before(b));
/// assert!(!Position::invalid().is_valid());
/// ```
///
/// [`SourceManager`]: crate::source::SourceManager
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    token: i32,
}

impl Position {
    /// The invalid position.
    pub const INVALID: Position = Position { token: -1 };

    /// Returns the invalid position.
    #[inline]
    pub const fn invalid() -> Self {
        Self::INVALID
    }

    /// Creates a position from a raw token offset.
    #[inline]
    pub const fn from_token(token: i32) -> Self {
        Self { token }
    }

    /// Whether this position is valid.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.token != -1
    }

    /// Whether this position is before the `other` position.
    ///
    /// Should only be used for positions in the same file. However, it
    /// returns a deterministic response for positions from two different
    /// files (the file registered first compares lower).
    #[inline]
    pub const fn is_before(&self, other: Position) -> bool {
        self.token < other.token
    }

    /// The raw token offset. Only meaningful to `Source` implementations
    /// and location mapping.
    #[inline]
    pub const fn token(&self) -> i32 {
        self.token
    }
}

impl Default for Position {
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

/// A `[from, to]` pair of positions with `from <= to`.
///
/// Invalid ranges are explicitly representable, see [`Range::invalid`].
///
/// # Examples
///
/// ```
/// use toitc_util::span::{Position, Range};
///
/// let a = Range::new(Position::from_token(0), Position::from_token(5));
/// let b = Range::new(Position::from_token(3), Position::from_token(9));
/// let joined = a.extend(b);
/// assert_eq!(joined.from(), Position::from_token(0));
/// assert_eq!(joined.to(), Position::from_token(9));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    from: Position,
    to: Position,
}

impl Range {
    /// Creates a new range.
    ///
    /// Either both positions are valid, or both are invalid.
    #[inline]
    pub fn new(from: Position, to: Position) -> Self {
        debug_assert!(from.is_valid() == to.is_valid());
        Self { from, to }
    }

    /// Creates a range covering the single given position.
    #[inline]
    pub fn at(position: Position) -> Self {
        Self { from: position, to: position }
    }

    /// Returns the invalid range.
    #[inline]
    pub const fn invalid() -> Self {
        Self { from: Position::INVALID, to: Position::INVALID }
    }

    /// Whether this range is valid.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.from.is_valid()
    }

    /// Returns the smallest range covering both `self` and `other`.
    #[must_use]
    pub fn extend(&self, other: Range) -> Range {
        let from = if self.from.is_before(other.from) { self.from } else { other.from };
        let to = if self.to.is_before(other.to) { other.to } else { self.to };
        Range { from, to }
    }

    /// Returns the smallest range covering `self` and the given position.
    #[must_use]
    pub fn extend_to(&self, to: Position) -> Range {
        self.extend(Range::at(to))
    }

    /// Whether this range is before the `other` range.
    ///
    /// Only looks at the `from` positions.
    #[inline]
    pub fn is_before(&self, other: Range) -> bool {
        self.from.is_before(other.from)
    }

    /// The start position.
    #[inline]
    pub fn from(&self) -> Position {
        debug_assert!(self.is_valid());
        self.from
    }

    /// The end position.
    #[inline]
    pub fn to(&self) -> Position {
        debug_assert!(self.is_valid());
        self.to
    }
}

impl Default for Range {
    #[inline]
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.from.token(), self.to.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_token() {
        let position = Position::from_token(42);
        assert_eq!(position.token(), 42);
        assert!(position.is_valid());
    }

    #[test]
    fn test_position_invalid() {
        assert!(!Position::invalid().is_valid());
        assert_eq!(Position::default(), Position::invalid());
    }

    #[test]
    fn test_position_is_before() {
        let a = Position::from_token(1);
        let b = Position::from_token(2);
        assert!(a.is_before(b));
        assert!(!b.is_before(a));
        assert!(!a.is_before(a));
    }

    #[test]
    fn test_range_new() {
        let range = Range::new(Position::from_token(1), Position::from_token(4));
        assert_eq!(range.from().token(), 1);
        assert_eq!(range.to().token(), 4);
    }

    #[test]
    fn test_range_invalid() {
        assert!(!Range::invalid().is_valid());
        assert!(!Range::default().is_valid());
    }

    #[test]
    fn test_range_extend() {
        let a = Range::new(Position::from_token(5), Position::from_token(10));
        let b = Range::new(Position::from_token(7), Position::from_token(20));
        let extended = a.extend(b);
        assert_eq!(extended.from().token(), 5);
        assert_eq!(extended.to().token(), 20);
        // Extending is symmetric.
        assert_eq!(b.extend(a), extended);
    }

    #[test]
    fn test_range_extend_to() {
        let range = Range::new(Position::from_token(5), Position::from_token(10));
        let extended = range.extend_to(Position::from_token(17));
        assert_eq!(extended.from().token(), 5);
        assert_eq!(extended.to().token(), 17);
    }

    #[test]
    fn test_range_is_before() {
        let a = Range::new(Position::from_token(1), Position::from_token(9));
        let b = Range::new(Position::from_token(2), Position::from_token(3));
        assert!(a.is_before(b));
        assert!(!b.is_before(a));
    }

    #[test]
    fn test_range_at() {
        let range = Range::at(Position::from_token(3));
        assert_eq!(range.from(), range.to());
    }
}

#[cfg(test)]
mod properties {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn make_range(a: u16, b: u16) -> Range {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        Range::new(Position::from_token(from as i32), Position::from_token(to as i32))
    }

    #[quickcheck]
    fn extend_is_commutative(a1: u16, a2: u16, b1: u16, b2: u16) -> bool {
        let a = make_range(a1, a2);
        let b = make_range(b1, b2);
        a.extend(b) == b.extend(a)
    }

    #[quickcheck]
    fn extend_covers_both(a1: u16, a2: u16, b1: u16, b2: u16) -> bool {
        let a = make_range(a1, a2);
        let b = make_range(b1, b2);
        let extended = a.extend(b);
        !a.from().is_before(extended.from())
            && !b.from().is_before(extended.from())
            && !extended.to().is_before(a.to())
            && !extended.to().is_before(b.to())
    }

    #[quickcheck]
    fn extend_is_idempotent(a1: u16, a2: u16) -> bool {
        let a = make_range(a1, a2);
        a.extend(a) == a
    }

    #[quickcheck]
    fn is_before_is_a_strict_order(a: i32, b: i32) -> bool {
        let pa = Position::from_token(a);
        let pb = Position::from_token(b);
        // Irreflexive and asymmetric.
        !pa.is_before(pa) && !(pa.is_before(pb) && pb.is_before(pa))
    }
}
