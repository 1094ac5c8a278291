//! Symbol module - String interning for identifiers and literals.
//!
//! This module provides the [`Symbol`] type, a compact (4-byte) handle to an
//! interned string. Interning gives identity-equality semantics: two symbols
//! created from equal bytes are the same handle, so comparing symbols is an
//! O(1) index comparison. The front-end relies on this for comparing
//! identifiers against the predefined names below (`monitor`, `interface`,
//! `show`, operator names, ...).
//!
//! # Examples
//!
//! ```
//! use toitc_util::symbol::{symbols, Symbol};
//!
//! let s1 = Symbol::synthetic(b"hello");
//! let s2 = Symbol::synthetic(b"hello");
//! assert_eq!(s1, s2);
//!
//! // Known identifiers are pre-interned with stable handles.
//! assert_eq!(Symbol::synthetic(b"this"), symbols::THIS);
//! assert_eq!(symbols::INDEX.as_str(), "[]");
//! ```
//!
//! # Thread Safety
//!
//! The underlying string table is process-global and lock-free; symbols are
//! `Copy + Send + Sync`.

mod interner;

pub use interner::STRING_TABLE;

use static_assertions::assert_eq_size;

/// Symbol - an interned string handle.
///
/// A `Symbol` is an index into a global string table. Equality is identity
/// equality of the interned string.
///
/// There is no invalid symbol value baked into the representation; code that
/// needs "no symbol" uses `Option<Symbol>`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Index into the global string table.
    pub(crate) index: u32,
}

assert_eq_size!(Symbol, u32);

impl Symbol {
    /// Interns the given bytes and returns the canonical handle.
    ///
    /// Always returns the same handle for equal bytes. Source text is byte
    /// oriented; non-UTF-8 bytes are replaced during interning (they can
    /// only appear inside malformed string literal data).
    pub fn synthetic(bytes: &[u8]) -> Symbol {
        match std::str::from_utf8(bytes) {
            Ok(s) => STRING_TABLE.intern(s),
            Err(_) => STRING_TABLE.intern(&String::from_utf8_lossy(bytes)),
        }
    }

    /// Interns the given string and returns the canonical handle.
    #[inline]
    pub fn intern(string: &str) -> Symbol {
        STRING_TABLE.intern(string)
    }

    /// The interned text.
    pub fn as_str(&self) -> &'static str {
        STRING_TABLE.get(*self).unwrap_or("<unknown>")
    }

    /// Whether this symbol is one of the pre-interned known identifiers.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.index < RESERVED_SYMBOLS_END
    }

    /// Whether this symbol names a private identifier (ends with `_`).
    pub fn is_private_identifier(&self) -> bool {
        let text = self.as_str();
        text.len() > 1 && text.ends_with('_')
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of symbol indices reserved for known identifiers.
pub(crate) const RESERVED_SYMBOLS_END: u32 = 64;

/// The texts of all pre-interned known identifiers, in index order.
///
/// Canonicalizers seed their tries from this table.
pub const KNOWN_SYMBOLS_TEXTS: &[&str] = KNOWN_SYMBOLS;

/// The known-symbol table, in index order.
///
/// The constants in [`symbols`] index into this table; keep both in sync
/// (pinned by `tests::test_known_symbol_table`).
pub(crate) const KNOWN_SYMBOLS: &[&str] = &[
    "this",             // 0
    "super",            // 1
    "constructor",      // 2
    "_",                // 3
    "main",             // 4
    "it",               // 5
    "no",               // 6
    "show",             // 7
    "monitor",          // 8
    "interface",        // 9
    "mixin",            // 10
    "extends",          // 11
    "implements",       // 12
    "with",             // 13
    "operator",         // 14
    "[]",               // 15
    "[]=",              // 16
    "[..]",             // 17
    "",                 // 18
    "1",                // 19
    "int",              // 20
    "bool",             // 21
    "float",            // 22
    "string",           // 23
    "none",             // 24
    "any",              // 25
    "Object",           // 26
    "Array_",           // 27
    "ByteArray",        // 28
    "List_",            // 29
    "Set",              // 30
    "Map",              // 31
    "String",           // 32
    "add",              // 33
    "call",             // 34
    "identical",        // 35
    "throw",            // 36
    "catch",            // 37
    "rethrow",          // 38
    "switch",           // 39
    "enum",             // 40
    "from",             // 41
    "to",               // 42
    "value_",           // 43
    "unreachable",      // 44
    "stringify",        // 45
];

/// Pre-interned known identifiers.
///
/// These are handles with fixed indices into [`KNOWN_SYMBOLS`]; comparing an
/// identifier symbol against one of these is an integer comparison.
pub mod symbols {
    use super::Symbol;

    const fn known(index: u32) -> Symbol {
        Symbol { index }
    }

    /// `this`
    pub const THIS: Symbol = known(0);
    /// `super`
    pub const SUPER: Symbol = known(1);
    /// `constructor`
    pub const CONSTRUCTOR: Symbol = known(2);
    /// `_`
    pub const UNDERSCORE: Symbol = known(3);
    /// `main` - the program entry point.
    pub const MAIN: Symbol = known(4);
    /// `it` - the implicit block parameter.
    pub const IT: Symbol = known(5);
    /// `no` - the `--no-` named-argument prefix.
    pub const NO: Symbol = known(6);
    /// `show`
    pub const SHOW: Symbol = known(7);
    /// `monitor`
    pub const MONITOR: Symbol = known(8);
    /// `interface`
    pub const INTERFACE: Symbol = known(9);
    /// `mixin`
    pub const MIXIN: Symbol = known(10);
    /// `extends`
    pub const EXTENDS: Symbol = known(11);
    /// `implements`
    pub const IMPLEMENTS: Symbol = known(12);
    /// `with`
    pub const WITH: Symbol = known(13);
    /// `operator`
    pub const OPERATOR: Symbol = known(14);
    /// `[]` - the index operator name.
    pub const INDEX: Symbol = known(15);
    /// `[]=` - the index-assignment operator name.
    pub const INDEX_PUT: Symbol = known(16);
    /// `[..]` - the slice operator name.
    pub const INDEX_SLICE: Symbol = known(17);
    /// The empty string.
    pub const EMPTY_STRING: Symbol = known(18);
    /// `1` - substitute payload for unterminated character literals.
    pub const ONE: Symbol = known(19);
    /// `int`
    pub const INT: Symbol = known(20);
    /// `bool`
    pub const BOOL: Symbol = known(21);
    /// `float`
    pub const FLOAT: Symbol = known(22);
    /// `string`
    pub const STRING: Symbol = known(23);
    /// `none`
    pub const NONE: Symbol = known(24);
    /// `any`
    pub const ANY: Symbol = known(25);
    /// `Object`
    pub const OBJECT: Symbol = known(26);
    /// `Array_`
    pub const ARRAY_: Symbol = known(27);
    /// `ByteArray`
    pub const BYTE_ARRAY: Symbol = known(28);
    /// `List_`
    pub const LIST_: Symbol = known(29);
    /// `Set`
    pub const SET: Symbol = known(30);
    /// `Map`
    pub const MAP: Symbol = known(31);
    /// `String`
    pub const STRING_CLASS: Symbol = known(32);
    /// `add`
    pub const ADD: Symbol = known(33);
    /// `call`
    pub const CALL: Symbol = known(34);
    /// `identical`
    pub const IDENTICAL: Symbol = known(35);
    /// `throw`
    pub const THROW: Symbol = known(36);
    /// `catch`
    pub const CATCH: Symbol = known(37);
    /// `rethrow`
    pub const RETHROW: Symbol = known(38);
    /// `switch`
    pub const SWITCH: Symbol = known(39);
    /// `enum`
    pub const ENUM: Symbol = known(40);
    /// `from`
    pub const FROM: Symbol = known(41);
    /// `to`
    pub const TO: Symbol = known(42);
    /// `value_`
    pub const VALUE_: Symbol = known(43);
    /// `unreachable`
    pub const UNREACHABLE: Symbol = known(44);
    /// `stringify`
    pub const STRINGIFY: Symbol = known(45);

    /// Whether the name is reserved and can't be used for declarations.
    pub fn is_reserved(name: Symbol) -> bool {
        name == THIS || name == SUPER || name == CONSTRUCTOR || name == UNDERSCORE
    }

    /// Whether the name is reserved for future use.
    pub fn is_future_reserved(name: Symbol) -> bool {
        name == THROW
            || name == RETHROW
            || name == CATCH
            || name == SWITCH
            || name == ENUM
            || name == MIXIN
            || name == INTERFACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_symbol_table() {
        // Every constant must resolve to the text at its table index.
        assert_eq!(symbols::THIS.as_str(), "this");
        assert_eq!(symbols::SUPER.as_str(), "super");
        assert_eq!(symbols::CONSTRUCTOR.as_str(), "constructor");
        assert_eq!(symbols::UNDERSCORE.as_str(), "_");
        assert_eq!(symbols::MAIN.as_str(), "main");
        assert_eq!(symbols::IT.as_str(), "it");
        assert_eq!(symbols::NO.as_str(), "no");
        assert_eq!(symbols::SHOW.as_str(), "show");
        assert_eq!(symbols::MONITOR.as_str(), "monitor");
        assert_eq!(symbols::INTERFACE.as_str(), "interface");
        assert_eq!(symbols::MIXIN.as_str(), "mixin");
        assert_eq!(symbols::EXTENDS.as_str(), "extends");
        assert_eq!(symbols::IMPLEMENTS.as_str(), "implements");
        assert_eq!(symbols::OPERATOR.as_str(), "operator");
        assert_eq!(symbols::INDEX.as_str(), "[]");
        assert_eq!(symbols::INDEX_PUT.as_str(), "[]=");
        assert_eq!(symbols::INDEX_SLICE.as_str(), "[..]");
        assert_eq!(symbols::EMPTY_STRING.as_str(), "");
        assert_eq!(symbols::ONE.as_str(), "1");
        assert_eq!(symbols::STRINGIFY.as_str(), "stringify");
        assert_eq!(KNOWN_SYMBOLS.len(), 46);
    }

    #[test]
    fn test_synthetic_identity() {
        let a = Symbol::synthetic(b"some_name");
        let b = Symbol::synthetic(b"some_name");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "some_name");
    }

    #[test]
    fn test_synthetic_matches_known() {
        assert_eq!(Symbol::synthetic(b"this"), symbols::THIS);
        assert_eq!(Symbol::synthetic(b"[]="), symbols::INDEX_PUT);
        assert_eq!(Symbol::synthetic(b""), symbols::EMPTY_STRING);
    }

    #[test]
    fn test_is_known() {
        assert!(symbols::MONITOR.is_known());
        assert!(!Symbol::intern("definitely_not_predefined_xyz").is_known());
    }

    #[test]
    fn test_is_private_identifier() {
        assert!(Symbol::intern("value_").is_private_identifier());
        assert!(!Symbol::intern("value").is_private_identifier());
        assert!(!Symbol::intern("_").is_private_identifier());
    }

    #[test]
    fn test_reserved() {
        assert!(symbols::is_reserved(symbols::THIS));
        assert!(symbols::is_reserved(symbols::UNDERSCORE));
        assert!(!symbols::is_reserved(symbols::MAIN));
        assert!(symbols::is_future_reserved(symbols::ENUM));
        assert!(!symbols::is_future_reserved(symbols::THIS));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", symbols::INDEX), "[]");
        assert_eq!(format!("{:?}", symbols::THIS), "Symbol(\"this\")");
    }
}
