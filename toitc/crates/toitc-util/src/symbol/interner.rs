//! String interner implementation using DashMap for concurrent access.
//!
//! This module provides a thread-safe string interner for compiler symbols:
//! - Lock-free concurrent access via DashMap
//! - Fast hashing with AHasher
//! - Pre-interned table of known identifiers with stable indices
//!
//! # Thread Safety
//!
//! The interner is fully thread-safe (`Sync + Send`). A process may compile
//! multiple units in parallel; they all share this one read-mostly table.

use ahash::AHasher;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use super::{Symbol, KNOWN_SYMBOLS, RESERVED_SYMBOLS_END};

/// Global string table instance.
///
/// Initialized on first use via `LazyLock`. All known identifiers are
/// pre-interned during initialization so they have stable, predictable
/// indices matching the constants in the parent module.
pub static STRING_TABLE: LazyLock<StringTable> = LazyLock::new(|| {
    let table = StringTable::new();
    table.initialize_known_symbols();
    table
});

/// Thread-safe string table.
///
/// Interned strings are allocated on the heap and leaked (intentionally) to
/// obtain `'static` lifetime references. This is safe because:
/// 1. The string table lives for the entire program duration
/// 2. Interned strings are never removed
/// 3. This avoids lifetime tracking overhead
pub struct StringTable {
    /// Maps string hash to (string, symbol index) for fast lookup.
    map: DashMap<u64, (&'static str, u32)>,

    /// Maps symbol index back to the interned string.
    ///
    /// Symbol text is needed throughout the front-end (canonicalization,
    /// diagnostics, the AST printer), so the reverse direction must be O(1)
    /// as well.
    reverse: DashMap<u32, &'static str>,

    /// Counter for the next index (atomic for lock-free increment).
    ///
    /// Starts at `RESERVED_SYMBOLS_END` to leave room for known symbols.
    next_index: AtomicU32,
}

impl StringTable {
    #[inline]
    fn new() -> Self {
        Self {
            map: DashMap::with_capacity(256),
            reverse: DashMap::with_capacity(256),
            next_index: AtomicU32::new(RESERVED_SYMBOLS_END),
        }
    }

    /// Pre-interns all known symbols.
    ///
    /// The indices must match the constants declared in the parent module;
    /// `tests::test_known_symbol_table` pins that correspondence.
    fn initialize_known_symbols(&self) {
        for (idx, text) in KNOWN_SYMBOLS.iter().enumerate() {
            let idx = idx as u32;
            debug_assert!(idx < RESERVED_SYMBOLS_END);
            let interned: &'static str = Box::leak(text.to_string().into_boxed_str());
            let hash = Self::hash_string(text);
            self.insert_with_probing(hash, interned, idx);
            self.reverse.insert(idx, interned);
        }
    }

    /// Interns a string, returning its symbol.
    ///
    /// If the string is already interned (including all known symbols), the
    /// existing symbol is returned; interning is idempotent and the returned
    /// handle compares equal for equal input bytes.
    ///
    /// Allocation is first-writer-wins: when two threads race to intern the
    /// same new string, the probing insert is serialized per map entry, the
    /// loser adopts the winner's index, and the loser's freshly drawn index
    /// is simply never handed out. Equal bytes always yield equal handles.
    pub fn intern(&self, string: &str) -> Symbol {
        let hash = Self::hash_string(string);

        // Fast path: the string is already interned under its own hash or a
        // probed slot.
        if let Some(index) = self.lookup_with_probing(hash, string) {
            return Symbol { index };
        }

        let interned: &'static str = Box::leak(string.to_string().into_boxed_str());
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let winner = self.insert_with_probing(hash, interned, index);
        self.reverse.insert(winner, interned);
        Symbol { index: winner }
    }

    /// Returns the string for a symbol.
    pub fn get(&self, symbol: Symbol) -> Option<&'static str> {
        self.reverse.get(&symbol.index).map(|entry| *entry.value())
    }

    const MAX_PROBES: u64 = 32;
    const PROBE_PRIME: u64 = 0x9e3779b97f4a7c15; // Golden ratio constant.

    fn lookup_with_probing(&self, hash: u64, string: &str) -> Option<u32> {
        for i in 0..=Self::MAX_PROBES {
            let probe_hash = hash.wrapping_add(i.wrapping_mul(Self::PROBE_PRIME));
            match self.map.get(&probe_hash) {
                Some(entry) if entry.value().0 == string => return Some(entry.value().1),
                Some(_) => continue, // Collision, keep probing.
                None => return None,
            }
        }
        None
    }

    /// Inserts the string at the first free probe slot and returns the
    /// index that ended up owning it.
    ///
    /// All threads walk the same probe sequence, and the entry API locks
    /// per slot, so the first writer claims the slot and every racing
    /// thread finds that entry and returns the winner's index instead of
    /// its own.
    fn insert_with_probing(&self, hash: u64, interned: &'static str, index: u32) -> u32 {
        for i in 0..=Self::MAX_PROBES {
            let probe_hash = hash.wrapping_add(i.wrapping_mul(Self::PROBE_PRIME));
            match self.map.entry(probe_hash) {
                dashmap::mapref::entry::Entry::Occupied(entry) => {
                    if entry.get().0 == interned {
                        return entry.get().1;
                    }
                    // Collision, keep probing.
                }
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    entry.insert((interned, index));
                    return index;
                }
            }
        }
        // Extremely unlikely: accept a potential overwrite of a probe chain
        // that is 32 entries deep.
        self.map.insert(hash, (interned, index));
        index
    }

    #[inline]
    fn hash_string(string: &str) -> u64 {
        let mut hasher = AHasher::default();
        string.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_intern_same_string() {
        let s1 = STRING_TABLE.intern("hello");
        let s2 = STRING_TABLE.intern("hello");
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_intern_different_strings() {
        let s1 = STRING_TABLE.intern("hello");
        let s2 = STRING_TABLE.intern("world");
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_get_string() {
        let symbol = STRING_TABLE.intern("test_string");
        assert_eq!(STRING_TABLE.get(symbol), Some("test_string"));
    }

    #[test]
    fn test_known_symbols_preinterned() {
        // Interning a known identifier must return the reserved index.
        let this = STRING_TABLE.intern("this");
        assert!(this.index < RESERVED_SYMBOLS_END);
    }

    #[test]
    fn test_empty_string() {
        let s = STRING_TABLE.intern("");
        assert_eq!(STRING_TABLE.get(s), Some(""));
    }

    #[test]
    fn test_concurrent_same_string() {
        let handles: Vec<_> = (0..10)
            .map(|_| thread::spawn(|| STRING_TABLE.intern("concurrent_same")))
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for symbol in &results[1..] {
            assert_eq!(results[0], *symbol);
        }
    }

    #[test]
    fn test_many_unique_strings() {
        let mut symbols = Vec::new();
        for i in 0..1000 {
            symbols.push(STRING_TABLE.intern(&format!("unique_{}", i)));
        }
        for (i, sym) in symbols.iter().enumerate() {
            let expected = format!("unique_{}", i);
            assert_eq!(STRING_TABLE.get(*sym), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StringTable>();
    }
}
