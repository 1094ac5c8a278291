//! The scanner state queue.
//!
//! A growable ring buffer of scanner states providing bounded lookahead,
//! with one retained "previous" state for range computation. The queue owns
//! the scanner; the parser reaches the scanner only through the queue, which
//! keeps the mode-switching entry points (string interpolation) explicit.

use toitc_lex::{Scanner, ScannerState};

/// A queue maintaining the scanner tokens.
///
/// Always keeps one previous scanner state around (initially invalid).
pub struct ScannerStateQueue<'a> {
    scanner: Scanner<'a>,
    /// Ring buffer; always a power-of-two length.
    states: Vec<ScannerState>,
    /// Index of the 'previous' state (the most recently consumed). The
    /// first live state is at `wrap(previous_index + 1)`.
    previous_index: usize,
    /// Number of buffered states, including the 'previous' one.
    buffered_count_with_previous: usize,
}

const INITIAL_SIZE: usize = 4;

impl<'a> ScannerStateQueue<'a> {
    /// Creates a queue over the given scanner. The 'previous' slot starts
    /// out invalid.
    pub fn new(scanner: Scanner<'a>) -> Self {
        let states = vec![ScannerState::invalid(); INITIAL_SIZE];
        Self { scanner, states, previous_index: 0, buffered_count_with_previous: 1 }
    }

    /// Consumes the current state: it becomes the 'previous' state.
    pub fn consume(&mut self) {
        debug_assert!(self.buffered_count_with_previous > 1);
        self.previous_index = self.wrap(self.previous_index + 1);
        self.buffered_count_with_previous -= 1;
    }

    /// Drops all buffered states, keeping only the 'previous' one.
    ///
    /// Used for error recovery in string interpolations: buffered states
    /// would otherwise interfere with rescanning the rest of the string.
    pub fn discard_buffered(&mut self) {
        self.previous_index =
            self.wrap(self.previous_index + self.buffered_count_with_previous - 1);
        self.buffered_count_with_previous = 1;
    }

    /// Buffers the identifier (or fallback token) following a `$`.
    pub fn buffer_interpolated_part(&mut self) {
        debug_assert!(self.buffered_count_with_previous == 1);
        let state = self.scanner.next_interpolated_part();
        self.buffer(state);
    }

    /// Buffers the string continuation after an interpolated expression.
    pub fn buffer_string_part(&mut self, is_multiline: bool) {
        debug_assert!(self.buffered_count_with_previous == 1);
        let state = self.scanner.next_string_part(is_multiline);
        self.buffer(state);
    }

    /// Buffers a `%`-format spec inside `$(...)`.
    pub fn buffer_string_format_part(&mut self) {
        debug_assert!(self.buffered_count_with_previous == 1);
        let state = self.scanner.next_string_format_part();
        self.buffer(state);
    }

    /// Returns the scanner state at position `i`, scanning on demand.
    ///
    /// It is legal to ask for `-1` to get the previous state.
    pub fn get(&mut self, i: isize) -> ScannerState {
        if i == -1 {
            return self.states[self.previous_index];
        }
        debug_assert!(i >= 0);
        while i as usize >= self.buffered_count_with_previous - 1 {
            let state = self.scanner.next();
            self.buffer(state);
        }
        self.states[self.wrap(self.previous_index + 1 + i as usize)]
    }

    /// Looks ahead in the raw input. Only valid while nothing is buffered.
    pub fn scanner_look_ahead(&self, n: usize) -> u8 {
        debug_assert!(self.buffered_count_with_previous == 1);
        self.scanner.look_ahead(n)
    }

    /// The number of buffered states (excluding the 'previous' one).
    pub fn buffered_count(&self) -> usize {
        self.buffered_count_with_previous - 1
    }

    /// The underlying scanner.
    pub fn scanner(&self) -> &Scanner<'a> {
        &self.scanner
    }

    /// The underlying scanner, mutably (EOF jumps, hash-bang skipping).
    pub fn scanner_mut(&mut self) -> &mut Scanner<'a> {
        &mut self.scanner
    }

    fn wrap(&self, i: usize) -> usize {
        debug_assert!(self.states.len().is_power_of_two());
        i & (self.states.len() - 1)
    }

    fn buffer(&mut self, state: ScannerState) {
        if self.buffered_count_with_previous >= self.states.len() {
            // Rotate the states into place, then double the capacity.
            if self.previous_index != 0 {
                self.states.rotate_left(self.previous_index);
                self.previous_index = 0;
            }
            let new_len = self.states.len() * 2;
            self.states.resize(new_len, ScannerState::invalid());
        }
        let index = self.wrap(self.previous_index + self.buffered_count_with_previous);
        self.states[index] = state;
        self.buffered_count_with_previous += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use toitc_lex::{SymbolCanonicalizer, Token};
    use toitc_util::diagnostic::Handler;
    use toitc_util::fs::StdFilesystem;
    use toitc_util::source::SourceManager;

    use super::*;

    fn with_queue<R>(text: &str, f: impl FnOnce(&mut ScannerStateQueue<'_>) -> R) -> R {
        let fs = StdFilesystem::new();
        let mut manager = SourceManager::new(&fs);
        let source = manager.add_virtual_file("///q.toit", text.as_bytes().to_vec());
        let symbols = RefCell::new(SymbolCanonicalizer::new());
        let handler = Handler::new();
        let scanner = Scanner::new(&source, &symbols, &handler);
        let mut queue = ScannerStateQueue::new(scanner);
        f(&mut queue)
    }

    #[test]
    fn test_initial_previous_is_invalid() {
        with_queue("a", |queue| {
            assert!(!queue.get(-1).is_valid());
        });
    }

    #[test]
    fn test_get_and_consume() {
        with_queue("a b c", |queue| {
            assert_eq!(queue.get(0).token(), Token::Identifier);
            assert_eq!(queue.get(0).data.unwrap().as_str(), "a");
            queue.consume();
            // The consumed state is now the previous one.
            assert_eq!(queue.get(-1).data.unwrap().as_str(), "a");
            assert_eq!(queue.get(0).data.unwrap().as_str(), "b");
        });
    }

    #[test]
    fn test_lookahead_growth() {
        // Force the ring to grow past its initial capacity.
        with_queue("a b c d e f g h i j", |queue| {
            let ninth = queue.get(8);
            assert_eq!(ninth.data.unwrap().as_str(), "i");
            // Earlier states are still intact.
            assert_eq!(queue.get(0).data.unwrap().as_str(), "a");
            assert_eq!(queue.get(4).data.unwrap().as_str(), "e");
            assert!(queue.buffered_count() >= 9);
        });
    }

    #[test]
    fn test_growth_after_consumes_rotates() {
        with_queue("a b c d e f g h", |queue| {
            queue.get(0);
            queue.consume();
            queue.consume();
            queue.consume();
            // previous is now "c"; buffering more forces a rotate+grow.
            assert_eq!(queue.get(4).data.unwrap().as_str(), "h");
            assert_eq!(queue.get(-1).data.unwrap().as_str(), "c");
            assert_eq!(queue.get(0).data.unwrap().as_str(), "d");
        });
    }

    #[test]
    fn test_discard_buffered() {
        with_queue("a b c d", |queue| {
            queue.get(2); // Buffer a, b, c.
            queue.discard_buffered();
            assert_eq!(queue.buffered_count(), 0);
            // The next get scans fresh from where the scanner stopped.
            assert_eq!(queue.get(0).data.unwrap().as_str(), "d");
        });
    }
}
