//! String interning for cheap identifier comparison.
//!
//! [`Symbol`] is a handle to a string that has been interned once and
//! lives for the rest of the process. Two symbols compare equal in O(1)
//! because equal strings always intern to the same pointer.
//!
//! # Memory model
//!
//! Interned strings are leaked (`Box::leak`'d) rather than freed. This
//! pipeline runs one compile per invocation, so the total number of
//! distinct identifiers is tiny and bounded by the size of a single
//! expression; leaking avoids needing any lifetime tracking for them.
//!
//! # Thread safety
//!
//! Single-threaded: the interner is a plain `RefCell`, not a lock. This
//! matches the synchronous, one-compile-at-a-time way this pipeline
//! runs (see the crate's concurrency model).

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

struct Interner {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Self {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&index) = self.lookup.get(s) {
            return index;
        }
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        let index = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, index);
        index
    }

    fn resolve(&self, index: u32) -> &'static str {
        self.strings[index as usize]
    }
}

/// A cheap-to-copy, cheap-to-compare handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    index: u32,
}

impl Symbol {
    /// Interns `s`, returning the same `Symbol` for equal strings.
    pub fn intern(s: &str) -> Self {
        let index = INTERNER.with(|interner| interner.borrow_mut().intern(s));
        Self { index }
    }

    /// Resolves this symbol back to its string.
    pub fn as_str(&self) -> &'static str {
        INTERNER.with(|interner| interner.borrow().resolve(self.index))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_strings_intern_to_equal_symbols() {
        assert_eq!(Symbol::intern("sin"), Symbol::intern("sin"));
    }

    #[test]
    fn test_different_strings_intern_to_different_symbols() {
        assert_ne!(Symbol::intern("sin"), Symbol::intern("cos"));
    }

    #[test]
    fn test_round_trips_through_as_str() {
        let sym = Symbol::intern("pi");
        assert_eq!(sym.as_str(), "pi");
    }

    #[test]
    fn test_display_matches_as_str() {
        let sym = Symbol::intern("x");
        assert_eq!(format!("{sym}"), "x");
    }
}
