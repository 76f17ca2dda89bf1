//! Symbol module - string interning for identifiers.
//!
//! A [`Symbol`] is a 4-byte handle to an interned string. Identifiers,
//! constructor names and effect names appear many times across the
//! pipeline; interning makes comparison O(1) and keeps AST nodes `Copy`-
//! friendly.
//!
//! Interned strings are leaked to obtain `'static` references. That is
//! acceptable here: the table lives for the whole invocation and total
//! growth is bounded by source size.
//!
//! # Examples
//!
//! ```
//! use mkc_util::symbol::Symbol;
//!
//! let a = Symbol::intern("main");
//! let b = Symbol::intern("main");
//! assert_eq!(a, b);
//! assert_eq!(a.as_str(), "main");
//! ```

use ahash::RandomState;
use dashmap::DashMap;
use std::fmt;
use std::sync::{LazyLock, RwLock};

static INTERNER: LazyLock<Interner> = LazyLock::new(Interner::new);

struct Interner {
    /// string -> index
    map: DashMap<&'static str, u32, RandomState>,
    /// index -> string
    strings: RwLock<Vec<&'static str>>,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: DashMap::with_hasher(RandomState::new()),
            strings: RwLock::new(Vec::new()),
        }
    }

    fn intern(&self, string: &str) -> u32 {
        if let Some(entry) = self.map.get(string) {
            return *entry;
        }

        // Take the write lock before re-checking so two racing interns of
        // the same new string cannot both allocate an index.
        let mut strings = self.strings.write().unwrap();
        if let Some(entry) = self.map.get(string) {
            return *entry;
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = strings.len() as u32;
        strings.push(leaked);
        self.map.insert(leaked, index);
        index
    }

    fn resolve(&self, index: u32) -> &'static str {
        self.strings.read().unwrap()[index as usize]
    }
}

/// Interned string handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern a string, returning its stable handle.
    pub fn intern(string: &str) -> Self {
        Symbol(INTERNER.intern(string))
    }

    /// The interned string.
    pub fn as_str(&self) -> &'static str {
        INTERNER.resolve(self.0)
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
    fn from(string: &str) -> Self {
        Symbol::intern(string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_same_symbol() {
        let a = Symbol::intern("handler");
        let b = Symbol::intern("handler");
        assert_eq!(a, b);
    }

    #[test]
    fn different_strings_different_symbols() {
        assert_ne!(Symbol::intern("ok"), Symbol::intern("err"));
    }

    #[test]
    fn as_str_round_trips() {
        let sym = Symbol::intern("listUsers");
        assert_eq!(sym.as_str(), "listUsers");
        assert_eq!(sym.to_string(), "listUsers");
    }

    #[test]
    fn concurrent_interning_is_consistent() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| Symbol::intern("shared")))
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(symbols.windows(2).all(|w| w[0] == w[1]));
    }
}
