//! String interning.
//!
//! Identifiers in a source file repeat constantly: a local variable may be
//! named in a declaration, an assignment, and a dozen expressions. Comparing
//! and hashing `String`s at every one of those sites is wasteful. A `Symbol`
//! is a 4-byte handle into a process-global table, so two symbols compare
//! equal iff the underlying text is equal, in O(1).
//!
//! The table never evicts entries: compilations are short-lived and the set
//! of distinct identifiers in a single source file is small, so leaking the
//! backing `String` data for the process lifetime is the simplest correct
//! choice (see `Interner::intern`).

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;

/// An interned identifier.
///
/// Cheap to copy, compare, and hash. Use [`Symbol::as_str`] to recover the
/// original text for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern `text`, returning the symbol for it.
    pub fn intern(text: &str) -> Self {
        INTERNER.with(|i| i.borrow_mut().intern(text))
    }

    /// The original text this symbol was interned from.
    pub fn as_str(&self) -> &'static str {
        INTERNER.with(|i| i.borrow().get(*self))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Interner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

impl Interner {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::new(),
        }
    }

    fn intern(&mut self, text: &str) -> Symbol {
        if let Some(&id) = self.map.get(text) {
            return Symbol(id);
        }
        // Leaked once per unique identifier in the program; see module docs.
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.map.insert(leaked, id);
        Symbol(id)
    }

    fn get(&self, symbol: Symbol) -> &'static str {
        self.strings[symbol.0 as usize]
    }
}

thread_local! {
    static INTERNER: RefCell<Interner> = RefCell::new(Interner::new());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_symbol() {
        let a = Symbol::intern("main");
        let b = Symbol::intern("main");
        assert_eq!(a, b);
    }

    #[test]
    fn different_text_interns_to_different_symbols() {
        let a = Symbol::intern("x");
        let b = Symbol::intern("y");
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_through_as_str() {
        let sym = Symbol::intern("fact");
        assert_eq!(sym.as_str(), "fact");
    }
}
