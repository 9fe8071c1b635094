//! Interned design names.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// An interned name: module types, instance names, parameters, ports, macros.
///
/// Equality and hashing are O(1); the text lives in the [`Interner`] that
/// produced the identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Creates an `Ident` from a raw index (deserialization and tests only).
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this identifier.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `Ident` wraps a `u32`, which always fits in a `usize` on supported
// targets, and `try_from_usize` rejects anything that does not fit back.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// String interner for every name seen while parsing a design.
///
/// Interning goes through `&self` so the parser, preprocessor and report
/// builder can share one instance without threading `&mut` around.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns `s`, returning the existing identifier if already present.
    pub fn get_or_intern(&self, s: &str) -> Ident {
        self.rodeo.get_or_intern(s)
    }

    /// Looks up `s` without interning it.
    ///
    /// Used when a name comes from outside the parsed sources (for example a
    /// `--top` argument) and must match a name the parser actually saw.
    pub fn lookup(&self, s: &str) -> Option<Ident> {
        self.rodeo.get(s)
    }

    /// Resolves an identifier back to its text.
    ///
    /// # Panics
    ///
    /// Panics if `ident` was not produced by this interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
