//! Diagnostic codes.
//!
//! Numbering: `1xx` lexical, `2xx` preprocessor, `3xx` syntax and structure,
//! `4xx` report extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a code, which fixes its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E` prefix.
    Error,
    /// `W` prefix.
    Warning,
}

impl Category {
    /// The single-character prefix.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A category prefix plus a number, displayed as e.g. `E301`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Category.
    pub category: Category,
    /// Number within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }

    /// Malformed token: unterminated string or comment, stray character.
    pub const LEX_ERROR: Self = Self::new(Category::Error, 101);
    /// Use of a macro that was never defined.
    pub const UNDEFINED_MACRO: Self = Self::new(Category::Error, 201);
    /// `` `include `` target not found in any search directory.
    pub const INCLUDE_NOT_FOUND: Self = Self::new(Category::Error, 202);
    /// `` `else ``/`` `endif `` without an opening conditional, or a missing `` `endif ``.
    pub const UNBALANCED_CONDITIONAL: Self = Self::new(Category::Error, 203);
    /// Directive with missing or malformed arguments.
    pub const BAD_DIRECTIVE: Self = Self::new(Category::Error, 204);
    /// Recursive `` `include `` or macro expansion beyond the nesting limit.
    pub const EXPANSION_DEPTH: Self = Self::new(Category::Error, 205);
    /// Unexpected token.
    pub const SYNTAX: Self = Self::new(Category::Error, 301);
    /// Two instances with the same name inside one module.
    pub const DUPLICATE_INSTANCE: Self = Self::new(Category::Warning, 301);
    /// Non-ANSI header port with no direction declaration in the body.
    pub const UNDECLARED_PORT: Self = Self::new(Category::Warning, 302);
    /// Port range bound that could not be reduced to a constant.
    pub const SYMBOLIC_WIDTH: Self = Self::new(Category::Warning, 401);
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
