//! Foundational types shared by the vspec parser and report crates.
//!
//! Names of modules, instances, parameters and ports are interned once by the
//! parser and resolved back to text only when a report is assembled.

#![warn(missing_docs)]

pub mod ident;

pub use ident::{Ident, Interner};
