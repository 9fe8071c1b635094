//! Source text ownership and location tracking.
//!
//! Every file the tool reads (command-line sources, `` `include``d headers and
//! the preprocessed text handed to the lexer) is registered in a [`SourceDb`].
//! AST nodes and diagnostics refer back to it through [`Span`]s.

#![warn(missing_docs)]

pub mod source_db;
pub mod span;

pub use source_db::{ResolvedSpan, SourceDb, SourceFile};
pub use span::{FileId, Span};
