//! Coded diagnostics for everything the tool reports about its input.
//!
//! Library code never prints. Problems found in source text are emitted into a
//! [`DiagnosticSink`] as [`Diagnostic`]s; the binary renders them to stderr
//! with a [`TerminalRenderer`] or serializes them as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
