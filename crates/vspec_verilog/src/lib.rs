//! Preprocessor and recursive descent parser for the module-level subset of
//! Verilog-2005.
//!
//! The entry point is [`parse_files`], which checks that every input exists,
//! preprocesses each file in order (macros carry across files), and parses
//! the expanded text into a [`VerilogSourceFile`].
//!
//! # Architecture
//!
//! - **Preprocessor** ([`preprocess`]): directives, conditionals, includes
//!   and macro expansion over raw text.
//! - **Lexer** ([`lexer`]): expanded text to tokens.
//! - **Parser** ([`parser`]): module headers, parameters, ports and
//!   instantiations; everything else is skipped as balanced token runs.
//! - **AST** ([`ast`]): node types with spans and serde support.

/// Syntax tree types.
pub mod ast;
mod expr;
mod items;
/// Lexical analyzer.
pub mod lexer;
/// Parser state and module header rules.
pub mod parser;
/// Compiler directives and macro expansion.
pub mod preprocess;
/// Token types.
pub mod token;

pub use ast::{ModuleDecl, VerilogSourceFile};
pub use preprocess::{Directive, DirectiveKind, Preprocessor};
pub use token::{Token, VerilogToken};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use vspec_common::{Ident, Interner};
use vspec_diagnostics::DiagnosticSink;
use vspec_source::{FileId, SourceDb};

/// Failures that stop parsing before any file is read.
#[derive(Debug, Error)]
pub enum ParseError {
    /// An input path does not name a readable file.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),
    /// An input file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A `-D` define is not `NAME` or `NAME=VALUE`.
    #[error("invalid macro definition `{0}`")]
    InvalidDefine(String),
}

/// Include search path and predefined macros.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Directories searched for `` `include `` after the including file's own.
    pub include_dirs: Vec<PathBuf>,
    /// `NAME` or `NAME=VALUE` entries.
    pub defines: Vec<String>,
}

/// Every parsed file plus the directives met while preprocessing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedDesign {
    /// Files in input order.
    pub files: Vec<VerilogSourceFile>,
    /// Directives in encounter order.
    pub directives: Vec<Directive>,
}

impl ParsedDesign {
    /// All module definitions, file by file in source order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDecl> {
        self.files.iter().flat_map(VerilogSourceFile::modules)
    }

    /// First definition of the module called `name`.
    pub fn find_module(&self, name: Ident) -> Option<&ModuleDecl> {
        self.modules().find(|m| m.name == name)
    }
}

/// Lexes and parses one file registered in `source_db`.
///
/// The text is parsed as-is; run it through a [`Preprocessor`] first if it
/// may contain directives. Errors are reported to `sink` and represented as
/// `Error` nodes in the tree.
pub fn parse_file(
    file_id: FileId,
    source_db: &SourceDb,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> VerilogSourceFile {
    let file = source_db.get_file(file_id);
    let source = &file.content;
    let tokens = lexer::lex(source, file_id, sink);
    let mut parser = parser::VerilogParser::new(tokens, source, file_id, interner, sink);
    parser.parse_source_file()
}

/// Preprocesses and parses `paths` in order.
///
/// Each raw file is loaded into `source_db` (directive spans point there);
/// its expanded text is registered again under the same path and parsed, so
/// AST spans point into the expanded copy.
pub fn parse_files(
    paths: &[PathBuf],
    options: &ParseOptions,
    source_db: &mut SourceDb,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Result<ParsedDesign, ParseError> {
    if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
        return Err(ParseError::FileNotFound(missing.clone()));
    }

    let mut preprocessor = Preprocessor::new(&options.include_dirs, sink);
    for define in &options.defines {
        if !preprocessor.define(define) {
            return Err(ParseError::InvalidDefine(define.clone()));
        }
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = source_db.load_file(path).map_err(|source| ParseError::Io {
            path: path.clone(),
            source,
        })?;
        let expanded = preprocessor.preprocess(raw, source_db);
        let id = source_db.add_source(path.clone(), expanded);
        files.push(parse_file(id, source_db, interner, sink));
    }

    Ok(ParsedDesign {
        files,
        directives: preprocessor.into_directives(),
    })
}
