//! Conformance test helpers for vspec.
//!
//! Writes Verilog sources to a temporary directory, runs them through the
//! whole pipeline (preprocess, parse, build report) and returns structured
//! results for assertions in integration tests.

#![warn(missing_docs)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use vspec_common::Interner;
use vspec_config::SpecConfig;
use vspec_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use vspec_report::{ReportError, ReportOptions, SpecReport};
use vspec_source::SourceDb;
use vspec_verilog::{ParseError, ParseOptions};

/// Result of running the preprocess, parse and report pipeline.
pub struct PipelineResult {
    /// The report, if parsing produced no errors.
    pub report: Option<Result<SpecReport, ReportError>>,
    /// All diagnostics emitted during the pipeline.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any errors were emitted.
    pub has_errors: bool,
    /// Number of error-severity diagnostics.
    pub error_count: usize,
    /// Number of warning-severity diagnostics.
    pub warning_count: usize,
}

impl PipelineResult {
    /// The report. Panics if parsing failed or the report could not be built.
    pub fn report(&self) -> &SpecReport {
        match &self.report {
            Some(Ok(report)) => report,
            Some(Err(e)) => panic!("report failed: {e}"),
            None => panic!("parse errors: {:#?}", self.diagnostics),
        }
    }

    /// The text rendering of the report.
    pub fn text(&self) -> String {
        match self.report().render_text() {
            Ok(text) => text,
            Err(e) => panic!("render failed: {e}"),
        }
    }

    /// Diagnostics carrying `code`.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.code == code).collect()
    }
}

/// Sources plus the options a run is made with.
#[derive(Default)]
pub struct Fixture {
    files: Vec<(String, String)>,
    defines: Vec<String>,
    include_subdirs: Vec<String>,
    options: ReportOptions,
    config: SpecConfig,
}

impl Fixture {
    /// Starts an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file at `name` (relative to the fixture root). Only files
    /// ending in `.v` are passed on the command line; others are reachable
    /// through `` `include ``.
    pub fn file(mut self, name: &str, text: &str) -> Self {
        self.files.push((name.to_string(), text.to_string()));
        self
    }

    /// Adds a `-D` define.
    pub fn define(mut self, define: &str) -> Self {
        self.defines.push(define.to_string());
        self
    }

    /// Adds a fixture subdirectory as an include directory.
    pub fn include_dir(mut self, subdir: &str) -> Self {
        self.include_subdirs.push(subdir.to_string());
        self
    }

    /// Selects the top module.
    pub fn top(mut self, top: &str) -> Self {
        self.options.top = Some(top.to_string());
        self
    }

    /// Restricts the hierarchy to direct instances.
    pub fn shallow(mut self) -> Self {
        self.options.shallow = true;
        self
    }

    /// Uses a configuration parsed from TOML text.
    pub fn config(mut self, toml: &str) -> Self {
        self.config = match vspec_config::load_config_from_str(toml) {
            Ok(config) => config,
            Err(e) => panic!("invalid fixture config: {e}"),
        };
        self
    }

    /// Writes the files and runs the pipeline.
    pub fn run(self) -> PipelineResult {
        match self.try_run() {
            Ok(result) => result,
            Err(e) => panic!("pipeline failed: {e}"),
        }
    }

    /// Like [`Fixture::run`] but returns parse-stage failures.
    pub fn try_run(self) -> Result<PipelineResult, ParseError> {
        let dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => panic!("cannot create temp dir: {e}"),
        };
        let mut inputs = Vec::new();
        for (name, text) in &self.files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| ParseError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, text).map_err(|source| ParseError::Io {
                path: path.clone(),
                source,
            })?;
            if name.ends_with(".v") {
                inputs.push(path);
            }
        }
        let parse_options = ParseOptions {
            include_dirs: self
                .include_subdirs
                .iter()
                .map(|d| dir.path().join(d))
                .collect::<Vec<PathBuf>>(),
            defines: self.defines.clone(),
        };
        run_pipeline(&inputs, &parse_options, &self.options, &self.config)
    }
}

/// Runs the pipeline on files already on disk.
pub fn run_pipeline(
    paths: &[PathBuf],
    parse_options: &ParseOptions,
    options: &ReportOptions,
    config: &SpecConfig,
) -> Result<PipelineResult, ParseError> {
    let mut source_db = SourceDb::new();
    let interner = Interner::new();
    let sink = DiagnosticSink::new();

    let design =
        vspec_verilog::parse_files(paths, parse_options, &mut source_db, &interner, &sink)?;
    let report = if sink.has_errors() {
        None
    } else {
        Some(SpecReport::build(
            &design,
            options,
            config,
            &source_db,
            &interner,
            &sink,
        ))
    };

    let diagnostics = sink.take_all();
    let error_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warning_count = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    Ok(PipelineResult {
        report,
        has_errors: error_count > 0,
        diagnostics,
        error_count,
        warning_count,
    })
}

/// Runs one source file through the pipeline with default options.
pub fn spec_of(source: &str) -> PipelineResult {
    Fixture::new().file("design.v", source).run()
}
