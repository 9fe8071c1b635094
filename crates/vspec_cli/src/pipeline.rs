//! The report pipeline behind the `vspec` command.
//!
//! 1. Load `vspec.toml` if `--config` was given
//! 2. Merge it with the command line (flags win)
//! 3. Preprocess and parse the source files
//! 4. Stop with exit code 1 if any error diagnostic was reported
//! 5. Build the report for the top module and write it to stdout

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use vspec_common::Interner;
use vspec_config::SpecConfig;
use vspec_diagnostics::{DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use vspec_report::{ReportOptions, SpecReport};
use vspec_source::SourceDb;
use vspec_verilog::ParseOptions;

use crate::{Cli, OutputFormat};

const INFO: &str = "vspec - Verilog module specification generator";
const USAGE: &str = "Usage: vspec [OPTIONS] file ...";

/// Runs the command. Returns the process exit code; `Err` means the run
/// could not start or was aborted (missing file, bad config, unknown top).
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<i32, Box<dyn Error>> {
    if cli.version {
        write_version(out)?;
        return Ok(0);
    }

    let config = match &cli.config {
        Some(path) => vspec_config::load_config(path)?,
        None => SpecConfig::default(),
    };

    if cli.files.is_empty() {
        write_version(out)?;
        return Ok(0);
    }

    let color = cli.color.enabled();
    let parse_options = merge_parse_options(&config, cli);
    let report_options = ReportOptions {
        top: cli.top.clone().or_else(|| config.top.clone()),
        shallow: cli.shallow,
    };

    if !cli.quiet {
        eprintln!("   Parsing {} file(s)", cli.files.len());
    }

    let mut source_db = SourceDb::new();
    let interner = Interner::new();
    let sink = DiagnosticSink::new();
    let design = vspec_verilog::parse_files(
        &cli.files,
        &parse_options,
        &mut source_db,
        &interner,
        &sink,
    )?;

    if cli.verbose {
        eprintln!(
            "   Found {} module(s), {} directive(s)",
            design.modules().count(),
            design.directives.len()
        );
    }

    if sink.has_errors() {
        render_diagnostics(&sink, &source_db, color);
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            sink.error_count(),
            sink.warning_count()
        );
        return Ok(1);
    }

    let report = SpecReport::build(
        &design,
        &report_options,
        &config,
        &source_db,
        &interner,
        &sink,
    )?;

    if !cli.quiet {
        render_diagnostics(&sink, &source_db, color);
        eprintln!("   Top module: {}", report.top);
    }

    let text = match cli.format {
        OutputFormat::Text => report.render_text()?,
        OutputFormat::Json => {
            let mut json = report.to_json()?;
            json.push('\n');
            json
        }
    };
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(0)
}

fn write_version(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{INFO}")?;
    writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "{USAGE}")
}

/// Config lists first, then the command line.
fn merge_parse_options(config: &SpecConfig, cli: &Cli) -> ParseOptions {
    let include_dirs: Vec<PathBuf> = config
        .include_dirs
        .iter()
        .chain(&cli.include)
        .cloned()
        .collect();
    let defines = config.defines.iter().chain(&cli.define).cloned().collect();
    ParseOptions {
        include_dirs,
        defines,
    }
}

/// Renders every diagnostic in `sink` to stderr.
fn render_diagnostics(sink: &DiagnosticSink, source_db: &SourceDb, color: bool) {
    let renderer = TerminalRenderer::new(color);
    for diag in sink.diagnostics() {
        eprint!("{}", renderer.render(&diag, source_db));
    }
}
