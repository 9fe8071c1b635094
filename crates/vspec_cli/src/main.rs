//! vspec: generates a module specification (instantiation tree, parameter
//! table, port table) from Verilog source files.

#![warn(missing_docs)]

mod pipeline;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

/// Verilog module specification generator.
#[derive(Parser, Debug)]
#[command(name = "vspec", disable_version_flag = true)]
pub struct Cli {
    /// Show the version and usage.
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Directory searched for included files (repeatable).
    #[arg(short = 'I', long = "include", value_name = "PATH")]
    pub include: Vec<PathBuf>,

    /// Macro definition as NAME or NAME=VALUE (repeatable).
    #[arg(short = 'D', value_name = "NAME[=VAL]")]
    pub define: Vec<String>,

    /// Module to report on (default: the first module definition).
    #[arg(long)]
    pub top: Option<String>,

    /// Only list the top module's direct instances.
    #[arg(long)]
    pub shallow: bool,

    /// Path to a `vspec.toml` configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Suppress all output except the report and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print extra progress information.
    #[arg(long)]
    pub verbose: bool,

    /// Control colored diagnostics.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Verilog source files, preprocessed and parsed in order.
    pub files: Vec<PathBuf>,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Banner-separated tree and Markdown tables.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    match pipeline::run(&cli, &mut stdout.lock()) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
