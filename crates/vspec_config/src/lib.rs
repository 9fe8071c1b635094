//! Loading and validation of the optional `vspec.toml` configuration file.
//!
//! The file supplies defaults for the command line (top module, include
//! directories, defines) and the description column of the parameter and
//! port tables, which cannot be recovered from HDL source.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::SpecConfig;
