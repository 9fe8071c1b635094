//! Structural extraction and rendering of a Verilog module report.
//!
//! Given parsed module definitions, this crate builds the instance map of a
//! top module and renders three artifacts: an instantiation tree, a
//! parameter table and a port table. [`SpecReport`] ties them together.

#![warn(missing_docs)]

pub mod const_eval;
pub mod error;
pub mod extract;
pub mod instance_map;
pub mod report;
pub mod table;
pub mod tree;

pub use error::{ReportError, TableError};
pub use extract::{
    extract_parameters, extract_ports, port_width, ParameterRecord, PortRecord, Width,
};
pub use instance_map::{build_design_map, build_instance_map, InstanceMap};
pub use report::{ReportOptions, SpecReport};
pub use table::{render_parameter_table, render_port_table};
pub use tree::{render_tree, write_tree, ReuseCounter};
