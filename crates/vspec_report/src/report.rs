//! Assembly of the three report sections for one top module.

use crate::error::ReportError;
use crate::extract::{extract_parameters, extract_ports, ParameterRecord, PortRecord};
use crate::instance_map::{build_design_map, build_instance_map, InstanceMap};
use crate::table::{render_parameter_table, render_port_table};
use crate::tree::render_tree;
use serde::{Deserialize, Serialize};
use vspec_common::Interner;
use vspec_config::SpecConfig;
use vspec_diagnostics::DiagnosticSink;
use vspec_source::SourceDb;
use vspec_verilog::ast::ModuleDecl;
use vspec_verilog::ParsedDesign;

/// Banner printed before the instantiation tree.
pub const TREE_BANNER: &str =
    "\r\n-------------------------generate module tree-------------------------\r\n";
/// Banner printed before the parameter table.
pub const PARAM_BANNER: &str =
    "\r\n-------------------------generate param table-------------------------\r\n";
/// Banner printed before the port table.
pub const PORT_BANNER: &str =
    "\r\n-------------------------generate port table-------------------------\r\n";

/// Choices that shape a report.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Module to report on; the first definition when `None`.
    pub top: Option<String>,
    /// Only the top module's direct instances, without descending into
    /// their definitions.
    pub shallow: bool,
}

/// Hierarchy, parameters and ports of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecReport {
    /// Name of the reported module.
    pub top: String,
    /// Instances reachable from `top`.
    pub hierarchy: InstanceMap,
    /// Parameter table rows.
    pub parameters: Vec<ParameterRecord>,
    /// Port table rows.
    pub ports: Vec<PortRecord>,
}

impl SpecReport {
    /// Builds the report for the selected top module of `design`.
    ///
    /// Structural warnings (duplicate instances, undeclared ports, symbolic
    /// widths) go to `sink`; they do not fail the build.
    pub fn build(
        design: &ParsedDesign,
        options: &ReportOptions,
        config: &SpecConfig,
        source_db: &SourceDb,
        interner: &Interner,
        sink: &DiagnosticSink,
    ) -> Result<Self, ReportError> {
        let top = select_top(design, options.top.as_deref(), interner)?;
        let hierarchy = if options.shallow {
            build_instance_map(top, interner, sink)
        } else {
            build_design_map(design.modules(), top, interner, sink)
        };
        Ok(Self {
            top: interner.resolve(top.name).to_string(),
            hierarchy,
            parameters: extract_parameters(top, config, source_db, interner),
            ports: extract_ports(top, config, source_db, interner, sink),
        })
    }

    /// The instantiation tree.
    pub fn tree(&self) -> String {
        render_tree(&self.hierarchy, &self.top)
    }

    /// The parameter table.
    pub fn parameter_table(&self) -> Result<String, ReportError> {
        let names: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        let defaults: Vec<&str> = self.parameters.iter().map(|p| p.default.as_str()).collect();
        let functions: Vec<String> = self.parameters.iter().map(|p| p.function.clone()).collect();
        Ok(render_parameter_table(&names, &defaults, Some(functions.as_slice()))?)
    }

    /// The port table.
    pub fn port_table(&self) -> Result<String, ReportError> {
        let names: Vec<&str> = self.ports.iter().map(|p| p.name.as_str()).collect();
        let widths: Vec<_> = self.ports.iter().map(|p| &p.width).collect();
        let directions: Vec<&str> = self.ports.iter().map(|p| p.direction.as_str()).collect();
        let functions: Vec<String> = self.ports.iter().map(|p| p.function.clone()).collect();
        Ok(render_port_table(&names, &widths, &directions, Some(functions.as_slice()))?)
    }

    /// The three sections, each preceded by its banner line and ending with
    /// a newline.
    pub fn render_text(&self) -> Result<String, ReportError> {
        let mut out = String::new();
        out.push_str(TREE_BANNER);
        out.push('\n');
        out.push_str(&self.tree());
        out.push_str(PARAM_BANNER);
        out.push('\n');
        out.push_str(&self.parameter_table()?);
        out.push('\n');
        out.push_str(PORT_BANNER);
        out.push('\n');
        out.push_str(&self.port_table()?);
        out.push('\n');
        Ok(out)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn select_top<'d>(
    design: &'d ParsedDesign,
    requested: Option<&str>,
    interner: &Interner,
) -> Result<&'d ModuleDecl, ReportError> {
    match requested {
        Some(name) => interner
            .lookup(name)
            .and_then(|ident| design.find_module(ident))
            .ok_or_else(|| ReportError::UnknownTop(name.to_string())),
        None => design.modules().next().ok_or(ReportError::NoModules),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vspec_verilog::parse_file;

    fn design(source: &str) -> (ParsedDesign, SourceDb, Interner) {
        let mut db = SourceDb::new();
        let id = db.add_source("design.v", source.to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let file = parse_file(id, &db, &interner, &sink);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        let design = ParsedDesign {
            files: vec![file],
            directives: Vec::new(),
        };
        (design, db, interner)
    }

    fn build(source: &str, options: &ReportOptions) -> Result<SpecReport, ReportError> {
        let (design, db, interner) = design(source);
        let sink = DiagnosticSink::new();
        SpecReport::build(&design, options, &SpecConfig::default(), &db, &interner, &sink)
    }

    const SOC: &str = "
        module soc #(parameter WIDTH = 8)(input clk, output [WIDTH-1:0] q);
            core u_core(.clk(clk));
            core u_core2(.clk(clk));
            uart u_uart(.clk(clk));
        endmodule
        module core(input clk);
            alu u_alu();
        endmodule
    ";

    #[test]
    fn text_report_layout() {
        let report = build(SOC, &ReportOptions::default()).unwrap();
        let expected = "\r\n-------------------------generate module tree-------------------------\r\n\n\
soc (top)
├── u_core: core
│   └── u_alu: alu
├── u_core2: core (reused)
│   └── u_alu: alu (reused)
└── u_uart: uart
\r\n-------------------------generate param table-------------------------\r\n\n\
| Parameter | Default Value | Function |
| :-------: | :-----------: | :------: |
| WIDTH     |       8       |          |
\r\n-------------------------generate port table-------------------------\r\n\n\
|     Port     | Width | Direction | Function |
| :----------: | :---: | :-------: | :------: |
|     clk     |   1   |   input   |          |
|      q      |   8   |   output  |          |
";
        assert_eq!(report.render_text().unwrap(), expected);
    }

    #[test]
    fn shallow_report_stops_at_direct_children() {
        let options = ReportOptions {
            top: None,
            shallow: true,
        };
        let report = build(SOC, &options).unwrap();
        assert_eq!(report.hierarchy.len(), 1);
        assert!(!report.tree().contains("u_alu"));
    }

    #[test]
    fn explicit_top() {
        let options = ReportOptions {
            top: Some("core".to_string()),
            shallow: false,
        };
        let report = build(SOC, &options).unwrap();
        assert_eq!(report.top, "core");
        assert_eq!(report.tree(), "core (top)\n└── u_alu: alu\n");
        assert!(report.parameters.is_empty());
    }

    #[test]
    fn unknown_top() {
        let options = ReportOptions {
            top: Some("missing".to_string()),
            shallow: false,
        };
        let err = build(SOC, &options).unwrap_err();
        assert!(matches!(err, ReportError::UnknownTop(ref name) if name == "missing"));
        assert_eq!(
            err.to_string(),
            "top module `missing` is not defined in the input files"
        );
    }

    #[test]
    fn no_modules() {
        let err = build("// nothing here\n", &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::NoModules));
    }

    #[test]
    fn json_report() {
        let report = build(SOC, &ReportOptions::default()).unwrap();
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["top"], "soc");
        assert_eq!(value["hierarchy"]["soc"]["u_uart"], "uart");
        assert_eq!(value["hierarchy"]["core"]["u_alu"], "alu");
        assert_eq!(value["ports"][1]["width"], 8);
        assert_eq!(value["ports"][1]["direction"], "output");
        let back: SpecReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
