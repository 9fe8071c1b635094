//! Parameter and port records pulled out of a module definition.

use crate::const_eval::{eval_range, module_env, ConstEnv};
use serde::{Deserialize, Serialize};
use std::fmt;
use vspec_common::{Ident, Interner};
use vspec_config::SpecConfig;
use vspec_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use vspec_source::SourceDb;
use vspec_verilog::ast::{Direction, ModuleDecl, ModuleItem, PortDecl, PortStyle};

/// One row of the parameter table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// Parameter name.
    pub name: String,
    /// Default value as written in the source, or empty.
    pub default: String,
    /// Description, or empty.
    pub function: String,
}

/// Bit width of a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Width {
    /// Constant width, at least 1.
    Bits(u64),
    /// Range whose bounds are not constant, as written (`[N-1:0]`).
    Symbolic(String),
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Bits(n) => write!(f, "{n}"),
            Width::Symbolic(text) => f.write_str(text),
        }
    }
}

/// One row of the port table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    /// Port name.
    pub name: String,
    /// Bit width.
    pub width: Width,
    /// Direction.
    pub direction: Direction,
    /// Description, or empty.
    pub function: String,
}

/// Width of the ports declared by `decl`: `|msb - lsb| + 1` for a constant
/// range, the source text of a non-constant one, otherwise the width implied
/// by the net type (1 unless `integer` or `time`).
pub fn port_width(
    decl: &PortDecl,
    env: &ConstEnv,
    source_db: &SourceDb,
    interner: &Interner,
) -> Width {
    match &decl.range {
        Some(range) => eval_range(range, source_db, interner, env)
            .and_then(|(msb, lsb)| msb.abs_diff(lsb).checked_add(1))
            .map_or_else(
                || Width::Symbolic(cell_text(source_db.snippet(range.span))),
                Width::Bits,
            ),
        None => Width::Bits(decl.net_type.map_or(1, |t| t.implicit_width())),
    }
}

/// Source text on one line: runs of whitespace, newlines included, become a
/// single space.
fn cell_text(snippet: &str) -> String {
    snippet.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The overridable parameters, one record per name.
///
/// With a `#(...)` header list only the header parameters count: body
/// `parameter` declarations are then local. Without one, the body
/// `parameter` declarations are the interface. `localparam` is always
/// skipped.
pub fn extract_parameters(
    module: &ModuleDecl,
    config: &SpecConfig,
    source_db: &SourceDb,
    interner: &Interner,
) -> Vec<ParameterRecord> {
    let has_header = !module.params.is_empty();
    let body = module
        .items
        .iter()
        .filter(|_| !has_header)
        .filter_map(|item| match item {
            ModuleItem::ParameterDecl(decl) => Some(decl),
            _ => None,
        });
    module
        .params
        .iter()
        .filter(|decl| !decl.local)
        .chain(body)
        .flat_map(|decl| &decl.assignments)
        .map(|assignment| {
            let name = interner.resolve(assignment.name);
            ParameterRecord {
                name: name.to_string(),
                default: assignment
                    .value
                    .as_ref()
                    .map(|v| cell_text(source_db.snippet(v.span())))
                    .unwrap_or_default(),
                function: config.parameter_description(name).to_string(),
            }
        })
        .collect()
}

/// Ports in header order, one record per name.
///
/// Non-ANSI header names take their direction and range from the body
/// declaration; a name never declared in the body is reported and skipped.
/// A range that is not constant is reported once per declaration.
pub fn extract_ports(
    module: &ModuleDecl,
    config: &SpecConfig,
    source_db: &SourceDb,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Vec<PortRecord> {
    let env = module_env(module, source_db, interner);
    let body: Vec<&PortDecl> = module
        .items
        .iter()
        .filter_map(|item| match item {
            ModuleItem::PortDecl(decl) => Some(decl),
            _ => None,
        })
        .collect();

    let record = |decl: &PortDecl, name: Ident| {
        let name = interner.resolve(name);
        PortRecord {
            name: name.to_string(),
            width: port_width(decl, &env, source_db, interner),
            direction: decl.direction,
            function: config.port_description(name).to_string(),
        }
    };

    let mut records = Vec::new();
    match module.port_style {
        PortStyle::Ansi => {
            for decl in &module.ports {
                records.extend(decl.names.iter().map(|name| record(decl, *name)));
            }
        }
        PortStyle::NonAnsi => {
            for port in &module.port_names {
                match body.iter().find(|decl| decl.names.contains(&port.name)) {
                    Some(decl) => records.push(record(*decl, port.name)),
                    None => sink.emit(
                        Diagnostic::warning(
                            DiagnosticCode::UNDECLARED_PORT,
                            format!(
                                "port `{}` has no input, output or inout declaration",
                                interner.resolve(port.name)
                            ),
                            port.span,
                        )
                        .with_help("the port is left out of the port table"),
                    ),
                }
            }
        }
        PortStyle::Empty => {}
    }

    for decl in module.ports.iter().chain(body.iter().copied()) {
        let Some(range) = &decl.range else { continue };
        if let Width::Symbolic(_) = port_width(decl, &env, source_db, interner) {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::SYMBOLIC_WIDTH,
                    format!(
                        "width of `{}` is not a constant that fits in 64 bits",
                        cell_text(source_db.snippet(range.span))
                    ),
                    range.span,
                )
                .with_note("the range is shown as written"),
            );
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use vspec_verilog::{parse_file, VerilogSourceFile};

    struct Parsed {
        db: SourceDb,
        ast: VerilogSourceFile,
        interner: Interner,
        sink: DiagnosticSink,
    }

    fn parse(source: &str) -> Parsed {
        let mut db = SourceDb::new();
        let id = db.add_source("test.v", source.to_string());
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let ast = parse_file(id, &db, &interner, &sink);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        Parsed {
            db,
            ast,
            interner,
            sink,
        }
    }

    impl Parsed {
        fn module(&self) -> &ModuleDecl {
            self.ast.modules().next().unwrap()
        }

        fn params(&self, config: &SpecConfig) -> Vec<ParameterRecord> {
            extract_parameters(self.module(), config, &self.db, &self.interner)
        }

        fn ports(&self, config: &SpecConfig) -> Vec<PortRecord> {
            extract_ports(self.module(), config, &self.db, &self.interner, &self.sink)
        }
    }

    #[test]
    fn header_and_body_parameters() {
        let p = parse(
            "module fifo #(parameter WIDTH = 8, DEPTH = 16)(input clk);
                parameter MODE = \"fast\";
                localparam AW = $clog2(DEPTH);
             endmodule",
        );
        let params = p.params(&SpecConfig::default());
        let names: Vec<_> = params.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["WIDTH", "DEPTH"]);
        assert_eq!(params[0].default, "8");
        assert!(params.iter().all(|r| r.function.is_empty()));
    }

    #[test]
    fn body_parameters_without_header_list() {
        let p = parse(
            "module fifo(input clk);
                parameter MODE = \"fast\", DEPTH = 4;
                localparam AW = $clog2(DEPTH);
             endmodule",
        );
        let params = p.params(&SpecConfig::default());
        let names: Vec<_> = params.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["MODE", "DEPTH"]);
        assert_eq!(params[0].default, "\"fast\"");
    }

    #[test]
    fn local_body_parameter_still_sizes_ports() {
        let p = parse(
            "module m #(parameter W = 8)(input [N-1:0] d);
                parameter N = W * 2;
             endmodule",
        );
        let names: Vec<_> = p
            .params(&SpecConfig::default())
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["W"]);
        assert_eq!(p.ports(&SpecConfig::default())[0].width, Width::Bits(16));
    }

    #[test]
    fn multi_line_default_stays_on_one_line() {
        let p = parse("module m #(parameter W = 4 +\n    4,\n  parameter M = {\n 2'b0 }\n)(); endmodule");
        let params = p.params(&SpecConfig::default());
        assert_eq!(params[0].default, "4 + 4");
        assert_eq!(params[1].default, "{ 2'b0 }");
    }

    #[test]
    fn multi_line_symbolic_range_stays_on_one_line() {
        let p = parse("module m(input [N -\n  1:0] a); endmodule");
        let ports = p.ports(&SpecConfig::default());
        assert_eq!(ports[0].width, Width::Symbolic("[N - 1:0]".to_string()));
    }

    #[test]
    fn width_overflowing_u64_falls_back_to_source_text() {
        let p = parse("module m(input [(1<<63):~(1<<63)] x, input [63:0] y); endmodule");
        let ports = p.ports(&SpecConfig::default());
        assert_eq!(
            ports[0].width,
            Width::Symbolic("[(1<<63):~(1<<63)]".to_string())
        );
        assert_eq!(ports[1].width, Width::Bits(64));
        let diags = p.sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::SYMBOLIC_WIDTH);
    }

    #[test]
    fn default_text_kept_as_written() {
        let p = parse("module m #(parameter W = 4 * 2, parameter [3:0] M = 4'hA)(); endmodule");
        let params = p.params(&SpecConfig::default());
        assert_eq!(params[0].default, "4 * 2");
        assert_eq!(params[1].default, "4'hA");
    }

    #[test]
    fn descriptions_from_config() {
        let p = parse("module m #(parameter W = 8)(input clk, output [W-1:0] q); endmodule");
        let mut config = SpecConfig::default();
        config.parameters.insert("W".into(), "Data width".into());
        config.ports.insert("clk".into(), "Clock".into());
        assert_eq!(p.params(&config)[0].function, "Data width");
        let ports = p.ports(&config);
        assert_eq!(ports[0].function, "Clock");
        assert_eq!(ports[1].function, "");
    }

    #[test]
    fn ansi_port_widths() {
        let p = parse(
            "module m #(parameter WIDTH = 16)(
                input wire clk,
                input [7:0] a, b,
                input [0:3] rev,
                output reg [WIDTH-1:0] q,
                output integer count,
                inout [$clog2(WIDTH):0] bus
            );
            endmodule",
        );
        let ports = p.ports(&SpecConfig::default());
        let summary: Vec<_> = ports
            .iter()
            .map(|r| (r.name.as_str(), r.width.to_string(), r.direction.as_str()))
            .collect();
        assert_eq!(
            summary,
            [
                ("clk", "1".to_string(), "input"),
                ("a", "8".to_string(), "input"),
                ("b", "8".to_string(), "input"),
                ("rev", "4".to_string(), "input"),
                ("q", "16".to_string(), "output"),
                ("count", "32".to_string(), "output"),
                ("bus", "5".to_string(), "inout"),
            ]
        );
        assert!(p.sink.take_all().is_empty());
    }

    #[test]
    fn non_ansi_ports_resolved_from_body() {
        let p = parse(
            "module m(clk, d, q, ghost);
                input clk;
                input [3:0] d;
                output [3:0] q;
                reg [3:0] q;
             endmodule",
        );
        let ports = p.ports(&SpecConfig::default());
        let names: Vec<_> = ports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["clk", "d", "q"]);
        assert_eq!(ports[1].width, Width::Bits(4));
        assert_eq!(ports[2].direction, Direction::Output);
        let diags = p.sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNDECLARED_PORT);
        assert!(diags[0].message.contains("ghost"));
    }

    #[test]
    fn symbolic_width_warned_once_per_declaration() {
        let p = parse("module m(input [N-1:0] a, b); endmodule");
        let ports = p.ports(&SpecConfig::default());
        assert_eq!(ports[0].width, Width::Symbolic("[N-1:0]".to_string()));
        assert_eq!(ports[1].width.to_string(), "[N-1:0]");
        let diags = p.sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::SYMBOLIC_WIDTH);
    }

    #[test]
    fn module_without_ports() {
        let p = parse("module tb; endmodule");
        assert!(p.ports(&SpecConfig::default()).is_empty());
        assert!(p.params(&SpecConfig::default()).is_empty());
    }

    #[test]
    fn width_serializes_as_number_or_string() {
        assert_eq!(serde_json::to_string(&Width::Bits(8)).unwrap(), "8");
        assert_eq!(
            serde_json::to_string(&Width::Symbolic("[N:0]".into())).unwrap(),
            "\"[N:0]\""
        );
        let back: Width = serde_json::from_str("\"[N:0]\"").unwrap();
        assert_eq!(back, Width::Symbolic("[N:0]".into()));
    }
}
