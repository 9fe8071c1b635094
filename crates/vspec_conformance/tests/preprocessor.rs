//! Macros, conditionals and includes seen through the whole pipeline.

use vspec_conformance::Fixture;
use vspec_diagnostics::DiagnosticCode;
use vspec_report::Width;
use vspec_verilog::DirectiveKind;

const CONFIGURABLE: &str = r#"
`ifdef USE_DSP
module mac (input clk, input [17:0] a, input [17:0] b, output [47:0] p);
    dsp48 u_dsp (.clk(clk), .a(a), .b(b), .p(p));
endmodule
`else
module mac (input clk, input [7:0] a, input [7:0] b, output [15:0] p);
    mult_lut u_mult (.a(a), .b(b), .p(p));
endmodule
`endif
"#;

#[test]
fn command_line_define_selects_branch() {
    let result = Fixture::new()
        .file("mac.v", CONFIGURABLE)
        .define("USE_DSP")
        .run();
    assert!(!result.has_errors, "{:#?}", result.diagnostics);
    let report = result.report();
    assert_eq!(report.tree(), "mac (top)\n└── u_dsp: dsp48\n");
    assert_eq!(report.ports[3].width, Width::Bits(48));
}

#[test]
fn undefined_macro_takes_else_branch() {
    let result = Fixture::new().file("mac.v", CONFIGURABLE).run();
    let report = result.report();
    assert_eq!(report.tree(), "mac (top)\n└── u_mult: mult_lut\n");
    assert_eq!(report.ports[3].width, Width::Bits(16));
}

#[test]
fn define_with_value_feeds_widths() {
    let result = Fixture::new()
        .file(
            "bus.v",
            "module bus (input [`BUS_W-1:0] data, output [`BUS_W/8-1:0] strb);\nendmodule\n",
        )
        .define("BUS_W=64")
        .run();
    let widths: Vec<_> = result.report().ports.iter().map(|p| p.width.clone()).collect();
    assert_eq!(widths, [Width::Bits(64), Width::Bits(8)]);
}

#[test]
fn macros_carry_across_files_in_order() {
    let result = Fixture::new()
        .file("defines.v", "`define ADDR_W 12\n`define DATA_W 32\n")
        .file(
            "ram.v",
            r#"
module ram (
    input                clk,
    input  [`ADDR_W-1:0] addr,
    input  [`DATA_W-1:0] wdata,
    output [`DATA_W-1:0] rdata
);
endmodule
"#,
        )
        .run();
    assert!(!result.has_errors, "{:#?}", result.diagnostics);
    let widths: Vec<_> = result.report().ports.iter().map(|p| p.width.to_string()).collect();
    assert_eq!(widths, ["1", "12", "32", "32"]);
}

#[test]
fn include_next_to_source_file() {
    let result = Fixture::new()
        .file("rtl/params.vh", "`define LANES 4\n")
        .file(
            "rtl/phy.v",
            r#"`include "params.vh"
module phy (input [`LANES-1:0] rx_p, output [`LANES-1:0] tx_p);
    serdes u_lane0 ();
endmodule
"#,
        )
        .run();
    assert!(!result.has_errors, "{:#?}", result.diagnostics);
    assert_eq!(result.report().ports[0].width, Width::Bits(4));
    assert_eq!(result.report().tree(), "phy (top)\n└── u_lane0: serdes\n");
}

#[test]
fn include_found_through_include_dir() {
    let result = Fixture::new()
        .file("include/regs.vh", "localparam NUM_REGS = 8;\n")
        .file(
            "src/regfile.v",
            r#"
module regfile (
    input clk,
    input [$clog2(NUM_REGS)-1:0] sel
);
    `include "regs.vh"
endmodule
"#,
        )
        .include_dir("include")
        .run();
    assert!(!result.has_errors, "{:#?}", result.diagnostics);
    assert_eq!(result.report().ports[1].width, Width::Bits(3));
    assert!(result.report().parameters.is_empty());
}

#[test]
fn missing_include_is_an_error() {
    let result = Fixture::new()
        .file("top.v", "`include \"nowhere.vh\"\nmodule top; endmodule\n")
        .run();
    assert!(result.has_errors);
    assert!(result.report.is_none());
    let diags = result.with_code(DiagnosticCode::INCLUDE_NOT_FOUND);
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("nowhere.vh"));
}

#[test]
fn function_like_macro_in_range() {
    let result = Fixture::new()
        .file(
            "m.v",
            r#"
`define MSB(w) ((w) - 1)
module m #(parameter W = 10) (input [`MSB(W):0] d);
endmodule
"#,
        )
        .run();
    assert!(!result.has_errors, "{:#?}", result.diagnostics);
    assert_eq!(result.report().ports[0].width, Width::Bits(10));
}

#[test]
fn undef_and_nested_conditionals() {
    let result = Fixture::new()
        .file(
            "top.v",
            r#"
`define FAST
`define WIDE
`undef WIDE
module top (
`ifdef FAST
  `ifdef WIDE
    output [63:0] q
  `elsif NARROW
    output [7:0] q
  `else
    output [31:0] q
  `endif
`else
    output q
`endif
);
endmodule
"#,
        )
        .run();
    assert!(!result.has_errors, "{:#?}", result.diagnostics);
    assert_eq!(result.report().ports[0].width, Width::Bits(32));
}

#[test]
fn unbalanced_conditional_blocks_report() {
    let result = Fixture::new()
        .file("top.v", "`ifdef X\nmodule top; endmodule\n")
        .run();
    assert!(result.has_errors);
    assert_eq!(
        result.with_code(DiagnosticCode::UNBALANCED_CONDITIONAL).len(),
        1
    );
}

#[test]
fn undefined_macro_use_is_an_error() {
    let result = Fixture::new()
        .file("top.v", "module top(input [`NOPE-1:0] a); endmodule\n")
        .run();
    assert!(result.has_errors);
    let diags = result.with_code(DiagnosticCode::UNDEFINED_MACRO);
    assert!(diags[0].message.contains("NOPE"));
}

#[test]
fn directives_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("top.v");
    std::fs::write(
        &path,
        "`timescale 1ns/1ps\n`default_nettype none\n`define W 2\nmodule top(input [`W-1:0] a); endmodule\n",
    )
    .unwrap();

    let mut db = vspec_source::SourceDb::new();
    let interner = vspec_common::Interner::new();
    let sink = vspec_diagnostics::DiagnosticSink::new();
    let design = vspec_verilog::parse_files(
        &[path],
        &vspec_verilog::ParseOptions::default(),
        &mut db,
        &interner,
        &sink,
    )
    .unwrap();
    let kinds: Vec<_> = design.directives.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            DirectiveKind::Timescale,
            DirectiveKind::DefaultNettype,
            DirectiveKind::Define
        ]
    );
}
