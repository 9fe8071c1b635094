//! Module body items.
//!
//! An identifier followed by another identifier or `#` starts a module
//! instantiation. Parameter and port declarations are parsed; any other item
//! is skipped as a unit, tracking `begin`/`end`-style nesting so that
//! instantiations inside `generate` regions, functions and behavioral blocks
//! are not picked up.

use crate::ast::*;
use crate::parser::VerilogParser;
use crate::token::VerilogToken;
use vspec_source::Span;

impl VerilogParser<'_> {
    /// Parses items until `endmodule`, a nested `module`, or end of input.
    pub fn parse_module_items(&mut self) -> Vec<ModuleItem> {
        let mut items = Vec::new();
        while !matches!(
            self.current(),
            VerilogToken::Endmodule | VerilogToken::Module | VerilogToken::Eof
        ) {
            items.push(self.parse_module_item());
        }
        items
    }

    fn parse_module_item(&mut self) -> ModuleItem {
        match self.current() {
            VerilogToken::Parameter => ModuleItem::ParameterDecl(self.parse_parameter_statement()),
            VerilogToken::Localparam => {
                ModuleItem::LocalparamDecl(self.parse_parameter_statement())
            }
            VerilogToken::Input | VerilogToken::Output | VerilogToken::Inout => {
                ModuleItem::PortDecl(self.parse_port_statement())
            }
            kind if kind.is_identifier()
                && (self.peek_kind(1).is_identifier() || self.peek_kind(1) == VerilogToken::Hash) =>
            {
                self.parse_instantiation()
            }
            VerilogToken::Identifier | VerilogToken::EscapedIdentifier => {
                let start = self.current_span();
                self.expected("module item");
                self.recover_to_semicolon();
                ModuleItem::Error(start.merge(self.prev_span()))
            }
            _ => ModuleItem::Other(self.skip_item()),
        }
    }

    /// `parameter|localparam ... NAME = value {, NAME = value};`
    fn parse_parameter_statement(&mut self) -> ParameterDecl {
        let mut decl = self.parse_parameter_head();
        loop {
            let assignment = self.parse_param_assignment();
            decl.assignments.push(assignment);
            if !self.eat(VerilogToken::Comma) {
                break;
            }
        }
        self.finish_statement();
        decl.span = decl.span.merge(self.prev_span());
        decl
    }

    /// `direction [net_type] [signed] [range] name {, name};`
    fn parse_port_statement(&mut self) -> PortDecl {
        let start = self.current_span();
        let direction = self.eat_direction().unwrap_or(Direction::Input);
        let net_type = self.eat_net_type();
        let signed = self.eat(VerilogToken::Signed);
        let range = self.at(VerilogToken::LeftBracket).then(|| self.parse_range());
        let mut names = Vec::new();
        loop {
            names.push(self.expect_ident());
            if self.eat(VerilogToken::Equals) {
                self.parse_expr();
            }
            if !self.eat(VerilogToken::Comma) {
                break;
            }
        }
        self.finish_statement();
        PortDecl {
            direction,
            net_type,
            signed,
            range,
            names,
            span: start.merge(self.prev_span()),
        }
    }

    /// Expects `;`, resynchronizing on the next one if something else is found.
    fn finish_statement(&mut self) {
        if !self.expect(VerilogToken::Semicolon) {
            self.recover_to_semicolon();
        }
    }

    fn parse_instantiation(&mut self) -> ModuleItem {
        let start = self.current_span();
        let module_name = self.expect_ident();

        let param_overrides = if self.eat(VerilogToken::Hash) {
            if self.at(VerilogToken::LeftParen) {
                self.parse_connection_list()
            } else {
                // `#8` shorthand for a single positional value.
                let actual = self.parse_primary();
                vec![Connection {
                    formal: None,
                    span: actual.span(),
                    actual: Some(actual),
                }]
            }
        } else {
            Vec::new()
        };

        let mut instances = Vec::new();
        loop {
            instances.push(self.parse_instance());
            if !self.eat(VerilogToken::Comma) {
                break;
            }
        }
        self.finish_statement();

        ModuleItem::Instantiation(Instantiation {
            module_name,
            param_overrides,
            instances,
            span: start.merge(self.prev_span()),
        })
    }

    fn parse_instance(&mut self) -> Instance {
        let start = self.current_span();
        let name = self.expect_ident();
        let range = self.at(VerilogToken::LeftBracket).then(|| self.parse_range());
        let connections = if self.at(VerilogToken::LeftParen) {
            self.parse_connection_list()
        } else {
            self.expected("`(`");
            Vec::new()
        };
        Instance {
            name,
            range,
            connections,
            span: start.merge(self.prev_span()),
        }
    }

    /// `( [connection {, connection}] )`.
    fn parse_connection_list(&mut self) -> Vec<Connection> {
        self.expect(VerilogToken::LeftParen);
        let mut connections = Vec::new();
        if !self.at(VerilogToken::RightParen) {
            loop {
                connections.push(self.parse_connection());
                if !self.eat(VerilogToken::Comma) {
                    break;
                }
            }
        }
        self.expect(VerilogToken::RightParen);
        connections
    }

    fn parse_connection(&mut self) -> Connection {
        let start = self.current_span();
        if self.eat(VerilogToken::Dot) {
            let formal = Some(self.expect_ident());
            let mut actual = None;
            if self.expect(VerilogToken::LeftParen) {
                if !self.at(VerilogToken::RightParen) {
                    actual = Some(self.parse_expr());
                }
                self.expect(VerilogToken::RightParen);
            }
            Connection {
                formal,
                actual,
                span: start.merge(self.prev_span()),
            }
        } else if matches!(
            self.current(),
            VerilogToken::Comma | VerilogToken::RightParen
        ) {
            Connection {
                formal: None,
                actual: None,
                span: start,
            }
        } else {
            let actual = self.parse_expr();
            Connection {
                formal: None,
                span: actual.span(),
                actual: Some(actual),
            }
        }
    }

    /// Skips one item and returns its span.
    ///
    /// The item ends at a `;` or closing block keyword at nesting depth zero,
    /// unless the next token is `else`, which continues an `if` statement.
    /// Always consumes at least one token. Stops without consuming at
    /// `endmodule` or `module`, reporting an error if a block is still open.
    fn skip_item(&mut self) -> Span {
        let start = self.current_span();
        let mut blocks = 0usize;
        let mut groups = 0usize;
        let mut first = true;
        loop {
            let kind = self.current();
            if !first
                && matches!(
                    kind,
                    VerilogToken::Endmodule | VerilogToken::Module | VerilogToken::Eof
                )
            {
                if blocks > 0 {
                    self.error_at(
                        format!("expected end of block before {}", kind.describe()),
                        self.current_span(),
                    );
                }
                break;
            }
            first = false;
            self.advance();

            let item_done = match kind {
                k if k.opens_block() => {
                    blocks += 1;
                    false
                }
                k if k.closes_block() => {
                    // `end : label`
                    if self.at(VerilogToken::Colon) && self.peek_kind(1).is_identifier() {
                        self.advance();
                        self.advance();
                    }
                    blocks = blocks.saturating_sub(1);
                    blocks == 0 && groups == 0
                }
                VerilogToken::LeftParen | VerilogToken::LeftBracket | VerilogToken::LeftBrace => {
                    groups += 1;
                    false
                }
                VerilogToken::RightParen
                | VerilogToken::RightBracket
                | VerilogToken::RightBrace => {
                    groups = groups.saturating_sub(1);
                    false
                }
                VerilogToken::Semicolon => blocks == 0 && groups == 0,
                VerilogToken::Endmodule | VerilogToken::Module | VerilogToken::Eof => true,
                _ => false,
            };
            if item_done && !self.at(VerilogToken::Else) {
                break;
            }
        }
        start.merge(self.prev_span())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::lexer;
    use crate::parser::VerilogParser;
    use vspec_common::Interner;
    use vspec_diagnostics::DiagnosticSink;
    use vspec_source::FileId;

    fn parse_body(body: &str) -> (Vec<ModuleItem>, Interner, usize) {
        let source = format!("module top;\n{body}\nendmodule\n");
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let file = FileId::from_raw(0);
        let tokens = lexer::lex(&source, file, &sink);
        let ast = VerilogParser::new(tokens, &source, file, &interner, &sink).parse_source_file();
        let module = match ast.items.into_iter().next() {
            Some(VerilogItem::Module(m)) => m,
            other => panic!("expected module, got {other:?}"),
        };
        (module.items, interner, sink.error_count())
    }

    fn instance_pairs(items: &[ModuleItem], interner: &Interner) -> Vec<(String, String)> {
        items
            .iter()
            .filter_map(|item| match item {
                ModuleItem::Instantiation(inst) => Some(inst),
                _ => None,
            })
            .flat_map(|inst| {
                inst.instances.iter().map(move |i| {
                    (
                        interner.resolve(i.name).to_string(),
                        interner.resolve(inst.module_name).to_string(),
                    )
                })
            })
            .collect()
    }

    #[test]
    fn named_and_positional_instances() {
        let (items, interner, errors) = parse_body(
            "fifo #(.DEPTH(16), .WIDTH(8)) u_fifo (.clk(clk), .din(data[7:0]), .full());
             adder u_add (a, , sum);",
        );
        assert_eq!(errors, 0);
        assert_eq!(
            instance_pairs(&items, &interner),
            vec![
                ("u_fifo".to_string(), "fifo".to_string()),
                ("u_add".to_string(), "adder".to_string())
            ]
        );
        match &items[0] {
            ModuleItem::Instantiation(inst) => {
                assert_eq!(inst.param_overrides.len(), 2);
                assert_eq!(inst.instances[0].connections.len(), 3);
                assert!(inst.instances[0].connections[2].actual.is_none());
            }
            other => panic!("expected instantiation, got {other:?}"),
        }
        match &items[1] {
            ModuleItem::Instantiation(inst) => {
                assert_eq!(inst.instances[0].connections.len(), 3);
                assert!(inst.instances[0].connections[1].actual.is_none());
            }
            other => panic!("expected instantiation, got {other:?}"),
        }
    }

    #[test]
    fn multiple_instances_in_one_statement() {
        let (items, interner, errors) = parse_body("sub u1 (a), u2 (b), u3[3:0] (c);");
        assert_eq!(errors, 0);
        let names: Vec<_> = instance_pairs(&items, &interner)
            .into_iter()
            .map(|(inst, _)| inst)
            .collect();
        assert_eq!(names, ["u1", "u2", "u3"]);
    }

    #[test]
    fn hash_shorthand_override() {
        let (items, _, errors) = parse_body("delay_line #4 u_dl (x, y);");
        assert_eq!(errors, 0);
        match &items[0] {
            ModuleItem::Instantiation(inst) => assert_eq!(inst.param_overrides.len(), 1),
            other => panic!("expected instantiation, got {other:?}"),
        }
    }

    #[test]
    fn body_parameters_and_ports() {
        let (items, interner, errors) = parse_body(
            "parameter A = 1, B = A + 1;
             localparam integer C = 3;
             input wire [7:0] d, e;
             output reg q = 1'b0;",
        );
        assert_eq!(errors, 0);
        match &items[0] {
            ModuleItem::ParameterDecl(p) => {
                assert!(!p.local);
                assert_eq!(p.assignments.len(), 2);
                assert_eq!(interner.resolve(p.assignments[1].name), "B");
            }
            other => panic!("expected parameter, got {other:?}"),
        }
        assert!(matches!(&items[1], ModuleItem::LocalparamDecl(p) if p.local));
        match &items[2] {
            ModuleItem::PortDecl(p) => {
                assert_eq!(p.direction, Direction::Input);
                assert_eq!(p.names.len(), 2);
            }
            other => panic!("expected port, got {other:?}"),
        }
        assert!(matches!(&items[3], ModuleItem::PortDecl(p) if p.direction == Direction::Output));
    }

    #[test]
    fn behavioral_code_is_skipped_whole() {
        let (items, _, errors) = parse_body(
            "wire [3:0] w;
             assign w = sel ? a : b;
             always @(posedge clk) begin
                 if (rst) q <= 0;
                 else q <= d;
             end
             always @(*) if (en) y = a; else y = b;
             always @* case (s) 2'b00: z = 0; default: z = 1; endcase
             function [7:0] f; input x; begin f = x; end endfunction",
        );
        assert_eq!(errors, 0);
        assert_eq!(items.len(), 6);
        assert!(items.iter().all(|i| matches!(i, ModuleItem::Other(_))));
    }

    #[test]
    fn generate_and_gate_instances_excluded() {
        let (items, interner, errors) = parse_body(
            "genvar i;
             generate for (i = 0; i < 4; i = i + 1) begin : g
                 cell u_cell (.a(x[i]));
             end endgenerate
             and g1 (y, a, b);
             for (i = 0; i < 2; i = i + 1) begin : g2 cell u_c (); end
             leaf u_leaf ();",
        );
        assert_eq!(errors, 0);
        assert_eq!(
            instance_pairs(&items, &interner),
            vec![("u_leaf".to_string(), "leaf".to_string())]
        );
    }

    #[test]
    fn stray_identifier_recovers() {
        let (items, interner, errors) = parse_body("x = 1;\nleaf u0 ();");
        assert_eq!(errors, 1);
        assert!(matches!(items[0], ModuleItem::Error(_)));
        assert_eq!(instance_pairs(&items, &interner).len(), 1);
    }

    #[test]
    fn unclosed_block_reported() {
        let (items, _, errors) = parse_body("always begin x = 1;");
        assert_eq!(errors, 1);
        assert_eq!(items.len(), 1);
    }
}
