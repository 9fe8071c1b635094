//! Parser state, token primitives, and module header rules.

use crate::ast::*;
use crate::token::{Token, VerilogToken};
use vspec_common::{Ident, Interner};
use vspec_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use vspec_source::{FileId, Span};

/// Recursive descent parser over one token stream.
///
/// Errors go to the sink; the tree keeps `Error` placeholders where input
/// could not be parsed, so later stages never see half-built nodes.
pub struct VerilogParser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    file: FileId,
    pub(crate) interner: &'src Interner,
    sink: &'src DiagnosticSink,
}

impl<'src> VerilogParser<'src> {
    /// Creates a parser. `tokens` must come from lexing `source`.
    pub fn new(
        tokens: Vec<Token>,
        source: &'src str,
        file: FileId,
        interner: &'src Interner,
        sink: &'src DiagnosticSink,
    ) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            file,
            interner,
            sink,
        }
    }

    pub(crate) fn current(&self) -> VerilogToken {
        self.peek_kind(0)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(Span::new(self.file, 0, 0), |t| t.span)
    }

    pub(crate) fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: VerilogToken) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(VerilogToken::Eof)
    }

    /// Span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span,
            None => self.current_span(),
        }
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> VerilogToken {
        self.tokens
            .get(self.pos + offset)
            .map_or(VerilogToken::Eof, |t| t.kind)
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    pub(crate) fn eat(&mut self, kind: VerilogToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` or reports it as missing. Returns whether it was present.
    pub(crate) fn expect(&mut self, kind: VerilogToken) -> bool {
        let found = self.eat(kind);
        if !found {
            self.expected(kind.describe());
        }
        found
    }

    /// Consumes an identifier, interning its text. Escaped identifiers lose
    /// the leading backslash.
    pub(crate) fn expect_ident(&mut self) -> Ident {
        match self.current() {
            VerilogToken::Identifier => {
                let ident = self.interner.get_or_intern(self.current_text());
                self.advance();
                ident
            }
            VerilogToken::EscapedIdentifier => {
                let text = &self.current_text()[1..];
                let ident = self.interner.get_or_intern(text);
                self.advance();
                ident
            }
            _ => {
                self.expected("identifier");
                self.interner.get_or_intern("<missing>")
            }
        }
    }

    pub(crate) fn error_at(&self, msg: impl Into<String>, span: Span) {
        self.sink
            .emit(Diagnostic::error(DiagnosticCode::SYNTAX, msg, span));
    }

    pub(crate) fn expected(&self, what: &str) {
        self.error_at(
            format!("expected {what}, found {}", self.current().describe()),
            self.current_span(),
        );
    }

    /// Skips to just past the next `;`, stopping early at `endmodule`.
    pub(crate) fn recover_to_semicolon(&mut self) {
        while !self.at_eof() && !self.at(VerilogToken::Endmodule) {
            if self.eat(VerilogToken::Semicolon) {
                return;
            }
            self.advance();
        }
    }

    /// Parses every top-level item.
    pub fn parse_source_file(&mut self) -> VerilogSourceFile {
        let mut items = Vec::new();
        while !self.at_eof() {
            match self.current() {
                VerilogToken::Module => items.push(VerilogItem::Module(self.parse_module())),
                VerilogToken::Primitive => items.push(self.skip_primitive()),
                _ => {
                    let start = self.current_span();
                    self.expected("`module`");
                    // Resynchronize on the next module.
                    while !self.at_eof() && !self.at(VerilogToken::Module) {
                        self.advance();
                    }
                    items.push(VerilogItem::Error(start.merge(self.prev_span())));
                }
            }
        }
        VerilogSourceFile {
            file: self.file,
            items,
        }
    }

    fn skip_primitive(&mut self) -> VerilogItem {
        let start = self.current_span();
        while !self.at_eof() && !self.eat(VerilogToken::Endprimitive) {
            self.advance();
        }
        VerilogItem::Primitive(start.merge(self.prev_span()))
    }

    fn parse_module(&mut self) -> ModuleDecl {
        let start = self.current_span();
        self.expect(VerilogToken::Module);
        let name_span = self.current_span();
        let name = self.expect_ident();

        let params = if self.at(VerilogToken::Hash) {
            self.parse_parameter_port_list()
        } else {
            Vec::new()
        };

        let (port_style, ports, port_names) = if self.at(VerilogToken::LeftParen) {
            self.parse_port_list()
        } else {
            (PortStyle::Empty, Vec::new(), Vec::new())
        };

        if !self.expect(VerilogToken::Semicolon) {
            self.recover_to_semicolon();
        }

        let items = self.parse_module_items();
        self.expect(VerilogToken::Endmodule);

        ModuleDecl {
            name,
            name_span,
            params,
            port_style,
            ports,
            port_names,
            items,
            span: start.merge(self.prev_span()),
        }
    }

    /// `#( [parameter] decl {, decl} )`. A name after a comma without its own
    /// `parameter` keyword joins the preceding declaration.
    fn parse_parameter_port_list(&mut self) -> Vec<ParameterDecl> {
        self.expect(VerilogToken::Hash);
        self.expect(VerilogToken::LeftParen);
        let mut params: Vec<ParameterDecl> = Vec::new();
        while !self.at(VerilogToken::RightParen) && !self.at_eof() {
            let keyword = matches!(
                self.current(),
                VerilogToken::Parameter | VerilogToken::Localparam
            );
            match params.last_mut() {
                Some(decl) if !keyword && self.current().is_identifier() => {
                    let assignment = self.parse_param_assignment();
                    decl.span = decl.span.merge(assignment.span);
                    decl.assignments.push(assignment);
                }
                _ => {
                    let mut decl = self.parse_parameter_head();
                    let assignment = self.parse_param_assignment();
                    decl.span = decl.span.merge(assignment.span);
                    decl.assignments.push(assignment);
                    params.push(decl);
                }
            }
            if !self.eat(VerilogToken::Comma) {
                break;
            }
        }
        self.expect(VerilogToken::RightParen);
        params
    }

    /// `[parameter|localparam] [type] [signed] [range]`, with no assignments yet.
    pub(crate) fn parse_parameter_head(&mut self) -> ParameterDecl {
        let start = self.current_span();
        let local = self.eat(VerilogToken::Localparam);
        if !local {
            self.eat(VerilogToken::Parameter);
        }
        // Type keywords only constrain the value; the report ignores them.
        while matches!(
            self.current(),
            VerilogToken::Integer
                | VerilogToken::Real
                | VerilogToken::Realtime
                | VerilogToken::Time
        ) {
            self.advance();
        }
        let signed = self.eat(VerilogToken::Signed);
        let range = self.at(VerilogToken::LeftBracket).then(|| self.parse_range());
        ParameterDecl {
            local,
            signed,
            range,
            assignments: Vec::new(),
            span: start.merge(self.prev_span()),
        }
    }

    pub(crate) fn parse_param_assignment(&mut self) -> ParamAssignment {
        let start = self.current_span();
        let name = self.expect_ident();
        let value = self.eat(VerilogToken::Equals).then(|| self.parse_expr());
        ParamAssignment {
            name,
            value,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_port_list(&mut self) -> (PortStyle, Vec<PortDecl>, Vec<PortName>) {
        self.expect(VerilogToken::LeftParen);
        if self.eat(VerilogToken::RightParen) {
            return (PortStyle::Empty, Vec::new(), Vec::new());
        }
        let result = if self.current().is_direction() {
            (PortStyle::Ansi, self.parse_ansi_ports(), Vec::new())
        } else {
            (PortStyle::NonAnsi, Vec::new(), self.parse_port_names())
        };
        self.expect(VerilogToken::RightParen);
        result
    }

    /// ANSI declarations. A declaration without a direction inherits the
    /// previous one, and a bare name after a comma extends the previous
    /// declaration.
    fn parse_ansi_ports(&mut self) -> Vec<PortDecl> {
        let mut ports = Vec::new();
        let mut direction = Direction::Input;
        loop {
            let start = self.current_span();
            if let Some(dir) = self.eat_direction() {
                direction = dir;
            }
            let net_type = self.eat_net_type();
            let signed = self.eat(VerilogToken::Signed);
            let range = self.at(VerilogToken::LeftBracket).then(|| self.parse_range());

            let mut names = vec![self.expect_ident()];
            self.skip_port_initializer();
            while self.at(VerilogToken::Comma) && self.peek_kind(1).is_identifier() {
                self.advance();
                names.push(self.expect_ident());
                self.skip_port_initializer();
            }

            ports.push(PortDecl {
                direction,
                net_type,
                signed,
                range,
                names,
                span: start.merge(self.prev_span()),
            });

            if !self.eat(VerilogToken::Comma) {
                break;
            }
        }
        ports
    }

    /// `output reg q = 1'b0` in a port list.
    fn skip_port_initializer(&mut self) {
        if self.eat(VerilogToken::Equals) {
            self.parse_expr();
        }
    }

    /// Non-ANSI names. Accepts `name`, `name[sel]` and `.name(expr)`; the
    /// external name is recorded in each case.
    fn parse_port_names(&mut self) -> Vec<PortName> {
        let mut names = Vec::new();
        loop {
            let start = self.current_span();
            let name = if self.eat(VerilogToken::Dot) {
                let name = self.expect_ident();
                if self.expect(VerilogToken::LeftParen) {
                    if !self.at(VerilogToken::RightParen) {
                        self.parse_expr();
                    }
                    self.expect(VerilogToken::RightParen);
                }
                name
            } else {
                let name = self.expect_ident();
                while self.at(VerilogToken::LeftBracket) {
                    self.skip_balanced();
                }
                name
            };
            names.push(PortName {
                name,
                span: start.merge(self.prev_span()),
            });
            if !self.eat(VerilogToken::Comma) {
                return names;
            }
        }
    }

    pub(crate) fn eat_direction(&mut self) -> Option<Direction> {
        let dir = match self.current() {
            VerilogToken::Input => Direction::Input,
            VerilogToken::Output => Direction::Output,
            VerilogToken::Inout => Direction::Inout,
            _ => return None,
        };
        self.advance();
        Some(dir)
    }

    pub(crate) fn eat_net_type(&mut self) -> Option<NetType> {
        let net = match self.current() {
            VerilogToken::Wire => NetType::Wire,
            VerilogToken::Tri => NetType::Tri,
            VerilogToken::Wand => NetType::Wand,
            VerilogToken::Wor => NetType::Wor,
            VerilogToken::Supply0 => NetType::Supply0,
            VerilogToken::Supply1 => NetType::Supply1,
            VerilogToken::Reg => NetType::Reg,
            VerilogToken::Integer => NetType::Integer,
            VerilogToken::Real => NetType::Real,
            VerilogToken::Realtime => NetType::Realtime,
            VerilogToken::Time => NetType::Time,
            _ => return None,
        };
        self.advance();
        Some(net)
    }

    /// `[ msb : lsb ]`.
    pub(crate) fn parse_range(&mut self) -> Range {
        let start = self.current_span();
        self.expect(VerilogToken::LeftBracket);
        let msb = self.parse_expr();
        self.expect(VerilogToken::Colon);
        let lsb = self.parse_expr();
        self.expect(VerilogToken::RightBracket);
        Range {
            msb,
            lsb,
            span: start.merge(self.prev_span()),
        }
    }

    /// Skips one bracketed group starting at `(`, `[` or `{`, including nested
    /// groups. Stops at `endmodule` or end of input if unbalanced.
    pub(crate) fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                VerilogToken::LeftParen | VerilogToken::LeftBracket | VerilogToken::LeftBrace => {
                    depth += 1
                }
                VerilogToken::RightParen
                | VerilogToken::RightBracket
                | VerilogToken::RightBrace => depth = depth.saturating_sub(1),
                VerilogToken::Eof | VerilogToken::Endmodule => return,
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use vspec_diagnostics::Diagnostic;

    fn parse(source: &str) -> (VerilogSourceFile, Interner, Vec<Diagnostic>) {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let file = FileId::from_raw(0);
        let tokens = lexer::lex(source, file, &sink);
        let ast = VerilogParser::new(tokens, source, file, &interner, &sink).parse_source_file();
        (ast, interner, sink.take_all())
    }

    fn parse_module(source: &str) -> (ModuleDecl, Interner) {
        let (ast, interner, errors) = parse(source);
        assert!(
            errors.is_empty(),
            "unexpected errors: {:?}",
            errors.iter().map(|e| &e.message).collect::<Vec<_>>()
        );
        match ast.items.into_iter().next() {
            Some(VerilogItem::Module(m)) => (m, interner),
            other => panic!("expected module, got {other:?}"),
        }
    }

    #[test]
    fn minimal_module() {
        let (m, interner) = parse_module("module top; endmodule");
        assert_eq!(interner.resolve(m.name), "top");
        assert_eq!(m.port_style, PortStyle::Empty);
        assert!(m.items.is_empty());
    }

    #[test]
    fn empty_port_parens() {
        let (m, _) = parse_module("module top(); endmodule");
        assert_eq!(m.port_style, PortStyle::Empty);
    }

    #[test]
    fn ansi_ports_inherit_direction() {
        let (m, interner) = parse_module(
            "module fifo(input wire clk, rst_n, output reg [7:0] dout, inout [3:0] pad);
             endmodule",
        );
        assert_eq!(m.port_style, PortStyle::Ansi);
        assert_eq!(m.ports.len(), 3);
        let first: Vec<_> = m.ports[0].names.iter().map(|n| interner.resolve(*n)).collect();
        assert_eq!(first, ["clk", "rst_n"]);
        assert_eq!(m.ports[0].net_type, Some(NetType::Wire));
        assert_eq!(m.ports[1].direction, Direction::Output);
        assert!(m.ports[1].range.is_some());
        assert_eq!(m.ports[2].direction, Direction::Inout);
    }

    #[test]
    fn ansi_port_without_direction_keeps_previous() {
        let (m, _) = parse_module("module m(output a, wire [1:0] b); endmodule");
        assert_eq!(m.ports[1].direction, Direction::Output);
        assert_eq!(m.ports[1].net_type, Some(NetType::Wire));
    }

    #[test]
    fn non_ansi_names() {
        let (m, interner) = parse_module(
            "module m(a, b[1:0], .c(int_c));
                input a; input [1:0] b; output c;
             endmodule",
        );
        assert_eq!(m.port_style, PortStyle::NonAnsi);
        let names: Vec<_> = m.port_names.iter().map(|p| interner.resolve(p.name)).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn header_parameters_group_by_keyword() {
        let (m, interner) = parse_module(
            "module m #(parameter WIDTH = 8, DEPTH = 16, parameter integer MODE = 0)(); endmodule",
        );
        assert_eq!(m.params.len(), 2);
        let names: Vec<_> = m.params[0]
            .assignments
            .iter()
            .map(|a| interner.resolve(a.name))
            .collect();
        assert_eq!(names, ["WIDTH", "DEPTH"]);
        assert_eq!(interner.resolve(m.params[1].assignments[0].name), "MODE");
    }

    #[test]
    fn header_parameter_without_keyword() {
        let (m, _) = parse_module("module m #(W = 4) (input [W-1:0] d); endmodule");
        assert_eq!(m.params.len(), 1);
        assert!(m.params[0].assignments[0].value.is_some());
    }

    #[test]
    fn escaped_module_name() {
        let (m, interner) = parse_module("module \\cpu-core (input clk); endmodule");
        assert_eq!(interner.resolve(m.name), "cpu-core");
    }

    #[test]
    fn primitive_is_skipped() {
        let (ast, _, errors) = parse(
            "primitive mux(o, a, b); output o; input a, b; table 0 0 : 0; endtable endprimitive
             module top; endmodule",
        );
        assert!(errors.is_empty());
        assert!(matches!(ast.items[0], VerilogItem::Primitive(_)));
        assert_eq!(ast.modules().count(), 1);
    }

    #[test]
    fn garbage_before_module_recovers() {
        let (ast, _, errors) = parse("wire x; module top; endmodule");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("expected `module`"));
        assert_eq!(ast.modules().count(), 1);
    }

    #[test]
    fn missing_endmodule_reported() {
        let (ast, _, errors) = parse("module top;");
        assert_eq!(ast.modules().count(), 1);
        assert!(errors[0].message.contains("`endmodule`"));
    }
}
