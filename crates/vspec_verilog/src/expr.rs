//! Pratt expression parser.
//!
//! | BP (L,R) | Operators |
//! |----------|-----------|
//! | (1,2)    | `||` |
//! | (3,4)    | `&&` |
//! | (5,6)    | `|` |
//! | (7,8)    | `^` `~^` |
//! | (9,10)   | `&` |
//! | (11,12)  | `==` `!=` `===` `!==` |
//! | (13,14)  | `<` `<=` `>` `>=` |
//! | (15,16)  | `<<` `>>` `<<<` `>>>` |
//! | (17,18)  | `+` `-` |
//! | (19,20)  | `*` `/` `%` |
//! | (22,21)  | `**` |
//! | prefix 23 | unary and reduction operators |
//!
//! `? :` binds loosest and is right-associative.

use crate::ast::*;
use crate::parser::VerilogParser;
use crate::token::VerilogToken;

const PREFIX_BP: u8 = 23;
// Stops an index expression before `+`/`-` so `[i+:w]` can be recognized.
const PART_SELECT_BP: u8 = 18;

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::LogOr => (1, 2),
        BinaryOp::LogAnd => (3, 4),
        BinaryOp::BitOr => (5, 6),
        BinaryOp::BitXor | BinaryOp::BitXnor => (7, 8),
        BinaryOp::BitAnd => (9, 10),
        BinaryOp::Eq | BinaryOp::Neq | BinaryOp::CaseEq | BinaryOp::CaseNeq => (11, 12),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => (13, 14),
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::AShl | BinaryOp::AShr => (15, 16),
        BinaryOp::Add | BinaryOp::Sub => (17, 18),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => (19, 20),
        BinaryOp::Pow => (22, 21),
    }
}

fn binary_op(kind: VerilogToken) -> Option<BinaryOp> {
    let op = match kind {
        VerilogToken::DoublePipe => BinaryOp::LogOr,
        VerilogToken::DoubleAmpersand => BinaryOp::LogAnd,
        VerilogToken::Pipe => BinaryOp::BitOr,
        VerilogToken::Caret => BinaryOp::BitXor,
        VerilogToken::TildeCaret => BinaryOp::BitXnor,
        VerilogToken::Ampersand => BinaryOp::BitAnd,
        VerilogToken::DoubleEquals => BinaryOp::Eq,
        VerilogToken::BangEquals => BinaryOp::Neq,
        VerilogToken::TripleEquals => BinaryOp::CaseEq,
        VerilogToken::BangDoubleEquals => BinaryOp::CaseNeq,
        VerilogToken::LessThan => BinaryOp::Lt,
        VerilogToken::LessEquals => BinaryOp::Le,
        VerilogToken::GreaterThan => BinaryOp::Gt,
        VerilogToken::GreaterEquals => BinaryOp::Ge,
        VerilogToken::DoubleLess => BinaryOp::Shl,
        VerilogToken::DoubleGreater => BinaryOp::Shr,
        VerilogToken::TripleLess => BinaryOp::AShl,
        VerilogToken::TripleGreater => BinaryOp::AShr,
        VerilogToken::Plus => BinaryOp::Add,
        VerilogToken::Minus => BinaryOp::Sub,
        VerilogToken::Star => BinaryOp::Mul,
        VerilogToken::Slash => BinaryOp::Div,
        VerilogToken::Percent => BinaryOp::Mod,
        VerilogToken::DoubleStar => BinaryOp::Pow,
        _ => return None,
    };
    Some(op)
}

fn unary_op(kind: VerilogToken) -> Option<UnaryOp> {
    let op = match kind {
        VerilogToken::Plus => UnaryOp::Plus,
        VerilogToken::Minus => UnaryOp::Minus,
        VerilogToken::Bang => UnaryOp::LogNot,
        VerilogToken::Tilde => UnaryOp::BitNot,
        VerilogToken::Ampersand => UnaryOp::RedAnd,
        VerilogToken::TildeAmpersand => UnaryOp::RedNand,
        VerilogToken::Pipe => UnaryOp::RedOr,
        VerilogToken::TildePipe => UnaryOp::RedNor,
        VerilogToken::Caret => UnaryOp::RedXor,
        VerilogToken::TildeCaret => UnaryOp::RedXnor,
        _ => return None,
    };
    Some(op)
}

impl VerilogParser<'_> {
    /// Parses a full expression.
    pub fn parse_expr(&mut self) -> Expr {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Expr {
        let lhs = self.parse_prefix();
        self.parse_infix(lhs, min_bp)
    }

    /// Continues an expression whose left operand is already parsed.
    fn parse_infix(&mut self, mut lhs: Expr, min_bp: u8) -> Expr {
        loop {
            if self.at(VerilogToken::Question) && min_bp == 0 {
                self.advance();
                let then_expr = self.parse_expr_bp(0);
                self.expect(VerilogToken::Colon);
                let else_expr = self.parse_expr_bp(0);
                let span = lhs.span().merge(else_expr.span());
                lhs = Expr::Ternary {
                    condition: Box::new(lhs),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                    span,
                };
                continue;
            }

            let Some(op) = binary_op(self.current()) else {
                return lhs;
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                return lhs;
            }
            self.advance();
            let rhs = self.parse_expr_bp(r_bp);
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                span,
            };
        }
    }

    fn parse_prefix(&mut self) -> Expr {
        if let Some(op) = unary_op(self.current()) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_expr_bp(PREFIX_BP);
            let span = start.merge(operand.span());
            return Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            };
        }
        let primary = self.parse_primary();
        self.parse_postfix(primary)
    }

    /// A literal, name, call, parenthesized expression or concatenation,
    /// without selects or operators.
    pub(crate) fn parse_primary(&mut self) -> Expr {
        let start = self.current_span();
        match self.current() {
            VerilogToken::IntLiteral | VerilogToken::SizedLiteral => {
                self.advance();
                Expr::Literal { span: start }
            }
            VerilogToken::RealLiteral => {
                self.advance();
                Expr::RealLiteral { span: start }
            }
            VerilogToken::StringLiteral => {
                self.advance();
                Expr::StringLiteral { span: start }
            }
            VerilogToken::LeftParen => {
                self.advance();
                let inner = self.parse_expr();
                self.expect(VerilogToken::RightParen);
                Expr::Paren {
                    inner: Box::new(inner),
                    span: start.merge(self.prev_span()),
                }
            }
            VerilogToken::LeftBrace => self.parse_concat(),
            VerilogToken::SystemIdentifier => {
                let name = self.interner.get_or_intern(self.current_text());
                self.advance();
                let args = if self.at(VerilogToken::LeftParen) {
                    self.parse_call_args()
                } else {
                    Vec::new()
                };
                Expr::SystemCall {
                    name,
                    args,
                    span: start.merge(self.prev_span()),
                }
            }
            kind if kind.is_identifier() => {
                let name = self.expect_ident();
                if self.at(VerilogToken::LeftParen) {
                    let args = self.parse_call_args();
                    return Expr::FuncCall {
                        name,
                        args,
                        span: start.merge(self.prev_span()),
                    };
                }
                if !self.at(VerilogToken::Dot) {
                    return Expr::Identifier { name, span: start };
                }
                let mut parts = vec![name];
                while self.eat(VerilogToken::Dot) {
                    parts.push(self.expect_ident());
                }
                Expr::HierarchicalName {
                    parts,
                    span: start.merge(self.prev_span()),
                }
            }
            _ => {
                self.expected("expression");
                // Leave delimiters in place for the caller to resynchronize on.
                if !matches!(
                    self.current(),
                    VerilogToken::Semicolon
                        | VerilogToken::Comma
                        | VerilogToken::RightParen
                        | VerilogToken::RightBracket
                        | VerilogToken::RightBrace
                        | VerilogToken::Endmodule
                ) {
                    self.advance();
                }
                Expr::Error(start)
            }
        }
    }

    /// Bit, range and indexed part selects.
    fn parse_postfix(&mut self, mut base: Expr) -> Expr {
        while self.eat(VerilogToken::LeftBracket) {
            let first = self.parse_expr_bp(PART_SELECT_BP);
            let part_select = matches!(self.current(), VerilogToken::Plus | VerilogToken::Minus)
                && self.peek_kind(1) == VerilogToken::Colon;
            base = if part_select {
                let ascending = self.at(VerilogToken::Plus);
                self.advance();
                self.advance();
                let width = self.parse_expr();
                self.expect(VerilogToken::RightBracket);
                let span = base.span().merge(self.prev_span());
                Expr::PartSelect {
                    base: Box::new(base),
                    index: Box::new(first),
                    ascending,
                    width: Box::new(width),
                    span,
                }
            } else {
                let first = self.parse_infix(first, 0);
                if self.eat(VerilogToken::Colon) {
                    let lsb = self.parse_expr();
                    self.expect(VerilogToken::RightBracket);
                    let span = base.span().merge(self.prev_span());
                    Expr::RangeSelect {
                        base: Box::new(base),
                        msb: Box::new(first),
                        lsb: Box::new(lsb),
                        span,
                    }
                } else {
                    self.expect(VerilogToken::RightBracket);
                    let span = base.span().merge(self.prev_span());
                    Expr::Index {
                        base: Box::new(base),
                        index: Box::new(first),
                        span,
                    }
                }
            };
        }
        base
    }

    /// `{a, b}` or `{n{a, b}}`.
    fn parse_concat(&mut self) -> Expr {
        let start = self.current_span();
        self.expect(VerilogToken::LeftBrace);
        let first = self.parse_expr();
        if self.eat(VerilogToken::LeftBrace) {
            let elements = self.parse_expr_list(VerilogToken::RightBrace);
            self.expect(VerilogToken::RightBrace);
            self.expect(VerilogToken::RightBrace);
            return Expr::Repeat {
                count: Box::new(first),
                elements,
                span: start.merge(self.prev_span()),
            };
        }
        let mut elements = vec![first];
        while self.eat(VerilogToken::Comma) {
            elements.push(self.parse_expr());
        }
        self.expect(VerilogToken::RightBrace);
        Expr::Concat {
            elements,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_call_args(&mut self) -> Vec<Expr> {
        self.expect(VerilogToken::LeftParen);
        let args = self.parse_expr_list(VerilogToken::RightParen);
        self.expect(VerilogToken::RightParen);
        args
    }

    /// Comma-separated expressions, possibly empty when `close` follows.
    fn parse_expr_list(&mut self, close: VerilogToken) -> Vec<Expr> {
        let mut items = Vec::new();
        if self.at(close) {
            return items;
        }
        loop {
            items.push(self.parse_expr());
            if !self.eat(VerilogToken::Comma) {
                return items;
            }
        }
    }
}
