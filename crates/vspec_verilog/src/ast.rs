//! Syntax tree for the module-level subset of Verilog-2005.
//!
//! Behavioral code, declarations of internal nets, generate regions and gate
//! primitives are kept only as [`ModuleItem::Other`] spans. Everything the
//! specification report needs (headers, parameters, ports, instantiations)
//! is fully typed.

use serde::{Deserialize, Serialize};
use vspec_common::Ident;
use vspec_source::{FileId, Span};

/// One parsed (preprocessed) file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerilogSourceFile {
    /// File holding the preprocessed text the spans point into.
    pub file: FileId,
    /// Top-level items in source order.
    pub items: Vec<VerilogItem>,
}

impl VerilogSourceFile {
    /// Module definitions in source order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDecl> {
        self.items.iter().filter_map(|item| match item {
            VerilogItem::Module(m) => Some(m),
            _ => None,
        })
    }
}

/// A top-level item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerilogItem {
    /// `module ... endmodule`.
    Module(ModuleDecl),
    /// User-defined primitive, skipped.
    Primitive(Span),
    /// Unparseable input.
    Error(Span),
}

/// A module definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// Module name.
    pub name: Ident,
    /// Span of the name token.
    pub name_span: Span,
    /// `#( ... )` header parameters.
    pub params: Vec<ParameterDecl>,
    /// Form of the port list.
    pub port_style: PortStyle,
    /// ANSI header port declarations (empty otherwise).
    pub ports: Vec<PortDecl>,
    /// Non-ANSI header port names (empty otherwise).
    pub port_names: Vec<PortName>,
    /// Body items.
    pub items: Vec<ModuleItem>,
    /// `module` through `endmodule`.
    pub span: Span,
}

/// Header port list style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortStyle {
    /// No list, or `()`.
    Empty,
    /// `(input a, output [7:0] b)`.
    Ansi,
    /// `(a, b)` with directions declared in the body.
    NonAnsi,
}

/// A name in a non-ANSI port list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortName {
    /// External port name.
    pub name: Ident,
    /// Source span.
    pub span: Span,
}

/// `direction [net_type] [signed] [range] name {, name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDecl {
    /// Direction.
    pub direction: Direction,
    /// Explicit net or variable type.
    pub net_type: Option<NetType>,
    /// `signed` present.
    pub signed: bool,
    /// Packed range.
    pub range: Option<Range>,
    /// Declared names.
    pub names: Vec<Ident>,
    /// Source span.
    pub span: Span,
}

/// Port direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    Inout,
}

impl Direction {
    /// The keyword spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Inout => "inout",
        }
    }
}

/// Net or variable type keyword on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetType {
    /// `wire`, `uwire`
    Wire,
    /// `tri` family
    Tri,
    /// `wand`
    Wand,
    /// `wor`
    Wor,
    /// `supply0`
    Supply0,
    /// `supply1`
    Supply1,
    /// `reg`
    Reg,
    /// `integer` (32 bits)
    Integer,
    /// `real`
    Real,
    /// `realtime`
    Realtime,
    /// `time` (64 bits)
    Time,
}

impl NetType {
    /// Bit width implied by the type when no range is given.
    pub fn implicit_width(self) -> u64 {
        match self {
            NetType::Integer => 32,
            NetType::Time => 64,
            _ => 1,
        }
    }
}

/// `parameter` or `localparam` declaration with one or more assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDecl {
    /// Declared with `localparam`.
    pub local: bool,
    /// `signed` present.
    pub signed: bool,
    /// Packed range.
    pub range: Option<Range>,
    /// `NAME = value` pairs in order.
    pub assignments: Vec<ParamAssignment>,
    /// Source span.
    pub span: Span,
}

/// `NAME [= value]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamAssignment {
    /// Parameter name.
    pub name: Ident,
    /// Default value; absent only for SystemVerilog-style header parameters.
    pub value: Option<Expr>,
    /// Source span.
    pub span: Span,
}

/// A body item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModuleItem {
    /// Module instantiation.
    Instantiation(Instantiation),
    /// Body `parameter` declaration.
    ParameterDecl(ParameterDecl),
    /// Body `localparam` declaration.
    LocalparamDecl(ParameterDecl),
    /// Non-ANSI port direction declaration.
    PortDecl(PortDecl),
    /// Construct outside the modeled subset, skipped structurally.
    Other(Span),
    /// Unparseable input.
    Error(Span),
}

/// `module_type [#(overrides)] inst (...) {, inst (...)};`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instantiation {
    /// Instantiated module type.
    pub module_name: Ident,
    /// Parameter value assignments.
    pub param_overrides: Vec<Connection>,
    /// Instances in declaration order.
    pub instances: Vec<Instance>,
    /// Source span.
    pub span: Span,
}

/// One instance in an instantiation statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Instance name.
    pub name: Ident,
    /// Instance array range.
    pub range: Option<Range>,
    /// Port connections.
    pub connections: Vec<Connection>,
    /// Source span.
    pub span: Span,
}

/// Named (`.port(expr)`) or positional connection. Both parts may be absent
/// for an empty positional slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Port or parameter name for named connections.
    pub formal: Option<Ident>,
    /// Connected expression.
    pub actual: Option<Expr>,
    /// Source span.
    pub span: Span,
}

/// `[msb:lsb]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    /// Left bound.
    pub msb: Expr,
    /// Right bound.
    pub lsb: Expr,
    /// Source span including brackets.
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Simple name.
    Identifier {
        /// Name.
        name: Ident,
        /// Source span.
        span: Span,
    },
    /// Dotted name.
    HierarchicalName {
        /// Components.
        parts: Vec<Ident>,
        /// Source span.
        span: Span,
    },
    /// Integer literal, sized or not; the value is read from the source text.
    Literal {
        /// Source span.
        span: Span,
    },
    /// Real literal.
    RealLiteral {
        /// Source span.
        span: Span,
    },
    /// String literal.
    StringLiteral {
        /// Source span.
        span: Span,
    },
    /// `base[index]`.
    Index {
        /// Selected expression.
        base: Box<Expr>,
        /// Bit index.
        index: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `base[msb:lsb]`.
    RangeSelect {
        /// Selected expression.
        base: Box<Expr>,
        /// Left bound.
        msb: Box<Expr>,
        /// Right bound.
        lsb: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `base[index+:width]` or `base[index-:width]`.
    PartSelect {
        /// Selected expression.
        base: Box<Expr>,
        /// Start index.
        index: Box<Expr>,
        /// `+:` when `true`.
        ascending: bool,
        /// Width.
        width: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `{a, b}`.
    Concat {
        /// Parts.
        elements: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// `{n{a, b}}`.
    Repeat {
        /// Replication count.
        count: Box<Expr>,
        /// Replicated parts.
        elements: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Infix operator.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `cond ? a : b`.
    Ternary {
        /// Condition.
        condition: Box<Expr>,
        /// Value when true.
        then_expr: Box<Expr>,
        /// Value when false.
        else_expr: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// User function call.
    FuncCall {
        /// Function name.
        name: Ident,
        /// Arguments.
        args: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// `$name(args)`.
    SystemCall {
        /// Name including the `$`.
        name: Ident,
        /// Arguments.
        args: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// `(inner)`.
    Paren {
        /// Inner expression.
        inner: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Recovery placeholder; an error has been reported.
    Error(Span),
}

impl Expr {
    /// Source span.
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::HierarchicalName { span, .. }
            | Expr::Literal { span }
            | Expr::RealLiteral { span }
            | Expr::StringLiteral { span }
            | Expr::Index { span, .. }
            | Expr::RangeSelect { span, .. }
            | Expr::PartSelect { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Repeat { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::FuncCall { span, .. }
            | Expr::SystemCall { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Error(span) => *span,
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `!`
    LogNot,
    /// `~`
    BitNot,
    /// `&`
    RedAnd,
    /// `~&`
    RedNand,
    /// `|`
    RedOr,
    /// `~|`
    RedNor,
    /// `^`
    RedXor,
    /// `~^`
    RedXnor,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `==`
    Eq,
    /// `!=`
    Neq,
    /// `===`
    CaseEq,
    /// `!==`
    CaseNeq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    LogAnd,
    /// `||`
    LogOr,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `~^`
    BitXnor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `<<<`
    AShl,
    /// `>>>`
    AShr,
}
