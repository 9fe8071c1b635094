//! Token kinds.
//!
//! Only the reserved words that shape module structure get their own kind.
//! Gate primitives collapse into [`VerilogToken::Gate`] and every other
//! Verilog-2005 reserved word into [`VerilogToken::Keyword`], which keeps them
//! from being mistaken for module names when an instantiation is detected.

use serde::{Deserialize, Serialize};
use vspec_source::Span;

/// A token kind. Literal and identifier text is recovered through the span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum VerilogToken {
    // Structural keywords
    Module,
    Endmodule,
    Primitive,
    Endprimitive,
    Input,
    Output,
    Inout,
    Parameter,
    Localparam,
    Signed,
    Wire,
    Tri,
    Wand,
    Wor,
    Supply0,
    Supply1,
    Reg,
    Integer,
    Real,
    Realtime,
    Time,
    Begin,
    End,
    Case,
    Endcase,
    Fork,
    Join,
    Function,
    Endfunction,
    Task,
    Endtask,
    Generate,
    Endgenerate,
    Specify,
    Endspecify,
    Table,
    Endtable,
    Else,
    /// Built-in gate or switch primitive (`and`, `nand`, `bufif0`, `pullup`, ...).
    Gate,
    /// Any other reserved word (`always`, `assign`, `initial`, ...).
    Keyword,

    // Literals
    /// Unsized decimal number.
    IntLiteral,
    /// Based number, sized (`8'hFF`) or not (`'b1`).
    SizedLiteral,
    /// Real number (`1.5`, `2e3`).
    RealLiteral,
    /// Double-quoted string.
    StringLiteral,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Hash,
    At,
    Question,
    Equals,

    // Operators
    DoubleEquals,
    BangEquals,
    TripleEquals,
    BangDoubleEquals,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    Percent,
    Ampersand,
    DoubleAmpersand,
    Pipe,
    DoublePipe,
    Caret,
    TildeCaret,
    Tilde,
    TildeAmpersand,
    TildePipe,
    Bang,
    DoubleLess,
    DoubleGreater,
    TripleLess,
    TripleGreater,

    // Names
    Identifier,
    /// `\name ` form; the span covers the backslash.
    EscapedIdentifier,
    /// `$name`.
    SystemIdentifier,

    Eof,
    /// Malformed input, already reported by the lexer.
    Error,
}

impl VerilogToken {
    /// Returns `true` for `input`, `output` and `inout`.
    pub fn is_direction(self) -> bool {
        matches!(
            self,
            VerilogToken::Input | VerilogToken::Output | VerilogToken::Inout
        )
    }

    /// Returns `true` for net and variable type keywords.
    pub fn is_net_type(self) -> bool {
        matches!(
            self,
            VerilogToken::Wire
                | VerilogToken::Tri
                | VerilogToken::Wand
                | VerilogToken::Wor
                | VerilogToken::Supply0
                | VerilogToken::Supply1
                | VerilogToken::Reg
                | VerilogToken::Integer
                | VerilogToken::Real
                | VerilogToken::Realtime
                | VerilogToken::Time
        )
    }

    /// Returns `true` for plain and escaped identifiers.
    pub fn is_identifier(self) -> bool {
        matches!(
            self,
            VerilogToken::Identifier | VerilogToken::EscapedIdentifier
        )
    }

    /// Keywords that open a region closed by a matching `end*` keyword.
    pub fn opens_block(self) -> bool {
        matches!(
            self,
            VerilogToken::Begin
                | VerilogToken::Case
                | VerilogToken::Fork
                | VerilogToken::Function
                | VerilogToken::Task
                | VerilogToken::Generate
                | VerilogToken::Specify
                | VerilogToken::Table
        )
    }

    /// Keywords that close a region opened by [`opens_block`](Self::opens_block).
    pub fn closes_block(self) -> bool {
        matches!(
            self,
            VerilogToken::End
                | VerilogToken::Endcase
                | VerilogToken::Join
                | VerilogToken::Endfunction
                | VerilogToken::Endtask
                | VerilogToken::Endgenerate
                | VerilogToken::Endspecify
                | VerilogToken::Endtable
        )
    }

    /// Human-readable description for "expected X, found Y" messages.
    pub fn describe(self) -> &'static str {
        use VerilogToken::*;
        match self {
            Module => "`module`",
            Endmodule => "`endmodule`",
            Primitive => "`primitive`",
            Endprimitive => "`endprimitive`",
            Input => "`input`",
            Output => "`output`",
            Inout => "`inout`",
            Parameter => "`parameter`",
            Localparam => "`localparam`",
            Signed => "`signed`",
            Wire | Tri | Wand | Wor | Supply0 | Supply1 | Reg | Integer | Real | Realtime
            | Time => "net type",
            Begin => "`begin`",
            End => "`end`",
            Case => "`case`",
            Endcase => "`endcase`",
            Fork => "`fork`",
            Join => "`join`",
            Function => "`function`",
            Endfunction => "`endfunction`",
            Task => "`task`",
            Endtask => "`endtask`",
            Generate => "`generate`",
            Endgenerate => "`endgenerate`",
            Specify => "`specify`",
            Endspecify => "`endspecify`",
            Table => "`table`",
            Endtable => "`endtable`",
            Else => "`else`",
            Gate => "gate primitive",
            Keyword => "keyword",
            IntLiteral | SizedLiteral | RealLiteral => "number",
            StringLiteral => "string",
            LeftParen => "`(`",
            RightParen => "`)`",
            LeftBracket => "`[`",
            RightBracket => "`]`",
            LeftBrace => "`{`",
            RightBrace => "`}`",
            Comma => "`,`",
            Semicolon => "`;`",
            Colon => "`:`",
            Dot => "`.`",
            Hash => "`#`",
            At => "`@`",
            Question => "`?`",
            Equals => "`=`",
            DoubleEquals | BangEquals | TripleEquals | BangDoubleEquals | LessThan
            | LessEquals | GreaterThan | GreaterEquals | Plus | Minus | Star | DoubleStar
            | Slash | Percent | Ampersand | DoubleAmpersand | Pipe | DoublePipe | Caret
            | TildeCaret | Tilde | TildeAmpersand | TildePipe | Bang | DoubleLess
            | DoubleGreater | TripleLess | TripleGreater => "operator",
            Identifier | EscapedIdentifier => "identifier",
            SystemIdentifier => "system function",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

/// A token kind with its location.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Kind.
    pub kind: VerilogToken,
    /// Source range.
    pub span: Span,
}

/// Classifies a word. Verilog reserved words are lowercase and case-sensitive.
pub fn lookup_keyword(word: &str) -> Option<VerilogToken> {
    use VerilogToken::*;
    let kind = match word {
        "module" | "macromodule" => Module,
        "endmodule" => Endmodule,
        "primitive" => Primitive,
        "endprimitive" => Endprimitive,
        "input" => Input,
        "output" => Output,
        "inout" => Inout,
        "parameter" => Parameter,
        "localparam" => Localparam,
        "signed" => Signed,
        "wire" | "uwire" => Wire,
        "tri" | "tri0" | "tri1" | "triand" | "trior" | "trireg" => Tri,
        "wand" => Wand,
        "wor" => Wor,
        "supply0" => Supply0,
        "supply1" => Supply1,
        "reg" => Reg,
        "integer" => Integer,
        "real" => Real,
        "realtime" => Realtime,
        "time" => Time,
        "begin" => Begin,
        "end" => End,
        "case" | "casex" | "casez" => Case,
        "endcase" => Endcase,
        "fork" => Fork,
        "join" => Join,
        "function" => Function,
        "endfunction" => Endfunction,
        "task" => Task,
        "endtask" => Endtask,
        "generate" => Generate,
        "endgenerate" => Endgenerate,
        "specify" => Specify,
        "endspecify" => Endspecify,
        "table" => Table,
        "endtable" => Endtable,
        "else" => Else,
        "and" | "nand" | "or" | "nor" | "xor" | "xnor" | "buf" | "not" | "bufif0"
        | "bufif1" | "notif0" | "notif1" | "nmos" | "pmos" | "cmos" | "rnmos" | "rpmos"
        | "rcmos" | "tran" | "tranif0" | "tranif1" | "rtran" | "rtranif0" | "rtranif1"
        | "pullup" | "pulldown" => Gate,
        "always" | "assign" | "automatic" | "cell" | "config" | "deassign" | "default"
        | "defparam" | "design" | "disable" | "edge" | "endconfig" | "event" | "for"
        | "force" | "forever" | "genvar" | "highz0" | "highz1" | "if" | "ifnone"
        | "incdir" | "include" | "initial" | "instance" | "large" | "liblist" | "library"
        | "medium" | "negedge" | "noshowcancelled" | "posedge" | "pull0" | "pull1"
        | "pulsestyle_ondetect" | "pulsestyle_onevent" | "release" | "repeat" | "scalared"
        | "showcancelled" | "small" | "specparam" | "strong0" | "strong1" | "unsigned"
        | "use" | "vectored" | "wait" | "weak0" | "weak1" | "while" => Keyword,
        _ => return None,
    };
    Some(kind)
}
