//! Tokenizer for preprocessed Verilog text.
//!
//! Comments and `(* ... *)` attribute instances are skipped. Compiler
//! directives never reach this stage; a stray backtick is a lexical error.

use crate::token::{lookup_keyword, Token, VerilogToken};
use vspec_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use vspec_source::{FileId, Span};

/// Tokenizes `source`. The result always ends with [`VerilogToken::Eof`].
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
    };
    let mut tokens = Vec::new();
    loop {
        lexer.skip_trivia();
        if lexer.at_end() {
            tokens.push(Token {
                kind: VerilogToken::Eof,
                span: lexer.span_from(lexer.pos),
            });
            return tokens;
        }
        tokens.push(lexer.next_token());
    }
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn token(&self, kind: VerilogToken, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn error(&self, msg: impl Into<String>, start: usize) -> Token {
        self.sink.emit(Diagnostic::error(
            DiagnosticCode::LEX_ERROR,
            msg,
            self.span_from(start),
        ));
        self.token(VerilogToken::Error, start)
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.at_end() && pred(self.source[self.pos]) {
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(|b| b.is_ascii_whitespace());
            match (self.peek_at(0), self.peek_at(1)) {
                (b'/', b'/') => self.eat_while(|b| b != b'\n'),
                (b'/', b'*') => {
                    let start = self.pos;
                    if !self.skip_until(b"*/") {
                        self.error("unterminated block comment", start);
                    }
                }
                // `@(*)` is a sensitivity list, not an attribute.
                (b'(', b'*') if self.peek_at(2) != b')' => {
                    let start = self.pos;
                    if !self.skip_until(b"*)") {
                        self.error("unterminated attribute instance", start);
                    }
                }
                _ => return,
            }
        }
    }

    /// Skips past the next occurrence of `terminator` (searching after the
    /// two-byte opener). Returns `false` and stops at end of input if absent.
    fn skip_until(&mut self, terminator: &[u8; 2]) -> bool {
        self.pos += 2;
        while !self.at_end() {
            if self.source[self.pos] == terminator[0] && self.peek_at(1) == terminator[1] {
                self.pos += 2;
                return true;
            }
            self.pos += 1;
        }
        false
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.source[self.pos];
        match b {
            b if is_ident_start(b) => {
                self.eat_while(is_ident_char);
                let word = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
                self.token(
                    lookup_keyword(word).unwrap_or(VerilogToken::Identifier),
                    start,
                )
            }
            b'\\' => {
                self.pos += 1;
                self.eat_while(|b| !b.is_ascii_whitespace());
                if self.pos == start + 1 {
                    return self.error("empty escaped identifier", start);
                }
                self.token(VerilogToken::EscapedIdentifier, start)
            }
            b'$' => {
                self.pos += 1;
                if !is_ident_start(self.peek_at(0)) {
                    return self.error("expected a name after `$`", start);
                }
                self.eat_while(is_ident_char);
                self.token(VerilogToken::SystemIdentifier, start)
            }
            b'0'..=b'9' => self.lex_number(start),
            b'\'' if is_base_char(self.peek_at(1)) => {
                self.pos += 1;
                self.lex_based_digits();
                self.token(VerilogToken::SizedLiteral, start)
            }
            b'"' => self.lex_string(start),
            b'`' => {
                self.pos += 1;
                self.eat_while(is_ident_char);
                self.error("unexpected compiler directive after preprocessing", start)
            }
            _ => self.lex_operator(start),
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        self.eat_while(|b| b.is_ascii_digit() || b == b'_');

        // Size and base may be separated by whitespace: `8 'hff`.
        let mut look = self.pos;
        while self.source.get(look).is_some_and(|b| *b == b' ' || *b == b'\t') {
            look += 1;
        }
        if self.source.get(look) == Some(&b'\'')
            && is_base_char(self.source.get(look + 1).copied().unwrap_or(0))
        {
            self.pos = look + 1;
            self.lex_based_digits();
            return self.token(VerilogToken::SizedLiteral, start);
        }

        let mut real = false;
        if self.peek_at(0) == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit() || b == b'_');
            real = true;
        }
        if matches!(self.peek_at(0), b'e' | b'E') {
            self.pos += 1;
            if matches!(self.peek_at(0), b'+' | b'-') {
                self.pos += 1;
            }
            self.eat_while(|b| b.is_ascii_digit() || b == b'_');
            real = true;
        }
        let kind = if real {
            VerilogToken::RealLiteral
        } else {
            VerilogToken::IntLiteral
        };
        self.token(kind, start)
    }

    /// Lexes `[s]<base> digits` with `pos` on the base (or `s`) character.
    fn lex_based_digits(&mut self) {
        if matches!(self.peek_at(0), b's' | b'S') {
            self.pos += 1;
        }
        let base = self.peek_at(0).to_ascii_lowercase();
        self.pos += 1;
        self.eat_while(|b| b == b' ' || b == b'\t');
        self.eat_while(|b| {
            let c = b.to_ascii_lowercase();
            c == b'_'
                || matches!(c, b'x' | b'z' | b'?')
                || match base {
                    b'b' => matches!(c, b'0' | b'1'),
                    b'o' => matches!(c, b'0'..=b'7'),
                    b'd' => c.is_ascii_digit(),
                    _ => c.is_ascii_hexdigit(),
                }
        });
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            match self.peek_at(0) {
                0 | b'\n' => return self.error("unterminated string literal", start),
                b'\\' => self.pos = (self.pos + 2).min(self.source.len()),
                b'"' => {
                    self.pos += 1;
                    return self.token(VerilogToken::StringLiteral, start);
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_operator(&mut self, start: usize) -> Token {
        use VerilogToken::*;
        let first = self.source[self.pos];
        let second = self.peek_at(1);
        let third = self.peek_at(2);
        let (kind, len) = match (first, second, third) {
            (b'=', b'=', b'=') => (TripleEquals, 3),
            (b'!', b'=', b'=') => (BangDoubleEquals, 3),
            (b'<', b'<', b'<') => (TripleLess, 3),
            (b'>', b'>', b'>') => (TripleGreater, 3),
            (b'=', b'=', _) => (DoubleEquals, 2),
            (b'!', b'=', _) => (BangEquals, 2),
            (b'<', b'=', _) => (LessEquals, 2),
            (b'>', b'=', _) => (GreaterEquals, 2),
            (b'<', b'<', _) => (DoubleLess, 2),
            (b'>', b'>', _) => (DoubleGreater, 2),
            (b'*', b'*', _) => (DoubleStar, 2),
            (b'&', b'&', _) => (DoubleAmpersand, 2),
            (b'|', b'|', _) => (DoublePipe, 2),
            (b'~', b'^', _) | (b'^', b'~', _) => (TildeCaret, 2),
            (b'~', b'&', _) => (TildeAmpersand, 2),
            (b'~', b'|', _) => (TildePipe, 2),
            (b'(', ..) => (LeftParen, 1),
            (b')', ..) => (RightParen, 1),
            (b'[', ..) => (LeftBracket, 1),
            (b']', ..) => (RightBracket, 1),
            (b'{', ..) => (LeftBrace, 1),
            (b'}', ..) => (RightBrace, 1),
            (b',', ..) => (Comma, 1),
            (b';', ..) => (Semicolon, 1),
            (b':', ..) => (Colon, 1),
            (b'.', ..) => (Dot, 1),
            (b'#', ..) => (Hash, 1),
            (b'@', ..) => (At, 1),
            (b'?', ..) => (Question, 1),
            (b'=', ..) => (Equals, 1),
            (b'<', ..) => (LessThan, 1),
            (b'>', ..) => (GreaterThan, 1),
            (b'+', ..) => (Plus, 1),
            (b'-', ..) => (Minus, 1),
            (b'*', ..) => (Star, 1),
            (b'/', ..) => (Slash, 1),
            (b'%', ..) => (Percent, 1),
            (b'&', ..) => (Ampersand, 1),
            (b'|', ..) => (Pipe, 1),
            (b'^', ..) => (Caret, 1),
            (b'~', ..) => (Tilde, 1),
            (b'!', ..) => (Bang, 1),
            _ => {
                // Consume the whole UTF-8 sequence so later slicing stays on
                // a char boundary.
                self.pos += 1;
                self.eat_while(|b| (b & 0xC0) == 0x80);
                let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
                return self.error(format!("unrecognized character `{text}`"), start);
            }
        };
        self.pos += len;
        self.token(kind, start)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_base_char(b: u8) -> bool {
    matches!(
        b.to_ascii_lowercase(),
        b'b' | b'o' | b'd' | b'h' | b's'
    )
}
