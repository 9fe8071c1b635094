//! Text-level Verilog preprocessor.
//!
//! Handles `` `define `` (object- and function-like), `` `undef ``, the
//! `` `ifdef `` family, `` `include `` and macro expansion. Other directives
//! (`` `timescale ``, `` `default_nettype ``, ...) are recorded and removed.
//!
//! Output keeps one output line per input line of the file being processed:
//! directives and inactive regions become blank lines, so positions in the
//! expanded text line up with the original except after an `` `include ``,
//! whose text is spliced in place.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use vspec_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use vspec_source::{FileId, SourceDb, Span};

const MAX_INCLUDE_DEPTH: usize = 32;
const MAX_EXPANSION_DEPTH: usize = 64;

/// Kind of a compiler directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectiveKind {
    /// `` `define ``
    Define,
    /// `` `undef ``
    Undef,
    /// `` `ifdef ``
    Ifdef,
    /// `` `ifndef ``
    Ifndef,
    /// `` `elsif ``
    Elsif,
    /// `` `else ``
    Else,
    /// `` `endif ``
    Endif,
    /// `` `include ``
    Include,
    /// `` `timescale ``
    Timescale,
    /// `` `default_nettype ``
    DefaultNettype,
    /// `` `resetall ``
    Resetall,
    /// `` `celldefine `` / `` `endcelldefine ``
    Celldefine,
    /// Any other recognized directive.
    Other,
}

/// A directive seen in an active region, or any conditional directive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    /// Kind.
    pub kind: DirectiveKind,
    /// Full directive text, e.g. `` `timescale 1ns/1ps ``.
    pub text: String,
    /// Location in the original file.
    pub span: Span,
}

#[derive(Debug, Clone)]
struct Macro {
    params: Option<Vec<String>>,
    body: String,
}

/// How much of the source a directive consumes after its name.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Operand {
    None,
    Ident,
    Line,
}

fn classify(name: &str) -> Option<(DirectiveKind, Operand)> {
    let entry = match name {
        "define" => (DirectiveKind::Define, Operand::Line),
        "undef" => (DirectiveKind::Undef, Operand::Ident),
        "ifdef" => (DirectiveKind::Ifdef, Operand::Ident),
        "ifndef" => (DirectiveKind::Ifndef, Operand::Ident),
        "elsif" => (DirectiveKind::Elsif, Operand::Ident),
        "else" => (DirectiveKind::Else, Operand::None),
        "endif" => (DirectiveKind::Endif, Operand::None),
        "include" => (DirectiveKind::Include, Operand::Line),
        "timescale" => (DirectiveKind::Timescale, Operand::Line),
        "default_nettype" => (DirectiveKind::DefaultNettype, Operand::Line),
        "resetall" => (DirectiveKind::Resetall, Operand::None),
        "celldefine" | "endcelldefine" => (DirectiveKind::Celldefine, Operand::None),
        "nounconnected_drive" | "end_keywords" | "undefineall" => {
            (DirectiveKind::Other, Operand::None)
        }
        "unconnected_drive" | "line" | "pragma" | "begin_keywords" => {
            (DirectiveKind::Other, Operand::Line)
        }
        _ => return None,
    };
    Some(entry)
}

/// One open `` `ifdef `` region.
struct Conditional {
    parent_active: bool,
    active: bool,
    taken: bool,
    seen_else: bool,
    span: Span,
}

/// Preprocessor state shared by every file of one run.
///
/// Macros defined in one file remain visible in the files processed after
/// it, matching how simulators treat a compilation unit.
pub struct Preprocessor<'a> {
    include_dirs: Vec<PathBuf>,
    macros: HashMap<String, Macro>,
    directives: Vec<Directive>,
    sink: &'a DiagnosticSink,
}

impl<'a> Preprocessor<'a> {
    /// Creates a preprocessor searching `include_dirs` (in order) for
    /// `` `include `` targets not found next to the including file.
    pub fn new(include_dirs: &[PathBuf], sink: &'a DiagnosticSink) -> Self {
        Self {
            include_dirs: include_dirs.to_vec(),
            macros: HashMap::new(),
            directives: Vec::new(),
            sink,
        }
    }

    /// Predefines a macro from `NAME` or `NAME=VALUE`. A bare name expands
    /// to `1`. Returns `false` if the name is not a valid identifier.
    pub fn define(&mut self, spec: &str) -> bool {
        let (name, body) = match spec.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => (spec.trim(), "1"),
        };
        let valid = name.bytes().next().is_some_and(is_ident_start)
            && name.bytes().all(is_ident_char);
        if valid {
            self.macros.insert(
                name.to_string(),
                Macro {
                    params: None,
                    body: body.to_string(),
                },
            );
        }
        valid
    }

    /// Returns `true` if `name` is currently defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    /// Preprocesses a file already registered in `source_db`.
    pub fn preprocess(&mut self, file: FileId, source_db: &mut SourceDb) -> String {
        self.run(file, source_db, 0)
    }

    /// Every directive recorded so far, in encounter order.
    pub fn into_directives(self) -> Vec<Directive> {
        self.directives
    }

    fn error(&self, code: DiagnosticCode, msg: impl Into<String>, span: Span) {
        self.sink.emit(Diagnostic::error(code, msg, span));
    }

    fn run(&mut self, file: FileId, source_db: &mut SourceDb, depth: usize) -> String {
        let (text, path) = {
            let f = source_db.get_file(file);
            (f.content.clone(), f.path.clone())
        };
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut conds: Vec<Conditional> = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let active = conds.last().map_or(true, |c| c.active);
            let end = match bytes[pos] {
                b'/' if bytes.get(pos + 1) == Some(&b'/') => line_end(bytes, pos),
                b'/' if bytes.get(pos + 1) == Some(&b'*') => find(bytes, pos + 2, b"*/")
                    .map_or(bytes.len(), |i| i + 2),
                b'"' => string_end(bytes, pos),
                b'`' => {
                    let name_end = ident_end(bytes, pos + 1);
                    let name = &text[pos + 1..name_end];
                    let consumed = match classify(name) {
                        Some((kind, operand)) => self.directive(
                            kind, operand, &text, pos, name_end, file, &path, source_db,
                            &mut conds, &mut out, depth,
                        ),
                        None if !active || name.is_empty() => {
                            if active {
                                out.push('`');
                            }
                            name_end.max(pos + 1)
                        }
                        None => self.expand_usage(&text, pos, name_end, file, &mut out),
                    };
                    push_newlines(&mut out, &text[pos..consumed]);
                    pos = consumed;
                    continue;
                }
                b'\n' => pos + 1,
                _ => next_special(bytes, pos + 1),
            };
            if active {
                out.push_str(&text[pos..end]);
            } else {
                push_newlines(&mut out, &text[pos..end]);
            }
            pos = end;
        }

        for cond in conds {
            self.error(
                DiagnosticCode::UNBALANCED_CONDITIONAL,
                "conditional block is never closed with `endif",
                cond.span,
            );
        }
        out
    }

    /// Handles one directive starting at `start` (the backtick). Returns the
    /// offset just past what it consumed; the caller re-emits the newlines of
    /// the consumed text.
    #[allow(clippy::too_many_arguments)]
    fn directive(
        &mut self,
        kind: DirectiveKind,
        operand: Operand,
        text: &str,
        start: usize,
        name_end: usize,
        file: FileId,
        path: &Path,
        source_db: &mut SourceDb,
        conds: &mut Vec<Conditional>,
        out: &mut String,
        depth: usize,
    ) -> usize {
        let bytes = text.as_bytes();
        let active = conds.last().map_or(true, |c| c.active);
        let (arg, end) = match operand {
            Operand::None => (None, name_end),
            Operand::Ident => {
                let arg_start = skip_blanks(bytes, name_end);
                let arg_end = ident_end(bytes, arg_start);
                (Some(&text[arg_start..arg_end]), arg_end)
            }
            Operand::Line => (None, logical_line_end(bytes, name_end)),
        };
        let span = Span::new(file, start as u32, end as u32);
        let is_conditional = matches!(
            kind,
            DirectiveKind::Ifdef
                | DirectiveKind::Ifndef
                | DirectiveKind::Elsif
                | DirectiveKind::Else
                | DirectiveKind::Endif
        );
        if !active && !is_conditional {
            return end;
        }
        self.directives.push(Directive {
            kind,
            text: text[start..end].trim_end().to_string(),
            span,
        });

        if operand == Operand::Ident && arg.map_or(true, str::is_empty) {
            self.error(
                DiagnosticCode::BAD_DIRECTIVE,
                format!("`{} requires a macro name", &text[start + 1..name_end]),
                span,
            );
            // Keep conditional nesting balanced even when the name is missing.
            if !matches!(kind, DirectiveKind::Ifdef | DirectiveKind::Ifndef) {
                return end;
            }
        }
        let defined = arg.is_some_and(|name| self.macros.contains_key(name));

        match kind {
            DirectiveKind::Ifdef | DirectiveKind::Ifndef => {
                let cond = defined == (kind == DirectiveKind::Ifdef);
                conds.push(Conditional {
                    parent_active: active,
                    active: active && cond,
                    taken: cond,
                    seen_else: false,
                    span,
                });
            }
            DirectiveKind::Elsif | DirectiveKind::Else => match conds.last_mut() {
                Some(cond) if !cond.seen_else => {
                    let take = kind == DirectiveKind::Else || defined;
                    cond.active = cond.parent_active && !cond.taken && take;
                    cond.taken |= take;
                    cond.seen_else = kind == DirectiveKind::Else;
                }
                Some(_) => self.error(
                    DiagnosticCode::UNBALANCED_CONDITIONAL,
                    format!("`{} after `else", &text[start + 1..name_end]),
                    span,
                ),
                None => self.error(
                    DiagnosticCode::UNBALANCED_CONDITIONAL,
                    format!("`{} without a matching `ifdef", &text[start + 1..name_end]),
                    span,
                ),
            },
            DirectiveKind::Endif => {
                if conds.pop().is_none() {
                    self.error(
                        DiagnosticCode::UNBALANCED_CONDITIONAL,
                        "`endif without a matching `ifdef",
                        span,
                    );
                }
            }
            DirectiveKind::Define => self.define_from_source(&text[name_end..end], span),
            DirectiveKind::Undef => {
                if let Some(name) = arg {
                    self.macros.remove(name);
                }
            }
            DirectiveKind::Include => {
                self.include(&text[name_end..end], path, span, source_db, out, depth)
            }
            _ => {}
        }
        end
    }

    /// Parses the text after `` `define ``.
    fn define_from_source(&mut self, rest: &str, span: Span) {
        let bytes = rest.as_bytes();
        let name_start = skip_blanks(bytes, 0);
        let name_end = ident_end(bytes, name_start);
        if name_start == name_end {
            self.error(
                DiagnosticCode::BAD_DIRECTIVE,
                "`define requires a macro name",
                span,
            );
            return;
        }
        let name = rest[name_start..name_end].to_string();

        // A parameter list must follow the name with no space in between.
        let mut body_start = name_end;
        let mut params = None;
        if bytes.get(name_end) == Some(&b'(') {
            let Some(close) = rest[name_end..].find(')').map(|i| name_end + i) else {
                self.error(
                    DiagnosticCode::BAD_DIRECTIVE,
                    format!("unterminated parameter list in `define {name}"),
                    span,
                );
                return;
            };
            params = Some(
                rest[name_end + 1..close]
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect(),
            );
            body_start = close + 1;
        }

        let body = strip_line_comment(&rest[body_start..].replace("\\\r\n", " ").replace("\\\n", " "))
            .trim()
            .to_string();
        self.macros.insert(name, Macro { params, body });
    }

    /// Splices the preprocessed text of an included file into `out`.
    fn include(
        &mut self,
        operand: &str,
        including: &Path,
        span: Span,
        source_db: &mut SourceDb,
        out: &mut String,
        depth: usize,
    ) {
        let operand = strip_line_comment(operand);
        let operand = operand.trim();
        let target = operand
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| operand.strip_prefix('<').and_then(|s| s.strip_suffix('>')));
        let Some(target) = target.filter(|t| !t.is_empty()) else {
            self.error(
                DiagnosticCode::BAD_DIRECTIVE,
                "`include expects a quoted file name",
                span,
            );
            return;
        };
        if depth >= MAX_INCLUDE_DEPTH {
            self.error(
                DiagnosticCode::EXPANSION_DEPTH,
                format!("`include nesting exceeds {MAX_INCLUDE_DEPTH} levels; is \"{target}\" recursive?"),
                span,
            );
            return;
        }

        let base = including.parent().unwrap_or_else(|| Path::new(""));
        let candidates: Vec<PathBuf> = std::iter::once(base.join(target))
            .chain(self.include_dirs.iter().map(|d| d.join(target)))
            .collect();
        let Some(found) = candidates.iter().find(|p| p.is_file()) else {
            let searched = candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.sink.emit(
                Diagnostic::error(
                    DiagnosticCode::INCLUDE_NOT_FOUND,
                    format!("cannot find included file \"{target}\""),
                    span,
                )
                .with_note(format!("searched: {searched}"))
                .with_help("add the directory with -I or `include_dirs` in vspec.toml"),
            );
            return;
        };
        match source_db.load_file(found) {
            Ok(id) => {
                let text = self.run(id, source_db, depth + 1);
                out.push_str(&text);
            }
            Err(e) => self.error(
                DiagnosticCode::INCLUDE_NOT_FOUND,
                format!("cannot read included file {}: {e}", found.display()),
                span,
            ),
        }
    }

    /// Expands a macro use at `start`; returns the offset past the use,
    /// including any argument list.
    fn expand_usage(
        &mut self,
        text: &str,
        start: usize,
        name_end: usize,
        file: FileId,
        out: &mut String,
    ) -> usize {
        let name = &text[start + 1..name_end];
        let Some(def) = self.macros.get(name).cloned() else {
            self.error(
                DiagnosticCode::UNDEFINED_MACRO,
                format!("macro `{name} is not defined"),
                Span::new(file, start as u32, name_end as u32),
            );
            return name_end;
        };
        let (expansion, end) = self.apply(name, &def, text, name_end, |end| {
            Span::new(file, start as u32, end as u32)
        });
        let expansion = self.expand_text(&expansion, 1, Span::new(file, start as u32, end as u32));
        out.push_str(&expansion);
        end
    }

    /// Substitutes arguments into a macro body. `after_name` points just past
    /// the macro name in `text`. Returns the substituted body and the offset
    /// past the use.
    fn apply(
        &self,
        name: &str,
        def: &Macro,
        text: &str,
        after_name: usize,
        span_to: impl Fn(usize) -> Span,
    ) -> (String, usize) {
        let Some(params) = &def.params else {
            return (def.body.clone(), after_name);
        };
        let bytes = text.as_bytes();
        let open = skip_whitespace(bytes, after_name);
        if bytes.get(open) != Some(&b'(') {
            self.error(
                DiagnosticCode::BAD_DIRECTIVE,
                format!("macro `{name} expects {} argument(s)", params.len()),
                span_to(after_name),
            );
            return (String::new(), after_name);
        }
        let Some((args, end)) = split_args(text, open) else {
            self.error(
                DiagnosticCode::BAD_DIRECTIVE,
                format!("unterminated argument list for macro `{name}"),
                span_to(text.len()),
            );
            return (String::new(), text.len());
        };
        // `M()` passes one empty argument; accept it for zero-parameter macros.
        let args = if params.is_empty() && args.len() == 1 && args[0].is_empty() {
            Vec::new()
        } else {
            args
        };
        if args.len() != params.len() {
            self.error(
                DiagnosticCode::BAD_DIRECTIVE,
                format!(
                    "macro `{name} expects {} argument(s), found {}",
                    params.len(),
                    args.len()
                ),
                span_to(end),
            );
            return (String::new(), end);
        }
        (substitute(&def.body, params, &args), end)
    }

    /// Expands macro uses inside already-substituted text.
    fn expand_text(&self, text: &str, depth: usize, span: Span) -> String {
        if !text.contains('`') {
            return text.to_string();
        }
        if depth > MAX_EXPANSION_DEPTH {
            self.error(
                DiagnosticCode::EXPANSION_DEPTH,
                format!("macro expansion exceeds {MAX_EXPANSION_DEPTH} levels; is a macro recursive?"),
                span,
            );
            return String::new();
        }
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => {
                    let end = string_end(bytes, pos);
                    out.push_str(&text[pos..end]);
                    pos = end;
                }
                b'`' => {
                    let name_end = ident_end(bytes, pos + 1);
                    let name = &text[pos + 1..name_end];
                    match self.macros.get(name) {
                        Some(def) => {
                            let (body, end) = self.apply(name, def, text, name_end, |_| span);
                            out.push_str(&self.expand_text(&body, depth + 1, span));
                            pos = end;
                        }
                        None => {
                            if !name.is_empty() {
                                self.error(
                                    DiagnosticCode::UNDEFINED_MACRO,
                                    format!("macro `{name} is not defined"),
                                    span,
                                );
                            }
                            pos = name_end.max(pos + 1);
                        }
                    }
                }
                _ => {
                    let end = bytes[pos + 1..]
                        .iter()
                        .position(|b| matches!(b, b'"' | b'`'))
                        .map_or(bytes.len(), |i| pos + 1 + i);
                    out.push_str(&text[pos..end]);
                    pos = end;
                }
            }
        }
        out
    }
}

/// Replaces whole-word occurrences of `params` in `body`, outside strings.
fn substitute(body: &str, params: &[String], args: &[String]) -> String {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut pos = 0;
    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'"' {
            let end = string_end(bytes, pos);
            out.push_str(&body[pos..end]);
            pos = end;
        } else if is_ident_start(b) && (pos == 0 || bytes[pos - 1] != b'`') {
            let end = ident_end(bytes, pos);
            let word = &body[pos..end];
            match params.iter().position(|p| p == word) {
                Some(i) => out.push_str(&args[i]),
                None => out.push_str(word),
            }
            pos = end;
        } else if is_ident_start(b) {
            // Name of a nested macro use; never a parameter.
            let end = ident_end(bytes, pos);
            out.push_str(&body[pos..end]);
            pos = end;
        } else {
            let len = body[pos..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&body[pos..pos + len]);
            pos += len;
        }
    }
    out
}

/// Splits `( a, f(b, c), {d, e} )` at top-level commas. `open` is the `(`.
/// Returns the trimmed arguments and the offset past the closing `)`.
fn split_args(text: &str, open: usize) -> Option<(Vec<String>, usize)> {
    let bytes = text.as_bytes();
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut arg_start = open + 1;
    let mut pos = open + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => {
                pos = string_end(bytes, pos);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' if depth == 0 => {
                args.push(text[arg_start..pos].trim().to_string());
                return Some((args, pos + 1));
            }
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                args.push(text[arg_start..pos].trim().to_string());
                arg_start = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    if !bytes.get(start).copied().is_some_and(is_ident_start) {
        return start;
    }
    start
        + bytes[start..]
            .iter()
            .position(|b| !is_ident_char(*b))
            .unwrap_or(bytes.len() - start)
}

fn skip_blanks(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(|b| *b == b' ' || *b == b'\t') {
        pos += 1;
    }
    pos
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

/// Offset of the `\n` ending the line containing `pos`, or the end of input.
fn line_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |i| pos + i)
}

/// Like [`line_end`] but follows backslash-newline continuations.
fn logical_line_end(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        let end = line_end(bytes, pos);
        let continued = bytes[pos..end].ends_with(b"\\") || bytes[pos..end].ends_with(b"\\\r");
        if !continued || end >= bytes.len() {
            return end;
        }
        pos = end + 1;
    }
}

/// Offset past the closing quote of the string starting at `pos`, or the end
/// of the line for an unterminated string (reported later by the lexer).
fn string_end(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Offset of the next byte the scanner must look at.
fn next_special(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| matches!(b, b'/' | b'"' | b'`' | b'\n'))
        .map_or(bytes.len(), |i| from + i)
}

fn strip_line_comment(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => pos = string_end(bytes, pos),
            b'/' if bytes.get(pos + 1) == Some(&b'/') => return text[..pos].to_string(),
            _ => pos += 1,
        }
    }
    text.to_string()
}

fn push_newlines(out: &mut String, consumed: &str) {
    for _ in consumed.bytes().filter(|b| *b == b'\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run(text: &str) -> (String, Vec<Diagnostic>) {
        let mut db = SourceDb::new();
        let id = db.add_source("top.v", text.to_string());
        let sink = DiagnosticSink::new();
        let mut pp = Preprocessor::new(&[], &sink);
        let out = pp.preprocess(id, &mut db);
        (out, sink.take_all())
    }

    fn run_ok(text: &str) -> String {
        let (out, diags) = run(text);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        out
    }

    #[test]
    fn object_macro_expands() {
        let out = run_ok("`define W 8\nwire [`W-1:0] a;\n");
        assert_eq!(out, "\nwire [8-1:0] a;\n");
    }

    #[test]
    fn function_macro_substitutes_arguments() {
        let out = run_ok("`define MAX(a,b) ((a) > (b) ? (a) : (b))\nassign y = `MAX(x, 4);\n");
        assert_eq!(out, "\nassign y = ((x) > (4) ? (x) : (4));\n");
    }

    #[test]
    fn nested_call_arguments_keep_commas() {
        let out = run_ok("`define ID(a) a\nx = `ID(f(1, 2));\n");
        assert_eq!(out, "\nx = f(1, 2);\n");
    }

    #[test]
    fn continuation_lines_keep_line_count() {
        let out = run_ok("`define SUM(a, b) \\\n  a + b\nx = `SUM(1,2);\n");
        assert_eq!(out, "\n\nx = 1 + 2;\n");
    }

    #[test]
    fn define_strips_trailing_comment() {
        let out = run_ok("`define DEPTH 16 // entries\nlocalparam D = `DEPTH;\n");
        assert_eq!(out, "\nlocalparam D = 16;\n");
    }

    #[test]
    fn ifdef_else_selects_branch() {
        let out = run_ok("`define FOO\n`ifdef FOO\na\n`else\nb\n`endif\n");
        assert_eq!(out, "\n\na\n\n\n\n");
    }

    #[test]
    fn ifndef_elsif_chain() {
        let src = "`define B\n`ifndef B\none\n`elsif B\ntwo\n`else\nthree\n`endif\n";
        let out = run_ok(src);
        assert!(out.contains("two"));
        assert!(!out.contains("one"));
        assert!(!out.contains("three"));
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn nested_conditionals_in_inactive_region() {
        let out = run_ok("`ifdef NOPE\n`ifdef ALSO\nx\n`else\ny\n`endif\n`else\nz\n`endif\n");
        assert!(out.contains('z'));
        assert!(!out.contains('x'));
        assert!(!out.contains('y'));
    }

    #[test]
    fn undef_removes_macro() {
        let out = run_ok("`define A\n`undef A\n`ifdef A\nyes\n`endif\n");
        assert!(!out.contains("yes"));
    }

    #[test]
    fn inactive_region_ignores_unknown_macros() {
        let out = run_ok("`ifdef NOPE\nwire w = `NOT_DEFINED;\n`endif\nwire v;\n");
        assert!(out.contains("wire v;"));
    }

    #[test]
    fn macros_in_comments_and_strings_untouched() {
        let out = run_ok("// uses `FOO\n$display(\"`BAR\");\n");
        assert_eq!(out, "// uses `FOO\n$display(\"`BAR\");\n");
    }

    #[test]
    fn undefined_macro_reported() {
        let (_, diags) = run("wire [`W:0] a;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNDEFINED_MACRO);
        assert!(diags[0].message.contains("`W"));
    }

    #[test]
    fn unclosed_ifdef_reported() {
        let (_, diags) = run("`ifdef X\nmodule m; endmodule\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UNBALANCED_CONDITIONAL);
    }

    #[test]
    fn stray_endif_reported() {
        let (_, diags) = run("`endif\n");
        assert_eq!(diags[0].code, DiagnosticCode::UNBALANCED_CONDITIONAL);
    }

    #[test]
    fn else_after_else_reported() {
        let (_, diags) = run("`ifdef X\n`else\n`else\n`endif\n");
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("after `else"));
    }

    #[test]
    fn ifdef_without_name_reported() {
        let (_, diags) = run("`ifdef\n`endif\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::BAD_DIRECTIVE);
    }

    #[test]
    fn wrong_argument_count_reported() {
        let (_, diags) = run("`define F(a, b) a\nx = `F(1);\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::BAD_DIRECTIVE);
        assert!(diags[0].message.contains("expects 2 argument(s), found 1"));
    }

    #[test]
    fn recursive_macro_hits_depth_limit() {
        let (_, diags) = run("`define LOOP `LOOP\nx = `LOOP;\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::EXPANSION_DEPTH);
    }

    #[test]
    fn other_directives_recorded_and_removed() {
        let mut db = SourceDb::new();
        let id = db.add_source(
            "top.v",
            "`timescale 1ns/1ps\n`default_nettype none\n`resetall\nmodule m; endmodule\n".to_string(),
        );
        let sink = DiagnosticSink::new();
        let mut pp = Preprocessor::new(&[], &sink);
        let out = pp.preprocess(id, &mut db);
        assert_eq!(out, "\n\n\nmodule m; endmodule\n");
        let directives = pp.into_directives();
        let kinds: Vec<_> = directives.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [
                DirectiveKind::Timescale,
                DirectiveKind::DefaultNettype,
                DirectiveKind::Resetall
            ]
        );
        assert_eq!(directives[0].text, "`timescale 1ns/1ps");
    }

    #[test]
    fn predefined_macros() {
        let sink = DiagnosticSink::new();
        let mut pp = Preprocessor::new(&[], &sink);
        assert!(pp.define("FAST"));
        assert!(pp.define("WIDTH=32"));
        assert!(!pp.define(""));
        assert!(!pp.define("9lives"));
        assert!(pp.is_defined("FAST"));

        let mut db = SourceDb::new();
        let id = db.add_source("top.v", "a = `FAST; b = `WIDTH;\n".to_string());
        assert_eq!(pp.preprocess(id, &mut db), "a = 1; b = 32;\n");
    }

    #[test]
    fn include_relative_and_search_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let inc = dir.path().join("inc");
        fs::create_dir(&inc).unwrap();
        fs::write(dir.path().join("local.vh"), "`define LOCAL 2\n").unwrap();
        fs::write(inc.join("defs.vh"), "`define WIDTH 16\n").unwrap();
        let top = dir.path().join("top.v");
        fs::write(
            &top,
            "`include \"local.vh\"\n`include <defs.vh>\nwire [`WIDTH-1:0] w = `LOCAL;\n",
        )
        .unwrap();

        let mut db = SourceDb::new();
        let id = db.load_file(&top).unwrap();
        let sink = DiagnosticSink::new();
        let mut pp = Preprocessor::new(&[inc], &sink);
        let out = pp.preprocess(id, &mut db);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        assert!(out.contains("wire [16-1:0] w = 2;"));
    }

    #[test]
    fn missing_include_lists_searched_paths() {
        let (_, diags) = run("`include \"nowhere.vh\"\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::INCLUDE_NOT_FOUND);
        assert!(diags[0].notes[0].contains("nowhere.vh"));
        assert!(!diags[0].help.is_empty());
    }

    #[test]
    fn self_include_hits_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.vh");
        fs::write(&path, "`include \"loop.vh\"\n").unwrap();
        let mut db = SourceDb::new();
        let id = db.load_file(&path).unwrap();
        let sink = DiagnosticSink::new();
        let mut pp = Preprocessor::new(&[], &sink);
        pp.preprocess(id, &mut db);
        let diags = sink.take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::EXPANSION_DEPTH);
    }
}
