//! Human-readable rendering of diagnostics.

use crate::diagnostic::Diagnostic;
use vspec_source::SourceDb;

/// Formats a diagnostic for some output target.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic, including its trailing newline.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// rustc-style terminal output:
///
/// ```text
/// error[E301]: expected `;`, found `endmodule`
///   --> rtl/top.v:4:1
///    |
///  4 | endmodule
///    | ^^^^^^^^^
///    = help: ...
/// ```
pub struct TerminalRenderer {
    /// Emit ANSI color escapes.
    pub color: bool,
}

const RESET: &str = "\x1b[0m";
const BLUE: &str = "\x1b[1;34m";

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, escape: &str) -> String {
        if self.color {
            format!("{escape}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();
        let header = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(&header, diag.severity.ansi_color()),
            diag.message
        ));

        let mut gutter = String::from("  ");
        if let Some(file) = source_db.try_get_file(diag.primary_span.file) {
            let span = diag.primary_span;
            let (line, col) = file.line_col(span.start);
            let line_num = line.to_string();
            gutter = " ".repeat(line_num.len() + 1);
            let bar = self.paint("|", BLUE);

            out.push_str(&format!(
                "{}{} {}:{}:{}\n",
                " ".repeat(line_num.len()),
                self.paint("-->", BLUE),
                file.path.display(),
                line,
                col
            ));
            out.push_str(&format!("{gutter}{bar}\n"));
            let text = file.line_text(span.start);
            out.push_str(&format!("{} {bar} {text}\n", self.paint(&line_num, BLUE)));

            // Carets stop at the end of the first line.
            let room = text.len().saturating_sub(col as usize - 1).max(1);
            let carets = "^".repeat((span.len() as usize).clamp(1, room));
            out.push_str(&format!(
                "{gutter}{bar} {}{}\n",
                " ".repeat(col as usize - 1),
                self.paint(&carets, diag.severity.ansi_color())
            ));
        }

        for note in &diag.notes {
            out.push_str(&format!("{gutter} = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("{gutter} = help: {help}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::DiagnosticCode;
    use vspec_source::Span;

    #[test]
    fn render_error_with_source_line() {
        let mut db = SourceDb::new();
        let file = db.add_source("top.v", "module top\n  wire a;\n".to_string());
        let span = Span::new(file, 13, 17);
        let diag = Diagnostic::error(DiagnosticCode::SYNTAX, "expected `;`, found `wire`", span);

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.starts_with("error[E301]: expected `;`, found `wire`\n"));
        assert!(out.contains("--> top.v:2:3"));
        assert!(out.contains("2 |   wire a;"));
        assert!(out.contains("  |   ^^^^\n"));
    }

    #[test]
    fn render_footers_without_source() {
        let db = SourceDb::new();
        let diag = Diagnostic::warning(
            DiagnosticCode::UNDECLARED_PORT,
            "port `clk` has no direction declaration",
            Span::DUMMY,
        )
        .with_note("non-ANSI ports need an input, output or inout declaration")
        .with_help("add `input clk;` to the module body");

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("warning[W302]"));
        assert!(!out.contains("-->"));
        assert!(out.contains("= note: non-ANSI ports"));
        assert!(out.contains("= help: add `input clk;`"));
    }

    #[test]
    fn color_wraps_header() {
        let db = SourceDb::new();
        let diag = Diagnostic::error(DiagnosticCode::LEX_ERROR, "stray `\\`", Span::DUMMY);
        let out = TerminalRenderer::new(true).render(&diag, &db);
        assert!(out.starts_with("\x1b[1;31merror[E101]\x1b[0m: "));
    }

    #[test]
    fn carets_clamped_to_line() {
        let mut db = SourceDb::new();
        let file = db.add_source("m.v", "/* open\nstill open".to_string());
        let diag = Diagnostic::error(
            DiagnosticCode::LEX_ERROR,
            "unterminated block comment",
            Span::new(file, 0, 18),
        );
        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("| ^^^^^^^\n"));
    }
}
