use std::fmt;

use crate::token::Token;

/// An irrecoverable scan error with full source location.
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub file: String,
}

impl LexError {
    pub fn new(message: impl Into<String>, line: u32, column: u32, file: impl Into<String>) -> Self {
        LexError {
            message: message.into(),
            line,
            column,
            file: file.into(),
        }
    }

    /// Render the error with the offending source line and a caret underline.
    pub fn display_with_source(&self, source: &str) -> String {
        render_context(source, &self.message, self.line, self.column, 1)
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.message)
    }
}

impl std::error::Error for LexError {}

/// A parse error citing the offending token.
///
/// The first error aborts the parse — there is no local recovery.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub token: Token,
}

impl ParseError {
    pub fn new(message: impl Into<String>, token: Token) -> Self {
        ParseError {
            message: message.into(),
            token,
        }
    }

    pub fn display_with_source(&self, source: &str) -> String {
        let width = self.token.value.chars().count().max(1);
        render_context(
            source,
            &self.message,
            self.token.line,
            self.token.column,
            width,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.token.file, self.token.line, self.token.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Wrap `text` in an ANSI SGR sequence, resetting at the end.
fn paint(sgr: &str, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", sgr, text)
}

/// Shared renderer: error label, source line, caret underline.
fn render_context(source: &str, message: &str, line: u32, column: u32, width: usize) -> String {
    let line_content = source.lines().nth(line.saturating_sub(1) as usize).unwrap_or("");
    let pad = " ".repeat(column.saturating_sub(1) as usize);
    let underline = "^".repeat(width);

    let line_num = paint("34", &format!("{:4}", line));
    let pipe = paint("34", "|");

    format!(
        "{}: {}\n\n{} {} {}\n     {} {}{}",
        paint("1;31", "error"),
        message,
        line_num,
        pipe,
        line_content,
        pipe,
        pad,
        paint("31", &underline)
    )
}
