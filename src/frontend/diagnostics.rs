//! Diagnostics for Vesna
//!
//! One compile holds at most one diagnostic: the first fatal error wins
//! and analysis stops there. The user-visible form is a single line,
//! `Error at <line>:<column>: <message>`.

use crate::frontend::ast::Span;

/// A compile-time error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
}

impl CompileError {
    pub fn new(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Semantic,
        }
    }

    pub fn syntax(message: String, span: Span) -> Self {
        Self {
            message,
            span,
            kind: ErrorKind::Syntax,
        }
    }

    /// Render against the source the error was produced from.
    pub fn render(&self, source: &str) -> String {
        let (line, column) = line_col(source, self.span.start);
        format!("Error at {}:{}: {}\n", line, column, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
}

/// 1-based line and column for a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut line_start = 0;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }

    (line, offset - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_is_one_based() {
        assert_eq!(line_col("abc", 0), (1, 1));
        assert_eq!(line_col("abc", 2), (1, 3));
    }

    #[test]
    fn line_col_counts_newlines() {
        let source = "let a;\nlet b;\n";
        assert_eq!(line_col(source, 7), (2, 1));
        assert_eq!(line_col(source, 11), (2, 5));
    }

    #[test]
    fn line_col_clamps_past_end() {
        assert_eq!(line_col("ab", 99), (1, 3));
    }

    #[test]
    fn constructors_classify_the_error() {
        let semantic = CompileError::new("m".to_string(), Span::default());
        assert_eq!(semantic.kind, ErrorKind::Semantic);
        let syntax = CompileError::syntax("m".to_string(), Span::default());
        assert_eq!(syntax.kind, ErrorKind::Syntax);
    }

    #[test]
    fn render_formats_position_prefix() {
        let err = CompileError::new("Identifier 'x' is not found".to_string(), Span::new(7, 8));
        assert_eq!(
            err.render("let a;\nx;"),
            "Error at 2:1: Identifier 'x' is not found\n"
        );
    }
}
