//! Lexer for the Vesna programming language
//!
//! Handles tokenization including:
//! - Keywords (let, func, class, if, while, return, import, this)
//! - Identifiers and literals (integer, string, boolean)
//! - Operators and punctuation (`+ - * / < <= > >= = . , : ;` and braces)
//! - `//` line comments

pub mod tokens;

pub use tokens::{keyword, Token, TokenKind};

use crate::frontend::ast::Span;
use crate::frontend::diagnostics::CompileError;

/// Lexer for Vesna source code.
///
/// Converts source text into a stream of tokens. The stream always ends
/// with an `Eof` token. Lexing stops at the first invalid input.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<Token>,
}

/// Tokenize an entire source string.
#[tracing::instrument(skip_all, fields(len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).tokenize()
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source code.
    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }
        self.tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.current_pos, self.current_pos),
        ));
        Ok(self.tokens)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, Span::new(start, self.current_pos)));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) -> Result<(), CompileError> {
        // Skip whitespace
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }

        let start = self.current_pos;
        let Some(c) = self.advance() else {
            return Ok(());
        };

        match c {
            '(' => self.push(TokenKind::LParen, start),
            ')' => self.push(TokenKind::RParen, start),
            '{' => self.push(TokenKind::LBrace, start),
            '}' => self.push(TokenKind::RBrace, start),
            ':' => self.push(TokenKind::Colon, start),
            ';' => self.push(TokenKind::Semi, start),
            ',' => self.push(TokenKind::Comma, start),
            '.' => self.push(TokenKind::Dot, start),
            '+' => self.push(TokenKind::Plus, start),
            '-' => self.push(TokenKind::Minus, start),
            '*' => self.push(TokenKind::Star, start),
            '=' => self.push(TokenKind::Assign, start),
            '/' => {
                if self.peek() == Some('/') {
                    // Line comment
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                } else {
                    self.push(TokenKind::Slash, start);
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.push(TokenKind::Le, start);
                } else {
                    self.push(TokenKind::Lt, start);
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.push(TokenKind::Ge, start);
                } else {
                    self.push(TokenKind::Gt, start);
                }
            }
            '"' => self.scan_string(start)?,
            c if c.is_ascii_digit() => self.scan_number(start, c)?,
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(start, c),
            c => {
                return Err(CompileError::syntax(
                    format!("Unexpected character '{}'", c),
                    Span::new(start, self.current_pos),
                ));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Literals and identifiers
    // ========================================================================

    fn scan_string(&mut self, start: usize) -> Result<(), CompileError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    let escaped = self.advance().ok_or_else(|| {
                        CompileError::syntax(
                            "Unterminated string literal".to_string(),
                            Span::new(start, self.current_pos),
                        )
                    })?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        other => {
                            return Err(CompileError::syntax(
                                format!("Unknown escape sequence '\\{}'", other),
                                Span::new(start, self.current_pos),
                            ));
                        }
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(CompileError::syntax(
                        "Unterminated string literal".to_string(),
                        Span::new(start, self.current_pos),
                    ));
                }
            }
        }
        self.push(TokenKind::Str(value), start);
        Ok(())
    }

    fn scan_number(&mut self, start: usize, first: char) -> Result<(), CompileError> {
        let mut digits = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let value: i64 = digits.parse().map_err(|_| {
            CompileError::syntax(
                format!("Integer literal '{}' is out of range", digits),
                Span::new(start, self.current_pos),
            )
        })?;
        self.push(TokenKind::Integer(value), start);
        Ok(())
    }

    fn scan_identifier(&mut self, start: usize, first: char) {
        let mut name = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = keyword(&name).unwrap_or(TokenKind::Ident(name));
        self.push(kind, start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_let_statement() {
        assert_eq!(
            kinds("let a = 5;"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("a".to_string()),
                TokenKind::Assign,
                TokenKind::Integer(5),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_two_char_operators() {
        assert_eq!(
            kinds("a <= b >= c < d > e"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Le,
                TokenKind::Ident("b".to_string()),
                TokenKind::Ge,
                TokenKind::Ident("c".to_string()),
                TokenKind::Lt,
                TokenKind::Ident("d".to_string()),
                TokenKind::Gt,
                TokenKind::Ident("e".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_escapes() {
        assert_eq!(
            kinds(r#""Hello\n""#),
            vec![TokenKind::Str("Hello\n".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            kinds("return true"),
            vec![TokenKind::Return, TokenKind::True, TokenKind::Eof]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(
            kinds("let a; // trailing\nlet b;"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("a".to_string()),
                TokenKind::Semi,
                TokenKind::Let,
                TokenKind::Ident("b".to_string()),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(lex(r#""abc"#).is_err());
    }

    #[test]
    fn token_spans_cover_source() {
        let tokens = lex("let ab = 12;").unwrap();
        assert_eq!(tokens[1].span, Span::new(4, 6));
        assert_eq!(tokens[3].span, Span::new(9, 11));
    }
}
