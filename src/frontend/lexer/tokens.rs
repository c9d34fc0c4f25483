//! Token types for the Vesna lexer.

use crate::frontend::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Let,
    Func,
    Class,
    Import,
    If,
    Else,
    While,
    Return,
    This,
    True,
    False,

    // Literals and names
    Ident(String),
    Integer(i64),
    Str(String),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Colon,
    Semi,
    Comma,
    Dot,
    Assign,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,

    Eof,
}

impl TokenKind {
    /// Human-readable token name for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Let => "'let'".to_string(),
            TokenKind::Func => "'func'".to_string(),
            TokenKind::Class => "'class'".to_string(),
            TokenKind::Import => "'import'".to_string(),
            TokenKind::If => "'if'".to_string(),
            TokenKind::Else => "'else'".to_string(),
            TokenKind::While => "'while'".to_string(),
            TokenKind::Return => "'return'".to_string(),
            TokenKind::This => "'this'".to_string(),
            TokenKind::True => "'true'".to_string(),
            TokenKind::False => "'false'".to_string(),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Integer(value) => format!("integer '{}'", value),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Semi => "';'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Assign => "'='".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Lt => "'<'".to_string(),
            TokenKind::Le => "'<='".to_string(),
            TokenKind::Gt => "'>'".to_string(),
            TokenKind::Ge => "'>='".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// Map an identifier spelling to its keyword token, if it is one.
pub fn keyword(name: &str) -> Option<TokenKind> {
    match name {
        "let" => Some(TokenKind::Let),
        "func" => Some(TokenKind::Func),
        "class" => Some(TokenKind::Class),
        "import" => Some(TokenKind::Import),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "while" => Some(TokenKind::While),
        "return" => Some(TokenKind::Return),
        "this" => Some(TokenKind::This),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        _ => None,
    }
}
