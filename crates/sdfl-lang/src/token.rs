//! Token types produced by the lexer

use std::fmt;

/// Terminal classes of the SDFL grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `def` - starts a function definition
    Def,
    /// `let` - legacy variable keyword, rejected by the parser
    Let,
    Identifier,
    Float,
    Int,
    Star,
    Slash,
    Plus,
    Minus,
    Equal,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Whitespace,
    Comment,
    Eof,
}

impl TokenKind {
    /// Short name used in diagnostics and token dumps
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Def => "'def'",
            TokenKind::Let => "'let'",
            TokenKind::Identifier => "identifier",
            TokenKind::Float => "float literal",
            TokenKind::Int => "integer literal",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Equal => "'='",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A lexed token. Rows start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub row: usize,
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            row,
            col,
        }
    }

    pub fn eof(row: usize, col: usize) -> Self {
        Self::new(TokenKind::Eof, "EOF", row, col)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token:{}:{} {:<16} Value: {:?}",
            self.row, self.col, self.kind, self.text
        )
    }
}
