//! Token kinds produced by the lexer.

use std::fmt;

/// A single lexical token.
///
/// `lexeme` always holds the exact source slice that produced the token,
/// including for `Error` tokens (where it is the one offending byte).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str) -> Self {
        Self { kind, lexeme }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}  {}", self.kind, self.lexeme)
    }
}

/// The kind of a [`Token`], independent of its source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Error,
    Eof,
    Ident,
    Number,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Error => "Error",
            TokenKind::Eof => "Eof",
            TokenKind::Ident => "Ident",
            TokenKind::Number => "Number",
            TokenKind::Plus => "Plus",
            TokenKind::Minus => "Minus",
            TokenKind::Star => "Star",
            TokenKind::Slash => "Slash",
            TokenKind::Caret => "Caret",
            TokenKind::LParen => "LParen",
            TokenKind::RParen => "RParen",
            TokenKind::Comma => "Comma",
        };
        write!(f, "{name}")
    }
}
