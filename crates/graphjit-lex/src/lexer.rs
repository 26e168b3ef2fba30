//! Core lexer implementation.
//!
//! The lexer first strips every whitespace byte out of the input, then
//! walks the resulting buffer with a [`Cursor`]. Stripping whitespace up
//! front (rather than skipping it token-by-token) means every lexeme is
//! a contiguous, whitespace-free slice of the cleaned buffer, which is
//! what the "lexeme concatenation reconstructs the stripped input"
//! invariant relies on.

use graphjit_util::{DiagnosticBuilder, Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Tokenizes a single-variable math expression.
pub struct Lexer<'a> {
    cleaned: &'a str,
    cursor: Cursor<'a>,
    handler: &'a mut Handler,
    paren_balance: i64,
}

impl<'a> Lexer<'a> {
    /// Builds a lexer over `source`, after stripping whitespace.
    ///
    /// `source` must already have had whitespace removed by the caller
    /// (see [`strip_whitespace`]) and outlive the lexer.
    pub fn new(cleaned: &'a str, handler: &'a mut Handler) -> Self {
        Self {
            cleaned,
            cursor: Cursor::new(cleaned.as_bytes()),
            handler,
            paren_balance: 0,
        }
    }

    fn make_token(&self, kind: TokenKind, start: usize) -> Token<'a> {
        Token::new(kind, self.cursor.slice(start, self.cursor.position()))
    }

    fn report_error(&mut self, message: impl Into<String>) {
        DiagnosticBuilder::error(message).span(Span::DUMMY).emit(self.handler);
    }

    /// Scans and returns the next token, `Eof` once the buffer is exhausted.
    pub fn next_token(&mut self) -> Token<'a> {
        let start = self.cursor.position();

        if self.cursor.is_at_end() {
            return self.make_token(TokenKind::Eof, start);
        }

        let c = self.cursor.advance();
        match c {
            b'(' => {
                self.paren_balance += 1;
                self.make_token(TokenKind::LParen, start)
            }
            b')' => {
                self.paren_balance -= 1;
                self.make_token(TokenKind::RParen, start)
            }
            b',' => self.make_token(TokenKind::Comma, start),
            b'+' => self.make_token(TokenKind::Plus, start),
            b'-' => self.make_token(TokenKind::Minus, start),
            b'*' => self.make_token(TokenKind::Star, start),
            b'/' => self.make_token(TokenKind::Slash, start),
            b'^' => self.make_token(TokenKind::Caret, start),
            b'0'..=b'9' => self.lex_number(start),
            b'a'..=b'z' | b'A'..=b'Z' => self.lex_ident(start),
            _ => {
                self.report_error(format!("unexpected character {:?}", c as char));
                self.make_token(TokenKind::Error, start)
            }
        }
    }

    /// Digits, then an optional `.` and more digits.
    ///
    /// A `.` is consumed whenever present even if no digit follows it
    /// (`"3."` lexes as the Number `"3."`) — this mirrors the source
    /// grammar exactly and is intentional, not a bug: the resulting text
    /// still parses fine via `str::parse::<f64>`.
    fn lex_number(&mut self, start: usize) -> Token<'a> {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }
        if self.cursor.current() == b'.' {
            self.cursor.advance();
            while self.cursor.current().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        self.make_token(TokenKind::Number, start)
    }

    /// Greedily consumes letters and digits.
    fn lex_ident(&mut self, start: usize) -> Token<'a> {
        while self.cursor.current().is_ascii_alphanumeric() {
            self.cursor.advance();
        }
        self.make_token(TokenKind::Ident, start)
    }

    /// Lexes the whole input, terminated by an `Eof` token.
    ///
    /// Returns `None` if the parentheses in the input are unbalanced —
    /// the caller should treat this as "no tokens produced" and refuse
    /// to hand anything to the parser.
    pub fn lex_all(mut self) -> Option<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        if self.paren_balance != 0 {
            return None;
        }
        Some(tokens)
    }

    /// The whitespace-stripped buffer this lexer is scanning.
    pub fn source(&self) -> &'a str {
        self.cleaned
    }
}

/// Removes every ASCII whitespace byte from `source`, producing the
/// buffer a [`Lexer`] actually scans.
pub fn strip_whitespace(source: &str) -> String {
    source.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Prints one line per token to stdout, for diagnostics only.
pub fn debug_dump_tokens(tokens: &[Token<'_>]) {
    for tok in tokens {
        println!("{}", tok);
    }
}
