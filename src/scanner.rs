//! One-pass streaming lexer.
//!
//! Transforms a UTF-8 source string into a sequence of [`Token`]s, skipping
//! whitespace and `//` comments and emitting exactly one `EOF` token at the
//! end. Implemented as a `FusedIterator` yielding `Result<Token>` so lexical
//! errors are interleaved with tokens and scanning continues past them.
//!
//! Tokens borrow their lexemes from the source buffer; nothing is allocated
//! except string-literal payloads. Keywords are resolved through a
//! compile-time perfect-hash map, and comment skipping fast-forwards to the
//! next newline with `memchr`.

use std::iter::FusedIterator;

use log::info;
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// Single-pass scanner over `src`. The lifetime `'a` ties every emitted
/// token's `lexeme` slice back to the original source buffer.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize, // first byte of the current lexeme
    curr: usize,  // one past the last byte examined
    line: usize,  // 1-based, incremented on '\n'
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
        }
    }

    // ───────────────────────── primitive helpers ─────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b: u8 = self.src.as_bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte without consuming it; `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src.as_bytes()[self.curr]
        }
    }

    /// One byte beyond [`peek`]; `0` past EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.src.as_bytes()[self.curr + 1]
        }
    }

    /// Consume a byte iff it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.curr += 1;
            true
        } else {
            false
        }
    }

    // ───────────────────────────── core lexing ───────────────────────────

    /// Scan a single lexeme starting at `self.start`. `Ok(None)` means the
    /// lexeme was whitespace or a comment and produced no token.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b: u8 = self.advance();

        let token_type = match b {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            b' ' | b'\r' | b'\t' => return Ok(None),

            b'\n' => {
                self.line += 1;
                return Ok(None);
            }

            b'/' => {
                if self.match_byte(b'/') {
                    // Fast-forward to the next newline; skip to EOF if none.
                    match memchr(b'\n', &self.src.as_bytes()[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.src.len(),
                    }

                    return Ok(None);
                }

                TokenType::SLASH
            }

            b'"' => self.scan_string()?,

            b'0'..=b'9' => self.scan_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            _ => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", b as char),
                ));
            }
        };

        Ok(Some(token_type))
    }

    /// Double-quoted string literal; multi-line strings are allowed.
    fn scan_string(&mut self) -> Result<TokenType> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        // Contents without the surrounding quotes.
        let contents: &str = &self.src[self.start + 1..self.curr - 1];

        Ok(TokenType::STRING(contents.to_owned()))
    }

    /// Numeric literal (`123`, `3.14`). The fractional part is optional.
    fn scan_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume '.'

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: &str = &self.src[self.start..self.curr];
        // Only digits and at most one '.' — parsing cannot fail.
        let n: f64 = lexeme.parse::<f64>().unwrap_or(0.0);

        TokenType::NUMBER(n)
    }

    /// Identifier, resolved to a keyword through the perfect-hash map.
    fn scan_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let lexeme: &[u8] = &self.src.as_bytes()[self.start..self.curr];

        KEYWORDS
            .get(lexeme)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Emit exactly one EOF, then terminate.
            if self.curr > self.src.len() {
                return None;
            }

            if self.curr == self.src.len() {
                self.curr += 1;

                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(Some(token_type)) => {
                    let lexeme: &str = &self.src[self.start..self.curr];

                    return Some(Ok(Token::new(token_type, lexeme, self.line)));
                }

                // Whitespace or comment — keep scanning.
                Ok(None) => continue,
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
