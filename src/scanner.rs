//! Streaming lexer.
//!
//! [`Scanner`] walks the source once and yields `Result<Token>` items.  Trivia
//! (whitespace and `//` comments) is consumed before each lexeme, so every
//! call to `next` produces either a token or an error, and exactly one `EOF`
//! token closes the stream.  A lexing error does not stop the scan: the next
//! call resumes after the offending character.
//!
//! Recognised lexemes:
//! - punctuation `( ) { } , . - + ; * /` and the operators `! != = == < <= > >=`
//! - string literals, which may span lines
//! - numbers with an optional fractional part (`12`, `3.5`; never `.5` or `5.`)
//! - identifiers, with keywords looked up in a compile-time perfect hash

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"    => TokenType::AND,
    "break"  => TokenType::BREAK,
    "class"  => TokenType::CLASS,
    "else"   => TokenType::ELSE,
    "false"  => TokenType::FALSE,
    "fun"    => TokenType::FUN,
    "for"    => TokenType::FOR,
    "if"     => TokenType::IF,
    "nil"    => TokenType::NIL,
    "or"     => TokenType::OR,
    "print"  => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super"  => TokenType::SUPER,
    "this"   => TokenType::THIS,
    "true"   => TokenType::TRUE,
    "var"    => TokenType::VAR,
    "while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    start: usize, // first byte of the lexeme being scanned
    pos: usize,   // next unread byte
    line: usize,
    finished: bool, // EOF token already handed out
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            bytes: text.as_bytes(),
            start: 0,
            pos: 0,
            line: 1,
            finished: false,
        }
    }

    /// Drain the scanner, keeping tokens and errors apart.
    pub fn scan_all(self) -> (Vec<Token>, Vec<LoxError>) {
        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        (tokens, errors)
    }

    #[inline(always)]
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Byte `offset` positions ahead of the cursor, `0` past the end.
    #[inline(always)]
    fn byte_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b: u8 = self.bytes[self.pos];
        self.pos += 1;
        b
    }

    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        let hit: bool = !self.at_end() && self.byte_at(0) == expected;
        if hit {
            self.pos += 1;
        }
        hit
    }

    #[inline(always)]
    fn lexeme(&self) -> &'a str {
        &self.text[self.start..self.pos]
    }

    /// `matched` when the next byte is `=`, otherwise `single`.
    fn with_equal(&mut self, matched: TokenType, single: TokenType) -> TokenType {
        if self.eat(b'=') {
            matched
        } else {
            single
        }
    }

    /// Consume whitespace, newlines and line comments.
    fn skip_trivia(&mut self) {
        while !self.at_end() {
            match self.byte_at(0) {
                b' ' | b'\r' | b'\t' => self.pos += 1,

                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }

                b'/' if self.byte_at(1) == b'/' => {
                    // Stop on the newline so the arm above counts it.
                    self.pos = match memchr(b'\n', &self.bytes[self.pos..]) {
                        Some(offset) => self.pos + offset,
                        None => self.bytes.len(),
                    };
                }

                _ => return,
            }
        }
    }

    /// Scan one lexeme starting at `self.start`.
    fn scan_token(&mut self) -> Result<TokenType> {
        let kind: TokenType = match self.bump() {
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
            b'/' => TokenType::SLASH,

            b'!' => self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Resume on the next character boundary, not the next byte.
                let c: char = self.text[self.start..].chars().next().unwrap_or('?');
                self.pos = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        };

        Ok(kind)
    }

    fn string(&mut self) -> Result<TokenType> {
        while !self.at_end() && self.byte_at(0) != b'"' {
            if self.bump() == b'\n' {
                self.line += 1;
            }
        }

        if self.at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.pos += 1; // closing quote

        let body: &str = &self.text[self.start + 1..self.pos - 1];
        Ok(TokenType::STRING(body.to_owned()))
    }

    fn number(&mut self) -> TokenType {
        while self.byte_at(0).is_ascii_digit() {
            self.pos += 1;
        }

        if self.byte_at(0) == b'.' && self.byte_at(1).is_ascii_digit() {
            self.pos += 1;
            while self.byte_at(0).is_ascii_digit() {
                self.pos += 1;
            }
        }

        // Digits with at most one interior dot always parse.
        TokenType::NUMBER(self.lexeme().parse::<f64>().unwrap_or(0.0))
    }

    fn identifier(&mut self) -> TokenType {
        while matches!(self.byte_at(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        KEYWORDS
            .get(self.lexeme())
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        self.skip_trivia();

        if self.at_end() {
            self.finished = true;
            return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
        }

        self.start = self.pos;

        Some(self.scan_token().map(|kind| {
            debug!("Scanned {:?} on line {}", kind, self.line);
            Token::new(kind, self.lexeme(), self.line)
        }))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        Scanner::new(source)
            .filter_map(Result::ok)
            .map(|token| token.token_type)
            .collect()
    }

    #[test]
    fn comment_at_end_of_input_still_yields_eof() {
        assert_eq!(kinds("x // no newline"), vec![TokenType::IDENTIFIER, TokenType::EOF]);
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        assert_eq!(
            kinds("5.foo"),
            vec![
                TokenType::NUMBER(0.0),
                TokenType::DOT,
                TokenType::IDENTIFIER,
                TokenType::EOF
            ]
        );
    }

    #[test]
    fn iterator_is_fused_after_eof() {
        let mut scanner = Scanner::new("");

        assert!(scanner.next().is_some_and(|t| t.is_ok_and(|t| t.is_eof())));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
