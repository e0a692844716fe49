//! Module `scanner` implements a one‑pass, streaming lexer for Tern.
//!
//! It transforms a `&str` into a sequence of *raw* [`Token`]s.  Unlike the
//! parser‑facing stream, the raw stream keeps whitespace, comments and line
//! breaks; the [`Morpher`](crate::morpher::Morpher) filters them afterwards.
//! The scanner is a `FusedIterator` that emits exactly one `EOF` token.
//!
//! # Core Phases
//!
//! 1. **Primitive Helpers**
//!    - `advance()`, `peek()`, `peek_next()` and `match_byte()` give two bytes
//!      of lookahead, enough for maximal munch on `...`, `?.`, `->`, `==` and
//!      the compound assignments.
//!
//! 2. **Lexing Loop** (`next`)
//!    - Reset `start`, call `scan_token()`, wrap the recognised kind into a
//!      token.  Errors are yielded in place and scanning resumes after the
//!      offending character.
//!
//! 3. **Token Recognition** (`scan_token`)
//!    - Line breaks: `\r\n`, `\r` and `\n` each produce one `NEWLINE`.
//!    - String and char literals with the fixed escape set
//!      `\n \r \f \t \0 \\ \' \"`.
//!    - Numbers: digits with at most one embedded dot.  Signs are prefix
//!      operators, never part of the literal.
//!    - Identifiers/keywords resolved via a perfect‑hash `KEYWORDS` map.
//!    - `@name` becomes a single `ANNOTATION` token whose lexeme is `name`.

use crate::error::{Result, TernError};
use crate::token::{Literal, Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr2};
use phf::phf_map;
use std::iter::FusedIterator;
use std::rc::Rc;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"or"     => TokenType::OR,
    b"class"  => TokenType::CLASS,
    b"if"     => TokenType::IF,
    b"else"   => TokenType::ELSE,
    b"while"  => TokenType::WHILE,
    b"for"    => TokenType::FOR,
    b"in"     => TokenType::IN,
    b"match"  => TokenType::MATCH,
    b"try"    => TokenType::TRY,
    b"catch"  => TokenType::CATCH,
    b"throw"  => TokenType::THROW,
    b"import" => TokenType::IMPORT,
    b"return" => TokenType::RETURN,
    b"true"   => TokenType::TRUE,
    b"false"  => TokenType::FALSE,
    b"null"   => TokenType::NULL,
};

/// A single pass **scanner / lexer** over one source unit.
pub struct Scanner<'a> {
    src: &'a str,                 // entire source unit
    source_name: Rc<str>,         // file name or `<eval>`, copied into every token
    start: usize,                 // index of the *first* byte of the current lexeme
    curr: usize,                  // index *one past* the last byte examined
    line: usize,                  // 1‑based line counter
    pending: Option<TokenType>,   // recognised token kind waiting to be emitted
    literal: Option<Literal>,     // decoded payload for literal tokens
    lexeme: Option<String>,       // lexeme override (annotations, newlines)
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`, labelling tokens with `source_name`.
    #[inline]
    pub fn new(src: &'a str, source_name: &str) -> Self {
        info!("Scanner created over {} bytes of {}", src.len(), source_name);

        Self {
            src,
            source_name: Rc::from(source_name),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
            literal: None,
            lexeme: None,
            finished: false,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Advance one byte and return it.  Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes()[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past the end.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.bytes().get(self.curr).copied().unwrap_or(0)
    }

    /// One byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        self.bytes().get(self.curr + 1).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> TernError {
        TernError::lex(self.line, &self.source_name, message)
    }

    /// Pick `with_eq` when the next byte is `=`, otherwise `plain`.
    fn either(&mut self, with_eq: TokenType, plain: TokenType) -> TokenType {
        if self.match_byte(b'=') {
            with_eq
        } else {
            plain
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b',' => TokenType::COMMA,
            b':' => TokenType::COLON,
            b';' => TokenType::SEMICOLON,
            b'\\' => TokenType::CONTINUATION,

            // ── maximal munch ────────────────────────────────────────────
            b'.' => {
                if self.peek() == b'.' && self.peek_next() == b'.' {
                    self.curr += 2;
                    TokenType::ELLIPSIS
                } else {
                    TokenType::DOT
                }
            }
            b'?' => {
                if self.match_byte(b'.') {
                    TokenType::SAFE_DOT
                } else {
                    return Err(self.error("Unexpected character: ?"));
                }
            }
            b'-' => {
                if self.match_byte(b'>') {
                    TokenType::ARROW
                } else {
                    self.either(TokenType::MINUS_EQUAL, TokenType::MINUS)
                }
            }
            b'+' => self.either(TokenType::PLUS_EQUAL, TokenType::PLUS),
            b'*' => self.either(TokenType::STAR_EQUAL, TokenType::STAR),
            b'%' => self.either(TokenType::PERCENT_EQUAL, TokenType::PERCENT),
            b'^' => self.either(TokenType::CARET_EQUAL, TokenType::CARET),
            b'~' => self.either(TokenType::TILDE_EQUAL, TokenType::TILDE),
            b'!' => self.either(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(TokenType::GREATER_EQUAL, TokenType::GREATER),

            // ── comments or division ─────────────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to the line break; it is scanned on its own.
                    match memchr2(b'\n', b'\r', &self.bytes()[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.src.len(),
                    }
                    TokenType::COMMENT
                } else if self.match_byte(b'*') {
                    self.block_comment()?;
                    TokenType::COMMENT
                } else {
                    self.either(TokenType::SLASH_EQUAL, TokenType::SLASH)
                }
            }

            // ── whitespace / line breaks ─────────────────────────────────
            b' ' | b'\t' | b'\x0c' => {
                while matches!(self.peek(), b' ' | b'\t' | b'\x0c') {
                    self.advance();
                }
                TokenType::WHITESPACE
            }
            b'\r' | b'\n' => {
                if b == b'\r' {
                    self.match_byte(b'\n');
                }
                self.lexeme = Some("\n".to_string());
                self.line += 1;
                TokenType::NEWLINE
            }

            b'"' => self.string()?,
            b'\'' => self.char_literal()?,
            b'@' => self.annotation()?,

            b'0'..=b'9' => self.number()?,

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Skip the whole UTF‑8 sequence so the next scan starts on a
                // character boundary.
                let c = self.src[self.start..].chars().next().unwrap_or('\u{fffd}');
                self.curr = self.start + c.len_utf8();
                return Err(self.error(format!("Unexpected character: {}", c)));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    fn block_comment(&mut self) -> Result<()> {
        loop {
            match memchr(b'*', &self.bytes()[self.curr..]) {
                Some(pos) => {
                    let chunk = &self.bytes()[self.curr..self.curr + pos];
                    self.line += count_line_breaks(chunk);
                    self.curr += pos + 1;
                    if self.match_byte(b'/') {
                        return Ok(());
                    }
                }
                None => {
                    let rest = &self.bytes()[self.curr..];
                    self.line += count_line_breaks(rest);
                    self.curr = self.src.len();
                    return Err(self.error("Unterminated block comment."));
                }
            }
        }
    }

    /// Decode one escape sequence; the backslash is already consumed.
    fn escape(&mut self) -> Result<char> {
        if self.is_at_end() {
            return Err(self.error("Unterminated escape sequence."));
        }

        let c = match self.advance() {
            b'n' => '\n',
            b'r' => '\r',
            b'f' => '\x0c',
            b't' => '\t',
            b'0' => '\0',
            b'\\' => '\\',
            b'\'' => '\'',
            b'"' => '"',
            other => {
                return Err(self.error(format!("Invalid escape sequence: \\{}", other as char)));
            }
        };

        Ok(c)
    }

    /// Parse a double‑quoted string literal.  `self.start` points at the
    /// opening quote; on return `self.curr` is past the closing one.
    fn string(&mut self) -> Result<TokenType> {
        let mut value = String::new();
        let mut run_start = self.curr;

        loop {
            if self.is_at_end() {
                return Err(self.error("Unterminated string."));
            }

            match self.peek() {
                b'"' => break,
                b'\\' => {
                    value.push_str(&self.src[run_start..self.curr]);
                    self.advance();
                    let c = self.escape()?;
                    value.push(c);
                    run_start = self.curr;
                }
                b'\n' => {
                    self.line += 1;
                    self.advance();
                }
                b'\r' => {
                    self.advance();
                    if self.peek() != b'\n' {
                        self.line += 1;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }

        value.push_str(&self.src[run_start..self.curr]);
        self.advance(); // closing quote

        self.literal = Some(Literal::Str(value));

        Ok(TokenType::STRING)
    }

    /// Parse a single‑quoted literal holding exactly one character.
    fn char_literal(&mut self) -> Result<TokenType> {
        if self.is_at_end() {
            return Err(self.error("Unterminated character literal."));
        }

        let c = if self.peek() == b'\\' {
            self.advance();
            self.escape()?
        } else {
            let c = self.src[self.curr..].chars().next().unwrap_or('\0');
            self.curr += c.len_utf8();
            c
        };

        if !self.match_byte(b'\'') {
            return Err(self.error("Character literal must hold exactly one character."));
        }

        self.literal = Some(Literal::Str(c.to_string()));

        Ok(TokenType::CHAR)
    }

    /// `@name`: one token wrapping the following name.
    fn annotation(&mut self) -> Result<TokenType> {
        let name_start = self.curr;

        if !matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'_') {
            return Err(self.error("Expected a name after '@'."));
        }

        while is_name_byte(self.peek()) {
            self.advance();
        }

        self.lexeme = Some(self.src[name_start..self.curr].to_string());

        Ok(TokenType::ANNOTATION)
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn number(&mut self) -> Result<TokenType> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: &str = &self.src[self.start..self.curr];
        let n: f64 = text
            .parse::<f64>()
            .map_err(|e| self.error(format!("Invalid number '{}': {}", text, e)))?;

        self.literal = Some(Literal::Number(n));

        Ok(TokenType::NUMBER)
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn identifier(&mut self) -> TokenType {
        while is_name_byte(self.peek()) {
            self.advance();
        }

        let slice: &[u8] = &self.bytes()[self.start..self.curr];

        KEYWORDS.get(slice).copied().unwrap_or(TokenType::IDENTIFIER)
    }
}

#[inline(always)]
fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

/// Counts line breaks with `\r\n` treated as one.
fn count_line_breaks(chunk: &[u8]) -> usize {
    let mut count = 0;
    let mut i = 0;

    while i < chunk.len() {
        match chunk[i] {
            b'\n' => count += 1,
            b'\r' => {
                count += 1;
                if chunk.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    count
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // EOF guard – emit exactly one EOF then terminate.
        if self.is_at_end() {
            self.finished = true;
            return Some(Ok(Token::new(
                TokenType::EOF,
                "",
                self.line,
                self.source_name.clone(),
            )));
        }

        self.start = self.curr;
        self.pending = None;
        self.literal = None;
        self.lexeme = None;

        // A line break belongs to the line it terminates.
        let line = self.line;

        if let Err(e) = self.scan_token() {
            return Some(Err(e));
        }

        let tt = self.pending.take()?;
        let lexeme = self
            .lexeme
            .take()
            .unwrap_or_else(|| self.src[self.start..self.curr].to_string());

        debug!("Scanned token ({:?}) on line {}", tt, line);

        let mut token = Token::new(tt, lexeme, line, self.source_name.clone());
        if let Some(literal) = self.literal.take() {
            token = token.with_literal(literal);
        }

        Some(Ok(token))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
