//! Token normaliser between the scanner and the parser.
//!
//! The morpher is an iterator adapter over the raw token stream.  It
//!
//! * drops whitespace and comments,
//! * turns `;` and line breaks into a single `SEPARATOR` kind,
//! * collapses runs of separators into one,
//! * elides a separator that follows a token which can not end an
//!   expression, or a `\` continuation marker (itself dropped).
//!
//! "Can not end an expression" covers more than the arithmetic operators
//! and `(`: every infix token (`=` and the compound assignments,
//! comparisons, `and`, `or`, `match`, `.`, `?.`, `:`, `->`), the `!`
//! prefix, the `[` opener and the `,` between arguments.  A line break
//! after any of them continues the expression.  After every other token,
//! closers and operands included, the separator is kept.
//!
//! Its only state is one boolean recomputed from the kind of the token it
//! last forwarded.

use crate::error::Result;
use crate::token::{Token, TokenType};
use log::debug;
use std::iter::FusedIterator;

/// Can a separator directly after `tt` be dropped?
pub fn elides_separator(tt: TokenType) -> bool {
    use TokenType::*;

    matches!(
        tt,
        PLUS | MINUS
            | STAR
            | SLASH
            | PERCENT
            | CARET
            | TILDE
            | BANG
            | LEFT_PAREN
            | LEFT_BRACKET
            | COMMA
            | DOT
            | SAFE_DOT
            | COLON
            | ARROW
            | EQUAL
            | EQUAL_EQUAL
            | BANG_EQUAL
            | LESS
            | LESS_EQUAL
            | GREATER
            | GREATER_EQUAL
            | PLUS_EQUAL
            | MINUS_EQUAL
            | STAR_EQUAL
            | SLASH_EQUAL
            | PERCENT_EQUAL
            | CARET_EQUAL
            | TILDE_EQUAL
            | AND
            | OR
            | MATCH
            | CONTINUATION
            | SEPARATOR
    )
}

pub struct Morpher<I> {
    tokens: I,
    elide_separator: bool,
}

impl<I> Morpher<I>
where
    I: Iterator<Item = Result<Token>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            elide_separator: false,
        }
    }
}

impl<I> Iterator for Morpher<I>
where
    I: Iterator<Item = Result<Token>>,
{
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut token = match self.tokens.next()? {
                Ok(token) => token,
                Err(e) => return Some(Err(e)),
            };

            if token.token_type.is_trivia() {
                continue;
            }

            if matches!(token.token_type, TokenType::SEMICOLON | TokenType::NEWLINE) {
                token.token_type = TokenType::SEPARATOR;
            }

            let elide = self.elide_separator;
            self.elide_separator = elides_separator(token.token_type);

            match token.token_type {
                TokenType::SEPARATOR if elide => {
                    debug!("Eliding separator on line {}", token.line);
                    continue;
                }
                TokenType::CONTINUATION => continue,
                _ => return Some(Ok(token)),
            }
        }
    }
}

impl<I> FusedIterator for Morpher<I> where I: FusedIterator<Item = Result<Token>> {}
