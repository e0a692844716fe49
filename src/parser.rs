/*!
Precedence‑climbing parser for Tern.

The parser is table driven: every token kind that can *start* an expression
has a prefix parselet, every token kind that can *continue* one has an infix
parselet with a binding precedence (see [`crate::parselets`]).  The core loop
in [`Parser::parse_expression`] is the whole algorithm:

```text
parse_expression(min):
    skip separators
    left  = prefix[next](…)                 // "unexpected token" if none
    while precedence(infix[peek]) > min:
        left = infix[next](left, …)
    return left
```

Right‑associative constructs (assignment, `->`, `^`) parse their right hand
side at `precedence - 1`.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `parse_expression`           | `debug`| Parselet dispatch.                        |
| Error paths (`consume`, etc.)| `debug`| Context before returning structured error.|
*/

use std::rc::Rc;

use crate::error::{Result, TernError};
use crate::expr::{Clause, Expr, ExprKind};
use crate::morpher::Morpher;
use crate::parselets::{precedence, Grammar};
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Scan, morph and parse a whole unit.
pub fn parse_source(source: &str, source_name: &str) -> Result<Vec<Expr>> {
    Parser::from_source(source, source_name)?.parse()
}

/// Top‑level parser over the significant token stream of one unit.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    grammar: Rc<Grammar>,
}

impl Parser {
    /// Construct a parser with the standard grammar.  `tokens` must come out
    /// of a [`Morpher`]; a trailing `EOF` is added when missing.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_grammar(tokens, Rc::new(Grammar::standard()))
    }

    /// Construct a parser over a custom parselet table.
    pub fn with_grammar(mut tokens: Vec<Token>, grammar: Rc<Grammar>) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if tokens.last().map(|t| t.token_type) != Some(TokenType::EOF) {
            let (line, source) = tokens
                .last()
                .map(|t| (t.line, t.source.clone()))
                .unwrap_or((1, Rc::from("<input>")));
            tokens.push(Token::new(TokenType::EOF, "", line, source));
        }

        Self {
            tokens,
            current: 0,
            grammar,
        }
    }

    /// Scan and morph `source`.  The first lexical error aborts.
    pub fn from_source(source: &str, source_name: &str) -> Result<Self> {
        let tokens: Vec<Token> =
            Morpher::new(Scanner::new(source, source_name)).collect::<Result<Vec<_>>>()?;

        Ok(Self::new(tokens))
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire unit and return its top‑level expressions.
    pub fn parse(&mut self) -> Result<Vec<Expr>> {
        info!("Beginning parse phase");

        let mut expressions: Vec<Expr> = Vec::new();

        while let Some(expr) = self.next_expression()? {
            expressions.push(expr);
        }

        info!("Parsed {} top-level expressions", expressions.len());

        Ok(expressions)
    }

    /// Parse the next top‑level expression, `None` at end of input.
    pub fn next_expression(&mut self) -> Result<Option<Expr>> {
        self.skip_separators();

        if self.is_at_end() {
            return Ok(None);
        }

        let expr = self.parse_expression(0)?;
        self.end_of_expression(TokenType::EOF)?;

        Ok(Some(expr))
    }

    /// The precedence‑climbing core.
    pub fn parse_expression(&mut self, min_precedence: u8) -> Result<Expr> {
        self.skip_separators();

        let token: Token = self.advance();
        let prefix = match self.grammar.prefix(token.token_type) {
            Some(prefix) => prefix,
            None => {
                debug!("No prefix parselet for {:?}", token.token_type);
                return Err(self.error_at(&token, "Unexpected token"));
            }
        };

        debug!("Prefix parselet for {:?}", token.token_type);
        let mut left: Expr = prefix.parse(self, token)?;

        while min_precedence < self.next_precedence() {
            let token: Token = self.advance();
            let Some(infix) = self.grammar.infix(token.token_type) else {
                return Err(self.error_at(&token, "Unexpected token"));
            };

            debug!("Infix parselet for {:?}", token.token_type);
            left = infix.parse(self, left, token)?;
        }

        Ok(left)
    }

    // ─────────────────── helpers shared with parselets ───────────────────

    /// Binding precedence of the next token, `0` when it has no infix role.
    fn next_precedence(&self) -> u8 {
        self.grammar
            .infix(self.peek().token_type)
            .map_or(0, |infix| infix.precedence())
    }

    /// `{ e; e; … }` after the opening brace has been consumed.
    pub(crate) fn sequence(&mut self) -> Result<Vec<Expr>> {
        let mut expressions: Vec<Expr> = Vec::new();

        loop {
            self.skip_separators();

            if self.matches(TokenType::RIGHT_BRACE) {
                return Ok(expressions);
            }

            if self.is_at_end() {
                return Err(self.error("Expected '}' to close block"));
            }

            expressions.push(self.parse_expression(0)?);
            self.end_of_expression(TokenType::RIGHT_BRACE)?;
        }
    }

    /// Comma separated expressions up to `close` (already opened).
    pub(crate) fn delimited(&mut self, close: TokenType, what: &str) -> Result<Vec<Expr>> {
        let mut items: Vec<Expr> = Vec::new();

        self.skip_separators();
        if self.matches(close) {
            return Ok(items);
        }

        loop {
            items.push(self.parse_expression(0)?);
            self.skip_separators();

            if self.matches(TokenType::COMMA) {
                continue;
            }

            self.consume(close, &format!("Expected ',' or closing delimiter after {}", what))?;
            return Ok(items);
        }
    }

    /// `{ pattern -> body … }` for `match` and `catch`.
    pub(crate) fn clauses(&mut self, what: &str) -> Result<Vec<Clause>> {
        self.skip_separators();
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' to open {} clauses", what),
        )?;

        let mut clauses: Vec<Clause> = Vec::new();

        loop {
            self.skip_separators();

            if self.matches(TokenType::RIGHT_BRACE) {
                return Ok(clauses);
            }

            let pattern: Expr = self.parse_expression(precedence::ASSIGNMENT)?;
            self.consume(TokenType::ARROW, "Expected '->' after pattern")?;
            let body: Expr = self.parse_expression(0)?;
            self.end_of_expression(TokenType::RIGHT_BRACE)?;

            clauses.push(Clause { pattern, body });
        }
    }

    /// After an expression: a separator, or the closing token left in place.
    fn end_of_expression(&mut self, close: TokenType) -> Result<()> {
        if self.matches(TokenType::SEPARATOR) || self.check(close) || self.is_at_end() {
            return Ok(());
        }

        Err(self.error("Expected end of expression"))
    }

    /// Consume `ttype` when it is the next token, possibly behind one
    /// separator (`} else`, `}\ncatch`).
    pub(crate) fn matches_after_separator(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            return true;
        }

        if self.check(TokenType::SEPARATOR)
            && self.tokens.get(self.current + 1).map(|t| t.token_type) == Some(ttype)
        {
            self.current += 2;
            return true;
        }

        false
    }

    pub(crate) fn skip_separators(&mut self) {
        while self.check(TokenType::SEPARATOR) {
            self.advance();
        }
    }

    #[inline(always)]
    pub(crate) fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    pub(crate) fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        debug!(
            "consume failed: wanted {:?}, found {:?}",
            ttype,
            self.peek().token_type
        );

        Err(self.error(message))
    }

    #[inline(always)]
    pub(crate) fn check(&self, ttype: TokenType) -> bool {
        self.peek().token_type == ttype
    }

    /// Take the next token.  `EOF` is never consumed.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();

        if !self.is_at_end() {
            self.current += 1;
        }

        token
    }

    #[inline(always)]
    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    #[inline(always)]
    pub(crate) fn peek(&self) -> &Token {
        // `with_grammar` guarantees a trailing EOF, so the clamp always hits.
        let last = self.tokens.len() - 1;
        &self.tokens[self.current.min(last)]
    }

    /// Parse error at the next token.
    pub(crate) fn error(&self, message: &str) -> TernError {
        self.error_at(self.peek(), message)
    }

    pub(crate) fn error_at(&self, token: &Token, message: &str) -> TernError {
        let lexeme: &str = match token.token_type {
            TokenType::EOF => "end of input",
            TokenType::SEPARATOR => "end of line",
            _ => &token.lexeme,
        };

        TernError::parse(token.line, &token.source, lexeme, message)
    }
}

impl Iterator for Parser {
    type Item = Result<Expr>;

    /// Yields top‑level expressions; stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_expression() {
            Ok(Some(expr)) => Some(Ok(expr)),
            Ok(None) => None,
            Err(e) => {
                self.current = self.tokens.len() - 1;
                Some(Err(e))
            }
        }
    }
}

/// Build a node at `token`'s position.
pub(crate) fn node(token: &Token, kind: ExprKind) -> Expr {
    Expr::new(token.clone(), kind)
}
