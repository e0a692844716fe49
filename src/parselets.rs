//! Prefix and infix parselets, plus the table that maps token kinds to them.
//!
//! A parselet receives the token that selected it (already consumed) and
//! builds one node, recursing into [`Parser::parse_expression`] for its
//! operands.  Grammar‑level desugaring lives here too: function declaration
//! from `name(args) = body`, index/member set from `t[i] = v` / `t.m = v`,
//! and compound assignment `t OP= v` ⇒ `t = t OP v`.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::Result;
use crate::expr::{
    BinaryOp, ClassMember, Expr, ExprKind, FunctionDef, LiteralValue, LogicalOp, Params, UnaryOp,
};
use crate::parser::{node, Parser};
use crate::token::{Literal, Token, TokenType};

/// The precedence ladder, low → high.
pub mod precedence {
    pub const ASSIGNMENT: u8 = 1;
    pub const RECORD: u8 = 2;
    pub const LOGICAL: u8 = 3;
    pub const EQUALITY: u8 = 4;
    pub const COMPARISON: u8 = 5;
    pub const EXPONENT: u8 = 6;
    pub const SUM: u8 = 7;
    pub const PRODUCT: u8 = 8;
    pub const PREFIX: u8 = 9;
    pub const CALL: u8 = 10;
}

/// A construct that starts an expression.
pub trait PrefixParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr>;
}

/// A construct that continues an expression to its left.
pub trait InfixParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr>;

    fn precedence(&self) -> u8;
}

/// Token kind → parselet tables.
#[derive(Default)]
pub struct Grammar {
    prefix: HashMap<TokenType, Rc<dyn PrefixParselet>>,
    infix: HashMap<TokenType, Rc<dyn InfixParselet>>,
}

impl Grammar {
    /// An empty table; see [`Grammar::standard`] for the language grammar.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_prefix(&mut self, ttype: TokenType, parselet: impl PrefixParselet + 'static) {
        self.prefix.insert(ttype, Rc::new(parselet));
    }

    pub fn register_infix(&mut self, ttype: TokenType, parselet: impl InfixParselet + 'static) {
        self.infix.insert(ttype, Rc::new(parselet));
    }

    pub fn prefix(&self, ttype: TokenType) -> Option<Rc<dyn PrefixParselet>> {
        self.prefix.get(&ttype).cloned()
    }

    pub fn infix(&self, ttype: TokenType) -> Option<Rc<dyn InfixParselet>> {
        self.infix.get(&ttype).cloned()
    }

    /// The Tern grammar.
    pub fn standard() -> Self {
        use precedence::*;
        use TokenType::*;

        let mut g = Self::new();

        // ── prefix ─────────────────────────────────────────────────────
        for tt in [NUMBER, STRING, CHAR, TRUE, FALSE, NULL] {
            g.register_prefix(tt, LiteralParselet);
        }
        g.register_prefix(IDENTIFIER, NameParselet);
        g.register_prefix(LEFT_PAREN, GroupParselet);
        g.register_prefix(LEFT_BRACKET, CollectionParselet);
        g.register_prefix(LEFT_BRACE, BlockParselet);
        g.register_prefix(MINUS, PrefixOperatorParselet(UnaryOp::Negate));
        g.register_prefix(BANG, PrefixOperatorParselet(UnaryOp::Not));
        g.register_prefix(ANNOTATION, AnnotationParselet);
        g.register_prefix(IF, IfParselet);
        g.register_prefix(WHILE, WhileParselet);
        g.register_prefix(FOR, ForParselet);
        g.register_prefix(TRY, TryParselet);
        g.register_prefix(THROW, ThrowParselet);
        g.register_prefix(RETURN, ReturnParselet);
        g.register_prefix(CLASS, ClassParselet);
        g.register_prefix(IMPORT, ImportParselet);

        // ── infix ──────────────────────────────────────────────────────
        g.register_infix(EQUAL, AssignParselet(None));
        for (tt, op) in [
            (PLUS_EQUAL, BinaryOp::Add),
            (MINUS_EQUAL, BinaryOp::Subtract),
            (STAR_EQUAL, BinaryOp::Multiply),
            (SLASH_EQUAL, BinaryOp::Divide),
            (PERCENT_EQUAL, BinaryOp::Remainder),
            (CARET_EQUAL, BinaryOp::Power),
            (TILDE_EQUAL, BinaryOp::Concat),
        ] {
            g.register_infix(tt, AssignParselet(Some(op)));
        }
        g.register_infix(ARROW, LambdaParselet);
        g.register_infix(COLON, PairParselet);
        g.register_infix(AND, LogicalParselet(LogicalOp::And));
        g.register_infix(OR, LogicalParselet(LogicalOp::Or));
        g.register_infix(MATCH, MatchParselet);

        let binary = [
            (EQUAL_EQUAL, BinaryOp::Equal, EQUALITY, false),
            (BANG_EQUAL, BinaryOp::NotEqual, EQUALITY, false),
            (LESS, BinaryOp::Less, COMPARISON, false),
            (LESS_EQUAL, BinaryOp::LessEqual, COMPARISON, false),
            (GREATER, BinaryOp::Greater, COMPARISON, false),
            (GREATER_EQUAL, BinaryOp::GreaterEqual, COMPARISON, false),
            (CARET, BinaryOp::Power, EXPONENT, true),
            (PLUS, BinaryOp::Add, SUM, false),
            (MINUS, BinaryOp::Subtract, SUM, false),
            (TILDE, BinaryOp::Concat, SUM, false),
            (STAR, BinaryOp::Multiply, PRODUCT, false),
            (SLASH, BinaryOp::Divide, PRODUCT, false),
            (PERCENT, BinaryOp::Remainder, PRODUCT, false),
        ];
        for (tt, op, precedence, right_assoc) in binary {
            g.register_infix(
                tt,
                BinaryOperatorParselet {
                    op,
                    precedence,
                    right_assoc,
                },
            );
        }

        g.register_infix(LEFT_PAREN, CallParselet);
        g.register_infix(LEFT_BRACKET, IndexParselet);
        g.register_infix(DOT, MemberParselet { safe: false });
        g.register_infix(SAFE_DOT, MemberParselet { safe: true });
        g.register_infix(ELLIPSIS, SpreadParselet);

        debug!(
            "Standard grammar: {} prefix, {} infix parselets",
            g.prefix.len(),
            g.infix.len()
        );

        g
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Prefix parselets
// ─────────────────────────────────────────────────────────────────────────────

pub struct LiteralParselet;

impl PrefixParselet for LiteralParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let value = match (token.token_type, &token.literal) {
            (TokenType::TRUE, _) => LiteralValue::True,
            (TokenType::FALSE, _) => LiteralValue::False,
            (TokenType::NULL, _) => LiteralValue::Null,
            (_, Some(Literal::Number(n))) => LiteralValue::Number(*n),
            (_, Some(Literal::Str(s))) => LiteralValue::Str(s.clone()),
            _ => return Err(parser.error_at(&token, "Malformed literal")),
        };

        Ok(node(&token, ExprKind::Literal(value)))
    }
}

pub struct NameParselet;

impl PrefixParselet for NameParselet {
    fn parse(&self, _parser: &mut Parser, token: Token) -> Result<Expr> {
        Ok(node(&token, ExprKind::Name(token.lexeme.clone())))
    }
}

/// `( … )`: grouping, tuple, or the empty tuple.
pub struct GroupParselet;

impl PrefixParselet for GroupParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        parser.skip_separators();

        if parser.matches(TokenType::RIGHT_PAREN) {
            return Ok(node(&token, ExprKind::Tuple(Vec::new())));
        }

        let first: Expr = parser.parse_expression(0)?;
        parser.skip_separators();

        if !parser.matches(TokenType::COMMA) {
            parser.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;
            return Ok(node(&token, ExprKind::Grouping(Box::new(first))));
        }

        // `(a,)` is a one element tuple; otherwise parse the remainder.
        let mut items: Vec<Expr> = vec![first];
        items.extend(parser.delimited(TokenType::RIGHT_PAREN, "tuple element")?);

        Ok(node(&token, ExprKind::Tuple(items)))
    }
}

/// `[ … ]`: list, map, or `[:]`.
pub struct CollectionParselet;

impl PrefixParselet for CollectionParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        parser.skip_separators();

        if parser.matches(TokenType::COLON) {
            parser.consume(TokenType::RIGHT_BRACKET, "Expected ']' after '[:'")?;
            return Ok(node(&token, ExprKind::Map(Vec::new())));
        }

        let items: Vec<Expr> = parser.delimited(TokenType::RIGHT_BRACKET, "element")?;

        let is_map = matches!(items.first().map(|e| &e.kind), Some(ExprKind::Pair(..)));
        if !is_map {
            if let Some(pair) = items.iter().find(|e| matches!(e.kind, ExprKind::Pair(..))) {
                return Err(parser.error_at(&pair.token, "Unexpected 'key: value' in list"));
            }
            return Ok(node(&token, ExprKind::List(items)));
        }

        let mut entries: Vec<(Expr, Expr)> = Vec::with_capacity(items.len());
        for item in items {
            match item.kind {
                ExprKind::Pair(key, value) => entries.push((*key, *value)),
                _ => return Err(parser.error_at(&item.token, "Expected 'key: value' in map")),
            }
        }

        Ok(node(&token, ExprKind::Map(entries)))
    }
}

pub struct BlockParselet;

impl PrefixParselet for BlockParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let body: Vec<Expr> = parser.sequence()?;

        Ok(node(&token, ExprKind::Block(body)))
    }
}

pub struct PrefixOperatorParselet(pub UnaryOp);

impl PrefixParselet for PrefixOperatorParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let right: Expr = parser.parse_expression(precedence::PREFIX)?;

        Ok(node(
            &token,
            ExprKind::Unary {
                op: self.0,
                right: Box::new(right),
            },
        ))
    }
}

/// `@name operand`: attaches `name` to the operand.
pub struct AnnotationParselet;

impl PrefixParselet for AnnotationParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let mut operand: Expr = parser.parse_expression(precedence::PREFIX)?;
        operand.annotations.push(token.lexeme);

        Ok(operand)
    }
}

pub struct IfParselet;

impl PrefixParselet for IfParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let condition: Expr = parser.parse_expression(0)?;
        let then_branch: Expr = parser.parse_expression(0)?;

        let else_branch: Option<Box<Expr>> = if parser.matches_after_separator(TokenType::ELSE) {
            Some(Box::new(parser.parse_expression(0)?))
        } else {
            None
        };

        Ok(node(
            &token,
            ExprKind::If {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch,
            },
        ))
    }
}

pub struct WhileParselet;

impl PrefixParselet for WhileParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let condition: Expr = parser.parse_expression(0)?;
        let body: Expr = parser.parse_expression(0)?;

        Ok(node(
            &token,
            ExprKind::While {
                condition: Box::new(condition),
                body: Box::new(body),
            },
        ))
    }
}

/// `for pattern in iterable body`
pub struct ForParselet;

impl PrefixParselet for ForParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let pattern: Expr = parser.parse_expression(0)?;
        parser.consume(TokenType::IN, "Expected 'in' after loop pattern")?;
        let iterable: Expr = parser.parse_expression(0)?;
        let body: Expr = parser.parse_expression(0)?;

        Ok(node(
            &token,
            ExprKind::For {
                pattern: Box::new(pattern),
                iterable: Box::new(iterable),
                body: Box::new(body),
            },
        ))
    }
}

/// `try body catch { pattern -> handler … }`
pub struct TryParselet;

impl PrefixParselet for TryParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let body: Expr = parser.parse_expression(0)?;

        if !parser.matches_after_separator(TokenType::CATCH) {
            return Err(parser.error("Expected 'catch' after try body"));
        }

        let clauses = parser.clauses("catch")?;

        Ok(node(
            &token,
            ExprKind::Try {
                body: Box::new(body),
                clauses,
            },
        ))
    }
}

pub struct ThrowParselet;

impl PrefixParselet for ThrowParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let value: Expr = parser.parse_expression(0)?;

        Ok(node(&token, ExprKind::Throw(Box::new(value))))
    }
}

pub struct ReturnParselet;

impl PrefixParselet for ReturnParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let bare = parser.check(TokenType::SEPARATOR)
            || parser.check(TokenType::RIGHT_BRACE)
            || parser.check(TokenType::RIGHT_PAREN)
            || parser.is_at_end();

        let value = if bare {
            None
        } else {
            Some(Box::new(parser.parse_expression(0)?))
        };

        Ok(node(&token, ExprKind::Return(value)))
    }
}

/// `class Name : Super { members }`
pub struct ClassParselet;

impl PrefixParselet for ClassParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let name: Token = parser.consume(TokenType::IDENTIFIER, "Expected class name")?;

        let superclass: Option<String> = if parser.matches(TokenType::COLON) {
            let sup = parser.consume(TokenType::IDENTIFIER, "Expected superclass name after ':'")?;
            Some(sup.lexeme)
        } else {
            None
        };

        parser.skip_separators();
        parser.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut members: Vec<ClassMember> = Vec::new();

        for member in parser.sequence()? {
            let member = match member.kind {
                ExprKind::FunctionDecl { function, .. } => ClassMember::Function(function),
                ExprKind::Assign { name, value, .. } => ClassMember::Field {
                    name,
                    default: Some(Rc::new(*value)),
                },
                ExprKind::Name(name) => ClassMember::Field {
                    name,
                    default: None,
                },
                _ => {
                    return Err(parser.error_at(
                        &member.token,
                        "Class members must be functions, fields, or field names",
                    ))
                }
            };
            members.push(member);
        }

        Ok(node(
            &token,
            ExprKind::Class {
                name: name.lexeme,
                superclass,
                members,
            },
        ))
    }
}

/// `import a.b.c`
pub struct ImportParselet;

impl PrefixParselet for ImportParselet {
    fn parse(&self, parser: &mut Parser, token: Token) -> Result<Expr> {
        let mut path: Vec<String> = vec![
            parser
                .consume(TokenType::IDENTIFIER, "Expected module name after 'import'")?
                .lexeme,
        ];

        while parser.matches(TokenType::DOT) {
            path.push(
                parser
                    .consume(TokenType::IDENTIFIER, "Expected module name after '.'")?
                    .lexeme,
            );
        }

        Ok(node(&token, ExprKind::Import(path)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Infix parselets
// ─────────────────────────────────────────────────────────────────────────────

pub struct BinaryOperatorParselet {
    pub op: BinaryOp,
    pub precedence: u8,
    pub right_assoc: bool,
}

impl InfixParselet for BinaryOperatorParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let next = if self.right_assoc {
            self.precedence - 1
        } else {
            self.precedence
        };
        let right: Expr = parser.parse_expression(next)?;

        Ok(node(
            &token,
            ExprKind::Binary {
                left: Box::new(left),
                op: self.op,
                right: Box::new(right),
            },
        ))
    }

    fn precedence(&self) -> u8 {
        self.precedence
    }
}

pub struct LogicalParselet(pub LogicalOp);

impl InfixParselet for LogicalParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let right: Expr = parser.parse_expression(precedence::LOGICAL)?;

        Ok(node(
            &token,
            ExprKind::Logical {
                left: Box::new(left),
                op: self.0,
                right: Box::new(right),
            },
        ))
    }

    fn precedence(&self) -> u8 {
        precedence::LOGICAL
    }
}

/// `=` and the compound assignments.
pub struct AssignParselet(pub Option<BinaryOp>);

impl InfixParselet for AssignParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let value: Expr = parser.parse_expression(precedence::ASSIGNMENT - 1)?;

        let Some(op) = self.0 else {
            return assignment(parser, left, value, token);
        };

        // t OP= v  ⇒  t = t OP v
        let target = match &left.kind {
            ExprKind::Grouping(inner) => (**inner).clone(),
            _ => left,
        };
        if !matches!(
            target.kind,
            ExprKind::Name(_) | ExprKind::Index { .. } | ExprKind::Member { safe: false, .. }
        ) {
            return Err(parser.error_at(&token, "Invalid compound assignment target"));
        }

        let combined = node(
            &token,
            ExprKind::Binary {
                left: Box::new(target.clone()),
                op,
                right: Box::new(value),
            },
        );

        assignment(parser, target, combined, token)
    }

    fn precedence(&self) -> u8 {
        precedence::ASSIGNMENT
    }
}

/// Route `target = value` to the node for the target's set‑kind.
fn assignment(parser: &Parser, target: Expr, value: Expr, token: Token) -> Result<Expr> {
    let declare = target.has_annotation("var");
    let annotations = target.annotations.clone();

    let kind = match target.kind {
        ExprKind::Name(name) => ExprKind::Assign {
            name,
            value: Box::new(value),
            declare,
        },

        ExprKind::Grouping(inner) => return assignment(parser, *inner, value, token),

        ExprKind::Call { callee, arguments } => {
            let Some(name) = callee.as_name().map(str::to_string) else {
                return Err(parser.error_at(
                    &callee.token,
                    "Function declaration requires a bare name",
                ));
            };
            let params = params_from(parser, &arguments)?;

            ExprKind::FunctionDecl {
                function: Rc::new(FunctionDef {
                    name,
                    params,
                    body: Rc::new(value),
                }),
                declare: declare || callee.has_annotation("var"),
            }
        }

        ExprKind::Index { target, index } => ExprKind::IndexSet {
            target,
            index,
            value: Box::new(value),
        },

        ExprKind::Member {
            object,
            name,
            safe: false,
        } => ExprKind::MemberSet {
            object,
            name,
            value: Box::new(value),
        },

        kind @ (ExprKind::Tuple(_) | ExprKind::List(_) | ExprKind::Map(_)) => {
            let pattern = Expr {
                token: target.token,
                annotations,
                kind,
            };
            ExprKind::Destructure {
                pattern: Box::new(pattern),
                value: Box::new(value),
            }
        }

        _ => return Err(parser.error_at(&token, "Invalid assignment target")),
    };

    Ok(node(&token, kind))
}

/// Parameter names from call arguments or a lambda's left side.
fn params_from(parser: &Parser, items: &[Expr]) -> Result<Params> {
    let mut params = Params::default();

    for (i, item) in items.iter().enumerate() {
        match &item.kind {
            ExprKind::Name(name) => params.names.push(name.clone()),
            ExprKind::Spread(inner) if i + 1 == items.len() => match inner.as_name() {
                Some(name) => params.rest = Some(name.to_string()),
                None => return Err(parser.error_at(&item.token, "Rest parameter must be a name")),
            },
            _ => return Err(parser.error_at(&item.token, "Parameters must be names")),
        }
    }

    Ok(params)
}

/// `params -> body`
pub struct LambdaParselet;

impl InfixParselet for LambdaParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let params = match &left.kind {
            ExprKind::Name(_) | ExprKind::Spread(_) => params_from(parser, std::slice::from_ref(&left))?,
            ExprKind::Grouping(inner) => params_from(parser, std::slice::from_ref(inner.as_ref()))?,
            ExprKind::Tuple(items) => params_from(parser, items)?,
            _ => return Err(parser.error_at(&left.token, "Invalid lambda parameters")),
        };

        let body: Expr = parser.parse_expression(precedence::ASSIGNMENT - 1)?;

        Ok(node(
            &token,
            ExprKind::Lambda(Rc::new(FunctionDef {
                name: "<lambda>".to_string(),
                params,
                body: Rc::new(body),
            })),
        ))
    }

    fn precedence(&self) -> u8 {
        precedence::ASSIGNMENT
    }
}

/// `key: value`
pub struct PairParselet;

impl InfixParselet for PairParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let right: Expr = parser.parse_expression(precedence::RECORD)?;

        Ok(node(&token, ExprKind::Pair(Box::new(left), Box::new(right))))
    }

    fn precedence(&self) -> u8 {
        precedence::RECORD
    }
}

/// `scrutinee match { pattern -> body … }`
pub struct MatchParselet;

impl InfixParselet for MatchParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let clauses = parser.clauses("match")?;

        let mut seen: Vec<&LiteralValue> = Vec::new();
        for clause in &clauses {
            if let ExprKind::Literal(literal) = &clause.pattern.kind {
                if seen.iter().any(|s| s.same_literal(literal)) {
                    return Err(parser.error_at(&clause.pattern.token, "Duplicate pattern in match"));
                }
                seen.push(literal);
            }
        }

        Ok(node(
            &token,
            ExprKind::Match {
                scrutinee: Box::new(left),
                clauses,
            },
        ))
    }

    fn precedence(&self) -> u8 {
        precedence::EQUALITY
    }
}

pub struct CallParselet;

impl InfixParselet for CallParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let arguments: Vec<Expr> = parser.delimited(TokenType::RIGHT_PAREN, "argument")?;

        Ok(node(
            &token,
            ExprKind::Call {
                callee: Box::new(left),
                arguments,
            },
        ))
    }

    fn precedence(&self) -> u8 {
        precedence::CALL
    }
}

pub struct IndexParselet;

impl InfixParselet for IndexParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let index: Expr = parser.parse_expression(0)?;
        parser.skip_separators();
        parser.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

        Ok(node(
            &token,
            ExprKind::Index {
                target: Box::new(left),
                index: Box::new(index),
            },
        ))
    }

    fn precedence(&self) -> u8 {
        precedence::CALL
    }
}

pub struct MemberParselet {
    pub safe: bool,
}

impl InfixParselet for MemberParselet {
    fn parse(&self, parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        let name: Token = parser.consume(TokenType::IDENTIFIER, "Expected member name after '.'")?;

        Ok(node(
            &token,
            ExprKind::Member {
                object: Box::new(left),
                name: name.lexeme,
                safe: self.safe,
            },
        ))
    }

    fn precedence(&self) -> u8 {
        precedence::CALL
    }
}

/// `expr...`
pub struct SpreadParselet;

impl InfixParselet for SpreadParselet {
    fn parse(&self, _parser: &mut Parser, left: Expr, token: Token) -> Result<Expr> {
        Ok(node(&token, ExprKind::Spread(Box::new(left))))
    }

    fn precedence(&self) -> u8 {
        precedence::CALL
    }
}
