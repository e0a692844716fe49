//! Structural pattern matching, shared by `match`, `catch`, `for` and
//! destructuring assignment.
//!
//! | Pattern            | Matches                                             |
//! |--------------------|-----------------------------------------------------|
//! | `name`             | anything; binds it (`_` binds nothing)              |
//! | literal            | an equal value of the same kind                     |
//! | `(p, q)`           | a tuple of the same length, element‑wise            |
//! | `[p, q]`           | a list of the same length, element‑wise             |
//! | `[k: p]`           | a map holding each (evaluated) key, value against p |
//! | `p: Class`         | an instance of `Class` (or a subclass), then `p`    |
//! | `p: q`             | otherwise a 2‑tuple, element‑wise                   |
//! | anything else      | evaluated, then compared with `==`                  |
//!
//! Bindings made by a failed tuple or list pattern are left behind; every
//! caller either runs the match in a throw‑away frame or rejects the value.

use std::rc::Rc;

use log::debug;

use crate::expr::{Expr, ExprKind, LiteralValue};
use crate::interpreter::{IResult, Interpreter};
use crate::object::ClassObj;
use crate::value::{MapKey, Value};

/// How a name pattern stores what it matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Bind in the innermost frame, overwriting silently.
    Fresh,
    /// Plain assignment: nearest binding, else the innermost frame.
    Assign,
    /// Define in the innermost frame; AlreadyDefined if present.
    Declare,
}

impl Interpreter {
    pub fn match_pattern(&mut self, pattern: &Expr, value: &Value, mode: BindMode) -> IResult<bool> {
        match &pattern.kind {
            ExprKind::Name(name) => {
                if name != "_" {
                    let mode = if pattern.has_annotation("var") {
                        BindMode::Declare
                    } else {
                        mode
                    };
                    self.bind_name(name, value.clone(), mode)?;
                }
                Ok(true)
            }

            ExprKind::Literal(literal) => Ok(literal_matches(literal, value)),

            ExprKind::Grouping(inner) => self.match_pattern(inner, value, mode),

            ExprKind::Tuple(patterns) => match value {
                Value::Tuple(values) => self.match_all(patterns, values, mode),
                _ => Ok(false),
            },

            ExprKind::List(patterns) => match value {
                Value::List(values) => {
                    let values = values.borrow().clone();
                    self.match_all(patterns, &values, mode)
                }
                _ => Ok(false),
            },

            ExprKind::Map(entries) => {
                let Value::Map(map) = value else {
                    return Ok(false);
                };

                for (key, sub_pattern) in entries {
                    let key = self.evaluate(key)?;
                    let entry = map.borrow().get(&MapKey(key)).cloned();

                    match entry {
                        Some(entry) if self.match_pattern(sub_pattern, &entry, mode)? => {}
                        _ => return Ok(false),
                    }
                }

                Ok(true)
            }

            ExprKind::Pair(left, right) => match self.class_pattern(right)? {
                Some(class) => {
                    if !self.builtins().is_instance(value, &class) {
                        debug!("Typed pattern rejects {} (not a {})", value, class.name);
                        return Ok(false);
                    }
                    self.match_pattern(left, value, mode)
                }
                None => match value {
                    Value::Tuple(values) if values.len() == 2 => {
                        Ok(self.match_pattern(left, &values[0], mode)?
                            && self.match_pattern(right, &values[1], mode)?)
                    }
                    _ => Ok(false),
                },
            },

            _ => {
                let expected = self.evaluate(pattern)?;
                Ok(expected == *value)
            }
        }
    }

    fn match_all(&mut self, patterns: &[Expr], values: &[Value], mode: BindMode) -> IResult<bool> {
        if patterns.len() != values.len() {
            return Ok(false);
        }

        for (pattern, value) in patterns.iter().zip(values) {
            if !self.match_pattern(pattern, value, mode)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn bind_name(&mut self, name: &str, value: Value, mode: BindMode) -> IResult<()> {
        match mode {
            BindMode::Fresh => {
                self.env.bind(name, value);
                Ok(())
            }
            BindMode::Assign => {
                self.env.put(name, value);
                Ok(())
            }
            BindMode::Declare => self.env.define(name, value),
        }
    }

    /// The class named by the right side of `p: Class`, if it names one.
    fn class_pattern(&mut self, expr: &Expr) -> IResult<Option<Rc<ClassObj>>> {
        let value = match &expr.kind {
            ExprKind::Name(name) if self.env.has(name) => self.env.get(name)?,
            ExprKind::Member { .. } => self.evaluate(expr)?,
            _ => return Ok(None),
        };

        match value {
            Value::Class(class) => Ok(Some(class)),
            _ => Ok(None),
        }
    }
}

fn literal_matches(literal: &LiteralValue, value: &Value) -> bool {
    match (literal, value) {
        (LiteralValue::Number(a), Value::Number(b)) => a == b,
        (LiteralValue::Str(a), Value::Str(b)) => a.as_str() == &**b,
        (LiteralValue::True, Value::Bool(b)) => *b,
        (LiteralValue::False, Value::Bool(b)) => !*b,
        (LiteralValue::Null, Value::Null) => true,
        _ => false,
    }
}
