use crate::expr::{Clause, ClassMember, Expr, ExprKind, FunctionDef, LiteralValue, LogicalOp, Params, UnaryOp};

/// Renders an expression tree in parenthesised prefix form, e.g.
/// `1 + 2 * 3` → `(+ 1 (* 2 3))`.  Used by the `parse` command and by the
/// parser tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        let printed = Self::print_kind(&expr.kind);

        if expr.annotations.is_empty() {
            return printed;
        }

        let annotations: Vec<String> = expr.annotations.iter().map(|a| format!("@{}", a)).collect();
        format!("({} {})", annotations.join(" "), printed)
    }

    fn print_kind(kind: &ExprKind) -> String {
        match kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Null => "null".into(),

                LiteralValue::Str(s) => format!("{:?}", s),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 && n.abs() < 1e15 {
                        // 3.0 → 3
                        let mut buf = itoa::Buffer::new();
                        buf.format(*n as i64).to_string()
                    } else {
                        n.to_string()
                    }
                }
            },

            ExprKind::Name(name) => name.clone(),

            ExprKind::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── collections ─────────────────────────────────────────────
            ExprKind::Tuple(items) => Self::form("tuple", items.iter()),

            ExprKind::List(items) => Self::form("list", items.iter()),

            ExprKind::Map(entries) => {
                let mut s = String::from("(map");
                for (key, value) in entries {
                    s.push_str(&format!(" ({} {})", Self::print(key), Self::print(value)));
                }
                s.push(')');
                s
            }

            ExprKind::Pair(left, right) => {
                format!("(: {} {})", Self::print(left), Self::print(right))
            }

            // ── operators ───────────────────────────────────────────────
            ExprKind::Unary { op, right } => {
                let symbol = match op {
                    UnaryOp::Negate => "-",
                    UnaryOp::Not => "!",
                };
                format!("({} {})", symbol, Self::print(right))
            }

            ExprKind::Binary { left, op, right } => format!(
                "({} {} {})",
                op.symbol(),
                Self::print(left),
                Self::print(right)
            ),

            ExprKind::Logical { left, op, right } => {
                let symbol = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                format!("({} {} {})", symbol, Self::print(left), Self::print(right))
            }

            // ── assignment ──────────────────────────────────────────────
            ExprKind::Assign {
                name,
                value,
                declare,
            } => {
                let op = if *declare { "var" } else { "=" };
                format!("({} {} {})", op, name, Self::print(value))
            }

            ExprKind::Destructure { pattern, value } => {
                format!("(= {} {})", Self::print(pattern), Self::print(value))
            }

            ExprKind::Index { target, index } => {
                format!("(index {} {})", Self::print(target), Self::print(index))
            }

            ExprKind::IndexSet {
                target,
                index,
                value,
            } => format!(
                "(index= {} {} {})",
                Self::print(target),
                Self::print(index),
                Self::print(value)
            ),

            ExprKind::Member { object, name, safe } => {
                let op = if *safe { "?." } else { "." };
                format!("({} {} {})", op, Self::print(object), name)
            }

            ExprKind::MemberSet {
                object,
                name,
                value,
            } => format!("(.= {} {} {})", Self::print(object), name, Self::print(value)),

            ExprKind::Call { callee, arguments } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            ExprKind::Spread(inner) => format!("(... {})", Self::print(inner)),

            // ── functions ───────────────────────────────────────────────
            ExprKind::FunctionDecl { function, .. } => {
                format!("(fn {} {})", function.name, Self::function(function))
            }

            ExprKind::Lambda(function) => format!("(lambda {})", Self::function(function)),

            // ── control flow ────────────────────────────────────────────
            ExprKind::Block(body) => Self::form("block", body.iter()),

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print(then_branch),
                    Self::print(else_branch)
                ),
                None => format!("(if {} {})", Self::print(condition), Self::print(then_branch)),
            },

            ExprKind::While { condition, body } => {
                format!("(while {} {})", Self::print(condition), Self::print(body))
            }

            ExprKind::For {
                pattern,
                iterable,
                body,
            } => format!(
                "(for {} {} {})",
                Self::print(pattern),
                Self::print(iterable),
                Self::print(body)
            ),

            ExprKind::Match { scrutinee, clauses } => {
                format!("(match {}{})", Self::print(scrutinee), Self::clauses(clauses))
            }

            ExprKind::Try { body, clauses } => {
                format!("(try {}{})", Self::print(body), Self::clauses(clauses))
            }

            ExprKind::Throw(value) => format!("(throw {})", Self::print(value)),

            ExprKind::Return(value) => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            ExprKind::Class {
                name,
                superclass,
                members,
            } => {
                let mut s = format!("(class {}", name);
                if let Some(superclass) = superclass {
                    s.push_str(&format!(" : {}", superclass));
                }
                for member in members {
                    s.push(' ');
                    match member {
                        ClassMember::Function(function) => {
                            s.push_str(&format!("(fn {} {})", function.name, Self::function(function)))
                        }
                        ClassMember::Field { name, default } => match default {
                            Some(default) => s.push_str(&format!("(field {} {})", name, Self::print(default))),
                            None => s.push_str(&format!("(field {})", name)),
                        },
                    }
                }
                s.push(')');
                s
            }

            ExprKind::Import(path) => format!("(import {})", path.join(".")),
        }
    }

    fn form<'a>(head: &str, items: impl Iterator<Item = &'a Expr>) -> String {
        let mut s = format!("({}", head);
        for item in items {
            s.push(' ');
            s.push_str(&Self::print(item));
        }
        s.push(')');
        s
    }

    fn params(params: &Params) -> String {
        let mut names: Vec<String> = params.names.clone();
        if let Some(rest) = &params.rest {
            names.push(format!("{}...", rest));
        }
        format!("({})", names.join(" "))
    }

    fn function(function: &FunctionDef) -> String {
        format!("{} {}", Self::params(&function.params), Self::print(&function.body))
    }

    fn clauses(clauses: &[Clause]) -> String {
        clauses
            .iter()
            .map(|clause| format!(" ({} -> {})", Self::print(&clause.pattern), Self::print(&clause.body)))
            .collect()
    }
}
