use std::rc::Rc;

use crate::token::Token;

/// A literal constant that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String (or char) literal without surrounding quotes.
    Str(String),

    True,

    False,

    Null,
}

impl LiteralValue {
    /// Identity used to reject duplicate literal patterns in one `match`.
    pub fn same_literal(&self, other: &LiteralValue) -> bool {
        match (self, other) {
            (LiteralValue::Number(a), LiteralValue::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

/// One `pattern -> body` arm of a `match` or `catch`.
#[derive(Debug, Clone)]
pub struct Clause {
    pub pattern: Expr,
    pub body: Expr,
}

/// Parameter list shared by declarations and lambdas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub names: Vec<String>,

    /// `rest...` collects surplus arguments into a list.
    pub rest: Option<String>,
}

/// A member of a class body.
#[derive(Debug, Clone)]
pub enum ClassMember {
    Function(Rc<FunctionDef>),
    Field {
        name: String,
        default: Option<Rc<Expr>>,
    },
}

/// Function template shared by every `FunctionObj` created from it.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Params,
    pub body: Rc<Expr>,
}

/// Binary operators (arithmetic, comparison, equality, concatenation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Power,
    Concat,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Power => "^",
            BinaryOp::Concat => "~",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// **Abstract‑Syntax‑Tree node.**  Every construct of the language is an
/// expression; `token` is the token that introduced the node and is used
/// for diagnostics.
#[derive(Debug, Clone)]
pub struct Expr {
    pub token: Token,

    /// Annotations attached with `@name`, e.g. `var`.
    pub annotations: Vec<String>,

    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A literal constant: number, string, `true`, `false`, or `null`.
    Literal(LiteralValue),

    /// Variable access, or a binding site when used as a pattern.
    Name(String),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// `(a, b)`, `(a,)`, `()`
    Tuple(Vec<Expr>),

    /// `[a, b]`
    List(Vec<Expr>),

    /// `[k: v, …]` / `[:]`
    Map(Vec<(Expr, Expr)>),

    /// `key: value`: a record pair, or a typed pattern `name: Class`.
    Pair(Box<Expr>, Box<Expr>),

    Unary {
        op: UnaryOp,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },

    /// `name = value`; `declare` is set by the `@var` annotation.
    Assign {
        name: String,
        value: Box<Expr>,
        declare: bool,
    },

    /// `(a, b) = value`
    Destructure {
        pattern: Box<Expr>,
        value: Box<Expr>,
    },

    /// `target[index]`
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },

    /// `target[index] = value`
    IndexSet {
        target: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },

    /// `object.name`, or `object?.name` when `safe`.
    Member {
        object: Box<Expr>,
        name: String,
        safe: bool,
    },

    /// `object.name = value`
    MemberSet {
        object: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// `expr...` inside an argument list.
    Spread(Box<Expr>),

    /// `name(params) = body`
    FunctionDecl {
        function: Rc<FunctionDef>,
        declare: bool,
    },

    /// `(params) -> body`
    Lambda(Rc<FunctionDef>),

    Block(Vec<Expr>),

    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },

    While {
        condition: Box<Expr>,
        body: Box<Expr>,
    },

    For {
        pattern: Box<Expr>,
        iterable: Box<Expr>,
        body: Box<Expr>,
    },

    /// `value match { clauses }`
    Match {
        scrutinee: Box<Expr>,
        clauses: Vec<Clause>,
    },

    /// `try body catch { clauses }`
    Try {
        body: Box<Expr>,
        clauses: Vec<Clause>,
    },

    Throw(Box<Expr>),

    Return(Option<Box<Expr>>),

    Class {
        name: String,
        superclass: Option<String>,
        members: Vec<ClassMember>,
    },

    /// `import a.b.c`, stored as its path segments.
    Import(Vec<String>),
}

impl Expr {
    pub fn new(token: Token, kind: ExprKind) -> Self {
        Self {
            token,
            annotations: Vec::new(),
            kind,
        }
    }

    pub fn line(&self) -> usize {
        self.token.line
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    /// The bare name, if this node is a `Name`.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }
}
