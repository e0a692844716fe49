//! Tree‑walking evaluator.
//!
//! [`Interpreter`] owns the [`Environment`] (the single live frame stack)
//! and evaluates [`Expr`] trees against it.  Every node is an expression;
//! statements are just expressions whose value is discarded.
//!
//! ### Control flow
//!
//! `return`, `throw` and host failures all travel as the `Err` side of
//! [`IResult`]:
//!
//! * [`InterpretError::Runtime`]: a failure detected by the evaluator
//!   (undefined name, bad operand, …).  It is turned into an instance of
//!   the built‑in exception class for its [`ErrorKind`] the first time it
//!   meets a `catch` or the top‑level reporter.
//! * [`InterpretError::Thrown`]: a language value raised with `throw`, or
//!   re‑raised by a `catch` none of whose clauses matched.  Identity is
//!   preserved all the way up.
//! * [`InterpretError::Return`]: unwinds to the nearest function call.
//! * [`InterpretError::Fatal`]: parse errors from `eval` / `import`; never
//!   catchable.
//!
//! Frames are pushed through [`Interpreter::scoped`], which pops on every
//! exit path and records the stack trace of an error at the innermost frame
//! it leaves.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, error, info};
use thiserror::Error;

use crate::builtins::Builtins;
use crate::environment::Environment;
use crate::error::{ErrorKind, Result, TernError, TraceEntry};
use crate::expr::{BinaryOp, ClassMember, Clause, Expr, ExprKind, LiteralValue, LogicalOp, UnaryOp};
use crate::module;
use crate::object::{ClassBuilder, FunctionObj};
use crate::parser::parse_source;
use crate::pattern::BindMode;
use crate::value::{MapKey, Value};

#[derive(Error, Debug)]
pub enum InterpretError {
    #[error("{kind}: {message}")]
    Runtime {
        kind: ErrorKind,
        message: String,
        trace: Vec<TraceEntry>,
    },

    #[error("Thrown {value}")]
    Thrown { value: Value, trace: Vec<TraceEntry> },

    #[error("Return signal with value: {0}")]
    Return(Value),

    #[error(transparent)]
    Fatal(#[from] TernError),
}

impl InterpretError {
    /// Helper constructor for evaluator failures.
    pub fn runtime<S: Into<String>>(kind: ErrorKind, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating {} error: {}", kind, message);

        InterpretError::Runtime {
            kind,
            message,
            trace: Vec::new(),
        }
    }

    /// The kind of a not yet materialised runtime failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            InterpretError::Runtime { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    fn capture_trace(&mut self, capture: impl FnOnce() -> Vec<TraceEntry>) {
        match self {
            InterpretError::Runtime { trace, .. } | InterpretError::Thrown { trace, .. }
                if trace.is_empty() =>
            {
                *trace = capture();
            }
            _ => {}
        }
    }
}

/// Convenient alias for interpreter results.
pub type IResult<T> = std::result::Result<T, InterpretError>;

/// Frames allowed on the live stack before a push fails with
/// InvalidOperation, the global frame included.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

pub struct Interpreter {
    pub(crate) env: Environment,
    module_root: Option<PathBuf>,
    imported: HashSet<String>,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// A fresh session with every built‑in bound in the global frame.
    pub fn new() -> Self {
        info!("Initializing Interpreter");

        let builtins = Rc::new(Builtins::new());
        let mut env = Environment::new(Rc::clone(&builtins));
        builtins.install(&mut env);

        Self {
            env,
            module_root: None,
            imported: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Resolve file imports relative to `root`.
    pub fn with_module_root(root: impl Into<PathBuf>) -> Self {
        let mut interpreter = Self::new();
        interpreter.module_root = Some(root.into());
        interpreter
    }

    /// Bound the live stack.  Every frame costs native stack, so hosts
    /// running on small threads should lower this.
    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth.max(1);
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn builtins(&self) -> Rc<Builtins> {
        Rc::clone(self.env.builtins())
    }

    /// Bind a host value in the global frame.
    pub fn define_global(&mut self, name: &str, value: Value) {
        debug!("Defining global '{}'", name);
        self.env.define_global(name, value);
    }

    /// Look a name up from the innermost frame outwards.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.env.get(name).ok()
    }

    /// Live frame count, the global frame included.
    pub fn depth(&self) -> usize {
        self.env.depth()
    }

    /// The trace of the exception being handled, or the live stack when no
    /// handler is running.  Innermost first.
    pub fn stack_trace(&self) -> Vec<TraceEntry> {
        match self.env.snapshot() {
            Some(snapshot) => snapshot.to_vec(),
            None => self.env.trace(),
        }
    }

    // ───────────────────────── units of work ─────────────────────────

    /// Parse and evaluate one unit in the global frame.
    ///
    /// Parse errors abort before anything runs.  An uncaught exception is
    /// reported on stderr and returned as [`TernError::Uncaught`]; bindings
    /// made before it stay, and the session remains usable.
    pub fn eval_source(&mut self, source: &str, name: &str) -> Result<Value> {
        info!("Evaluating unit '{}'", name);

        let program = parse_source(source, name)?;

        let depth = self.env.depth();
        let previous = self.env.set_file(Rc::from(name));

        let outcome = self.run_program(&program);
        let result = match outcome {
            Ok(value) => Ok(value),
            Err(err) => Err(self.report(err)),
        };

        self.env.truncate(depth);
        self.env.set_file(previous);

        info!("Finished unit '{}'", name);

        result
    }

    /// Read and evaluate a script.  Imports resolve next to it unless a
    /// module root was configured.
    pub fn run_file(&mut self, path: &Path) -> Result<Value> {
        let source = fs::read_to_string(path)?;

        if self.module_root.is_none() {
            if let Some(parent) = path.parent() {
                self.module_root = Some(parent.to_path_buf());
            }
        }

        self.eval_source(&source, &path.display().to_string())
    }

    /// Parse and evaluate text on the live stack, in the current frame.
    pub fn eval_in_place(&mut self, source: &str, name: &str) -> IResult<Value> {
        let program = parse_source(source, name)?;
        self.run_program(&program)
    }

    fn run_program(&mut self, program: &[Expr]) -> IResult<Value> {
        let mut last = Value::Null;

        for expr in program {
            last = match self.evaluate(expr) {
                Ok(value) => value,
                Err(InterpretError::Return(value)) => return Ok(value),
                Err(err) => return Err(err),
            };
        }

        Ok(last)
    }

    /// Print the diagnostic for an exception that reached the top level.
    fn report(&mut self, err: InterpretError) -> TernError {
        let (exception, trace) = match self.materialize(err) {
            Ok(pair) => pair,
            Err(InterpretError::Fatal(fatal)) => return fatal,
            Err(other) => {
                return TernError::Uncaught {
                    class: "Error".to_string(),
                    message: other.to_string(),
                    trace: self.env.trace(),
                }
            }
        };

        self.env.push_snapshot(trace.clone());
        let (class, message) = self.describe_exception(&exception);
        self.env.pop_snapshot();

        error!("Uncaught {}: {}", class, message);
        eprintln!("Uncaught {}: {}", class, message);
        for entry in &trace {
            eprintln!("    at {}", entry);
        }

        TernError::Uncaught {
            class,
            message,
            trace,
        }
    }

    fn describe_exception(&mut self, exception: &Value) -> (String, String) {
        match exception {
            Value::Object(obj) => {
                let class = obj.class().name.clone();
                let message = match self.get_member(exception, "message") {
                    Ok(Value::Null) | Err(_) => String::new(),
                    Ok(message) => message.to_string(),
                };
                (class, message)
            }
            other => (self.env.builtins().class_of(other).name.clone(), other.to_string()),
        }
    }

    /// Turn an unwinding error into the exception value a handler sees.
    /// `Return` and `Fatal` come back out untouched.
    fn materialize(&mut self, err: InterpretError) -> IResult<(Value, Vec<TraceEntry>)> {
        let (exception, mut trace) = match err {
            InterpretError::Thrown { value, trace } => (value, trace),
            InterpretError::Runtime {
                kind,
                message,
                trace,
            } => {
                let class = self.env.builtins().error_class(kind);
                let exception = self.instantiate(&class, vec![Value::str(message)])?;
                (exception, trace)
            }
            other => return Err(other),
        };

        if trace.is_empty() {
            trace = self.env.trace();
        }

        Ok((exception, trace))
    }

    /// Push a frame, run `body`, pop the frame whatever happened.  Fails
    /// without pushing once the stack holds `max_depth` frames.
    pub(crate) fn scoped<T>(
        &mut self,
        name: &str,
        file: Rc<str>,
        line: usize,
        body: impl FnOnce(&mut Self) -> IResult<T>,
    ) -> IResult<T> {
        if self.env.depth() >= self.max_depth {
            return Err(InterpretError::runtime(
                ErrorKind::InvalidOperation,
                format!("stack overflow: more than {} frames", self.max_depth),
            ));
        }

        self.env.push(name, file, line);

        let mut result = body(self);
        if let Err(err) = &mut result {
            err.capture_trace(|| self.env.trace());
        }

        self.env.pop();
        result
    }

    // ───────────────────────── evaluation ─────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        self.env.mark(expr.line());

        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),

            ExprKind::Name(name) => self.env.get(name),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Tuple(items) => Ok(Value::tuple(self.evaluate_all(items)?)),

            ExprKind::List(items) => Ok(Value::list(self.evaluate_all(items)?)),

            ExprKind::Map(entries) => {
                let mut map: IndexMap<MapKey, Value> = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.evaluate(key)?;
                    let value = self.evaluate(value)?;
                    map.insert(MapKey(key), value);
                }
                Ok(Value::map(map))
            }

            ExprKind::Pair(left, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(Value::tuple(vec![left, right]))
            }

            ExprKind::Unary { op, right } => {
                let right = self.evaluate(right)?;
                unary(*op, right)
            }

            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.env.mark(expr.line());
                binary(*op, left, right)
            }

            ExprKind::Logical { left, op, right } => {
                let left = self.evaluate(left)?;
                match op {
                    LogicalOp::Or if left.is_truthy() => Ok(left),
                    LogicalOp::And if !left.is_truthy() => Ok(left),
                    _ => self.evaluate(right),
                }
            }

            ExprKind::Assign {
                name,
                value,
                declare,
            } => {
                let value = self.evaluate(value)?;
                self.assign(name, value.clone(), *declare)?;
                Ok(value)
            }

            ExprKind::Destructure { pattern, value } => {
                let value = self.evaluate(value)?;
                self.destructure(pattern, &value)?;
                Ok(value)
            }

            ExprKind::Index { target, index } => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;
                self.env.mark(expr.line());
                index_get(&target, &index)
            }

            ExprKind::IndexSet {
                target,
                index,
                value,
            } => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;
                self.env.mark(expr.line());
                index_set(&target, &index, value.clone())?;
                Ok(value)
            }

            ExprKind::Member { object, name, safe } => {
                let object = self.evaluate(object)?;
                if *safe && object.is_null() {
                    return Ok(Value::Null);
                }
                self.env.mark(expr.line());
                self.get_member(&object, name)
            }

            ExprKind::MemberSet {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;
                let value = self.evaluate(value)?;
                self.env.mark(expr.line());
                self.set_member(&object, name, value.clone())?;
                Ok(value)
            }

            ExprKind::Call { callee, arguments } => {
                let callee = self.evaluate(callee)?;
                let args = self.arguments(arguments)?;
                self.env.mark(expr.line());
                self.call_value(&callee, args)
            }

            ExprKind::Spread(_) => Err(InterpretError::runtime(
                ErrorKind::InvalidOperation,
                "'...' is only allowed in an argument list",
            )),

            ExprKind::FunctionDecl { function, declare } => {
                debug!("Declaring function '{}'", function.name);
                let value = Value::Function(Rc::new(FunctionObj::new(Rc::clone(function))));
                self.assign(&function.name, value.clone(), *declare)?;
                Ok(value)
            }

            ExprKind::Lambda(function) => {
                Ok(Value::Function(Rc::new(FunctionObj::new(Rc::clone(function)))))
            }

            ExprKind::Block(body) => {
                let file = Rc::clone(&expr.token.source);
                self.scoped("<block>", file, expr.line(), |interp| interp.sequence(body))
            }

            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.evaluate(else_branch)
                } else {
                    Ok(Value::Null)
                }
            }

            ExprKind::While { condition, body } => {
                let mut last = Value::Null;
                while self.evaluate(condition)?.is_truthy() {
                    last = self.evaluate(body)?;
                }
                Ok(last)
            }

            ExprKind::For {
                pattern,
                iterable,
                body,
            } => self.for_loop(expr, pattern, iterable, body),

            ExprKind::Match { scrutinee, clauses } => {
                let value = self.evaluate(scrutinee)?;
                match self.run_clauses("<match>", clauses, &value)? {
                    Some(result) => Ok(result),
                    None => Err(InterpretError::runtime(
                        ErrorKind::NoMatchingClause,
                        format!("no clause matches {}", value),
                    )),
                }
            }

            ExprKind::Try { body, clauses } => self.try_catch(body, clauses),

            ExprKind::Throw(value) => {
                let value = self.evaluate(value)?;
                debug!("Throwing {}", value);
                Err(InterpretError::Thrown {
                    value,
                    trace: Vec::new(),
                })
            }

            ExprKind::Return(value) => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Null,
                };
                Err(InterpretError::Return(value))
            }

            ExprKind::Class {
                name,
                superclass,
                members,
            } => self.declare_class(name, superclass.as_deref(), members),

            ExprKind::Import(path) => self.import(path),
        }
    }

    fn evaluate_all(&mut self, items: &[Expr]) -> IResult<Vec<Value>> {
        items.iter().map(|item| self.evaluate(item)).collect()
    }

    fn sequence(&mut self, body: &[Expr]) -> IResult<Value> {
        let mut last = Value::Null;
        for expr in body {
            last = self.evaluate(expr)?;
        }
        Ok(last)
    }

    /// Plain assignment updates the nearest binding or creates one in the
    /// innermost frame; `@var` always defines.
    fn assign(&mut self, name: &str, value: Value, declare: bool) -> IResult<()> {
        if declare {
            self.env.define(name, value)
        } else {
            self.env.put(name, value);
            Ok(())
        }
    }

    /// Call arguments, with `xs...` spread in place.
    fn arguments(&mut self, arguments: &[Expr]) -> IResult<Vec<Value>> {
        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            match &argument.kind {
                ExprKind::Spread(inner) => match self.evaluate(inner)? {
                    Value::List(items) => args.extend(items.borrow().iter().cloned()),
                    Value::Tuple(items) => args.extend(items.iter().cloned()),
                    other => {
                        return Err(InterpretError::runtime(
                            ErrorKind::TypeMismatch,
                            format!("can only spread a List or Tuple, not {}", other.type_name()),
                        ))
                    }
                },
                _ => args.push(self.evaluate(argument)?),
            }
        }

        Ok(args)
    }

    /// `(a, b) = value`.  The pattern is tried in a scratch frame first so
    /// a failed match binds nothing.
    fn destructure(&mut self, pattern: &Expr, value: &Value) -> IResult<()> {
        let file = Rc::clone(&pattern.token.source);
        let fits = self.scoped("<destructure>", file, pattern.line(), |interp| {
            interp.match_pattern(pattern, value, BindMode::Fresh)
        })?;

        if !fits {
            return Err(InterpretError::runtime(
                ErrorKind::NoMatchingClause,
                format!("pattern does not match {}", value),
            ));
        }

        let mode = if pattern.has_annotation("var") {
            BindMode::Declare
        } else {
            BindMode::Assign
        };
        self.match_pattern(pattern, value, mode)?;

        Ok(())
    }

    /// One frame per iteration; the pattern is bound fresh in it.
    fn for_loop(&mut self, expr: &Expr, pattern: &Expr, iterable: &Expr, body: &Expr) -> IResult<Value> {
        let iterable = self.evaluate(iterable)?;
        let items = iteration_items(&iterable)?;
        let mut last = Value::Null;

        for item in items {
            let file = Rc::clone(&expr.token.source);
            last = self.scoped("<for>", file, expr.line(), |interp| {
                if !interp.match_pattern(pattern, &item, BindMode::Fresh)? {
                    return Err(InterpretError::runtime(
                        ErrorKind::NoMatchingClause,
                        format!("loop pattern does not match {}", item),
                    ));
                }
                interp.evaluate(body)
            })?;
        }

        Ok(last)
    }

    /// Try `clauses` in order, each in its own frame.  `None` when no
    /// pattern matched.
    fn run_clauses(&mut self, frame: &str, clauses: &[Clause], value: &Value) -> IResult<Option<Value>> {
        for clause in clauses {
            let file = Rc::clone(&clause.pattern.token.source);
            let outcome = self.scoped(frame, file, clause.pattern.line(), |interp| {
                if interp.match_pattern(&clause.pattern, value, BindMode::Fresh)? {
                    interp.evaluate(&clause.body).map(Some)
                } else {
                    Ok(None)
                }
            })?;

            if outcome.is_some() {
                return Ok(outcome);
            }
        }

        Ok(None)
    }

    fn try_catch(&mut self, body: &Expr, clauses: &[Clause]) -> IResult<Value> {
        let err = match self.evaluate(body) {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let (exception, trace) = self.materialize(err)?;
        debug!("Handling exception {}", exception);

        self.env.push_snapshot(trace.clone());
        let handled = self.run_clauses("<catch>", clauses, &exception);
        self.env.pop_snapshot();

        match handled? {
            Some(value) => Ok(value),
            None => {
                debug!("No catch clause matched; re-raising {}", exception);
                Err(InterpretError::Thrown {
                    value: exception,
                    trace,
                })
            }
        }
    }

    fn declare_class(
        &mut self,
        name: &str,
        superclass: Option<&str>,
        members: &[ClassMember],
    ) -> IResult<Value> {
        info!("Declaring class '{}'", name);

        let superclass = match superclass {
            Some(superclass) => match self.env.get(superclass)? {
                Value::Class(class) if class.is_synthetic() => {
                    return Err(InterpretError::runtime(
                        ErrorKind::InvalidOperation,
                        format!("class {} can not extend native class {}", name, class.name),
                    ))
                }
                Value::Class(class) => Some(class),
                other => {
                    return Err(InterpretError::runtime(
                        ErrorKind::TypeMismatch,
                        format!("superclass of {} must be a class, not {}", name, other.type_name()),
                    ))
                }
            },
            None => None,
        };

        let mut builder = ClassBuilder::new(name).superclass(superclass);
        for member in members {
            builder = match member {
                ClassMember::Function(function) => builder.function(Rc::clone(function)),
                ClassMember::Field { name, default } => builder.field(name, default.clone()),
            };
        }

        let class = Value::Class(builder.build());
        self.env.put(name, class.clone());

        Ok(class)
    }

    /// `import a.b.c`: evaluated once per session, in the importing frame.
    fn import(&mut self, path: &[String]) -> IResult<Value> {
        let relative = module::relative_path(path);

        if self.imported.contains(&relative) {
            debug!("Module '{}' already imported", relative);
            return Ok(Value::Null);
        }

        let source = module::load(&relative, self.module_root.as_deref())?;
        self.imported.insert(relative.clone());

        info!("Importing module '{}'", relative);

        let previous = self.env.set_file(Rc::from(relative.as_str()));
        let mut result = self.eval_in_place(&source, &relative);
        if let Err(err) = &mut result {
            err.capture_trace(|| self.env.trace());
        }
        self.env.set_file(previous);

        result.map(|_| Value::Null)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::str(s.as_str()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Null => Value::Null,
    }
}

fn operand_error(op: &str, left: &Value, right: &Value) -> InterpretError {
    InterpretError::runtime(
        ErrorKind::TypeMismatch,
        format!(
            "unsupported operands for '{}': {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
    )
}

fn unary(op: UnaryOp, right: Value) -> IResult<Value> {
    match (op, &right) {
        (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOp::Negate, other) => Err(InterpretError::runtime(
            ErrorKind::TypeMismatch,
            format!("operand of '-' must be a Number, not {}", other.type_name()),
        )),
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> IResult<Value> {
    match op {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        BinaryOp::Concat => return Ok(Value::str(format!("{}{}", left, right))),
        _ => {}
    }

    match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (*a, *b);
            let value = match op {
                BinaryOp::Add => Value::Number(a + b),
                BinaryOp::Subtract => Value::Number(a - b),
                BinaryOp::Multiply => Value::Number(a * b),
                BinaryOp::Divide | BinaryOp::Remainder if b == 0.0 => {
                    return Err(InterpretError::runtime(
                        ErrorKind::InvalidOperation,
                        format!("'{}' by zero", op.symbol()),
                    ))
                }
                BinaryOp::Divide => Value::Number(a / b),
                BinaryOp::Remainder => Value::Number(a % b),
                BinaryOp::Power => Value::Number(a.powf(b)),
                BinaryOp::Less => Value::Bool(a < b),
                BinaryOp::LessEqual => Value::Bool(a <= b),
                BinaryOp::Greater => Value::Bool(a > b),
                BinaryOp::GreaterEqual => Value::Bool(a >= b),
                _ => return Err(operand_error(op.symbol(), &left, &right)),
            };
            Ok(value)
        }

        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => Ok(Value::str(format!("{}{}", a, b))),
            BinaryOp::Less => Ok(Value::Bool(a < b)),
            BinaryOp::LessEqual => Ok(Value::Bool(a <= b)),
            BinaryOp::Greater => Ok(Value::Bool(a > b)),
            BinaryOp::GreaterEqual => Ok(Value::Bool(a >= b)),
            _ => Err(operand_error(op.symbol(), &left, &right)),
        },

        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }

        _ => Err(operand_error(op.symbol(), &left, &right)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Indexing and iteration
// ─────────────────────────────────────────────────────────────────────────────

fn position(index: &Value, len: usize) -> IResult<usize> {
    if index.as_number().is_none() {
        return Err(InterpretError::runtime(
            ErrorKind::TypeMismatch,
            format!("index must be a Number, not {}", index.type_name()),
        ));
    }

    match index.as_index() {
        Some(i) if i >= 0 && (i as usize) < len => Ok(i as usize),
        _ => Err(InterpretError::runtime(
            ErrorKind::OutOfBounds,
            format!("index {} out of bounds for length {}", index, len),
        )),
    }
}

fn index_get(target: &Value, index: &Value) -> IResult<Value> {
    match target {
        Value::List(items) => {
            let items = items.borrow();
            Ok(items[position(index, items.len())?].clone())
        }
        Value::Tuple(items) => Ok(items[position(index, items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let c = chars[position(index, chars.len())?];
            Ok(Value::str(c.to_string()))
        }
        Value::Map(entries) => entries
            .borrow()
            .get(&MapKey(index.clone()))
            .cloned()
            .ok_or_else(|| {
                InterpretError::runtime(
                    ErrorKind::UndefinedReference,
                    format!("key {} not found", index),
                )
            }),
        other => Err(InterpretError::runtime(
            ErrorKind::TypeMismatch,
            format!("{} is not indexable", other.type_name()),
        )),
    }
}

fn index_set(target: &Value, index: &Value, value: Value) -> IResult<()> {
    match target {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let i = position(index, items.len())?;
            items[i] = value;
            Ok(())
        }
        Value::Map(entries) => {
            entries.borrow_mut().insert(MapKey(index.clone()), value);
            Ok(())
        }
        Value::Tuple(_) | Value::Str(_) => Err(InterpretError::runtime(
            ErrorKind::InvalidOperation,
            format!("{} is immutable", target.type_name()),
        )),
        other => Err(InterpretError::runtime(
            ErrorKind::TypeMismatch,
            format!("{} does not support index assignment", other.type_name()),
        )),
    }
}

/// Snapshot of what a `for` loop walks over.
pub(crate) fn iteration_items(iterable: &Value) -> IResult<Vec<Value>> {
    match iterable {
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Tuple(items) => Ok(items.to_vec()),
        Value::Map(entries) => Ok(entries
            .borrow()
            .iter()
            .map(|(key, value)| Value::tuple(vec![key.0.clone(), value.clone()]))
            .collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
        other => Err(InterpretError::runtime(
            ErrorKind::TypeMismatch,
            format!("can not iterate over {}", other.type_name()),
        )),
    }
}
