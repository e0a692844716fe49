//! Native bridging: the registration table through which host functions
//! reach the language.
//!
//! A [`NativeFunction`] is a name plus a list of `(arity, implementation)`
//! overloads; the call site picks the overload by argument count.  Every
//! implementation shares one calling convention: the evaluator handle and
//! the positional arguments in, a value or a typed error out.  Functions
//! read off a receiver (`"abc".upper`) get that receiver prepended as the
//! first argument.

use std::fmt;

use log::debug;

use crate::error::ErrorKind;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::value::Value;

/// Calling convention for every native implementation.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> IResult<Value>;

/// Accepted argument count of one overload (receiver excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "{}+", n),
        }
    }
}

pub struct NativeFunction {
    pub name: String,
    overloads: Vec<(Arity, NativeFn)>,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Register one more overload.
    pub fn overload(mut self, arity: Arity, function: NativeFn) -> Self {
        self.overloads.push((arity, function));
        self
    }

    /// Exact arities win over variadic ones.
    pub fn select(&self, argc: usize) -> Option<NativeFn> {
        self.overloads
            .iter()
            .find(|(arity, _)| *arity == Arity::Exact(argc))
            .or_else(|| self.overloads.iter().find(|(arity, _)| arity.accepts(argc)))
            .map(|(_, function)| *function)
    }

    /// Overload arities, for error messages.
    pub fn arities(&self) -> String {
        self.overloads
            .iter()
            .map(|(arity, _)| arity.to_string())
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Select and run an overload.  `receiver` is prepended when present.
    pub fn invoke(
        &self,
        interpreter: &mut Interpreter,
        receiver: Option<&Value>,
        mut args: Vec<Value>,
    ) -> IResult<Value> {
        let Some(function) = self.select(args.len()) else {
            return Err(InterpretError::runtime(
                ErrorKind::ArityMismatch,
                format!(
                    "native function '{}' expects {} arguments but got {}",
                    self.name,
                    self.arities(),
                    args.len()
                ),
            ));
        };

        debug!("Calling native function '{}' with {} args", self.name, args.len());

        if let Some(receiver) = receiver {
            args.insert(0, receiver.clone());
        }

        function(interpreter, &args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arities", &self.arities())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument helpers shared by the built‑in library
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn type_error(function: &str, expected: &str, got: &Value) -> InterpretError {
    InterpretError::runtime(
        ErrorKind::TypeMismatch,
        format!(
            "'{}' expects {} but got {}",
            function,
            expected,
            got.type_name()
        ),
    )
}

pub(crate) fn expect_str<'v>(function: &str, value: &'v Value) -> IResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| type_error(function, "a String", value))
}

pub(crate) fn expect_number(function: &str, value: &Value) -> IResult<f64> {
    value
        .as_number()
        .ok_or_else(|| type_error(function, "a Number", value))
}
