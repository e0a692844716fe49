//! Built‑in classes and global functions.
//!
//! [`Builtins::new`] is the single initialisation step that builds every
//! native class singleton; [`Builtins::install`] binds them, together with
//! the global functions, in the global frame.  Values that are not
//! instances (strings, lists, …) answer member lookups through the class
//! returned by [`Builtins::class_of`].

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

use crate::environment::Environment;
use crate::error::ErrorKind;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::native::{expect_number, expect_str, type_error, Arity, NativeFunction};
use crate::object::{ClassBuilder, ClassObj};
use crate::value::{MapKey, Value};

#[derive(Debug)]
pub struct Builtins {
    pub string: Rc<ClassObj>,
    pub number: Rc<ClassObj>,
    pub boolean: Rc<ClassObj>,
    pub null: Rc<ClassObj>,
    pub list: Rc<ClassObj>,
    pub map: Rc<ClassObj>,
    pub tuple: Rc<ClassObj>,
    pub function: Rc<ClassObj>,
    pub class: Rc<ClassObj>,
    pub exception: Rc<ClassObj>,
    errors: HashMap<ErrorKind, Rc<ClassObj>>,
    globals: Vec<Rc<NativeFunction>>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    pub fn new() -> Self {
        info!("Registering built-in classes");

        let exception = exception_class();
        let errors = ErrorKind::ALL
            .iter()
            .map(|kind| {
                let class = ClassBuilder::new(kind.class_name())
                    .superclass(Some(Rc::clone(&exception)))
                    .build();
                (*kind, class)
            })
            .collect();

        Self {
            string: string_class(),
            number: number_class(),
            boolean: ClassBuilder::new("Bool").synthetic().build(),
            null: ClassBuilder::new("Null").synthetic().build(),
            list: list_class(),
            map: map_class(),
            tuple: tuple_class(),
            function: function_class(),
            class: class_class(),
            exception,
            errors,
            globals: global_functions(),
        }
    }

    /// Bind every class and global function in the global frame.
    pub fn install(&self, env: &mut Environment) {
        let classes = [
            &self.string,
            &self.number,
            &self.boolean,
            &self.null,
            &self.list,
            &self.map,
            &self.tuple,
            &self.function,
            &self.class,
            &self.exception,
        ];

        for class in classes.into_iter().chain(self.errors.values()) {
            env.define_global(&class.name, Value::Class(Rc::clone(class)));
        }

        for function in &self.globals {
            env.define_global(&function.name, Value::native(Rc::clone(function)));
        }

        debug!(
            "Installed {} classes and {} global functions",
            classes.len() + self.errors.len(),
            self.globals.len()
        );
    }

    /// The class a value answers member lookups through.
    pub fn class_of(&self, value: &Value) -> Rc<ClassObj> {
        let class = match value {
            Value::Null => &self.null,
            Value::Bool(_) => &self.boolean,
            Value::Number(_) => &self.number,
            Value::Str(_) => &self.string,
            Value::Tuple(_) => &self.tuple,
            Value::List(_) => &self.list,
            Value::Map(_) => &self.map,
            Value::Object(obj) => obj.class(),
            Value::Class(_) => &self.class,
            Value::Function(_) | Value::Native(_) => &self.function,
        };
        Rc::clone(class)
    }

    /// Exception class raised for a runtime failure of `kind`.
    pub fn error_class(&self, kind: ErrorKind) -> Rc<ClassObj> {
        self.errors
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Rc::clone(&self.exception))
    }

    pub fn is_instance(&self, value: &Value, class: &Rc<ClassObj>) -> bool {
        self.class_of(value).is_subclass_of(class)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Global functions
// ─────────────────────────────────────────────────────────────────────────────

fn global_functions() -> Vec<Rc<NativeFunction>> {
    let functions = vec![
        NativeFunction::new("print").overload(Arity::AtLeast(0), print),
        NativeFunction::new("str").overload(Arity::Exact(1), stringify),
        NativeFunction::new("type").overload(Arity::Exact(1), type_of),
        NativeFunction::new("eval").overload(Arity::Exact(1), eval),
        NativeFunction::new("clock").overload(Arity::Exact(0), clock),
        NativeFunction::new("range")
            .overload(Arity::Exact(1), range)
            .overload(Arity::Exact(2), range),
        NativeFunction::new("assert")
            .overload(Arity::Exact(1), assert)
            .overload(Arity::Exact(2), assert),
        NativeFunction::new("stacktrace").overload(Arity::Exact(0), stacktrace),
    ];

    functions.into_iter().map(Rc::new).collect()
}

fn print(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", line);
    Ok(Value::Null)
}

fn stringify(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    Ok(Value::str(args[0].to_string()))
}

fn type_of(interp: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    Ok(Value::Class(interp.builtins().class_of(&args[0])))
}

fn eval(interp: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let source = expect_str("eval", &args[0])?.to_string();
    interp.eval_in_place(&source, "<eval>")
}

fn clock(_: &mut Interpreter, _: &[Value]) -> IResult<Value> {
    let micros = chrono::Utc::now().timestamp_micros();
    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

fn range(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let bound = |value: &Value| {
        value
            .as_index()
            .ok_or_else(|| type_error("range", "an integral Number", value))
    };

    let (start, end) = match args {
        [end] => (0, bound(end)?),
        [start, end, ..] => (bound(start)?, bound(end)?),
        [] => (0, 0),
    };

    Ok(Value::list((start..end).map(|n| Value::Number(n as f64)).collect()))
}

fn assert(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    if args[0].is_truthy() {
        return Ok(Value::Null);
    }

    let message = match args.get(1) {
        Some(message) => message.to_string(),
        None => "assertion failed".to_string(),
    };
    Err(InterpretError::runtime(ErrorKind::InvalidOperation, message))
}

fn stacktrace(interp: &mut Interpreter, _: &[Value]) -> IResult<Value> {
    let entries = interp
        .stack_trace()
        .iter()
        .map(|entry| Value::str(entry.to_string()))
        .collect();
    Ok(Value::list(entries))
}

// ─────────────────────────────────────────────────────────────────────────────
// String / Number
// ─────────────────────────────────────────────────────────────────────────────

fn string_class() -> Rc<ClassObj> {
    ClassBuilder::new("String")
        .synthetic()
        .init(Arity::Exact(1), |_, args| Ok(Value::str(args[0].to_string())))
        .getter("size", |_, this| {
            let s = expect_str("size", this)?;
            Ok(Value::Number(s.chars().count() as f64))
        })
        .native("upper", Arity::Exact(0), |_, args| {
            Ok(Value::str(expect_str("upper", &args[0])?.to_uppercase()))
        })
        .native("lower", Arity::Exact(0), |_, args| {
            Ok(Value::str(expect_str("lower", &args[0])?.to_lowercase()))
        })
        .native("trim", Arity::Exact(0), |_, args| {
            Ok(Value::str(expect_str("trim", &args[0])?.trim()))
        })
        .native("split", Arity::Exact(1), string_split)
        .native("contains", Arity::Exact(1), |_, args| {
            let s = expect_str("contains", &args[0])?;
            let needle = expect_str("contains", &args[1])?;
            Ok(Value::Bool(s.contains(needle)))
        })
        .native("chars", Arity::Exact(0), |_, args| {
            let s = expect_str("chars", &args[0])?;
            Ok(Value::list(s.chars().map(|c| Value::str(c.to_string())).collect()))
        })
        .build()
}

fn string_split(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    let s = expect_str("split", &args[0])?;
    let separator = expect_str("split", &args[1])?;

    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::str(c.to_string())).collect()
    } else {
        s.split(separator).map(Value::str).collect()
    };

    Ok(Value::list(parts))
}

fn number_class() -> Rc<ClassObj> {
    ClassBuilder::new("Number")
        .synthetic()
        .init(Arity::Exact(1), number_init)
        .native("floor", Arity::Exact(0), |_, args| {
            Ok(Value::Number(expect_number("floor", &args[0])?.floor()))
        })
        .native("ceil", Arity::Exact(0), |_, args| {
            Ok(Value::Number(expect_number("ceil", &args[0])?.ceil()))
        })
        .native("round", Arity::Exact(0), |_, args| {
            Ok(Value::Number(expect_number("round", &args[0])?.round()))
        })
        .native("abs", Arity::Exact(0), |_, args| {
            Ok(Value::Number(expect_number("abs", &args[0])?.abs()))
        })
        .build()
}

fn number_init(_: &mut Interpreter, args: &[Value]) -> IResult<Value> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Number).map_err(|_| {
            InterpretError::runtime(
                ErrorKind::TypeMismatch,
                format!("can not convert \"{}\" to a Number", s),
            )
        }),
        other => Err(type_error("Number", "a Number or String", other)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Collections
// ─────────────────────────────────────────────────────────────────────────────

fn items_of(function: &str, value: &Value) -> IResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.borrow().clone()),
        other => Err(type_error(function, "a List", other)),
    }
}

fn list_class() -> Rc<ClassObj> {
    ClassBuilder::new("List")
        .synthetic()
        .init(Arity::AtLeast(0), |_, args| Ok(Value::list(args.to_vec())))
        .getter("size", |_, this| Ok(Value::Number(items_of("size", this)?.len() as f64)))
        .native("push", Arity::Exact(1), |_, args| match &args[0] {
            Value::List(items) => {
                items.borrow_mut().push(args[1].clone());
                Ok(args[0].clone())
            }
            other => Err(type_error("push", "a List", other)),
        })
        .native("pop", Arity::Exact(0), |_, args| match &args[0] {
            Value::List(items) => items.borrow_mut().pop().ok_or_else(|| {
                InterpretError::runtime(ErrorKind::OutOfBounds, "pop from an empty list")
            }),
            other => Err(type_error("pop", "a List", other)),
        })
        .native("contains", Arity::Exact(1), |_, args| {
            Ok(Value::Bool(items_of("contains", &args[0])?.contains(&args[1])))
        })
        .native("each", Arity::Exact(1), |interp, args| {
            for item in items_of("each", &args[0])? {
                interp.call_value(&args[1], vec![item])?;
            }
            Ok(Value::Null)
        })
        .native("map", Arity::Exact(1), |interp, args| {
            let mut mapped = Vec::new();
            for item in items_of("map", &args[0])? {
                mapped.push(interp.call_value(&args[1], vec![item])?);
            }
            Ok(Value::list(mapped))
        })
        .native("filter", Arity::Exact(1), |interp, args| {
            let mut kept = Vec::new();
            for item in items_of("filter", &args[0])? {
                if interp.call_value(&args[1], vec![item.clone()])?.is_truthy() {
                    kept.push(item);
                }
            }
            Ok(Value::list(kept))
        })
        .native("fold", Arity::Exact(2), |interp, args| {
            let mut acc = args[1].clone();
            for item in items_of("fold", &args[0])? {
                acc = interp.call_value(&args[2], vec![acc, item])?;
            }
            Ok(acc)
        })
        .native("join", Arity::Exact(0), |_, args| list_join(&args[0], ""))
        .native("join", Arity::Exact(1), |_, args| {
            list_join(&args[0], expect_str("join", &args[1])?)
        })
        .native("reverse", Arity::Exact(0), |_, args| {
            let mut items = items_of("reverse", &args[0])?;
            items.reverse();
            Ok(Value::list(items))
        })
        .build()
}

fn list_join(list: &Value, separator: &str) -> IResult<Value> {
    let joined = items_of("join", list)?
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(separator);
    Ok(Value::str(joined))
}

fn map_class() -> Rc<ClassObj> {
    ClassBuilder::new("Map")
        .synthetic()
        .init(Arity::Exact(0), |_, _| Ok(Value::map(IndexMap::new())))
        .getter("size", |_, this| match this {
            Value::Map(entries) => Ok(Value::Number(entries.borrow().len() as f64)),
            other => Err(type_error("size", "a Map", other)),
        })
        .native("keys", Arity::Exact(0), |_, args| {
            map_view(&args[0], "keys", |key, _| key.clone())
        })
        .native("values", Arity::Exact(0), |_, args| {
            map_view(&args[0], "values", |_, value| value.clone())
        })
        .native("has", Arity::Exact(1), |_, args| match &args[0] {
            Value::Map(entries) => Ok(Value::Bool(
                entries.borrow().contains_key(&MapKey(args[1].clone())),
            )),
            other => Err(type_error("has", "a Map", other)),
        })
        .native("get", Arity::Exact(1), |_, args| map_get(&args[0], &args[1], Value::Null))
        .native("get", Arity::Exact(2), |_, args| {
            map_get(&args[0], &args[1], args[2].clone())
        })
        .native("remove", Arity::Exact(1), |_, args| match &args[0] {
            Value::Map(entries) => Ok(entries
                .borrow_mut()
                .shift_remove(&MapKey(args[1].clone()))
                .unwrap_or(Value::Null)),
            other => Err(type_error("remove", "a Map", other)),
        })
        .build()
}

fn map_view(map: &Value, function: &str, pick: fn(&Value, &Value) -> Value) -> IResult<Value> {
    match map {
        Value::Map(entries) => Ok(Value::list(
            entries
                .borrow()
                .iter()
                .map(|(key, value)| pick(&key.0, value))
                .collect(),
        )),
        other => Err(type_error(function, "a Map", other)),
    }
}

fn map_get(map: &Value, key: &Value, default: Value) -> IResult<Value> {
    match map {
        Value::Map(entries) => Ok(entries
            .borrow()
            .get(&MapKey(key.clone()))
            .cloned()
            .unwrap_or(default)),
        other => Err(type_error("get", "a Map", other)),
    }
}

fn tuple_class() -> Rc<ClassObj> {
    ClassBuilder::new("Tuple")
        .synthetic()
        .init(Arity::AtLeast(0), |_, args| Ok(Value::tuple(args.to_vec())))
        .getter("size", |_, this| match this {
            Value::Tuple(items) => Ok(Value::Number(items.len() as f64)),
            other => Err(type_error("size", "a Tuple", other)),
        })
        .native("toList", Arity::Exact(0), |_, args| match &args[0] {
            Value::Tuple(items) => Ok(Value::list(items.to_vec())),
            other => Err(type_error("toList", "a Tuple", other)),
        })
        .build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions, classes, exceptions
// ─────────────────────────────────────────────────────────────────────────────

fn function_class() -> Rc<ClassObj> {
    ClassBuilder::new("Function")
        .synthetic()
        .getter("name", |_, this| match this {
            Value::Function(function) => Ok(Value::str(function.name())),
            Value::Native(native) => Ok(Value::str(native.function.name.as_str())),
            other => Err(type_error("name", "a Function", other)),
        })
        .getter("arity", |_, this| match this {
            Value::Function(function) => Ok(Value::Number(function.arity() as f64)),
            Value::Native(_) => Ok(Value::Null),
            other => Err(type_error("arity", "a Function", other)),
        })
        .build()
}

fn class_class() -> Rc<ClassObj> {
    ClassBuilder::new("Class")
        .synthetic()
        .getter("name", |_, this| match this {
            Value::Class(class) => Ok(Value::str(class.name.as_str())),
            other => Err(type_error("name", "a Class", other)),
        })
        .getter("superclass", |_, this| match this {
            Value::Class(class) => Ok(class
                .superclass()
                .map_or(Value::Null, |superclass| Value::Class(Rc::clone(superclass)))),
            other => Err(type_error("superclass", "a Class", other)),
        })
        .build()
}

fn exception_class() -> Rc<ClassObj> {
    ClassBuilder::new("Exception")
        .field("message", None)
        .native("init", Arity::Exact(0), |_, _| Ok(Value::Null))
        .native("init", Arity::Exact(1), |_, args| match &args[0] {
            Value::Object(obj) => {
                obj.set_slot("message", args[1].clone());
                Ok(Value::Null)
            }
            other => Err(type_error("Exception.init", "an instance", other)),
        })
        .native("toString", Arity::Exact(0), |_, args| match &args[0] {
            Value::Object(obj) => Ok(match obj.slot("message") {
                Some(Value::Null) | None => Value::str(obj.class().name.as_str()),
                Some(message) => Value::str(message.to_string()),
            }),
            other => Err(type_error("toString", "an instance", other)),
        })
        .build()
}
