use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::native::NativeFunction;
use crate::object::{ClassObj, FunctionObj, Obj};

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type MapRef = Rc<RefCell<IndexMap<MapKey, Value>>>;

/// A runtime value.  Collections and objects are shared handles, so
/// cloning a `Value` never deep‑copies.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Tuple(Rc<[Value]>),
    List(ListRef),
    Map(MapRef),
    Object(Rc<Obj>),
    Class(Rc<ClassObj>),
    Function(Rc<FunctionObj>),
    Native(NativeRef),
}

/// A native function, optionally bound to the receiver it was read from.
#[derive(Debug, Clone)]
pub struct NativeRef {
    pub function: Rc<NativeFunction>,
    pub receiver: Option<Box<Value>>,
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(items.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: IndexMap<MapKey, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn native(function: Rc<NativeFunction>) -> Self {
        Value::Native(NativeRef {
            function,
            receiver: None,
        })
    }

    /// Name of the built‑in kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::Str(_) => "String",
            Value::Tuple(_) => "Tuple",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Object(_) => "Object",
            Value::Class(_) => "Class",
            Value::Function(_) | Value::Native(_) => "Function",
        }
    }

    /// `null` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integral numbers only, for indices and counts.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Identity for reference kinds.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(&a.function, &b.function),
            _ => false,
        }
    }

    /// Structural equality over possibly cyclic data.  `pending` holds the
    /// container pairs being compared further up; meeting one again adds
    /// nothing new, so it counts as equal.
    fn equals(&self, other: &Value, pending: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, pending))
            }
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                self.compare_once(other, pending, |pending| {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, pending))
                })
            }
            (Value::Map(a), Value::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                self.compare_once(other, pending, |pending| {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.len() == b.len()
                        && a.iter()
                            .all(|(k, v)| b.get(k).is_some_and(|w| v.equals(w, pending)))
                })
            }
            (Value::Native(a), Value::Native(b)) => {
                Rc::ptr_eq(&a.function, &b.function)
                    && match (&a.receiver, &b.receiver) {
                        (Some(x), Some(y)) => x.same_ref(y) || x.equals(y, pending),
                        (None, None) => true,
                        _ => false,
                    }
            }
            _ => self.same_ref(other),
        }
    }

    fn compare_once(
        &self,
        other: &Value,
        pending: &mut Vec<(usize, usize)>,
        compare: impl FnOnce(&mut Vec<(usize, usize)>) -> bool,
    ) -> bool {
        let pair = (MapKey::address(self), MapKey::address(other));
        if pending.contains(&pair) {
            return true;
        }

        pending.push(pair);
        let equal = compare(pending);
        pending.pop();
        equal
    }

    /// Display form.  Nested strings are quoted, and a container met again
    /// while it is still being written prints as `[...]`.
    fn write_to(&self, f: &mut fmt::Formatter<'_>, nested: bool, seen: &mut Vec<usize>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write_number(f, *n),

            Value::Str(s) if nested => write!(f, "{:?}", s),

            Value::Str(s) => write!(f, "{}", s),

            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_to(f, true, seen)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }

            Value::List(items) => self.write_once(f, seen, |f, seen| {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_to(f, true, seen)?;
                }
                write!(f, "]")
            }),

            Value::Map(entries) => self.write_once(f, seen, |f, seen| {
                let entries = entries.borrow();
                if entries.is_empty() {
                    return write!(f, "[:]");
                }
                write!(f, "[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    key.0.write_to(f, true, seen)?;
                    write!(f, ": ")?;
                    value.write_to(f, true, seen)?;
                }
                write!(f, "]")
            }),

            Value::Object(obj) => write!(f, "<{} instance>", obj.class().name),

            Value::Class(class) => write!(f, "<class {}>", class.name),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Native(native) => write!(f, "<native fn {}>", native.function.name),
        }
    }

    fn write_once(
        &self,
        f: &mut fmt::Formatter<'_>,
        seen: &mut Vec<usize>,
        write: impl FnOnce(&mut fmt::Formatter<'_>, &mut Vec<usize>) -> fmt::Result,
    ) -> fmt::Result {
        let address = MapKey::address(self);
        if seen.contains(&address) {
            return write!(f, "[...]");
        }

        seen.push(address);
        let result = write(f, seen);
        seen.pop();
        result
    }
}

/// Language equality: structural for data, identity for objects,
/// classes and functions.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut Vec::new())
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        f.write_str(buf.format(n as i64))
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f, false, &mut Vec::new())
    }
}

/// Map key wrapper.  Data kinds hash by content, reference kinds by
/// identity, so mutating a list never moves it inside a map.
#[derive(Debug, Clone)]
pub struct MapKey(pub Value);

impl MapKey {
    fn canonical_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else if n.is_nan() {
            f64::NAN.to_bits()
        } else {
            n.to_bits()
        }
    }

    fn address(value: &Value) -> usize {
        match value {
            Value::List(rc) => Rc::as_ptr(rc) as *const u8 as usize,
            Value::Map(rc) => Rc::as_ptr(rc) as *const u8 as usize,
            Value::Object(rc) => Rc::as_ptr(rc) as *const u8 as usize,
            Value::Class(rc) => Rc::as_ptr(rc) as *const u8 as usize,
            Value::Function(rc) => Rc::as_ptr(rc) as *const u8 as usize,
            Value::Native(native) => Rc::as_ptr(&native.function) as *const u8 as usize,
            _ => 0,
        }
    }

    fn key_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => {
                Self::canonical_bits(*x) == Self::canonical_bits(*y)
            }
            (Value::Str(x), Value::Str(y)) => x == y,
            (Value::Tuple(x), Value::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| Self::key_eq(p, q))
            }
            _ => a.same_ref(b),
        }
    }

    fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
        std::mem::discriminant(value).hash(state);
        match value {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => Self::canonical_bits(*n).hash(state),
            Value::Str(s) => s.hash(state),
            Value::Tuple(items) => {
                items.len().hash(state);
                for item in items.iter() {
                    Self::hash_value(item, state);
                }
            }
            other => Self::address(other).hash(state),
        }
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        MapKey::key_eq(&self.0, &other.0)
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        MapKey::hash_value(&self.0, state);
    }
}

impl From<Value> for MapKey {
    fn from(value: Value) -> Self {
        MapKey(value)
    }
}
