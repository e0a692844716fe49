//! Runtime object model: classes, instances, and functions, together with
//! late‑bound member dispatch and instantiation.
//!
//! Inheritance is by *delegation*: an instance of `B : A` owns a separate
//! super‑instance of `A`, and member lookups that `B` can not answer are
//! forwarded to it.  Built‑in classes and user classes expose the same
//! three lookups (`function`, `field`, `superclass`), so dispatch never
//! needs to know which kind of class it is talking to.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info};

use crate::error::ErrorKind;
use crate::expr::{Expr, FunctionDef};
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::native::{Arity, NativeFn, NativeFunction};
use crate::value::{NativeRef, Value};

/// Reads a native field off a receiver.
pub type Getter = fn(&mut Interpreter, &Value) -> IResult<Value>;

/// Writes a native field on a receiver.
pub type Setter = fn(&mut Interpreter, &Value, Value) -> IResult<()>;

/// An entry of a class's function table.
#[derive(Debug, Clone)]
pub enum Method {
    User(Rc<FunctionDef>),
    Native(Rc<NativeFunction>),
}

#[derive(Clone)]
pub enum FieldAccess {
    /// Stored in the instance's member table.
    Slot,
    Native { get: Getter, set: Option<Setter> },
}

#[derive(Clone)]
pub struct Field {
    /// Evaluated afresh for every instantiation.
    pub default: Option<Rc<Expr>>,
    pub access: FieldAccess,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            FieldAccess::Slot => "slot",
            FieldAccess::Native { .. } => "native",
        };
        f.debug_struct("Field")
            .field("default", &self.default.is_some())
            .field("access", &access)
            .finish()
    }
}

/// A class, user‑declared or native.  Immutable once built.
#[derive(Debug)]
pub struct ClassObj {
    pub name: String,
    functions: HashMap<String, Method>,
    fields: IndexMap<String, Field>,
    superclass: Option<Rc<ClassObj>>,
    synthetic: bool,
    init: Option<Rc<NativeFunction>>,
}

impl ClassObj {
    pub fn function(&self, name: &str) -> Option<&Method> {
        self.functions.get(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    pub fn superclass(&self) -> Option<&Rc<ClassObj>> {
        self.superclass.as_ref()
    }

    /// Implemented natively rather than in source.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// `self` is `other` or inherits from it.
    pub fn is_subclass_of(self: &Rc<Self>, other: &Rc<ClassObj>) -> bool {
        let mut current: Option<&Rc<ClassObj>> = Some(self);

        while let Some(class) = current {
            if Rc::ptr_eq(class, other) {
                return true;
            }
            current = class.superclass();
        }

        false
    }
}

/// Fluent construction of a [`ClassObj`]; used both for `class`
/// declarations and for native registration.
pub struct ClassBuilder {
    class: ClassObj,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            class: ClassObj {
                name: name.into(),
                functions: HashMap::new(),
                fields: IndexMap::new(),
                superclass: None,
                synthetic: false,
                init: None,
            },
        }
    }

    pub fn synthetic(mut self) -> Self {
        self.class.synthetic = true;
        self
    }

    pub fn superclass(mut self, superclass: Option<Rc<ClassObj>>) -> Self {
        self.class.superclass = superclass;
        self
    }

    /// Native constructor overload for a synthetic class.
    pub fn init(mut self, arity: Arity, function: NativeFn) -> Self {
        let name = format!("{}.init", self.class.name);
        let init = self
            .class
            .init
            .take()
            .and_then(|rc| Rc::try_unwrap(rc).ok())
            .unwrap_or_else(|| NativeFunction::new(name));
        self.class.init = Some(Rc::new(init.overload(arity, function)));
        self
    }

    /// Native function overload, registered under `name`.
    pub fn native(mut self, name: &str, arity: Arity, function: NativeFn) -> Self {
        let qualified = format!("{}.{}", self.class.name, name);
        let native = match self.class.functions.remove(name) {
            Some(Method::Native(rc)) => {
                Rc::try_unwrap(rc).unwrap_or_else(|_| NativeFunction::new(qualified))
            }
            _ => NativeFunction::new(qualified),
        };
        self.class
            .functions
            .insert(name.to_string(), Method::Native(Rc::new(native.overload(arity, function))));
        self
    }

    pub fn function(mut self, function: Rc<FunctionDef>) -> Self {
        self.class
            .functions
            .insert(function.name.clone(), Method::User(function));
        self
    }

    /// A slot field with an optional default expression.
    pub fn field(mut self, name: &str, default: Option<Rc<Expr>>) -> Self {
        self.class.fields.insert(
            name.to_string(),
            Field {
                default,
                access: FieldAccess::Slot,
            },
        );
        self
    }

    /// A read‑only native field.
    pub fn getter(mut self, name: &str, get: Getter) -> Self {
        self.class.fields.insert(
            name.to_string(),
            Field {
                default: None,
                access: FieldAccess::Native { get, set: None },
            },
        );
        self
    }

    pub fn build(self) -> Rc<ClassObj> {
        debug!(
            "Built class '{}' ({} functions, {} fields)",
            self.class.name,
            self.class.functions.len(),
            self.class.fields.len()
        );
        Rc::new(self.class)
    }
}

/// An instance.  The super‑instance is owned exclusively by this object.
pub struct Obj {
    class: Rc<ClassObj>,
    members: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Obj>>,
}

impl Obj {
    pub fn new(class: Rc<ClassObj>, parent: Option<Rc<Obj>>) -> Self {
        Self {
            class,
            members: RefCell::new(HashMap::new()),
            parent,
        }
    }

    pub fn class(&self) -> &Rc<ClassObj> {
        &self.class
    }

    /// The super‑instance, if the class has a superclass.
    pub fn parent(&self) -> Option<&Rc<Obj>> {
        self.parent.as_ref()
    }

    pub fn slot(&self, name: &str) -> Option<Value> {
        self.members.borrow().get(name).cloned()
    }

    pub fn set_slot(&self, name: &str, value: Value) {
        self.members.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Debug for Obj {
    // Members may point back at the instance; print the shape only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj")
            .field("class", &self.class.name)
            .field("members", &self.members.borrow().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// `self` / `super` carried by a function read off an instance.
#[derive(Debug, Clone)]
pub struct Receiver {
    pub this: Value,
    pub parent: Value,
}

/// A user function: a shared template plus an optional receiver binding.
#[derive(Debug)]
pub struct FunctionObj {
    pub def: Rc<FunctionDef>,
    pub receiver: Option<Receiver>,
}

impl FunctionObj {
    pub fn new(def: Rc<FunctionDef>) -> Self {
        Self {
            def,
            receiver: None,
        }
    }

    /// A copy of the template bound to `this` / `parent`.
    pub fn bound(def: Rc<FunctionDef>, this: Value, parent: Value) -> Self {
        Self {
            def,
            receiver: Some(Receiver { this, parent }),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn arity(&self) -> usize {
        self.def.params.names.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

fn undefined_member(receiver: &Value, name: &str) -> InterpretError {
    InterpretError::runtime(
        ErrorKind::UndefinedReference,
        format!("{} has no member '{}'", describe(receiver), name),
    )
}

fn describe(value: &Value) -> String {
    match value {
        Value::Object(obj) => format!("instance of {}", obj.class().name),
        Value::Class(class) => format!("class {}", class.name),
        other => other.type_name().to_string(),
    }
}

impl Interpreter {
    /// `receiver.name`: function table, then field table, then the
    /// super‑instance, else UndefinedReference.
    pub fn get_member(&mut self, receiver: &Value, name: &str) -> IResult<Value> {
        match receiver {
            Value::Object(obj) => self.object_member(obj, name),
            other => {
                let class = self.builtins().class_of(other);
                self.class_member(&class, other, None, name)?
                    .ok_or_else(|| undefined_member(other, name))
            }
        }
    }

    fn object_member(&mut self, obj: &Rc<Obj>, name: &str) -> IResult<Value> {
        let this = Value::Object(Rc::clone(obj));

        if let Some(value) = self.class_member(obj.class(), &this, obj.parent(), name)? {
            return Ok(value);
        }

        match obj.parent() {
            Some(parent) => {
                debug!("Delegating '{}' to super-instance of {}", name, obj.class().name);
                self.object_member(parent, name)
            }
            None => Err(undefined_member(&this, name)),
        }
    }

    /// Resolve `name` on exactly one class level.
    fn class_member(
        &mut self,
        class: &Rc<ClassObj>,
        this: &Value,
        parent: Option<&Rc<Obj>>,
        name: &str,
    ) -> IResult<Option<Value>> {
        if let Some(method) = class.function(name) {
            let value = match method {
                Method::User(def) => {
                    let parent = parent.map_or(Value::Null, |p| Value::Object(Rc::clone(p)));
                    Value::Function(Rc::new(FunctionObj::bound(
                        Rc::clone(def),
                        this.clone(),
                        parent,
                    )))
                }
                Method::Native(function) => Value::Native(NativeRef {
                    function: Rc::clone(function),
                    receiver: Some(Box::new(this.clone())),
                }),
            };
            return Ok(Some(value));
        }

        if let Some(field) = class.field(name) {
            let value = match (&field.access, this) {
                (FieldAccess::Slot, Value::Object(obj)) => obj.slot(name).unwrap_or(Value::Null),
                (FieldAccess::Slot, _) => Value::Null,
                (FieldAccess::Native { get, .. }, _) => get(self, this)?,
            };
            return Ok(Some(value));
        }

        Ok(None)
    }

    /// `receiver.name = value`: field table, then the super‑instance.
    /// Functions are never assignable.
    pub fn set_member(&mut self, receiver: &Value, name: &str, value: Value) -> IResult<()> {
        let (class, parent) = match receiver {
            Value::Object(obj) => (Rc::clone(obj.class()), obj.parent().cloned()),
            other => (self.builtins().class_of(other), None),
        };

        if let Some(field) = class.field(name) {
            return match (&field.access, receiver) {
                (FieldAccess::Slot, Value::Object(obj)) => {
                    obj.set_slot(name, value);
                    Ok(())
                }
                (FieldAccess::Native { set: Some(set), .. }, _) => set(self, receiver, value),
                _ => Err(InterpretError::runtime(
                    ErrorKind::InvalidOperation,
                    format!("member '{}' of {} is read-only", name, describe(receiver)),
                )),
            };
        }

        if class.function(name).is_some() {
            return Err(InterpretError::runtime(
                ErrorKind::InvalidOperation,
                format!("can not assign to function '{}' of {}", name, describe(receiver)),
            ));
        }

        match parent {
            Some(parent) => self.set_member(&Value::Object(parent), name, value),
            None => Err(undefined_member(receiver, name)),
        }
    }

    /// `Class(args)`.
    pub fn instantiate(&mut self, class: &Rc<ClassObj>, args: Vec<Value>) -> IResult<Value> {
        if class.is_synthetic() {
            return match &class.init {
                Some(init) => Rc::clone(init).invoke(self, None, args),
                None => Err(InterpretError::runtime(
                    ErrorKind::InvalidOperation,
                    format!("class {} can not be instantiated", class.name),
                )),
            };
        }

        info!("Instantiating {}", class.name);

        let obj = self.construct(class)?;
        let instance = Value::Object(obj);

        match self.get_member(&instance, "init") {
            Ok(init) => {
                self.call_value(&init, args)?;
            }
            Err(InterpretError::Runtime {
                kind: ErrorKind::UndefinedReference,
                ..
            }) if args.is_empty() => {}
            Err(InterpretError::Runtime {
                kind: ErrorKind::UndefinedReference,
                ..
            }) => {
                return Err(InterpretError::runtime(
                    ErrorKind::ArityMismatch,
                    format!("class {} takes no arguments but got {}", class.name, args.len()),
                ));
            }
            Err(e) => return Err(e),
        }

        Ok(instance)
    }

    /// Allocate the instance chain, superclass level first, and evaluate
    /// each level's field defaults inside a constructor frame.
    fn construct(&mut self, class: &Rc<ClassObj>) -> IResult<Rc<Obj>> {
        let parent = match class.superclass() {
            Some(superclass) if superclass.is_synthetic() => {
                return Err(InterpretError::runtime(
                    ErrorKind::InvalidOperation,
                    format!(
                        "class {} can not extend native class {}",
                        class.name, superclass.name
                    ),
                ));
            }
            Some(superclass) => Some(self.construct(superclass)?),
            None => None,
        };

        let obj = Rc::new(Obj::new(Rc::clone(class), parent));

        let slots: Vec<(String, Option<Rc<Expr>>)> = class
            .fields()
            .filter(|(_, field)| matches!(field.access, FieldAccess::Slot))
            .map(|(name, field)| (name.clone(), field.default.clone()))
            .collect();

        if slots.is_empty() {
            return Ok(obj);
        }

        let this = Value::Object(Rc::clone(&obj));
        let parent = obj
            .parent()
            .map_or(Value::Null, |p| Value::Object(Rc::clone(p)));
        let file = self.env.file();

        self.scoped(&format!("<init {}>", class.name), file, 0, |interp| {
            interp.env.bind("self", this);
            interp.env.bind("super", parent);

            for (name, default) in &slots {
                let value = match default {
                    Some(expr) => interp.evaluate(expr)?,
                    None => Value::Null,
                };
                obj.set_slot(name, value);
            }

            Ok(())
        })?;

        Ok(obj)
    }

    /// Call any callable value.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> IResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Native(native) => {
                let receiver = native.receiver.as_deref();
                Rc::clone(&native.function).invoke(self, receiver, args)
            }
            Value::Class(class) => self.instantiate(class, args),
            other => Err(InterpretError::runtime(
                ErrorKind::InvalidOperation,
                format!("{} is not callable", describe(other)),
            )),
        }
    }

    /// Push a frame, bind receiver and parameters, evaluate the body.
    ///
    /// Names the body does not bind are resolved on the live stack at call
    /// time, so a function observes later changes to names it uses from an
    /// enclosing scope.
    pub fn call_function(&mut self, function: &Rc<FunctionObj>, args: Vec<Value>) -> IResult<Value> {
        let def = Rc::clone(&function.def);
        let params = &def.params;

        let fits = match params.rest {
            Some(_) => args.len() >= params.names.len(),
            None => args.len() == params.names.len(),
        };
        if !fits {
            let expected = match params.rest {
                Some(_) => format!("at least {}", params.names.len()),
                None => params.names.len().to_string(),
            };
            return Err(InterpretError::runtime(
                ErrorKind::ArityMismatch,
                format!(
                    "function '{}' expects {} arguments but got {}",
                    def.name,
                    expected,
                    args.len()
                ),
            ));
        }

        debug!("Calling user-defined function '{}'", def.name);

        let file = Rc::clone(&def.body.token.source);
        let line = def.body.line();
        let receiver = function.receiver.clone();

        self.scoped(&def.name, file, line, |interp| {
            if let Some(receiver) = receiver {
                interp.env.bind("self", receiver.this);
                interp.env.bind("super", receiver.parent);
            }

            let mut args = args.into_iter();
            for name in &params.names {
                let arg = args.next().unwrap_or(Value::Null);
                interp.env.bind(name, arg);
            }
            if let Some(rest) = &params.rest {
                interp.env.bind(rest, Value::list(args.collect()));
            }

            match interp.evaluate(&def.body) {
                Err(InterpretError::Return(value)) => Ok(value),
                other => other,
            }
        })
    }
}
