//! Variable storage: an ordered stack of [`Frame`]s, innermost last.
//!
//! Lookups walk the live stack from the top down, so a name is visible in
//! every frame pushed after the one that bound it.  The global frame sits
//! at the bottom and is never popped.
//!
//! Besides the live stack the environment keeps a stack of *snapshots*:
//! copies of the stack trace taken where an exception was raised.  One is
//! pushed when a `catch` clause (or the top‑level reporter) starts handling
//! an exception and popped when it is done, so `stacktrace()` inside a
//! handler describes the raise point even though the raising frames are
//! already gone.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::builtins::Builtins;
use crate::error::{ErrorKind, TraceEntry};
use crate::interpreter::{IResult, InterpretError};
use crate::value::Value;

/// Name of the bottom frame.
pub const GLOBAL_FRAME: &str = "<global>";

#[derive(Debug)]
pub struct Frame {
    /// Function or construct that pushed the frame.
    pub name: String,
    bindings: HashMap<String, Value>,
    /// Line being evaluated in this frame.
    pub line: usize,
    pub file: Rc<str>,
}

impl Frame {
    fn new(name: &str, file: Rc<str>, line: usize) -> Self {
        Self {
            name: name.to_string(),
            bindings: HashMap::new(),
            line,
            file,
        }
    }
}

#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
    snapshots: Vec<Vec<TraceEntry>>,
    builtins: Rc<Builtins>,
}

impl Environment {
    /// A stack holding only the global frame.  Built-in names are not bound
    /// until [`Builtins::install`] runs.
    pub fn new(builtins: Rc<Builtins>) -> Self {
        Self {
            frames: vec![Frame::new(GLOBAL_FRAME, Rc::from("<input>"), 0)],
            snapshots: Vec::new(),
            builtins,
        }
    }

    /// The built-in class table this stack was created with.
    pub fn builtins(&self) -> &Rc<Builtins> {
        &self.builtins
    }

    // ── frames ──

    pub fn push(&mut self, name: &str, file: Rc<str>, line: usize) {
        debug!("push frame '{}' (depth {})", name, self.frames.len());
        self.frames.push(Frame::new(name, file, line));
    }

    /// Pop the innermost frame.  The global frame stays.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            if let Some(frame) = self.frames.pop() {
                debug!("pop frame '{}' (depth {})", frame.name, self.frames.len());
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop frames above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Record the line being evaluated in the innermost frame.
    pub fn mark(&mut self, line: usize) {
        self.top().line = line;
    }

    pub fn file(&self) -> Rc<str> {
        Rc::clone(&self.frames[self.frames.len() - 1].file)
    }

    /// Switch the innermost frame to another file, returning the previous one.
    pub fn set_file(&mut self, file: Rc<str>) -> Rc<str> {
        std::mem::replace(&mut self.top().file, file)
    }

    // ── bindings ──

    /// Bind `name` in the innermost frame; fails if it is already bound there.
    pub fn define(&mut self, name: &str, value: Value) -> IResult<()> {
        let frame = self.top();

        if frame.bindings.contains_key(name) {
            return Err(InterpretError::runtime(
                ErrorKind::AlreadyDefined,
                format!("'{}' is already defined in this scope", name),
            ));
        }

        frame.bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Rebind `name` in the innermost frame; fails if it is not bound there.
    pub fn update(&mut self, name: &str, value: Value) -> IResult<()> {
        match self.top().bindings.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(InterpretError::runtime(
                ErrorKind::UndefinedReference,
                format!("'{}' is not defined in this scope", name),
            )),
        }
    }

    /// Update the nearest `name`, or define it in the innermost frame.
    pub fn put(&mut self, name: &str, value: Value) {
        match self.slot(name) {
            Some(slot) => *slot = value,
            None => {
                self.top().bindings.insert(name.to_string(), value);
            }
        }
    }

    /// Bind in the innermost frame, shadowing or overwriting silently.
    /// Used for parameters and pattern bindings.
    pub fn bind(&mut self, name: &str, value: Value) {
        self.top().bindings.insert(name.to_string(), value);
    }

    pub fn define_global(&mut self, name: &str, value: Value) {
        self.frames[0].bindings.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> IResult<Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
            .cloned()
            .ok_or_else(|| {
                InterpretError::runtime(
                    ErrorKind::UndefinedReference,
                    format!("undefined variable '{}'", name),
                )
            })
    }

    pub fn has(&self, name: &str) -> bool {
        self.frames
            .iter()
            .rev()
            .any(|frame| frame.bindings.contains_key(name))
    }

    fn slot(&mut self, name: &str) -> Option<&mut Value> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.bindings.get_mut(name))
    }

    // ── traces ──

    /// The live stack, innermost first.
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.frames
            .iter()
            .rev()
            .map(|frame| TraceEntry {
                function: frame.name.clone(),
                file: frame.file.to_string(),
                line: frame.line,
            })
            .collect()
    }

    pub fn push_snapshot(&mut self, trace: Vec<TraceEntry>) {
        self.snapshots.push(trace);
    }

    pub fn pop_snapshot(&mut self) {
        self.snapshots.pop();
    }

    /// The snapshot of the handler currently running, if any.
    pub fn snapshot(&self) -> Option<&[TraceEntry]> {
        self.snapshots.last().map(Vec::as_slice)
    }
}
