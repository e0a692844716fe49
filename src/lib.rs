//! Tern: a small dynamically typed scripting language with classes,
//! pattern matching and exceptions.
//!
//! Source text flows through [`scanner`] → [`morpher`] → [`parser`]
//! (driven by the tables in [`parselets`]) into [`expr`] trees, which the
//! [`interpreter`] evaluates against a single frame stack.

pub mod ast_printer;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod module;
pub mod morpher;
pub mod native;
pub mod object;
pub mod parselets;
pub mod parser;
pub mod pattern;
pub mod scanner;
pub mod token;
pub mod value;
