//! Centralised error hierarchy for the **Tern interpreter**.
//!
//! Two families live here:
//!
//! * [`TernError`] is what the public API hands back: lexing and parsing
//!   failures (which are never language values and can not be caught from
//!   script code), uncaught runtime exceptions that reached the top level,
//!   and I/O failures on the host side.
//! * [`ErrorKind`] classifies runtime failures.  Each kind has a built‑in
//!   exception class of the same name, so a host failure can be materialised
//!   into a language object before it reaches a `catch` clause.
//!
//! The module **does not** print diagnostics itself.

use std::fmt;
use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TernError {
    /// Lexical (scanner) error with source position.
    #[error("[{source_name}:{line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// Name of the unit being scanned (file path or `<eval>`).
        source_name: String,
    },

    /// Syntactic (parser) error.
    #[error("[{source_name}:{line}] Error at '{lexeme}': {message}")]
    Parse {
        message: String,
        line: usize,
        source_name: String,
        lexeme: String,
    },

    /// A runtime exception that no `catch` clause intercepted.
    #[error("Uncaught {class}: {message}")]
    Uncaught {
        /// Name of the exception's class.
        class: String,

        /// Display form of the exception's message.
        message: String,

        /// Snapshot of the stack at the raise point, innermost first.
        trace: Vec<TraceEntry>,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl TernError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, source_name: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Lex error: {}:{}, msg={}",
            source_name, line, message
        );

        TernError::Lex {
            message,
            line,
            source_name: source_name.to_string(),
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, source_name: &str, lexeme: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: {}:{} at '{}', msg={}",
            source_name, line, lexeme, message
        );

        TernError::Parse {
            message,
            line,
            source_name: source_name.to_string(),
            lexeme: lexeme.to_string(),
        }
    }

    /// `true` for the parse‑time category (lexer and parser failures).
    pub fn is_parse_time(&self) -> bool {
        matches!(self, TernError::Lex { .. } | TernError::Parse { .. })
    }
}

/// Runtime failure kinds.  The variant name doubles as the name of the
/// built‑in exception class raised for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UndefinedReference,
    AlreadyDefined,
    InvalidOperation,
    TypeMismatch,
    ArityMismatch,
    OutOfBounds,
    NoMatchingClause,
    IOFailure,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::UndefinedReference,
        ErrorKind::AlreadyDefined,
        ErrorKind::InvalidOperation,
        ErrorKind::TypeMismatch,
        ErrorKind::ArityMismatch,
        ErrorKind::OutOfBounds,
        ErrorKind::NoMatchingClause,
        ErrorKind::IOFailure,
    ];

    /// Name of the exception class that represents this kind.
    pub fn class_name(self) -> &'static str {
        match self {
            ErrorKind::UndefinedReference => "UndefinedReference",
            ErrorKind::AlreadyDefined => "AlreadyDefined",
            ErrorKind::InvalidOperation => "InvalidOperation",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::OutOfBounds => "OutOfBounds",
            ErrorKind::NoMatchingClause => "NoMatchingClause",
            ErrorKind::IOFailure => "IOFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// One line of a diagnostic stack walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub function: String,
    pub file: String,
    pub line: usize,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, TernError>;
