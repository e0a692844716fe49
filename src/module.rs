//! Module resolution for `import a.b.c`.
//!
//! The dotted path maps to `a/b/c.tern`.  Modules bundled with the crate
//! are looked up first; anything else is read relative to the module root
//! (the running script's directory, else the current directory).

use std::borrow::Cow;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::ErrorKind;
use crate::interpreter::{IResult, InterpretError};

/// File extension of source units.
pub const EXTENSION: &str = "tern";

/// Modules compiled into the binary, keyed by relative path.
pub const EMBEDDED: &[(&str, &str)] = &[
    (
        "std/functional.tern",
        include_str!("../modules/std/functional.tern"),
    ),
    ("std/assert.tern", include_str!("../modules/std/assert.tern")),
];

/// `["a", "b", "c"]` → `a/b/c.tern`
pub fn relative_path(segments: &[String]) -> String {
    format!("{}.{}", segments.join("/"), EXTENSION)
}

pub fn embedded(relative: &str) -> Option<&'static str> {
    EMBEDDED
        .iter()
        .find(|(path, _)| *path == relative)
        .map(|(_, source)| *source)
}

/// Source text of a module.
pub fn load(relative: &str, root: Option<&Path>) -> IResult<Cow<'static, str>> {
    if let Some(source) = embedded(relative) {
        debug!("Module '{}' resolved to embedded resource", relative);
        return Ok(Cow::Borrowed(source));
    }

    let base: PathBuf = match root {
        Some(root) => root.to_path_buf(),
        None => env::current_dir().unwrap_or_default(),
    };
    let path = base.join(relative);

    if !path.is_file() {
        return Err(InterpretError::runtime(
            ErrorKind::UndefinedReference,
            format!("module not found: {}", relative),
        ));
    }

    debug!("Module '{}' resolved to {}", relative, path.display());

    fs::read_to_string(&path).map(Cow::Owned).map_err(|e| {
        InterpretError::runtime(
            ErrorKind::IOFailure,
            format!("can not read module {}: {}", path.display(), e),
        )
    })
}
