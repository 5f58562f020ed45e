//! Error types for the Forge pipeline
//!
//! Three failure classes can abort a compilation:
//!
//! - [`ParseError`]: token mismatch while parsing (the syntax class)
//! - [`TranslationError`]: a construct the generator cannot lower
//! - [`ModuleResolutionError`]: a `load` that names no readable module
//!
//! [`ForgeError`] wraps all three. None of them is recovered from: the first
//! error ends the run and no partial unit is produced.
//!
//! The `attempt`/`rescue` construct is unrelated to these types; it is a
//! runtime mechanism of the emitted program.

use crate::parser::ast::SourceLocation;
use crate::parser::ParseError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Semantic failure while lowering the AST to C
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationError {
    /// No builtin, struct, extern or registered function carries this name
    #[error("unresolved call to '{name}' at {location}")]
    UnresolvedCall {
        name: String,
        location: SourceLocation,
    },

    #[error("struct '{struct_name}' has no field '{field}' at {location}")]
    UnknownField {
        struct_name: String,
        field: String,
        location: SourceLocation,
    },

    #[error("cannot access field '{field}' on a value of type {ty} at {location}")]
    FieldOnNonStruct {
        field: String,
        ty: String,
        location: SourceLocation,
    },

    /// A call whose callee or argument list has a shape with no lowering
    #[error("unsupported call at {location}: {message}")]
    UnsupportedCall {
        message: String,
        location: SourceLocation,
    },

    #[error("unsupported expression at {location}: {message}")]
    UnsupportedExpression {
        message: String,
        location: SourceLocation,
    },

    #[error("value of type {ty} cannot be subscripted at {location}")]
    NotSubscriptable { ty: String, location: SourceLocation },

    #[error("struct '{name}' has {expected} fields but {got} values were given at {location}")]
    StructArity {
        name: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    #[error("builtin '{name}' expects {expected} arguments, got {got} at {location}")]
    BuiltinArity {
        name: String,
        expected: String,
        got: usize,
        location: SourceLocation,
    },

    #[error("struct '{name}' is already defined with different fields at {location}")]
    DuplicateStruct {
        name: String,
        location: SourceLocation,
    },

    #[error("cannot bind '{name}' to an expression with no value at {location}")]
    ValuelessBinding {
        name: String,
        location: SourceLocation,
    },
}

impl TranslationError {
    pub fn location(&self) -> SourceLocation {
        match self {
            TranslationError::UnresolvedCall { location, .. }
            | TranslationError::UnknownField { location, .. }
            | TranslationError::FieldOnNonStruct { location, .. }
            | TranslationError::UnsupportedCall { location, .. }
            | TranslationError::UnsupportedExpression { location, .. }
            | TranslationError::NotSubscriptable { location, .. }
            | TranslationError::StructArity { location, .. }
            | TranslationError::BuiltinArity { location, .. }
            | TranslationError::DuplicateStruct { location, .. }
            | TranslationError::ValuelessBinding { location, .. } => *location,
        }
    }

    pub(crate) fn unsupported_expression(
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        TranslationError::UnsupportedExpression {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn unsupported_call(message: impl Into<String>, location: SourceLocation) -> Self {
        TranslationError::UnsupportedCall {
            message: message.into(),
            location,
        }
    }
}

/// A `load` that could not be turned into a parsed module
#[derive(Debug, Error)]
pub enum ModuleResolutionError {
    #[error("module '{}' not found (searched: {})", .path, display_dirs(.searched))]
    NotFound {
        path: String,
        searched: Vec<PathBuf>,
    },

    #[error("module '{path}' must have the .forge extension")]
    InvalidExtension { path: String },

    #[error("cannot read module '{}': {}", .path.display(), .source)]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which of the three failure classes an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Translation,
    ModuleResolution,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "syntax error"),
            ErrorCategory::Translation => write!(f, "translation error"),
            ErrorCategory::ModuleResolution => write!(f, "module resolution error"),
        }
    }
}

/// Any error that aborts a Forge compilation
#[derive(Debug, Error)]
pub enum ForgeError {
    /// `module` is set when the syntax error is inside a loaded module
    #[error("{}{}", module_prefix(.module), .source)]
    Syntax {
        module: Option<String>,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    ModuleResolution(#[from] ModuleResolutionError),
}

fn module_prefix(module: &Option<String>) -> String {
    match module {
        Some(path) => format!("in module '{}': ", path),
        None => String::new(),
    }
}

impl ForgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForgeError::Syntax { .. } => ErrorCategory::Syntax,
            ForgeError::Translation(_) => ErrorCategory::Translation,
            ForgeError::ModuleResolution(_) => ErrorCategory::ModuleResolution,
        }
    }
}

impl From<ParseError> for ForgeError {
    fn from(source: ParseError) -> Self {
        ForgeError::Syntax {
            module: None,
            source,
        }
    }
}

/// Result of a lowering step
pub type CodegenResult<T> = Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err: ForgeError = TranslationError::UnresolvedCall {
            name: "nope".into(),
            location: SourceLocation::new(3, 1),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Translation);
        assert_eq!(err.to_string(), "unresolved call to 'nope' at line 3, column 1");

        let err: ForgeError = ModuleResolutionError::NotFound {
            path: "util.forge".into(),
            searched: vec![PathBuf::from("."), PathBuf::from("lib")],
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::ModuleResolution);
        assert!(err.to_string().contains("searched: ., lib"));
    }

    #[test]
    fn test_syntax_error_names_module() {
        let source = ParseError::UnexpectedToken {
            expected: "')'".into(),
            found: "'}'".into(),
            location: SourceLocation::new(2, 5),
        };
        let err = ForgeError::Syntax {
            module: Some("geo.forge".into()),
            source,
        };
        assert_eq!(err.category(), ErrorCategory::Syntax);
        assert!(err.to_string().starts_with("in module 'geo.forge': syntax error at line 2"));
    }
}
