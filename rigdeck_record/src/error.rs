use std::fmt;

use thiserror::Error;

/// Result type alias for record operations
pub type Result<T> = std::result::Result<T, RecordError>;

/// Kinds a record field can hold, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Str,
    Tuple,
    Record,
    List,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Str => "string",
            FieldKind::Tuple => "tuple",
            FieldKind::Record => "record",
            FieldKind::List => "list",
        };
        f.write_str(name)
    }
}

/// Errors raised while reading or writing records
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("data already exists at [{key}]")]
    DuplicateKey { key: String },

    #[error("wrong kind at [{key}]: expected {expected}, actually got {actual}")]
    KindMismatch {
        key: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("{reason} at [{key}]")]
    Invalid { key: String, reason: String },

    #[error("malformed input: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RecordError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        RecordError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Prepends a path segment to the key so nested failures name their
    /// position in the whole document.
    pub fn prefixed(self, parent: &str) -> Self {
        let join = |key: String| format!("{parent}.{key}");
        match self {
            RecordError::DuplicateKey { key } => RecordError::DuplicateKey { key: join(key) },
            RecordError::KindMismatch {
                key,
                expected,
                actual,
            } => RecordError::KindMismatch {
                key: join(key),
                expected,
                actual,
            },
            RecordError::Invalid { key, reason } => RecordError::Invalid {
                key: join(key),
                reason,
            },
            other => other,
        }
    }
}
