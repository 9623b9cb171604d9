use std::fmt;

use thiserror::Error;

/// The category of a script failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing operand, unbalanced block, or an unknown word in statement position.
    Syntax,
    /// Unknown resource, missing segment, or index out of range.
    Resolution,
    /// A string that cannot become the targeted type, or string vs number comparison.
    Coercion,
    /// Unknown operator, bad regular expression, or bad network block.
    Validator,
    /// An absent field whose type has no empty instance.
    Construction,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "rule-syntax-error",
            ErrorKind::Resolution => "rule-resolution-error",
            ErrorKind::Coercion => "rule-coercion-error",
            ErrorKind::Validator => "rule-validator-error",
            ErrorKind::Construction => "rule-construction-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A fatal script error with the 1-based line of the offending statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line:{line} ({kind})")]
pub struct RuleError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: usize,
}

impl RuleError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, line: usize) -> Self {
        RuleError {
            kind,
            message: message.into(),
            line,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, line)
    }

    /// Wrap an accessor failure, keeping its kind.
    pub fn access(context: impl fmt::Display, err: &AccessError, line: usize) -> Self {
        Self::new(err.kind(), format!("{context}: {err}"), line)
    }
}

/// Failures raised by the path accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("segment '{segment}' has not been found in {kind} '{type_name}'")]
    SegmentNotFound {
        segment: String,
        kind: &'static str,
        type_name: String,
    },

    #[error("expected an index into '{type_name}' but got '{segment}'")]
    InvalidIndex { segment: String, type_name: String },

    #[error("index {index} is out of range for '{type_name}' of length {len}")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        type_name: String,
    },

    #[error("segment '{segment}' cannot follow scalar {kind}")]
    PathPastScalar { segment: String, kind: &'static str },

    #[error("value of '{type_name}' is absent")]
    Absent { type_name: String },

    #[error("cannot assign to {kind} '{type_name}'")]
    NotAssignable {
        kind: &'static str,
        type_name: String,
    },

    #[error("cannot convert '{value}' to {target}: {reason}")]
    Coercion {
        value: String,
        target: &'static str,
        reason: String,
    },

    #[error("cannot construct empty value of type '{0}'")]
    Construct(String),
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Coercion { .. } | AccessError::NotAssignable { .. } => {
                ErrorKind::Coercion
            }
            AccessError::Construct(_) => ErrorKind::Construction,
            _ => ErrorKind::Resolution,
        }
    }
}
