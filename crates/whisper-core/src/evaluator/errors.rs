use thiserror::Error;

/// Failures raised while evaluating expressions or executing statements.
///
/// The `Display` form is the plain message shown to the program author: it is
/// printed after `Error: ` by diagnostics and bound to `error` inside a
/// `handle:` block.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Variable '{name}' is not defined")]
    Name { name: String },

    #[error("Index out of range or invalid: {index}")]
    Index { index: String },

    #[error("division by zero")]
    ZeroDivision,

    #[error("invalid syntax: {message}")]
    Syntax { message: String },

    #[error("{message}")]
    Type { message: String },

    #[error("{message}")]
    Value { message: String },

    #[error("{0}")]
    Runtime(String),

    #[error("{0}")]
    Io(String),
}

/// Coarse classification of an [`EvalError`], mirroring the dialect's error
/// taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Index,
    ZeroDivision,
    Syntax,
    Type,
    Value,
    Runtime,
    Io,
}

impl EvalError {
    /// Create an undefined-variable error
    pub fn undefined(name: &str) -> Self {
        Self::Name {
            name: name.to_string(),
        }
    }

    /// Create an index error for the offending index text
    pub fn bad_index(index: impl std::fmt::Display) -> Self {
        Self::Index {
            index: index.to_string(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Create a type error for binary operations
    pub fn binary_type_error(operation: &str, left_type: &str, right_type: &str) -> Self {
        Self::Type {
            message: format!(
                "unsupported operand types for {operation}: '{left_type}' and '{right_type}'"
            ),
        }
    }

    /// Create a type error for unary operations and built-in arguments
    pub fn unary_type_error(operation: &str, expected: &str, actual: &str) -> Self {
        Self::Type {
            message: format!("{operation} requires {expected}, got '{actual}'"),
        }
    }

    pub fn bad_value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Name { .. } => ErrorKind::Name,
            Self::Index { .. } => ErrorKind::Index,
            Self::ZeroDivision => ErrorKind::ZeroDivision,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Type { .. } => ErrorKind::Type,
            Self::Value { .. } => ErrorKind::Value,
            Self::Runtime(_) => ErrorKind::Runtime,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for EvalError {
    fn from(err: std::io::Error) -> Self {
        EvalError::Io(err.to_string())
    }
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;
