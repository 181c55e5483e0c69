use std::fmt;

/// Where a parse, serialize or query problem was found in its source text.
///
/// All fields are best-effort: a collaborator that cannot compute a column
/// or byte offset leaves it `None` rather than guessing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    pub line: Option<u64>,
    pub column: Option<u64>,
    pub byte_offset: Option<u64>,
    pub file: Option<String>,
}

impl Locator {
    pub fn at_line(line: u64) -> Self {
        Self {
            line: Some(line),
            ..Self::default()
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{file}")?;
        }
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, ":{line}:{column}"),
            (Some(line), None) => write!(f, ":{line}"),
            _ => Ok(()),
        }
    }
}

/// The error kinds fixed by the storage and model specification.
///
/// Constructors return a null/absent handle on failure (see module docs on
/// each component); this type is what is logged through the [`crate::log`]
/// sink and, for the shim layers, attached to the collaborator's own error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("storage backend failure: {0}")]
    BackendFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("parse error at {locator}: {message}")]
    ParseError { message: String, locator: Locator },

    #[error("serialize error: {0}")]
    SerializeError(String),

    #[error("query error: {0}")]
    QueryError(String),
}

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        Self::InvalidEncoding(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn backend_failure(msg: impl Into<String>) -> Self {
        Self::BackendFailure(msg.into())
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            locator: Locator::default(),
        }
    }

    pub fn parse_error_at(message: impl Into<String>, locator: Locator) -> Self {
        Self::ParseError {
            message: message.into(),
            locator,
        }
    }

    pub fn query_error(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    pub fn serialize_error(msg: impl Into<String>) -> Self {
        Self::SerializeError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
