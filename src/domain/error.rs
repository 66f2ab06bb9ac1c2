//! Domain-level errors (no I/O concerns)

use thiserror::Error;

/// Domain errors represent invalid input or invalid node references.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("malformed snapshot: {message}")]
    MalformedSnapshot { message: String },

    #[error("cannot serialize snapshot: {message}")]
    Serialize { message: String },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("node belongs to another tree: {0}")]
    ForeignNode(String),

    #[error("invalid node path: {0}")]
    InvalidPath(String),

    #[error("action '{name}' not supported on '{path}'")]
    UnsupportedAction { name: String, path: String },

    #[error("action '{name}' expects {expected} argument(s), got {got}")]
    InvalidArguments {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
