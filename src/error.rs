use std::path::PathBuf;

use crate::hash::Hash20;

/// The single sum-typed error surfaced at every boundary of the core.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepository,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed {kind} object: {reason}")]
    MalformedObject { kind: &'static str, reason: String },

    #[error("wrong object kind: expected {expected}, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("object not found: {0}")]
    NotFound(Hash20),

    #[error("invalid index: {reason}")]
    InvalidIndex { reason: String },

    #[error("invalid {what}: {value:?}")]
    InvalidName { what: &'static str, value: String },

    #[error("path escapes repository: {}", .0.display())]
    PathEscapesRepo(PathBuf),

    #[error("conflict: {reason}")]
    Conflict { reason: String },

    #[error("validation failed for {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, GitError>;
