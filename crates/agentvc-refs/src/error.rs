//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch or remote name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// HEAD is missing or does not name a branch.
    #[error("corrupt HEAD: {0}")]
    CorruptHead(String),

    /// A ref file does not contain a commit digest.
    #[error("corrupt ref {name}: {reason}")]
    CorruptRef { name: String, reason: String },

    /// HEAD names a branch that has no commits yet.
    #[error("branch {branch} has no commits")]
    EmptyRepository { branch: String },

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
