use std::path::PathBuf;

use agentvc_crypto::CryptoError;
use agentvc_diff::DiffError;
use agentvc_protocol::ProtocolError;
use agentvc_refs::RefError;
use agentvc_store::StoreError;
use agentvc_sync::SyncError;
use agentvc_types::TypeError;
use thiserror::Error;

/// Every failure a [`Repository`](crate::Repository) operation can report.
///
/// Errors from the lower crates are folded into the shared taxonomy where
/// one applies (a corrupt ref and a corrupt object are both `CorruptState`);
/// the rest are carried as-is.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not an agentvc repository (or any parent): {0}")]
    NotARepository(PathBuf),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("corrupt repository state: {0}")]
    CorruptState(String),

    #[error("nothing to commit: card is unchanged")]
    NoChanges,

    #[error("uncommitted changes on branch {branch}; commit them first")]
    UncommittedChanges { branch: String },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("unknown diff target: {0} (expected a branch name or a commit digest)")]
    UnknownTarget(String),

    #[error("branch {0} has no commits")]
    EmptyRepository(String),

    #[error("authentication required: no identity is loaded")]
    AuthRequired,

    #[error("signature not verified: {0}")]
    Unverified(String),

    #[error("expired: {0}")]
    Expired(String),

    #[error("remote error ({status}): {message}")]
    RemoteError { status: u16, message: String },

    #[error("invalid card document: {0}")]
    InvalidCard(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("ref error: {0}")]
    Ref(RefError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    #[error("sync error: {0}")]
    Sync(SyncError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound {
                kind: "object",
                name: id.to_hex(),
            },
            StoreError::HashMismatch { .. }
            | StoreError::CorruptObject { .. }
            | StoreError::MalformedCommit(_) => Self::CorruptState(e.to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<RefError> for RepoError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::EmptyRepository { branch } => Self::EmptyRepository(branch),
            RefError::CorruptHead(_) | RefError::CorruptRef { .. } => {
                Self::CorruptState(e.to_string())
            }
            other => Self::Ref(other),
        }
    }
}

impl From<ProtocolError> for RepoError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Expired(msg) => Self::Expired(msg),
            ProtocolError::SignatureMismatch(msg) => Self::Unverified(msg),
            ProtocolError::UnknownIdentity(name) => Self::NotFound {
                kind: "identity",
                name,
            },
            other => Self::Sync(SyncError::Protocol(other)),
        }
    }
}

impl From<SyncError> for RepoError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::AuthRequired => Self::AuthRequired,
            SyncError::RemoteError { status, message } => Self::RemoteError { status, message },
            SyncError::Protocol(inner) => inner.into(),
            other => Self::Sync(other),
        }
    }
}

impl From<TypeError> for RepoError {
    fn from(e: TypeError) -> Self {
        Self::InvalidCard(e.to_string())
    }
}
