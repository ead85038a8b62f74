use std::path::PathBuf;

/// Errors from signing, verification, and key storage.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// No keypair has been generated yet; `init` must run first.
    #[error("no identity found in {0}")]
    NoIdentity(PathBuf),

    #[error("identity already exists in {0}")]
    IdentityExists(PathBuf),

    /// Key files exist but disagree with each other.
    #[error("corrupt key material: {0}")]
    CorruptKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
