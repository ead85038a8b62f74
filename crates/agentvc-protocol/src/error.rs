use agentvc_crypto::CryptoError;
use thiserror::Error;

/// Authentication and framing failures.
///
/// Each variant maps onto one HTTP status so the server and the client agree
/// on the taxonomy.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Missing or unparsable header, token, or body.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// Timestamp outside the replay window, or challenge past its expiry.
    #[error("expired: {0}")]
    Expired(String),

    /// The signature does not verify, or a token is bound to something else.
    #[error("signature mismatch: {0}")]
    SignatureMismatch(String),

    /// No key is known for the agent.
    #[error("unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ProtocolError {
    /// HTTP status for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Malformed(_) | Self::Serialization(_) => 400,
            Self::Expired(_) => 401,
            Self::SignatureMismatch(_) => 403,
            Self::UnknownIdentity(_) => 404,
        }
    }
}

impl From<CryptoError> for ProtocolError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidSignature => Self::SignatureMismatch("invalid signature".into()),
            CryptoError::InvalidKey(msg) | CryptoError::InvalidEncoding(msg) => {
                Self::Malformed(msg)
            }
            other => Self::Malformed(other.to_string()),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
