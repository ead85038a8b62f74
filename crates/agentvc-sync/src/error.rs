use agentvc_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The operation needs a local identity and none is loaded.
    #[error("authentication required: run `agentvc init` to create an identity")]
    AuthRequired,

    /// The server answered with an error; `message` is its `error` text.
    #[error("remote error ({status}): {message}")]
    RemoteError { status: u16, message: String },

    #[error("invalid remote URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Local verification of a login proof failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
