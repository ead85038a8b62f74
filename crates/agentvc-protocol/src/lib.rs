//! Wire protocol for agentvc.
//!
//! Defines the HTTP surface shared by the sync client and the reference
//! server: endpoint paths and headers, the canonical message signed on every
//! write, the stateless challenge token guarding protected-branch reads, the
//! domain-bound login proof, and the JSON request/response bodies.
//!
//! Nothing here performs I/O. Every check takes the current time as an
//! argument so callers (and tests) control the clock.

pub mod auth;
pub mod challenge;
pub mod endpoint;
pub mod error;
pub mod login;
pub mod message;

pub use auth::{canonical_write_message, check_freshness, verify_signed_request, SignedHeaders};
pub use challenge::{ChallengeClaims, ChallengeToken, DEFAULT_CHALLENGE_TTL_SECS};
pub use endpoint::{endpoints, headers, HealthResponse, REPLAY_WINDOW_SECS};
pub use error::{ProtocolError, ProtocolResult};
pub use login::LoginProof;
pub use message::{
    ChallengeResponse, ErrorBody, ListBranchesResponse, PushBranchRequest, PushBranchResponse,
    RemoteBranch, VerifyResponse, PROTOCOL_VERSION,
};
