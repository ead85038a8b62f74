//! High-level SDK for agentvc.
//!
//! [`Repository`] is the entry point: it ties the object store, the ref
//! store, the keypair and the working `agent-card.json` together and exposes
//! the git-like operations (`init`, `commit`, `log`, `diff`, `branch`,
//! `checkout`, `status`, `push`).
//!
//! A repository assumes a single writer. Nothing is locked; every mutating
//! operation moves its ref as the very last step so an interrupted command
//! leaves at worst an unreferenced object behind.

pub mod commit;
pub mod config;
pub mod error;
pub mod repository;
pub mod resolver;

pub use commit::{BranchStatus, LogEntry, Status};
pub use config::{RemoteConfig, RepoConfig, DEFAULT_CARD_FILE, DEFAULT_REMOTE};
pub use error::{RepoError, RepoResult};
pub use repository::{Repository, DEFAULT_LOG_LIMIT, METADATA_DIR};
pub use resolver::{PassThroughResolver, SkillResolver};

// Re-export key types
pub use agentvc_diff::{CardDiff, FieldChange};
pub use agentvc_protocol::LoginProof;
pub use agentvc_store::Commit;
pub use agentvc_sync::PushOutcome;
pub use agentvc_types::{AgentCard, AgentId, ObjectId, Skill, MAIN_BRANCH};
