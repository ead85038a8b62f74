//! Content-addressed object storage for agentvc.
//!
//! A hash-keyed object store analogous to git's `.git/objects/` directory.
//! Card snapshots and commit records are stored as immutable objects
//! identified by the SHA-256 of their kind-framed bytes.
//!
//! # Object Types
//!
//! - card -- canonical JSON of an [`AgentCard`](agentvc_types::AgentCard)
//! - [`Commit`] -- line-oriented commit record linking a card to its parent
//!
//! # Storage
//!
//! [`FsObjectStore`] implements the [`ObjectStore`] trait over a two-level
//! directory partitioned by digest prefix.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writing an existing object is a no-op.
//! 3. Readers never observe a partially written object.
//! 4. Reads re-verify the digest; a mismatch is corruption, not a miss.
//! 5. All I/O errors are propagated, never retried or silently ignored.

pub mod error;
pub mod fs;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use object::{Commit, ObjectKind, StoredObject, COMMIT_FORMAT_VERSION};
pub use traits::ObjectStore;
