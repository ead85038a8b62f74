//! Remote synchronization for agentvc.
//!
//! Talks to a card hosting service over HTTP: pushes branch snapshots with
//! signed requests, lists and deletes remote branches, and fetches branch
//! cards, answering the server's challenge transparently for protected
//! branches. Also wraps the login-proof verification endpoint.
//!
//! Push failures are reported per branch as [`PushOutcome`]s so a multi-branch
//! push can continue past a rejected branch. Every other remote failure is a
//! [`SyncError`].

pub mod error;
pub mod http;
pub mod login;
pub mod transport;
pub mod types;

pub use error::{SyncError, SyncResult};
pub use http::HttpRemote;
pub use login::verify_login_locally;
pub use transport::CardRemote;
pub use types::{BranchPush, PushOutcome};
