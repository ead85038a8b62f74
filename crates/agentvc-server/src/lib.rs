//! Reference HTTP service for agentvc.
//!
//! Hosts the branches agents push, pins each agent's public key on its first
//! signed write to `main`, serves `main` publicly and every other branch
//! behind a stateless challenge, and verifies domain-bound login proofs for
//! third parties.
//!
//! All state is in memory. The server's challenge-signing key is generated at
//! startup, so outstanding challenges die with the process.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::build_router;
pub use server::AgentvcServer;
pub use state::AppState;
