//! Foundation types for agentvc.
//!
//! This crate provides the identity, addressing, and document types used
//! throughout agentvc. Every other agentvc crate depends on `agentvc-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed digest (SHA-256, hex-encoded on the wire)
//! - [`AgentId`] -- Name-based UUID derived from an agent's public key
//! - [`AgentCard`] -- The versioned identity document
//! - [`Skill`] / [`Provider`] / [`Capabilities`] -- Card sub-records

pub mod card;
pub mod error;
pub mod identity;
pub mod object;

pub use card::{AgentCard, Capabilities, Provider, Skill, MAIN_BRANCH};
pub use error::TypeError;
pub use identity::{AgentId, AGENT_ID_NAMESPACE};
pub use object::ObjectId;
