//! Reference management for agentvc.
//!
//! Named references point at commit digests in the object store. They are
//! the human-readable entry points into a card's history, analogous to git
//! refs.
//!
//! # Architecture
//!
//! - **Branches** are mutable pointers to the latest commit on a line of
//!   history. They advance as new commits are written.
//! - **Remote refs** record the last commit successfully pushed per
//!   (remote, branch) and are only updated by sync operations.
//! - **HEAD** is a symbolic ref naming the current branch. It never points
//!   directly at a commit.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- The [`Head`] file format
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- Branch/remote name validation
//! - [`fs`] -- [`FsRefStore`], the on-disk layout under `.agentvc/`

pub mod error;
pub mod fs;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use fs::FsRefStore;
pub use names::{validate_branch_name, validate_remote_name};
pub use traits::RefStore;
pub use types::Head;
