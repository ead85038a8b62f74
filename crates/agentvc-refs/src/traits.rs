//! The [`RefStore`] trait defining the reference storage interface.

use agentvc_types::ObjectId;

use crate::error::{RefError, RefResult};

/// Storage backend for named references.
///
/// The namespace follows git's layout:
///
/// - `refs/heads/*` for branches
/// - `refs/remotes/{remote}/*` for remote tracking refs
/// - `HEAD` naming the current branch
///
/// Implementations validate names before touching storage, since names
/// become file paths.
pub trait RefStore: Send + Sync {
    /// The branch HEAD names. Fails with `CorruptHead` if HEAD is missing or
    /// is not a symbolic ref.
    fn head(&self) -> RefResult<String>;

    /// Point HEAD at `branch`. The branch need not exist yet.
    fn set_head(&self, branch: &str) -> RefResult<()>;

    /// Tip of `branch`, or `None` if the branch does not exist.
    fn get_branch(&self, branch: &str) -> RefResult<Option<ObjectId>>;

    /// Create or move `branch` to `target`.
    fn set_branch(&self, branch: &str, target: &ObjectId) -> RefResult<()>;

    /// Delete `branch`. Returns `true` if it existed.
    fn delete_branch(&self, branch: &str) -> RefResult<bool>;

    /// All branches with their tips, sorted by name.
    fn list_branches(&self) -> RefResult<Vec<(String, ObjectId)>>;

    /// Last digest pushed for (`remote`, `branch`).
    fn get_remote_ref(&self, remote: &str, branch: &str) -> RefResult<Option<ObjectId>>;

    /// Record that `target` was pushed for (`remote`, `branch`).
    fn set_remote_ref(&self, remote: &str, branch: &str, target: &ObjectId) -> RefResult<()>;

    /// Tip of the current branch.
    fn resolve_head(&self) -> RefResult<ObjectId> {
        let branch = self.head()?;
        self.get_branch(&branch)?
            .ok_or(RefError::EmptyRepository { branch })
    }
}
