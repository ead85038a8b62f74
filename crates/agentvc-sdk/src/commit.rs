use agentvc_diff::CardDiff;
use agentvc_store::Commit;
use agentvc_types::{AgentId, ObjectId};
use serde::Serialize;

/// One entry of [`Repository::log`](crate::Repository::log).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: ObjectId,
    pub commit: Commit,
}

/// Snapshot of repository state for `status`.
#[derive(Clone, Debug)]
pub struct Status {
    pub branch: String,
    pub agent_id: AgentId,
    pub public_key: String,
    /// Working card against the tip of the current branch.
    pub changes: CardDiff,
    /// The working card would produce a new snapshot. Unlike `changes` this
    /// also sees edits to fields the diff does not cover.
    pub dirty: bool,
    pub branches: Vec<BranchStatus>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        !self.dirty
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchStatus {
    pub name: String,
    pub tip: ObjectId,
    pub current: bool,
    /// Commits not yet pushed to the default remote.
    pub ahead: usize,
}
