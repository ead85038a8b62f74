use agentvc_types::{AgentCard, ObjectId};
use serde::{Deserialize, Serialize};

/// One branch to push.
#[derive(Clone, Debug)]
pub struct BranchPush {
    pub branch: String,
    pub card: AgentCard,
    pub commit: ObjectId,
}

/// Result of pushing one branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOutcome {
    pub branch: String,
    pub commit: ObjectId,
    pub success: bool,
    /// Server error text (or transport failure) when `success` is false.
    pub error: Option<String>,
}

impl PushOutcome {
    pub fn ok(branch: impl Into<String>, commit: ObjectId) -> Self {
        Self {
            branch: branch.into(),
            commit,
            success: true,
            error: None,
        }
    }

    pub fn failed(branch: impl Into<String>, commit: ObjectId, error: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            commit,
            success: false,
            error: Some(error.into()),
        }
    }
}
