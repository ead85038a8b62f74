use agentvc_protocol::{LoginProof, RemoteBranch, VerifyResponse};
use agentvc_types::{AgentCard, ObjectId};
use async_trait::async_trait;

use crate::error::SyncResult;
use crate::types::{BranchPush, PushOutcome};

/// A remote that hosts agent card branches.
#[async_trait]
pub trait CardRemote: Send + Sync {
    /// Push one branch snapshot.
    ///
    /// Rejections and transport failures come back as a failed outcome; only
    /// local preconditions (no identity) are errors.
    async fn push_branch(
        &self,
        branch: &str,
        card: &AgentCard,
        commit: &ObjectId,
    ) -> SyncResult<PushOutcome>;

    /// Branches the remote holds for this agent.
    async fn list_remote_branches(&self) -> SyncResult<Vec<RemoteBranch>>;

    /// Delete a branch on the remote.
    async fn delete_remote_branch(&self, branch: &str) -> SyncResult<()>;

    /// Fetch the card of `branch` from a per-agent card URL.
    async fn fetch_branch_card(&self, card_url: &str, branch: &str) -> SyncResult<AgentCard>;

    /// Ask the remote to verify a login proof.
    async fn verify_login(&self, proof: &LoginProof) -> SyncResult<VerifyResponse>;

    /// Push branches in the given order, one outcome each. A failed branch
    /// does not stop the rest.
    async fn push_all(&self, branches: &[BranchPush]) -> SyncResult<Vec<PushOutcome>> {
        let mut outcomes = Vec::with_capacity(branches.len());
        for push in branches {
            outcomes.push(self.push_branch(&push.branch, &push.card, &push.commit).await?);
        }
        Ok(outcomes)
    }
}
