//! Local verification of login proofs.

use agentvc_protocol::{LoginProof, REPLAY_WINDOW_SECS};
use agentvc_types::{AgentCard, MAIN_BRANCH};

use crate::error::{SyncError, SyncResult};
use crate::transport::CardRemote;

/// Verify `proof` for `expected_domain` by fetching the agent's public
/// `main` card from `card_url` and checking against its `publicKey`.
///
/// Returns the fetched card on success.
pub async fn verify_login_locally<R: CardRemote + ?Sized>(
    remote: &R,
    card_url: &str,
    proof: &LoginProof,
    expected_domain: &str,
) -> SyncResult<AgentCard> {
    let card = remote.fetch_branch_card(card_url, MAIN_BRANCH).await?;
    let key = card.public_key.as_deref().ok_or_else(|| {
        SyncError::UnexpectedResponse("published card carries no publicKey".into())
    })?;
    proof.verify(
        key,
        expected_domain,
        chrono::Utc::now().timestamp(),
        REPLAY_WINDOW_SECS,
    )?;
    Ok(card)
}
