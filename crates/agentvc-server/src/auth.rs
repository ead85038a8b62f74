//! Request authentication: signed writes, trust on first use, and challenge
//! responses.

use agentvc_crypto::{Signature, VerifyingKey};
use agentvc_protocol::{headers, verify_signed_request, ChallengeToken, ProtocolError, SignedHeaders};
use agentvc_types::{AgentCard, AgentId};
use axum::http::{HeaderMap, Method};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

fn header<'a>(map: &'a HeaderMap, name: &str) -> ServerResult<Option<&'a str>> {
    map.get(name)
        .map(|v| {
            v.to_str()
                .map_err(|_| ProtocolError::Malformed(format!("{name} is not ASCII")).into())
        })
        .transpose()
}

/// Parse the `X-Agent-Id`, `X-Timestamp` and `X-Signature` headers.
pub fn signed_headers(map: &HeaderMap) -> ServerResult<SignedHeaders> {
    Ok(SignedHeaders::from_header_values(
        header(map, headers::AGENT_ID)?,
        header(map, headers::TIMESTAMP)?,
        header(map, headers::SIGNATURE)?,
    )?)
}

/// Verify a signed request against the agent's pinned key.
pub fn authenticate(
    state: &AppState,
    method: &Method,
    path: &str,
    signed: &SignedHeaders,
    body: &[u8],
) -> ServerResult<()> {
    let key = state.pinned_key(&signed.agent_id).ok_or_else(|| {
        ProtocolError::UnknownIdentity(format!("no key pinned for agent {}", signed.agent_id))
    })?;
    verify_signed_request(
        &key,
        method.as_str(),
        path,
        signed,
        body,
        state.now(),
        state.config().replay_window_secs,
    )?;
    Ok(())
}

/// Trust-on-first-use for an unpinned agent writing `main`.
///
/// The key is taken from the submitted card, must derive the declared agent
/// id, and must verify the request. Only then is it pinned.
pub fn authenticate_first_use(
    state: &AppState,
    method: &Method,
    path: &str,
    signed: &SignedHeaders,
    body: &[u8],
    card: &AgentCard,
) -> ServerResult<VerifyingKey> {
    let field = card.public_key.as_deref().ok_or_else(|| {
        ServerError::BadRequest("first push to main must carry publicKey".into())
    })?;
    let key = VerifyingKey::from_field(field).map_err(ProtocolError::from)?;
    if key.to_agent_id() != signed.agent_id {
        return Err(ProtocolError::SignatureMismatch(
            "publicKey does not derive the declared agent id".into(),
        )
        .into());
    }
    verify_signed_request(
        &key,
        method.as_str(),
        path,
        signed,
        body,
        state.now(),
        state.config().replay_window_secs,
    )?;
    Ok(state.pin_key(signed.agent_id, key))
}

/// The `X-Challenge` / `X-Signature` pair, if the client sent one.
pub fn challenge_response(map: &HeaderMap) -> ServerResult<Option<(ChallengeToken, Signature)>> {
    let (Some(token), Some(sig)) = (
        header(map, headers::CHALLENGE)?,
        header(map, headers::SIGNATURE)?,
    ) else {
        return Ok(None);
    };
    let sig = Signature::from_base64(sig).map_err(ProtocolError::from)?;
    Ok(Some((ChallengeToken::from_string(token), sig)))
}

/// Verify a challenge response for reading `branch` of `agent_id`.
pub fn verify_challenge(
    state: &AppState,
    agent_id: &AgentId,
    branch: &str,
    client_key: &VerifyingKey,
    token: &ChallengeToken,
    signature: &Signature,
) -> ServerResult<()> {
    token.verify_response(
        &state.server_key().verifying_key(),
        agent_id,
        branch,
        client_key,
        signature,
        state.now(),
    )?;
    Ok(())
}
