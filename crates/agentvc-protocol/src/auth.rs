//! Signed write requests.
//!
//! Every mutating request carries `X-Agent-Id`, `X-Timestamp` and
//! `X-Signature`. The signature covers the canonical message
//!
//! ```text
//! METHOD\nPATH\nAGENT_ID\nTIMESTAMP[\nSHA256_HEX(BODY)]
//! ```
//!
//! where the body line is present only for non-empty bodies and `PATH` is the
//! request path without query string.

use agentvc_crypto::{sha256_hex, Identity, Signature, VerifyingKey};
use agentvc_types::AgentId;

use crate::error::{ProtocolError, ProtocolResult};
use crate::endpoint::headers;

/// Build the canonical message for a write request.
pub fn canonical_write_message(
    method: &str,
    path: &str,
    agent_id: &AgentId,
    timestamp: i64,
    body: &[u8],
) -> String {
    let mut message = format!(
        "{}\n{path}\n{agent_id}\n{timestamp}",
        method.to_ascii_uppercase()
    );
    if !body.is_empty() {
        message.push('\n');
        message.push_str(&sha256_hex(body));
    }
    message
}

/// Reject timestamps further than `window` seconds from `now`, either way.
pub fn check_freshness(timestamp: i64, now: i64, window: i64) -> ProtocolResult<()> {
    let skew = now.saturating_sub(timestamp).saturating_abs();
    if skew > window {
        return Err(ProtocolError::Expired(format!(
            "timestamp {timestamp} is {skew}s from server time"
        )));
    }
    Ok(())
}

/// The three authentication headers of a signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    pub agent_id: AgentId,
    pub timestamp: i64,
    pub signature: Signature,
}

impl SignedHeaders {
    /// Sign a request as `identity` at time `now`.
    pub fn sign(identity: &Identity, method: &str, path: &str, body: &[u8], now: i64) -> Self {
        let agent_id = identity.agent_id();
        let message = canonical_write_message(method, path, &agent_id, now, body);
        Self {
            agent_id,
            timestamp: now,
            signature: identity.sign(message.as_bytes()),
        }
    }

    /// Parse raw header values. Any missing or unparsable header is
    /// `Malformed`.
    pub fn from_header_values(
        agent_id: Option<&str>,
        timestamp: Option<&str>,
        signature: Option<&str>,
    ) -> ProtocolResult<Self> {
        let missing = |name: &str| ProtocolError::Malformed(format!("missing {name} header"));
        let agent_id = agent_id
            .ok_or_else(|| missing(headers::AGENT_ID))?
            .trim()
            .parse::<AgentId>()
            .map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        let timestamp = timestamp
            .ok_or_else(|| missing(headers::TIMESTAMP))?
            .trim()
            .parse::<i64>()
            .map_err(|e| ProtocolError::Malformed(format!("bad timestamp: {e}")))?;
        let signature = Signature::from_base64(signature.ok_or_else(|| missing(headers::SIGNATURE))?)?;
        Ok(Self {
            agent_id,
            timestamp,
            signature,
        })
    }

    /// Header name/value pairs to attach to an outgoing request.
    pub fn to_header_values(&self) -> [(&'static str, String); 3] {
        [
            (headers::AGENT_ID, self.agent_id.to_string()),
            (headers::TIMESTAMP, self.timestamp.to_string()),
            (headers::SIGNATURE, self.signature.to_base64()),
        ]
    }
}

/// Server-side check of a signed request against a known key.
///
/// Freshness is checked before the signature so a replayed request is
/// reported as expired rather than forged.
pub fn verify_signed_request(
    key: &VerifyingKey,
    method: &str,
    path: &str,
    signed: &SignedHeaders,
    body: &[u8],
    now: i64,
    window: i64,
) -> ProtocolResult<()> {
    check_freshness(signed.timestamp, now, window)?;
    let message = canonical_write_message(method, path, &signed.agent_id, signed.timestamp, body);
    key.verify(message.as_bytes(), &signed.signature)
        .map_err(|_| ProtocolError::SignatureMismatch("request signature does not verify".into()))
}
