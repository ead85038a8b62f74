//! Domain-bound login proofs.
//!
//! An agent proves its identity to a third-party site by signing
//! `AGENT_ID\nDOMAIN\nTIMESTAMP`. The verifier rebuilds the message with the
//! domain it expects, so a proof minted for one site never verifies on
//! another.

use agentvc_crypto::{Identity, Signature, VerifyingKey};
use agentvc_types::AgentId;
use serde::{Deserialize, Serialize};

use crate::auth::check_freshness;
use crate::error::{ProtocolError, ProtocolResult};

/// A signed login proof, as posted to the verification endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginProof {
    pub agent_id: AgentId,
    pub domain: String,
    pub timestamp: i64,
    /// Standard base64.
    pub signature: String,
}

impl LoginProof {
    /// The message that gets signed.
    pub fn message(agent_id: &AgentId, domain: &str, timestamp: i64) -> String {
        format!("{agent_id}\n{domain}\n{timestamp}")
    }

    /// Produce a proof for `domain` at time `now`.
    pub fn sign(identity: &Identity, domain: &str, now: i64) -> ProtocolResult<Self> {
        if domain.is_empty() || domain.contains('\n') {
            return Err(ProtocolError::Malformed(
                "domain must be a non-empty single line".into(),
            ));
        }
        let agent_id = identity.agent_id();
        let sig = identity.sign(Self::message(&agent_id, domain, now).as_bytes());
        Ok(Self {
            agent_id,
            domain: domain.to_string(),
            timestamp: now,
            signature: sig.to_base64(),
        })
    }

    /// Verify this proof for `expected_domain` against the agent's published
    /// public-key field.
    ///
    /// The key must derive this proof's agent id, so a card carrying someone
    /// else's key cannot vouch for the claimed identity.
    pub fn verify(
        &self,
        public_key_field: &str,
        expected_domain: &str,
        now: i64,
        window: i64,
    ) -> ProtocolResult<()> {
        check_freshness(self.timestamp, now, window)?;
        let key = VerifyingKey::from_field(public_key_field)?;
        if key.to_agent_id() != self.agent_id {
            return Err(ProtocolError::SignatureMismatch(
                "public key does not belong to this agent".into(),
            ));
        }
        let sig = Signature::from_base64(&self.signature)?;
        let message = Self::message(&self.agent_id, expected_domain, self.timestamp);
        key.verify(message.as_bytes(), &sig).map_err(|_| {
            ProtocolError::SignatureMismatch(format!(
                "signature does not verify for domain {expected_domain}"
            ))
        })
    }
}
