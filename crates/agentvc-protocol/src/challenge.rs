//! Stateless challenge tokens for protected-branch reads.
//!
//! Token format: `base64url(claims_json).base64url(server_signature)`, where
//! the server signs the encoded claims string. The server keeps no record of
//! issued challenges: everything it needs to check a response is inside the
//! token and covered by its own signature.
//!
//! The client proves possession of its key by signing the raw token string
//! and returning it in `X-Challenge` with the signature in `X-Signature`.

use agentvc_crypto::{Signature, SigningKey, VerifyingKey};
use agentvc_types::AgentId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

pub const DEFAULT_CHALLENGE_TTL_SECS: i64 = 60;

/// What a challenge is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeClaims {
    pub nonce: String,
    pub agent_id: AgentId,
    pub branch: String,
    /// Unix seconds after which the challenge is refused.
    pub exp: i64,
}

/// An encoded, server-signed challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeToken(String);

impl ChallengeToken {
    /// Issue a challenge for reading `branch` of `agent_id`.
    pub fn issue(
        server_key: &SigningKey,
        agent_id: AgentId,
        branch: &str,
        now: i64,
        ttl_secs: i64,
    ) -> ProtocolResult<(Self, ChallengeClaims)> {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let claims = ChallengeClaims {
            nonce: hex::encode(nonce),
            agent_id,
            branch: branch.to_string(),
            exp: now + ttl_secs,
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let sig = server_key.sign(payload.as_bytes());
        let token = format!("{payload}.{}", URL_SAFE_NO_PAD.encode(sig.to_bytes()));
        Ok((Self(token), claims))
    }

    /// Wrap a token received from the wire.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the server's own signature and decode the claims.
    pub fn open(&self, server_key: &VerifyingKey) -> ProtocolResult<ChallengeClaims> {
        let (payload, sig) = self
            .0
            .split_once('.')
            .ok_or_else(|| ProtocolError::Malformed("challenge must have two parts".into()))?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|e| ProtocolError::Malformed(format!("challenge signature: {e}")))?;
        let sig = Signature::from_slice(&sig_bytes)?;
        server_key
            .verify(payload.as_bytes(), &sig)
            .map_err(|_| ProtocolError::SignatureMismatch("challenge was not issued here".into()))?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| ProtocolError::Malformed(format!("challenge payload: {e}")))?;
        serde_json::from_slice(&json)
            .map_err(|e| ProtocolError::Malformed(format!("challenge claims: {e}")))
    }

    /// Full server-side verification of a challenge response.
    ///
    /// Checks, in order: the server's signature on the token, expiry, binding
    /// to the requested agent and branch, then the client's signature over
    /// the raw token.
    pub fn verify_response(
        &self,
        server_key: &VerifyingKey,
        agent_id: &AgentId,
        branch: &str,
        client_key: &VerifyingKey,
        client_signature: &Signature,
        now: i64,
    ) -> ProtocolResult<ChallengeClaims> {
        let claims = self.open(server_key)?;
        if now > claims.exp {
            return Err(ProtocolError::Expired("challenge expired".into()));
        }
        if claims.agent_id != *agent_id || claims.branch != branch {
            return Err(ProtocolError::SignatureMismatch(
                "challenge was issued for a different agent or branch".into(),
            ));
        }
        client_key
            .verify(self.0.as_bytes(), client_signature)
            .map_err(|_| ProtocolError::SignatureMismatch("challenge response does not verify".into()))?;
        Ok(claims)
    }
}

impl std::fmt::Display for ChallengeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentvc_crypto::Identity;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        server: SigningKey,
        client: Identity,
    }

    fn fixture() -> Fixture {
        Fixture {
            server: SigningKey::from_bytes([1; 32]),
            client: Identity::from_signing_key(SigningKey::from_bytes([2; 32])),
        }
    }

    fn issue(f: &Fixture, branch: &str) -> ChallengeToken {
        ChallengeToken::issue(&f.server, f.client.agent_id(), branch, NOW, 60)
            .unwrap()
            .0
    }

    #[test]
    fn valid_response_accepted() {
        let f = fixture();
        let token = issue(&f, "faam.io");
        let sig = f.client.sign(token.as_str().as_bytes());
        let claims = token
            .verify_response(
                &f.server.verifying_key(),
                &f.client.agent_id(),
                "faam.io",
                f.client.verifying_key(),
                &sig,
                NOW + 10,
            )
            .unwrap();
        assert_eq!(claims.branch, "faam.io");
        assert_eq!(claims.exp, NOW + 60);
    }

    #[test]
    fn token_shape() {
        let f = fixture();
        let token = issue(&f, "b");
        let parts: Vec<_> = token.as_str().split('.').collect();
        assert_eq!(parts.len(), 2);
        assert!(!token.as_str().contains('='));
    }

    #[test]
    fn nonces_differ() {
        let f = fixture();
        assert_ne!(issue(&f, "b"), issue(&f, "b"));
    }

    #[test]
    fn expired_challenge() {
        let f = fixture();
        let token = issue(&f, "b");
        let sig = f.client.sign(token.as_str().as_bytes());
        let err = token
            .verify_response(
                &f.server.verifying_key(),
                &f.client.agent_id(),
                "b",
                f.client.verifying_key(),
                &sig,
                NOW + 61,
            )
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Expired(_)));
    }

    #[test]
    fn bound_to_branch() {
        let f = fixture();
        let token = issue(&f, "faam.io");
        let sig = f.client.sign(token.as_str().as_bytes());
        let err = token
            .verify_response(
                &f.server.verifying_key(),
                &f.client.agent_id(),
                "discord.com",
                f.client.verifying_key(),
                &sig,
                NOW,
            )
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn forged_token_rejected() {
        let f = fixture();
        let rogue = SigningKey::from_bytes([9; 32]);
        let (token, _) = ChallengeToken::issue(&rogue, f.client.agent_id(), "b", NOW, 60).unwrap();
        assert!(matches!(
            token.open(&f.server.verifying_key()),
            Err(ProtocolError::SignatureMismatch(_))
        ));
    }

    #[test]
    fn wrong_client_signature_rejected() {
        let f = fixture();
        let token = issue(&f, "b");
        let other = Identity::generate();
        let sig = other.sign(token.as_str().as_bytes());
        assert!(token
            .verify_response(
                &f.server.verifying_key(),
                &f.client.agent_id(),
                "b",
                f.client.verifying_key(),
                &sig,
                NOW,
            )
            .is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let f = fixture();
        let token = ChallengeToken::from_string("not-a-token");
        assert!(matches!(
            token.open(&f.server.verifying_key()),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
