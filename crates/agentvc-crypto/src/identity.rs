use agentvc_types::AgentId;

use crate::signer::{Signature, SigningKey, VerifyingKey};

/// A loaded agent identity: the signing key plus everything derived from it.
pub struct Identity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    public_key_field: String,
    agent_id: AgentId,
}

impl Identity {
    /// Build an identity around an existing signing key.
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        let public_key_field = verifying_key.to_field();
        let agent_id = AgentId::derive(&public_key_field);
        Self {
            signing_key,
            verifying_key,
            public_key_field,
            agent_id,
        }
    }

    /// A fresh random identity (not persisted).
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate())
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Canonical `"ed25519:<base64>"` public-key field.
    pub fn public_key_field(&self) -> &str {
        &self.public_key_field
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("agent_id", &self.agent_id)
            .field("public_key", &self.public_key_field)
            .finish_non_exhaustive()
    }
}
