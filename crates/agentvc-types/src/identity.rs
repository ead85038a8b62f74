use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Namespace for agent identifier derivation.
///
/// Changing this value re-derives every agent identifier in existence, so it
/// is frozen.
pub const AGENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x4a0f8d3e_9b2c_4f61_a7e5_3c1d6b8f2e90);

/// Public identifier of an agent.
///
/// An `AgentId` is a name-based (version 5) UUID computed from
/// [`AGENT_ID_NAMESPACE`] and the canonical public-key field
/// (`"ed25519:<base64 key>"`). No registry assigns it: anyone holding the
/// public key can recompute it, and it cannot be rebound to another key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Derive an `AgentId` from a canonical public-key field.
    pub fn derive(public_key_field: &str) -> Self {
        Self(Uuid::new_v5(&AGENT_ID_NAMESPACE, public_key_field.as_bytes()))
    }

    /// Wrap an existing UUID. Use `derive()` for production code.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0.hyphenated())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for AgentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidAgentId(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "ed25519:AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
    const KEY_B: &str = "ed25519:Hx4dHBsaGRgXFhUUExIREA8ODQwLCgkIBwYFBAMCAQA=";

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(AgentId::derive(KEY_A), AgentId::derive(KEY_A));
    }

    #[test]
    fn different_keys_produce_different_ids() {
        assert_ne!(AgentId::derive(KEY_A), AgentId::derive(KEY_B));
    }

    #[test]
    fn derived_ids_are_version_5_rfc4122() {
        let id = AgentId::derive(KEY_A);
        assert_eq!(id.as_uuid().get_version_num(), 5);
        assert_eq!(id.as_uuid().get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn display_parse_roundtrip() {
        let id = AgentId::derive(KEY_A);
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<AgentId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "not-a-uuid".parse::<AgentId>(),
            Err(TypeError::InvalidAgentId(_))
        ));
    }

    #[test]
    fn short_id_is_prefix() {
        let id = AgentId::derive(KEY_A);
        assert_eq!(id.short_id().len(), 8);
        assert!(id.to_string().starts_with(&id.short_id()));
    }

    #[test]
    fn serde_is_plain_string() {
        let id = AgentId::derive(KEY_B);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
