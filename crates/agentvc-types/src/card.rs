//! The agent card: the document agentvc versions.
//!
//! The schema is fixed. Fields the schema does not name are kept in
//! `extensions` so a round trip through agentvc never drops data, but they do
//! not participate in structural diffs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// The only branch that carries the public key and is readable anonymously.
pub const MAIN_BRANCH: &str = "main";

/// The versioned agent identity document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// `"ed25519:<base64>"`; present only on the `main` branch snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    #[serde(default)]
    pub default_input_modes: Vec<String>,
    #[serde(default)]
    pub default_output_modes: Vec<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Organization that operates the agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub organization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Optional protocol features the agent supports.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_transition_history: Option<bool>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// One advertised skill. Skills are identified by `id`, unique per card.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
    /// Pointer to an external skill description, resolved at commit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl AgentCard {
    /// A minimal card with the given display name and text-only modes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.1.0".into(),
            default_input_modes: vec!["text".into()],
            default_output_modes: vec!["text".into()],
            ..Self::default()
        }
    }

    /// Parse a card from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TypeError> {
        serde_json::from_str(text).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Parse a card from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
        serde_json::from_slice(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Canonical serialized form: pretty JSON with a trailing newline.
    ///
    /// Field order is fixed by the struct definition and extension maps are
    /// sorted, so equal cards always produce identical bytes. These are the
    /// bytes that get content-addressed.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, TypeError> {
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|e| TypeError::Serialization(e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Canonical form as a string.
    pub fn to_canonical_json(&self) -> Result<String, TypeError> {
        let bytes = self.to_canonical_bytes()?;
        String::from_utf8(bytes).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Look up a skill by id.
    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Copy of this card with `publicKey` set to `field`.
    pub fn with_public_key(mut self, field: impl Into<String>) -> Self {
        self.public_key = Some(field.into());
        self
    }

    /// Copy of this card with `publicKey` removed.
    pub fn without_public_key(mut self) -> Self {
        self.public_key = None;
        self
    }
}

impl Skill {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}
