//! Repository configuration, stored as `.agentvc/config.toml`.
//!
//! ```toml
//! author = "Scout <ops@example.com>"
//! card_file = "agent-card.json"
//!
//! [remotes.origin]
//! url = "https://cards.example.com"
//! card_url = "https://cards.example.com/agents/<id>/.well-known/agent-card.json"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};

/// Working document file name, relative to the repository root.
pub const DEFAULT_CARD_FILE: &str = "agent-card.json";

/// Remote used when a command does not name one.
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Author label recorded in commits. Falls back to the agent id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub card_file: String,
    pub remotes: BTreeMap<String, RemoteConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the card hosting service.
    pub url: String,
    /// Per-agent card endpoint. When unset the reference server layout under
    /// `url` is assumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_url: Option<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            author: None,
            card_file: DEFAULT_CARD_FILE.to_string(),
            remotes: BTreeMap::new(),
        }
    }
}

impl RepoConfig {
    pub fn from_toml_str(text: &str) -> RepoResult<Self> {
        toml::from_str(text).map_err(|e| RepoError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> RepoResult<String> {
        toml::to_string_pretty(self).map_err(|e| RepoError::Config(e.to_string()))
    }

    /// Load from `path`. Missing keys take their defaults.
    pub fn load(path: &Path) -> RepoResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn save(&self, path: &Path) -> RepoResult<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn remote(&self, name: &str) -> RepoResult<&RemoteConfig> {
        self.remotes.get(name).ok_or_else(|| RepoError::NotFound {
            kind: "remote",
            name: name.to_string(),
        })
    }
}
