use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use agentvc_protocol::{DEFAULT_CHALLENGE_TTL_SECS, REPLAY_WINDOW_SECS};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Accepted clock skew on signed requests and login proofs.
    pub replay_window_secs: i64,
    /// Lifetime of an issued challenge.
    pub challenge_ttl_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8787)),
            replay_window_secs: REPLAY_WINDOW_SECS,
            challenge_ttl_secs: DEFAULT_CHALLENGE_TTL_SECS,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
