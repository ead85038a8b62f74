/// HTTP endpoint paths.
pub mod endpoints {
    pub const BRANCHES: &str = "/agent-card/branches";
    pub const VERIFY: &str = "/agent-card/verify";
    pub const HEALTH: &str = "/health";

    /// Public card path for an agent on the reference server.
    pub fn agent_card(agent_id: &str) -> String {
        format!("/agents/{agent_id}/.well-known/agent-card.json")
    }
}

/// Request header names.
pub mod headers {
    pub const AGENT_ID: &str = "x-agent-id";
    pub const TIMESTAMP: &str = "x-timestamp";
    pub const SIGNATURE: &str = "x-signature";
    pub const CHALLENGE: &str = "x-challenge";
}

/// Maximum clock skew accepted on signed requests and login proofs.
pub const REPLAY_WINDOW_SECS: i64 = 300;

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_defaults() {
        let h = HealthResponse::default();
        assert_eq!(h.status, "ok");
        assert_eq!(h.protocol_version, 1);
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(endpoints::BRANCHES, "/agent-card/branches");
        assert_eq!(
            endpoints::agent_card("abc"),
            "/agents/abc/.well-known/agent-card.json"
        );
    }
}
