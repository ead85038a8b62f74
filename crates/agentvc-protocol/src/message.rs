use agentvc_types::{AgentCard, AgentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

/// `PUT /agent-card/branches/{branch}` body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushBranchRequest {
    pub card_json: AgentCard,
    pub commit_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushBranchResponse {
    pub success: bool,
    pub branch: String,
    pub commit_hash: String,
}

/// One entry of `GET /agent-card/branches`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBranch {
    pub name: String,
    pub commit_hash: String,
    pub pushed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBranchesResponse {
    pub branches: Vec<RemoteBranch>,
}

/// 401 body for a protected read without a valid challenge response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub challenge: String,
    /// Unix seconds.
    pub expires: i64,
}

/// `POST /agent-card/verify` success body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub agent_id: AgentId,
    pub domain: String,
    pub card: AgentCard,
}

/// Body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_request_field_names() {
        let req = PushBranchRequest {
            card_json: AgentCard::new("a"),
            commit_hash: "ab".repeat(32),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["card_json"]["name"], json!("a"));
        assert_eq!(value["commit_hash"], json!("ab".repeat(32)));
    }

    #[test]
    fn error_body_shape() {
        let value = serde_json::to_value(ErrorBody::new("nope")).unwrap();
        assert_eq!(value, json!({"error": "nope"}));
    }

    #[test]
    fn list_response_parses() {
        let body = json!({
            "branches": [
                {"name": "main", "commit_hash": "00", "pushed_at": "2024-01-01T00:00:00Z"}
            ]
        });
        let parsed: ListBranchesResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.branches[0].name, "main");
    }
}
