//! HTTP implementation of [`CardRemote`].

use std::sync::Arc;
use std::time::Duration;

use agentvc_crypto::Identity;
use agentvc_protocol::{
    endpoints, headers, ChallengeResponse, ErrorBody, ListBranchesResponse, LoginProof,
    PushBranchRequest, PushBranchResponse, RemoteBranch, SignedHeaders, VerifyResponse,
};
use agentvc_types::{AgentCard, AgentId, ObjectId, MAIN_BRANCH};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{SyncError, SyncResult};
use crate::transport::CardRemote;
use crate::types::PushOutcome;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A card hosting service reached over HTTP.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
    base: Url,
    identity: Option<Arc<Identity>>,
}

impl HttpRemote {
    /// Remote at `base_url`, acting as `identity` when one is loaded.
    pub fn new(base_url: &str, identity: Option<Arc<Identity>>) -> SyncResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(client, base_url, identity)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        identity: Option<Arc<Identity>>,
    ) -> SyncResult<Self> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SyncError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client,
            base,
            identity,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Card URL for `agent_id` on a server laid out like the reference one.
    pub fn default_card_url(&self, agent_id: &AgentId) -> SyncResult<String> {
        Ok(self.url(&endpoints::agent_card(&agent_id.to_string()))?.to_string())
    }

    fn identity(&self) -> SyncResult<&Identity> {
        self.identity.as_deref().ok_or(SyncError::AuthRequired)
    }

    fn url(&self, path: &str) -> SyncResult<Url> {
        let base = self.base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{path}")).map_err(|e| SyncError::InvalidUrl(e.to_string()))
    }

    /// URL of a single branch resource. Each `/`-separated component is
    /// percent-encoded as its own path segment.
    fn branch_url(&self, branch: &str) -> SyncResult<Url> {
        let mut url = self.url(endpoints::BRANCHES)?;
        url.path_segments_mut()
            .map_err(|_| SyncError::InvalidUrl(format!("{} cannot carry a path", self.base)))?
            .extend(branch.split('/'));
        Ok(url)
    }

    /// Build a request carrying the signed-write headers. The signature
    /// covers the URL's path as it will appear on the wire.
    fn signed(&self, method: Method, url: Url, body: Vec<u8>) -> SyncResult<RequestBuilder> {
        let identity = self.identity()?;
        let now = chrono::Utc::now().timestamp();
        let signed = SignedHeaders::sign(identity, method.as_str(), url.path(), &body, now);
        let mut request = self.client.request(method, url);
        for (name, value) in signed.to_header_values() {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        Ok(request)
    }
}

/// The server's `error` text, or the status line if the body has none.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => {
            let text = String::from_utf8_lossy(body);
            if text.trim().is_empty() {
                status.to_string()
            } else {
                text.into_owned()
            }
        }
    }
}

async fn error_text(response: Response) -> String {
    let status = response.status();
    match response.bytes().await {
        Ok(body) => error_message(status, &body),
        Err(_) => status.to_string(),
    }
}

async fn remote_error(response: Response) -> SyncError {
    let status = response.status().as_u16();
    SyncError::RemoteError {
        status,
        message: error_text(response).await,
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> SyncResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SyncError::UnexpectedResponse(e.to_string()))
}

#[async_trait]
impl CardRemote for HttpRemote {
    async fn push_branch(
        &self,
        branch: &str,
        card: &AgentCard,
        commit: &ObjectId,
    ) -> SyncResult<PushOutcome> {
        let body = serde_json::to_vec(&PushBranchRequest {
            card_json: card.clone(),
            commit_hash: commit.to_hex(),
        })
        .map_err(|e| SyncError::Serialization(e.to_string()))?;
        let url = self.branch_url(branch)?;
        let request = self.signed(Method::PUT, url, body)?;

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%branch, error = %e, "push failed to reach remote");
                return Ok(PushOutcome::failed(branch, *commit, e.to_string()));
            }
        };
        if !response.status().is_success() {
            let message = error_text(response).await;
            tracing::warn!(%branch, %message, "push rejected");
            return Ok(PushOutcome::failed(branch, *commit, message));
        }
        match parse_json::<PushBranchResponse>(response).await {
            Ok(ack) if ack.success => {
                tracing::info!(%branch, %commit, "pushed branch");
                Ok(PushOutcome::ok(branch, *commit))
            }
            Ok(_) => Ok(PushOutcome::failed(branch, *commit, "remote reported failure")),
            Err(e) => Ok(PushOutcome::failed(branch, *commit, e.to_string())),
        }
    }

    async fn list_remote_branches(&self) -> SyncResult<Vec<RemoteBranch>> {
        let url = self.url(endpoints::BRANCHES)?;
        let response = self.signed(Method::GET, url, Vec::new())?.send().await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(parse_json::<ListBranchesResponse>(response).await?.branches)
    }

    async fn delete_remote_branch(&self, branch: &str) -> SyncResult<()> {
        let url = self.branch_url(branch)?;
        let response = self.signed(Method::DELETE, url, Vec::new())?.send().await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        tracing::info!(%branch, "deleted remote branch");
        Ok(())
    }

    async fn fetch_branch_card(&self, card_url: &str, branch: &str) -> SyncResult<AgentCard> {
        let mut url =
            Url::parse(card_url).map_err(|e| SyncError::InvalidUrl(format!("{card_url}: {e}")))?;
        if branch == MAIN_BRANCH {
            let response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(remote_error(response).await);
            }
            return parse_json(response).await;
        }

        let identity = self.identity()?;
        url.query_pairs_mut().append_pair("branch", branch);
        let response = self.client.get(url.clone()).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            if !response.status().is_success() {
                return Err(remote_error(response).await);
            }
            return parse_json(response).await;
        }

        let status = response.status();
        let body = response.bytes().await?;
        let challenge: ChallengeResponse = match serde_json::from_slice(&body) {
            Ok(challenge) => challenge,
            Err(_) => {
                return Err(SyncError::RemoteError {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                })
            }
        };
        tracing::debug!(%branch, expires = challenge.expires, "answering challenge");
        let signature = identity.sign(challenge.challenge.as_bytes());
        let response = self
            .client
            .get(url)
            .header(headers::CHALLENGE, &challenge.challenge)
            .header(headers::SIGNATURE, signature.to_base64())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        parse_json(response).await
    }

    async fn verify_login(&self, proof: &LoginProof) -> SyncResult<VerifyResponse> {
        let url = self.url(endpoints::VERIFY)?;
        let response = self.client.post(url).json(proof).send().await?;
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        parse_json(response).await
    }
}

impl std::fmt::Debug for HttpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemote")
            .field("base", &self.base.as_str())
            .field("identity", &self.identity.as_ref().map(|i| i.agent_id()))
            .finish()
    }
}
