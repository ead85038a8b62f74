use agentvc_protocol::{
    ChallengeResponse, ChallengeToken, HealthResponse, ListBranchesResponse, LoginProof,
    PushBranchRequest, PushBranchResponse, RemoteBranch, VerifyResponse,
};
use agentvc_refs::validate_branch_name;
use agentvc_types::{AgentId, ObjectId, MAIN_BRANCH};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth;
use crate::error::{ServerError, ServerResult};
use crate::state::{AppState, HostedBranch};

fn check_branch(name: &str) -> ServerResult<()> {
    validate_branch_name(name).map_err(|e| ServerError::BadRequest(e.to_string()))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `PUT /agent-card/branches/{branch}`
pub async fn push_branch(
    State(state): State<AppState>,
    Path(branch): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<PushBranchResponse>> {
    check_branch(&branch)?;
    let signed = auth::signed_headers(&headers)?;
    let request: PushBranchRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid push body: {e}")))?;
    ObjectId::from_hex(&request.commit_hash)
        .map_err(|e| ServerError::BadRequest(format!("invalid commit_hash: {e}")))?;

    if let Some(pinned) = state.pinned_key(&signed.agent_id) {
        auth::authenticate(&state, &method, uri.path(), &signed, &body)?;
        if branch == MAIN_BRANCH
            && request.card_json.public_key.as_deref() != Some(pinned.to_field().as_str())
        {
            return Err(ServerError::BadRequest(
                "main card must carry the pinned publicKey".into(),
            ));
        }
    } else if branch == MAIN_BRANCH {
        auth::authenticate_first_use(&state, &method, uri.path(), &signed, &body, &request.card_json)?;
    } else {
        return Err(ServerError::NotFound(format!(
            "unknown agent {}: push main first",
            signed.agent_id
        )));
    }

    let hosted = HostedBranch {
        card: request.card_json,
        commit_hash: request.commit_hash.clone(),
        pushed_at: Utc::now(),
    };
    if !state.put_branch(&signed.agent_id, &branch, hosted) {
        return Err(ServerError::Internal("agent disappeared during push".into()));
    }
    tracing::info!(agent_id = %signed.agent_id, %branch, commit = %request.commit_hash, "branch pushed");

    Ok(Json(PushBranchResponse {
        success: true,
        branch,
        commit_hash: request.commit_hash,
    }))
}

/// `GET /agent-card/branches`
pub async fn list_branches(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> ServerResult<Json<ListBranchesResponse>> {
    let signed = auth::signed_headers(&headers)?;
    auth::authenticate(&state, &method, uri.path(), &signed, b"")?;
    let record = state
        .agent(&signed.agent_id)
        .ok_or_else(|| ServerError::NotFound(format!("unknown agent {}", signed.agent_id)))?;
    let branches = record
        .branches
        .into_iter()
        .map(|(name, b)| RemoteBranch {
            name,
            commit_hash: b.commit_hash,
            pushed_at: b.pushed_at,
        })
        .collect();
    Ok(Json(ListBranchesResponse { branches }))
}

/// `DELETE /agent-card/branches/{branch}`
pub async fn delete_branch(
    State(state): State<AppState>,
    Path(branch): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> ServerResult<Json<serde_json::Value>> {
    check_branch(&branch)?;
    if branch == MAIN_BRANCH {
        return Err(ServerError::BadRequest("the main branch cannot be deleted".into()));
    }
    let signed = auth::signed_headers(&headers)?;
    auth::authenticate(&state, &method, uri.path(), &signed, b"")?;
    if !state.remove_branch(&signed.agent_id, &branch) {
        return Err(ServerError::NotFound(format!("branch not found: {branch}")));
    }
    tracing::info!(agent_id = %signed.agent_id, %branch, "branch deleted");
    Ok(Json(serde_json::json!({ "success": true, "branch": branch })))
}

#[derive(Debug, Deserialize)]
pub struct CardQuery {
    pub branch: Option<String>,
}

/// `GET /agents/{agent_id}/.well-known/agent-card.json[?branch=NAME]`
///
/// `main` is public. Any other branch answers 401 with a fresh challenge
/// until the request carries a valid challenge response.
pub async fn get_card(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Query(query): Query<CardQuery>,
    headers: HeaderMap,
) -> ServerResult<Response> {
    let agent_id: AgentId = agent_id
        .parse()
        .map_err(|e: agentvc_types::TypeError| ServerError::BadRequest(e.to_string()))?;
    let branch = query.branch.unwrap_or_else(|| MAIN_BRANCH.to_string());
    check_branch(&branch)?;
    let record = state
        .agent(&agent_id)
        .ok_or_else(|| ServerError::NotFound(format!("unknown agent {agent_id}")))?;

    if branch != MAIN_BRANCH {
        match auth::challenge_response(&headers)? {
            Some((token, sig)) => {
                auth::verify_challenge(&state, &agent_id, &branch, &record.key, &token, &sig)?;
            }
            None => {
                let (token, claims) = ChallengeToken::issue(
                    state.server_key(),
                    agent_id,
                    &branch,
                    state.now(),
                    state.config().challenge_ttl_secs,
                )?;
                tracing::debug!(%agent_id, %branch, "issued challenge");
                let body = ChallengeResponse {
                    challenge: token.to_string(),
                    expires: claims.exp,
                };
                return Ok((StatusCode::UNAUTHORIZED, Json(body)).into_response());
            }
        }
    }

    let hosted = record
        .branches
        .get(&branch)
        .ok_or_else(|| ServerError::NotFound(format!("branch not found: {branch}")))?;
    Ok(Json(hosted.card.clone()).into_response())
}

/// `POST /agent-card/verify`
pub async fn verify_login(
    State(state): State<AppState>,
    body: Bytes,
) -> ServerResult<Json<VerifyResponse>> {
    let proof: LoginProof = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid proof: {e}")))?;
    let record = state
        .agent(&proof.agent_id)
        .ok_or_else(|| ServerError::NotFound(format!("unknown agent {}", proof.agent_id)))?;
    proof.verify(
        &record.public_key_field,
        &proof.domain,
        state.now(),
        state.config().replay_window_secs,
    )?;
    let card = record
        .branches
        .get(MAIN_BRANCH)
        .map(|b| b.card.clone())
        .ok_or_else(|| ServerError::NotFound("agent has no main card".into()))?;
    tracing::info!(agent_id = %proof.agent_id, domain = %proof.domain, "login verified");
    Ok(Json(VerifyResponse {
        verified: true,
        agent_id: proof.agent_id,
        domain: proof.domain,
        card,
    }))
}
