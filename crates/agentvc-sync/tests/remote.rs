use std::sync::Arc;

use agentvc_crypto::Identity;
use agentvc_protocol::LoginProof;
use agentvc_server::{build_router, AppState, ServerConfig};
use agentvc_sync::{verify_login_locally, BranchPush, CardRemote, HttpRemote, SyncError};
use agentvc_types::{AgentCard, ObjectId, MAIN_BRANCH};

/// Spin up the reference server on an OS-assigned port, returning the base URL.
async fn spawn_test_server() -> String {
    let app = build_router(AppState::new(ServerConfig::default()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

fn main_card(identity: &Identity) -> AgentCard {
    AgentCard::new("Scout").with_public_key(identity.public_key_field())
}

fn commit(b: u8) -> ObjectId {
    ObjectId::from_hash([b; 32])
}

async fn connected() -> (HttpRemote, Arc<Identity>) {
    let base = spawn_test_server().await;
    let identity = Arc::new(Identity::generate());
    let remote = HttpRemote::new(&base, Some(identity.clone())).unwrap();
    (remote, identity)
}

#[tokio::test]
async fn push_main_then_branch() {
    let (remote, identity) = connected().await;

    let outcome = remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    assert!(outcome.success, "{:?}", outcome.error);

    let outcome = remote
        .push_branch("faam.io", &AgentCard::new("Scout"), &commit(2))
        .await
        .unwrap();
    assert!(outcome.success);

    let branches = remote.list_remote_branches().await.unwrap();
    let names: Vec<_> = branches.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["faam.io", "main"]);
    assert_eq!(branches[1].commit_hash, commit(1).to_hex());
}

#[tokio::test]
async fn rejected_push_is_a_failed_outcome_with_server_text() {
    let (remote, _identity) = connected().await;
    let outcome = remote
        .push_branch("faam.io", &AgentCard::new("Scout"), &commit(1))
        .await
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("push main first"));
}

#[tokio::test]
async fn unreachable_remote_is_a_failed_outcome() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let identity = Arc::new(Identity::generate());
    let remote = HttpRemote::new(&format!("http://127.0.0.1:{port}"), Some(identity.clone())).unwrap();
    let outcome = remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn push_all_continues_past_failures() {
    let (remote, identity) = connected().await;
    let branches = vec![
        BranchPush {
            branch: "early".into(),
            card: AgentCard::new("Scout"),
            commit: commit(1),
        },
        BranchPush {
            branch: MAIN_BRANCH.into(),
            card: main_card(&identity),
            commit: commit(2),
        },
        BranchPush {
            branch: "late".into(),
            card: AgentCard::new("Scout"),
            commit: commit(3),
        },
    ];
    let outcomes = remote.push_all(&branches).await.unwrap();
    let results: Vec<_> = outcomes.iter().map(|o| (o.branch.as_str(), o.success)).collect();
    assert_eq!(results, vec![("early", false), ("main", true), ("late", true)]);
}

#[tokio::test]
async fn delete_remote_branch() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    remote
        .push_branch("tmp", &AgentCard::new("Scout"), &commit(2))
        .await
        .unwrap();

    remote.delete_remote_branch("tmp").await.unwrap();
    assert_eq!(remote.list_remote_branches().await.unwrap().len(), 1);

    match remote.delete_remote_branch("tmp").await {
        Err(SyncError::RemoteError { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("tmp"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    match remote.delete_remote_branch(MAIN_BRANCH).await {
        Err(SyncError::RemoteError { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn list_before_any_push_is_unknown_identity() {
    let (remote, _identity) = connected().await;
    match remote.list_remote_branches().await {
        Err(SyncError::RemoteError { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_main_anonymously() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    let card_url = remote.default_card_url(&identity.agent_id()).unwrap();

    let anonymous = HttpRemote::new(remote.base_url().as_str(), None).unwrap();
    let card = anonymous.fetch_branch_card(&card_url, MAIN_BRANCH).await.unwrap();
    assert_eq!(card.public_key.as_deref(), Some(identity.public_key_field()));
}

#[tokio::test]
async fn reserved_characters_cannot_reach_main() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();

    let mut scratch = AgentCard::new("Scout");
    scratch.description = "scratch only".into();
    for name in ["main#scratch", "a%41"] {
        let outcome = remote.push_branch(name, &scratch, &commit(2)).await.unwrap();
        assert!(!outcome.success, "{name}");
    }

    let names: Vec<_> = remote
        .list_remote_branches()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["main"]);

    let card_url = remote.default_card_url(&identity.agent_id()).unwrap();
    let card = remote.fetch_branch_card(&card_url, MAIN_BRANCH).await.unwrap();
    assert_eq!(card.description, AgentCard::new("Scout").description);
    assert_eq!(card.public_key.as_deref(), Some(identity.public_key_field()));
}

#[tokio::test]
async fn main_push_without_pinned_key_is_rejected() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    let outcome = remote
        .push_branch(MAIN_BRANCH, &AgentCard::new("Scout"), &commit(2))
        .await
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("pinned publicKey"));
}

#[tokio::test]
async fn fetch_protected_branch_answers_challenge() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    let mut private = AgentCard::new("Scout");
    private.description = "faam only".into();
    remote
        .push_branch("faam.io", &private, &commit(2))
        .await
        .unwrap();

    let card_url = remote.default_card_url(&identity.agent_id()).unwrap();
    let card = remote.fetch_branch_card(&card_url, "faam.io").await.unwrap();
    assert_eq!(card.description, "faam only");
}

#[tokio::test]
async fn fetch_protected_branch_as_another_agent_is_refused() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    remote
        .push_branch("faam.io", &AgentCard::new("Scout"), &commit(2))
        .await
        .unwrap();
    let card_url = remote.default_card_url(&identity.agent_id()).unwrap();

    let stranger =
        HttpRemote::new(remote.base_url().as_str(), Some(Arc::new(Identity::generate()))).unwrap();
    match stranger.fetch_branch_card(&card_url, "faam.io").await {
        Err(SyncError::RemoteError { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_verification_remote_and_local() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    let now = chrono::Utc::now().timestamp();
    let proof = LoginProof::sign(&identity, "faam.io", now).unwrap();

    let verified = remote.verify_login(&proof).await.unwrap();
    assert!(verified.verified);
    assert_eq!(verified.agent_id, identity.agent_id());

    let card_url = remote.default_card_url(&identity.agent_id()).unwrap();
    let card = verify_login_locally(&remote, &card_url, &proof, "faam.io")
        .await
        .unwrap();
    assert_eq!(card.name, "Scout");

    let wrong_site = verify_login_locally(&remote, &card_url, &proof, "discord.com").await;
    assert!(matches!(wrong_site, Err(SyncError::Protocol(_))));
}

#[tokio::test]
async fn stale_login_proof_is_rejected_remotely() {
    let (remote, identity) = connected().await;
    remote
        .push_branch(MAIN_BRANCH, &main_card(&identity), &commit(1))
        .await
        .unwrap();
    let stale = LoginProof::sign(&identity, "faam.io", chrono::Utc::now().timestamp() - 1000).unwrap();
    match remote.verify_login(&stale).await {
        Err(SyncError::RemoteError { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_without_challenge_keeps_server_text() {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    let app = Router::new().route(
        "/card",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "card access revoked" })),
            )
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://127.0.0.1:{port}");
    let remote = HttpRemote::new(&base, Some(Arc::new(Identity::generate()))).unwrap();
    match remote.fetch_branch_card(&format!("{base}/card"), "faam.io").await {
        Err(SyncError::RemoteError { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "card access revoked");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}
