use agentvc_protocol::endpoints;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::BRANCHES, get(handler::list_branches))
        .route(
            "/agent-card/branches/*branch",
            put(handler::push_branch).delete(handler::delete_branch),
        )
        .route(endpoints::VERIFY, post(handler::verify_login))
        .route(
            "/agents/:agent_id/.well-known/agent-card.json",
            get(handler::get_card),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
