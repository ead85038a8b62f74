use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// The reference agentvc server.
pub struct AgentvcServer {
    state: AppState,
}

impl AgentvcServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        self.state.config()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Bind the configured address and serve until the task is cancelled.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config().bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, "agentvc server listening");
        axum::serve(listener, build_router(self.state))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
