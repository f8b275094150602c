//! HTTP server exposing the generation pipeline and interview protocol
//! over REST plus a real-time SSE event stream per run.

pub mod routes;
pub mod state;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use state::AppState;

/// Default port for the server
pub const DEFAULT_PORT: u16 = 8970;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            host: "127.0.0.1".to_string(),
            cors_enabled: false,
        }
    }
}

/// Build the API router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(routes::health::health_check))
        // Runs
        .route("/api/roadmaps", post(routes::roadmaps::create_roadmap))
        .route("/api/roadmaps/:id", get(routes::roadmaps::get_roadmap))
        .route("/api/roadmaps/:id/events", get(routes::events::run_events))
        // Interviews
        .route("/api/interviews", post(routes::interviews::start_interview))
        .route(
            "/api/interviews/:id/answers",
            post(routes::interviews::submit_answers),
        )
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let app_config = Config::load().unwrap_or_default();
    let state = Arc::new(AppState::new(app_config).await?);

    let mut app = router(state).layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    tracing::info!("Starting learnpath server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
