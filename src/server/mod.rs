//! HTTP server module for the StudyHub API.
//!
//! Serves session logging, study goal CRUD, and the weekly analytics
//! endpoint to the web frontend.

pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{delete, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::database::Database;
use crate::server::routes::{health, sessions, stats, tasks};
use crate::server::state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 7420;

/// Builds the API router over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    // CORS layer for frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Stats API
        .route("/api/stats/weekly", get(stats::get_weekly_summary))
        // Sessions API
        .route(
            "/api/sessions",
            get(sessions::get_sessions).post(sessions::create_session),
        )
        // Tasks API
        .route("/api/tasks", get(tasks::get_tasks).post(tasks::create_task))
        .route("/api/tasks/:id", delete(tasks::delete_task))
        .layer(cors)
        .with_state(state)
}

/// Runs the axum server until shutdown.
pub async fn run_server(db: Arc<Database>, port: u16) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(db));
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("HTTP server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
