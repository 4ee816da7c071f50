//! StudyHub - Study goal and Pomodoro session tracker.
//!
//! Runs the HTTP API backing the StudyHub web frontend: session
//! logging, study goal CRUD, and weekly analytics.

use std::sync::Arc;

use studyhub::database::Database;
use studyhub::server::{run_server, DEFAULT_PORT};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("studyhub=info")),
        )
        .init();

    let db = Arc::new(Database::open()?);
    tracing::info!("Database initialized");

    let port = std::env::var("STUDYHUB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    run_server(db, port).await?;

    tracing::info!("StudyHub has exited");
    Ok(())
}
