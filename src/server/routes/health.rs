//! Health check endpoint.

use axum::Json;
use serde_json::{json, Value};

/// GET /health - Liveness probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
