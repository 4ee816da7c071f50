//! Practice session endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::state::AppState;
use crate::store::RawSession;

/// Query parameters for listing sessions.
#[derive(Deserialize)]
pub struct SessionsQuery {
    /// Owner of the sessions.
    pub user_id: String,
    /// Max results (default 100, capped at 1000).
    pub limit: Option<usize>,
}

/// Response wrapper with metadata.
#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<RawSession>,
    pub total: usize,
}

/// GET /api/sessions?user_id=&limit= - Recent sessions, newest first.
pub async fn get_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SessionsQuery>,
) -> Json<SessionsResponse> {
    let limit = query.limit.unwrap_or(100).min(1000);

    match state.db.recent_sessions(&query.user_id, limit) {
        Ok(sessions) => Json(SessionsResponse {
            total: sessions.len(),
            sessions,
        }),
        Err(e) => {
            tracing::warn!(user_id = %query.user_id, ?e, "Failed to query sessions");
            Json(SessionsResponse {
                sessions: vec![],
                total: 0,
            })
        }
    }
}

/// Request body for logging a practice session.
#[derive(Deserialize)]
pub struct NewSession {
    pub user_id: String,
    pub task_id: Option<String>,
    /// RFC 3339; defaults to now when no timestamp is given at all.
    pub created_at: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub is_pomodoro: bool,
}

/// POST /api/sessions - Log a practice session.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewSession>,
) -> Result<Json<RawSession>, StatusCode> {
    if body.user_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.db.save_session(
        &body.user_id,
        body.task_id.as_deref(),
        body.created_at.as_deref(),
        body.started_at.as_deref(),
        body.ended_at.as_deref(),
        body.duration_minutes,
        body.is_pomodoro,
    ) {
        Ok(saved) => Ok(Json(saved)),
        Err(e) => {
            tracing::warn!(user_id = %body.user_id, ?e, "Failed to save session");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
