//! Study goal endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::state::AppState;
use crate::store::Task;

/// Query parameters for listing goals.
#[derive(Deserialize)]
pub struct TasksQuery {
    /// Owner of the goals.
    pub user_id: String,
}

/// Response wrapper with metadata.
#[derive(Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
    pub total: usize,
}

/// GET /api/tasks?user_id= - List study goals, newest first.
pub async fn get_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TasksQuery>,
) -> Json<TasksResponse> {
    match state.db.tasks_for_user(&query.user_id) {
        Ok(tasks) => Json(TasksResponse {
            total: tasks.len(),
            tasks,
        }),
        Err(e) => {
            tracing::warn!(user_id = %query.user_id, ?e, "Failed to query tasks");
            Json(TasksResponse {
                tasks: vec![],
                total: 0,
            })
        }
    }
}

/// Request body for creating a study goal.
#[derive(Deserialize)]
pub struct NewTask {
    pub user_id: String,
    pub title: String,
}

/// POST /api/tasks - Create a study goal.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTask>,
) -> Result<Json<Task>, StatusCode> {
    if body.user_id.is_empty() || body.title.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    match state.db.save_task(&body.user_id, body.title.trim()) {
        Ok(task) => Ok(Json(task)),
        Err(e) => {
            tracing::warn!(user_id = %body.user_id, ?e, "Failed to save task");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// DELETE /api/tasks/{id} - Remove a study goal.
///
/// Sessions logged against the goal keep their task reference; the
/// weekly breakdown falls back to an id-derived name for them.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.db.delete_task(&id) {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            tracing::warn!(task_id = %id, ?e, "Failed to delete task");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
