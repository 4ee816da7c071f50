//! Statistics endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::server::state::AppState;
use crate::store::{compute_weekly_summary, WeeklySummary, DEFAULT_WINDOW_DAYS};

/// Query parameters for the weekly summary.
#[derive(Deserialize)]
pub struct WeeklyQuery {
    /// Owner of the sessions being summarized.
    pub user_id: String,
    /// Rolling window size in days (default 7).
    pub days: Option<u32>,
}

/// GET /api/stats/weekly?user_id=&days=7 - Rolling weekly study summary.
///
/// Never fails: storage problems degrade to an all-zero summary and
/// are logged server-side.
pub async fn get_weekly_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeeklyQuery>,
) -> Json<WeeklySummary> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, 90);
    let db = state.db.as_ref();

    Json(compute_weekly_summary(db, db, &query.user_id, days).await)
}
