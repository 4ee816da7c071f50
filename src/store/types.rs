//! Data types for study tracking and weekly analytics.
//!
//! Defines the boundary types read from storage and the normalized
//! in-memory shapes the aggregation logic works on. Storage rows are
//! loosely typed; all null-coalescing and validation happens once, in
//! [`PracticeSession::from_raw`], so the aggregator never sees missing
//! or malformed fields.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A practice session row as it comes out of storage.
///
/// Everything except the ids may be absent. Timestamps are RFC 3339
/// strings; unknown extra fields are ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSession {
    /// Opaque unique identifier.
    pub id: String,

    /// Owner reference.
    pub user_id: String,

    /// The study goal this session applies to, if any.
    pub task_id: Option<String>,

    /// When the session was recorded.
    pub created_at: Option<String>,

    /// When the session began, if tracked separately.
    pub started_at: Option<String>,

    /// When the session ended, if tracked separately.
    pub ended_at: Option<String>,

    /// Session length in minutes.
    pub duration_minutes: Option<f64>,

    /// Whether this was a Pomodoro-timed session.
    pub is_pomodoro: Option<bool>,
}

/// A practice session after boundary normalization.
///
/// `local_date` is the session's calendar day in the server's local
/// timezone, resolved once here so everything downstream is plain date
/// math. It is `None` when no timestamp field could be resolved; such
/// sessions still count toward totals but are skipped for day and
/// streak bucketing.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSession {
    pub id: String,
    pub task_id: Option<String>,
    pub local_date: Option<NaiveDate>,
    pub duration_minutes: f64,
    pub is_pomodoro: bool,
}

impl PracticeSession {
    /// Normalizes a raw storage row.
    ///
    /// Applies the `created_at` → `started_at` → `ended_at` timestamp
    /// fallback chain and clamps negative or non-finite durations to
    /// zero. A bad field never fails the row; it is logged and its
    /// contribution dropped.
    pub fn from_raw(raw: RawSession) -> Self {
        let local_date = resolve_timestamp(&raw).map(|t| t.with_timezone(&Local).date_naive());

        let duration_minutes = match raw.duration_minutes {
            Some(m) if m.is_finite() && m >= 0.0 => m,
            Some(m) => {
                tracing::warn!(
                    session_id = %raw.id,
                    duration = m,
                    "Invalid session duration, treating as 0"
                );
                0.0
            }
            None => 0.0,
        };

        Self {
            id: raw.id,
            task_id: raw.task_id,
            local_date,
            duration_minutes,
            is_pomodoro: raw.is_pomodoro.unwrap_or(false),
        }
    }
}

/// Resolves a session's timestamp via the fallback chain.
///
/// An unparseable value is logged and the chain continues to the next
/// field, so a single corrupt timestamp doesn't hide a usable one.
pub(crate) fn resolve_timestamp(raw: &RawSession) -> Option<DateTime<Utc>> {
    for field in [&raw.created_at, &raw.started_at, &raw.ended_at] {
        if let Some(text) = field {
            match DateTime::parse_from_rfc3339(text) {
                Ok(dt) => return Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    tracing::warn!(
                        session_id = %raw.id,
                        timestamp = %text,
                        error = %e,
                        "Unparseable session timestamp"
                    );
                }
            }
        }
    }
    None
}

/// A study goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier.
    pub id: String,

    /// Owner reference.
    pub user_id: String,

    /// Display name shown in the per-task breakdown.
    pub title: String,

    /// Whether the goal has been marked done.
    pub completed: bool,

    /// When the goal was created (RFC 3339).
    pub created_at: String,
}

/// Accumulated minutes for one calendar day of the rolling window.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    /// The local calendar day this bucket covers.
    pub date: NaiveDate,

    /// Display label, e.g. "Wed 8/27".
    pub label: String,

    /// Total practice minutes logged on this day.
    pub minutes: f64,
}

impl DayBucket {
    /// Creates an empty bucket for the given day.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            label: date.format("%a %-m/%-d").to_string(),
            minutes: 0.0,
        }
    }
}

/// Hours studied on one day of the window, oldest first in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    /// ISO calendar date (preserves day identity for consumers that
    /// re-derive their own labels).
    pub date: NaiveDate,

    /// Display label, e.g. "Wed 8/27".
    pub label: String,

    /// Hours studied, rounded to 2 decimal places.
    pub hours: f64,
}

/// Hours accumulated against one study goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHours {
    /// Resolved task title, or a fallback derived from the id.
    pub name: String,

    /// Hours studied, rounded to 2 decimal places.
    pub hours: f64,
}

/// The rolling weekly study summary.
///
/// A pure projection of the session log: recomputed from scratch on
/// every request, never persisted or incrementally updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// Total hours across all fetched sessions, rounded to 1 decimal.
    pub total_hours: f64,

    /// Number of sessions flagged as Pomodoros.
    pub total_pomodoros: u32,

    /// Days in the window with at least one session.
    pub days_studied: u32,

    /// `days_studied / window_days`, as a rounded percentage.
    pub consistency_pct: u32,

    /// Consecutive active days ending today. A day without a session,
    /// including today itself, resets this to 0.
    pub current_streak_days: u32,

    /// One entry per window day, oldest first.
    pub hours_by_day: Vec<DayHours>,

    /// One entry per task with at least one session, hours descending.
    pub hours_by_task: Vec<TaskHours>,
}
