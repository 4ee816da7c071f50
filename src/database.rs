//! SQLite database for study data persistence.
//!
//! Stores practice sessions and study goals, and implements the
//! [`SessionStore`] and [`TaskStore`] collaborator traits the weekly
//! aggregator reads through. Timestamps are RFC 3339 text columns,
//! rewritten to UTC at write time so they compare consistently as
//! text. Session timestamp columns are nullable on purpose; the
//! boundary types tolerate partial rows.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Result as SqlResult};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{RawSession, SessionStore, Task, TaskStore};

/// Database wrapper with thread-safe connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens or creates the database at the default location.
    pub fn open() -> SqlResult<Self> {
        let db_path = Self::get_db_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        tracing::info!(path = ?db_path, "Opening database");

        let conn = Connection::open(&db_path)?;

        // Enable WAL mode for better crash safety
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Opens an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> SqlResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Returns the default database path.
    fn get_db_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studyhub")
            .join("studyhub.db")
    }

    /// Initializes the database schema.
    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Practice sessions. Timestamp columns are nullable; the
            -- aggregator applies the created/started/ended fallback chain.
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                task_id TEXT,
                created_at TEXT,
                started_at TEXT,
                ended_at TEXT,
                duration_minutes REAL,
                is_pomodoro BOOLEAN DEFAULT 0
            );

            -- Study goals
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                completed BOOLEAN DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Indexes for per-user window queries
            CREATE INDEX IF NOT EXISTS idx_sessions_user_created
                ON sessions(user_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
            "#,
        )?;

        tracing::debug!("Database schema initialized");
        Ok(())
    }

    /// Rewrites an RFC 3339 timestamp into UTC.
    ///
    /// Client-supplied timestamps may carry any offset, but the window
    /// query compares stored values as text, so offsets must be gone by
    /// the time a row is written. Unparseable input is stored as given;
    /// the aggregator skips it when bucketing.
    fn normalize_timestamp(ts: Option<&str>) -> Option<String> {
        ts.map(|s| match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => dt.with_timezone(&Utc).to_rfc3339(),
            Err(_) => s.to_string(),
        })
    }

    /// Saves a practice session and returns the stored row.
    ///
    /// Assigns a fresh id. If no timestamp is supplied at all,
    /// `created_at` defaults to now so the session lands in today's
    /// bucket.
    #[allow(clippy::too_many_arguments)]
    pub fn save_session(
        &self,
        user_id: &str,
        task_id: Option<&str>,
        created_at: Option<&str>,
        started_at: Option<&str>,
        ended_at: Option<&str>,
        duration_minutes: Option<f64>,
        is_pomodoro: bool,
    ) -> SqlResult<RawSession> {
        let id = Uuid::new_v4().to_string();
        let created_at = Self::normalize_timestamp(created_at);
        let started_at = Self::normalize_timestamp(started_at);
        let ended_at = Self::normalize_timestamp(ended_at);
        let created_at = match (&created_at, &started_at, &ended_at) {
            (None, None, None) => Some(Utc::now().to_rfc3339()),
            _ => created_at,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, user_id, task_id, created_at, started_at, ended_at, duration_minutes, is_pomodoro)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                user_id,
                task_id,
                created_at,
                started_at,
                ended_at,
                duration_minutes,
                is_pomodoro,
            ],
        )?;

        Ok(RawSession {
            id,
            user_id: user_id.to_string(),
            task_id: task_id.map(String::from),
            created_at,
            started_at,
            ended_at,
            duration_minutes,
            is_pomodoro: Some(is_pomodoro),
        })
    }

    /// Lists a user's sessions recorded at or after the cutoff.
    ///
    /// Keeps rows with no timestamp at all; they still count toward
    /// summary totals even though they can't be day-bucketed.
    pub fn sessions_for_user(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> SqlResult<Vec<RawSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, task_id, created_at, started_at, ended_at, duration_minutes, is_pomodoro
             FROM sessions
             WHERE user_id = ?1
               AND (COALESCE(created_at, started_at, ended_at) >= ?2
                    OR COALESCE(created_at, started_at, ended_at) IS NULL)",
        )?;

        let rows = stmt.query_map(params![user_id, since.to_rfc3339()], Self::map_session)?;
        rows.collect()
    }

    /// Gets recent sessions for a user, newest first.
    pub fn recent_sessions(&self, user_id: &str, limit: usize) -> SqlResult<Vec<RawSession>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, task_id, created_at, started_at, ended_at, duration_minutes, is_pomodoro
             FROM sessions
             WHERE user_id = ?1
             ORDER BY COALESCE(created_at, started_at, ended_at) DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], Self::map_session)?;
        rows.collect()
    }

    fn map_session(row: &rusqlite::Row<'_>) -> SqlResult<RawSession> {
        Ok(RawSession {
            id: row.get(0)?,
            user_id: row.get(1)?,
            task_id: row.get(2)?,
            created_at: row.get(3)?,
            started_at: row.get(4)?,
            ended_at: row.get(5)?,
            duration_minutes: row.get(6)?,
            is_pomodoro: row.get(7)?,
        })
    }

    // === Task Methods ===

    /// Creates a study goal and returns the stored row.
    pub fn save_task(&self, user_id: &str, title: &str) -> SqlResult<Task> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tasks (id, user_id, title, completed, created_at) VALUES (?1, ?2, ?3, 0, ?4)",
            params![id, user_id, title, now],
        )?;

        Ok(Task {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            completed: false,
            created_at: now,
        })
    }

    /// Lists a user's study goals, newest first.
    pub fn tasks_for_user(&self, user_id: &str) -> SqlResult<Vec<Task>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, completed, created_at
             FROM tasks WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Task {
                id: row.get(0)?,
                user_id: row.get(1)?,
                title: row.get(2)?,
                completed: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        rows.collect()
    }

    /// Deletes a study goal. Sessions keep their task reference; the
    /// aggregator's fallback naming covers the dangling id.
    pub fn delete_task(&self, id: &str) -> SqlResult<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Batch-resolves task titles for the given ids.
    ///
    /// Unknown ids are simply absent from the result.
    pub fn titles_for(&self, ids: &[String]) -> SqlResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT id, title FROM tasks WHERE id IN ({})", placeholders);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        rows.collect()
    }
}

#[async_trait]
impl SessionStore for Database {
    async fn sessions_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RawSession>, StoreError> {
        Ok(self.sessions_for_user(user_id, since)?)
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn task_titles(&self, ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        Ok(self.titles_for(ids)?)
    }
}
