//! Weekly study summary aggregation.
//!
//! Derives the rolling 7-day study summary (total hours, pomodoro
//! count, days active, consistency percentage, current streak) from a
//! raw log of timestamped practice sessions, bucketed per task and per
//! calendar day.
//!
//! Day buckets use the server's local calendar day; sessions carry
//! their local date from ingestion, so every function here is pure
//! date math over an explicit `today`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

use super::types::{DayBucket, DayHours, PracticeSession, TaskHours, WeeklySummary};
use super::{SessionStore, TaskStore};

/// Default rolling window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Characters of the task id used in fallback display names.
const TASK_NAME_PREFIX_LEN: usize = 6;

/// Computes the weekly study summary for a user.
///
/// Orchestrates the two collaborator reads sequentially: sessions
/// first, then task titles only if the log references any tasks. This
/// never fails: a session-store error degrades to an all-zero summary
/// with `window_days` empty buckets, and a task-store error only
/// degrades the display names. Both are logged, never surfaced.
pub async fn compute_weekly_summary<S, T>(
    sessions: &S,
    tasks: &T,
    user_id: &str,
    window_days: u32,
) -> WeeklySummary
where
    S: SessionStore + ?Sized,
    T: TaskStore + ?Sized,
{
    let window_days = window_days.max(1);
    let today = Local::now().date_naive();

    if user_id.is_empty() {
        tracing::warn!("Weekly summary requested with empty user id");
        return empty_summary(today, window_days);
    }

    let since = window_start_utc(today, window_days);
    let raw = match sessions.sessions_since(user_id, since).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Session store unavailable, serving empty summary"
            );
            return empty_summary(today, window_days);
        }
    };

    let parsed: Vec<PracticeSession> = raw.into_iter().map(PracticeSession::from_raw).collect();

    let mut task_ids: Vec<String> = parsed
        .iter()
        .filter_map(|s| s.task_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    task_ids.sort();

    let titles = if task_ids.is_empty() {
        HashMap::new()
    } else {
        match tasks.task_titles(&task_ids).await {
            Ok(titles) => titles,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Task store unavailable, falling back to id-derived names"
                );
                HashMap::new()
            }
        }
    };

    assemble_summary(&parsed, &titles, today, window_days)
}

/// Assembles a summary from already-normalized sessions.
pub fn assemble_summary(
    sessions: &[PracticeSession],
    titles: &HashMap<String, String>,
    today: NaiveDate,
    window_days: u32,
) -> WeeklySummary {
    let window_days = window_days.max(1);
    let buckets = bucketize_days(sessions, today, window_days);
    let active = active_dates(sessions);
    let studied = days_studied(&active, today, window_days);

    let total_minutes: f64 = sessions.iter().map(|s| s.duration_minutes).sum();
    let total_pomodoros = sessions.iter().filter(|s| s.is_pomodoro).count() as u32;

    WeeklySummary {
        total_hours: round1(total_minutes / 60.0),
        total_pomodoros,
        days_studied: studied,
        consistency_pct: consistency_pct(studied, window_days),
        current_streak_days: current_streak(&active, today),
        hours_by_day: buckets
            .into_iter()
            .map(|b| DayHours {
                date: b.date,
                label: b.label,
                hours: round2(b.minutes / 60.0),
            })
            .collect(),
        hours_by_task: task_breakdown(sessions, titles),
    }
}

/// The all-zero summary served when the session store is unreachable.
///
/// Still carries `window_days` empty buckets so consumers always see a
/// full, contiguous window.
pub fn empty_summary(today: NaiveDate, window_days: u32) -> WeeklySummary {
    assemble_summary(&[], &HashMap::new(), today, window_days)
}

/// Partitions sessions into `window_days` calendar-day buckets, oldest
/// first, covering `window_days - 1` days ago through `today`.
///
/// Sessions dated outside the window (the store may over-fetch) and
/// sessions without a resolvable date are skipped.
pub fn bucketize_days(
    sessions: &[PracticeSession],
    today: NaiveDate,
    window_days: u32,
) -> Vec<DayBucket> {
    let window_days = window_days.max(1);
    let start = today - Duration::days(i64::from(window_days) - 1);

    let mut buckets: Vec<DayBucket> = (0..window_days)
        .map(|i| DayBucket::new(start + Duration::days(i64::from(i))))
        .collect();

    for session in sessions {
        let Some(date) = session.local_date else {
            continue;
        };
        if date < start || date > today {
            continue;
        }
        let idx = (date - start).num_days() as usize;
        buckets[idx].minutes += session.duration_minutes;
    }

    buckets
}

/// The set of local calendar days with at least one session.
pub fn active_dates(sessions: &[PracticeSession]) -> HashSet<NaiveDate> {
    sessions.iter().filter_map(|s| s.local_date).collect()
}

/// Number of window days with at least one session.
pub fn days_studied(active: &HashSet<NaiveDate>, today: NaiveDate, window_days: u32) -> u32 {
    let window_days = window_days.max(1);
    let start = today - Duration::days(i64::from(window_days) - 1);
    active.iter().filter(|d| **d >= start && **d <= today).count() as u32
}

/// Share of window days studied, as a rounded percentage.
pub fn consistency_pct(days_studied: u32, window_days: u32) -> u32 {
    (f64::from(days_studied) / f64::from(window_days.max(1)) * 100.0).round() as u32
}

/// Consecutive active days ending today.
///
/// Walks backward from today and stops at the first gap. A day with no
/// session (including today itself, even though it isn't over) reads
/// as a broken streak. The streak is "current, unbroken, ending today",
/// not "most recent", so a user who hasn't studied yet today sees 0.
pub fn current_streak(active: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while active.contains(&day) {
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}

/// Per-task hour breakdown, hours descending.
///
/// Sessions without a task id are excluded entirely; they still count
/// toward the summary totals. Titles missing from `titles` get a
/// deterministic fallback name derived from the id prefix. Titles are
/// not deduplicated: two tasks with the same title stay separate
/// entries.
pub fn task_breakdown(
    sessions: &[PracticeSession],
    titles: &HashMap<String, String>,
) -> Vec<TaskHours> {
    let mut minutes_by_task: HashMap<&str, f64> = HashMap::new();
    for session in sessions {
        if let Some(task_id) = &session.task_id {
            *minutes_by_task.entry(task_id).or_default() += session.duration_minutes;
        }
    }

    let mut breakdown: Vec<(String, TaskHours)> = minutes_by_task
        .into_iter()
        .map(|(id, minutes)| {
            let name = titles
                .get(id)
                .cloned()
                .unwrap_or_else(|| fallback_task_name(id));
            (
                id.to_string(),
                TaskHours {
                    name,
                    hours: round2(minutes / 60.0),
                },
            )
        })
        .collect();

    // Hours descending, then id for a stable order between equals.
    breakdown.sort_by(|a, b| {
        b.1.hours
            .partial_cmp(&a.1.hours)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    breakdown.into_iter().map(|(_, hours)| hours).collect()
}

/// Deterministic display name for a task whose title couldn't be
/// resolved.
pub fn fallback_task_name(task_id: &str) -> String {
    let prefix: String = task_id.chars().take(TASK_NAME_PREFIX_LEN).collect();
    format!("Task {}", prefix)
}

/// UTC instant of local midnight at the start of the window.
///
/// Used as the session-store read cutoff. Inclusive of the lower bound
/// at day granularity.
pub fn window_start_utc(today: NaiveDate, window_days: u32) -> DateTime<Utc> {
    let start_day = today - Duration::days(i64::from(window_days.max(1)) - 1);
    let midnight = start_day.and_hms_opt(0, 0, 0).unwrap();
    match Local.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // Local midnight can be skipped by a DST transition.
        None => Utc.from_utc_datetime(&midnight),
    }
}

fn round1(hours: f64) -> f64 {
    (hours * 10.0).round() / 10.0
}

fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::types::RawSession;
    use async_trait::async_trait;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 27).unwrap()
    }

    fn session(task_id: Option<&str>, minutes: f64, days_ago: i64) -> PracticeSession {
        PracticeSession {
            id: format!("s-{}-{}", minutes, days_ago),
            task_id: task_id.map(String::from),
            local_date: Some(today() - Duration::days(days_ago)),
            duration_minutes: minutes,
            is_pomodoro: false,
        }
    }

    fn dateless_session(minutes: f64) -> PracticeSession {
        PracticeSession {
            id: "s-dateless".to_string(),
            task_id: None,
            local_date: None,
            duration_minutes: minutes,
            is_pomodoro: true,
        }
    }

    #[test]
    fn test_bucket_coverage_regardless_of_sessions() {
        for w in [1u32, 3, 7, 30] {
            let buckets = bucketize_days(&[], today(), w);
            assert_eq!(buckets.len(), w as usize);
            assert_eq!(buckets.last().unwrap().date, today());
            for pair in buckets.windows(2) {
                assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
            }
        }
    }

    #[test]
    fn test_bucketize_sums_minutes_per_day() {
        let sessions = vec![
            session(None, 25.0, 0),
            session(None, 35.0, 0),
            session(None, 50.0, 2),
        ];
        let buckets = bucketize_days(&sessions, today(), 7);

        assert_eq!(buckets[6].minutes, 60.0);
        assert_eq!(buckets[4].minutes, 50.0);
        let total: f64 = buckets.iter().map(|b| b.minutes).sum();
        assert_eq!(total, 110.0);
    }

    #[test]
    fn test_bucketize_ignores_out_of_window_and_dateless() {
        let sessions = vec![
            session(None, 30.0, 0),
            session(None, 45.0, 10), // over-fetched, outside a 7-day window
            dateless_session(15.0),
        ];
        let buckets = bucketize_days(&sessions, today(), 7);
        let total: f64 = buckets.iter().map(|b| b.minutes).sum();
        assert_eq!(total, 30.0);
    }

    #[test]
    fn test_conservation_of_minutes() {
        let sessions = vec![
            session(None, 25.0, 1),
            session(None, 35.0, 3),
            session(None, 45.0, 10), // outside window
            dateless_session(20.0),
        ];
        let summary = assemble_summary(&sessions, &HashMap::new(), today(), 7);

        let bucket_minutes: f64 = summary.hours_by_day.iter().map(|d| d.hours * 60.0).sum();
        assert_eq!(bucket_minutes.round(), 60.0);

        // Totals include the out-of-window and dateless sessions.
        assert_eq!(summary.total_hours, 2.1); // 125 min -> 2.0833 -> 2.1
        assert_eq!(summary.total_pomodoros, 1);
    }

    #[test]
    fn test_streak_zero_when_today_inactive() {
        let sessions = vec![
            session(None, 30.0, 3),
            session(None, 30.0, 2),
            session(None, 30.0, 1),
        ];
        let active = active_dates(&sessions);
        assert_eq!(current_streak(&active, today()), 0);
    }

    #[test]
    fn test_streak_counts_consecutive_days_ending_today() {
        let sessions = vec![
            session(None, 30.0, 2),
            session(None, 30.0, 1),
            session(None, 30.0, 0),
        ];
        let active = active_dates(&sessions);
        assert_eq!(current_streak(&active, today()), 3);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let sessions = vec![
            session(None, 30.0, 0),
            session(None, 30.0, 1),
            // gap at -2
            session(None, 30.0, 3),
        ];
        let active = active_dates(&sessions);
        assert_eq!(current_streak(&active, today()), 2);
    }

    #[test]
    fn test_consistency_bounds_and_rounding() {
        assert_eq!(consistency_pct(0, 7), 0);
        assert_eq!(consistency_pct(7, 7), 100);
        assert_eq!(consistency_pct(3, 7), 43); // 42.86 rounds up
        assert_eq!(consistency_pct(1, 7), 14); // 14.29 rounds down
        for d in 0..=7 {
            let pct = consistency_pct(d, 7);
            assert!(pct <= 100);
        }
    }

    #[test]
    fn test_days_studied_only_counts_window() {
        let sessions = vec![
            session(None, 30.0, 0),
            session(None, 30.0, 6),
            session(None, 30.0, 7), // one day before the window
        ];
        let active = active_dates(&sessions);
        assert_eq!(days_studied(&active, today(), 7), 2);
    }

    #[test]
    fn test_task_breakdown_resolves_and_falls_back() {
        let sessions = vec![
            session(Some("task-a"), 60.0, 0),
            session(Some("task-a"), 30.0, 1),
            session(Some("unknown-id"), 45.0, 1),
            session(None, 90.0, 2), // untasked, excluded here
        ];
        let mut titles = HashMap::new();
        titles.insert("task-a".to_string(), "Linear Algebra".to_string());

        let breakdown = task_breakdown(&sessions, &titles);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].name, "Linear Algebra");
        assert_eq!(breakdown[0].hours, 1.5);
        assert_eq!(breakdown[1].name, "Task unknow");
        assert_eq!(breakdown[1].hours, 0.75);
    }

    #[test]
    fn test_fallback_task_name_truncates() {
        assert_eq!(fallback_task_name("abcdef123456"), "Task abcdef");
        assert_eq!(fallback_task_name("ab"), "Task ab");
    }

    #[test]
    fn test_duplicate_titles_stay_separate() {
        let sessions = vec![
            session(Some("task-a"), 60.0, 0),
            session(Some("task-b"), 30.0, 0),
        ];
        let mut titles = HashMap::new();
        titles.insert("task-a".to_string(), "Review".to_string());
        titles.insert("task-b".to_string(), "Review".to_string());

        let breakdown = task_breakdown(&sessions, &titles);
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].name, "Review");
        assert_eq!(breakdown[1].name, "Review");
    }

    #[test]
    fn test_rounding_precision_split() {
        // 100 minutes: totals get 1 decimal, per-day gets 2.
        let sessions = vec![session(None, 100.0, 0)];
        let summary = assemble_summary(&sessions, &HashMap::new(), today(), 7);
        assert_eq!(summary.total_hours, 1.7);
        assert_eq!(summary.hours_by_day[6].hours, 1.67);
    }

    #[test]
    fn test_assemble_summary_is_idempotent() {
        let sessions = vec![
            session(Some("task-a"), 60.0, 0),
            session(None, 30.0, 1),
            dateless_session(10.0),
        ];
        let titles = HashMap::new();
        let first = assemble_summary(&sessions, &titles, today(), 7);
        let second = assemble_summary(&sessions, &titles, today(), 7);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_summary_shape() {
        let summary = empty_summary(today(), 7);
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.total_pomodoros, 0);
        assert_eq!(summary.days_studied, 0);
        assert_eq!(summary.consistency_pct, 0);
        assert_eq!(summary.current_streak_days, 0);
        assert_eq!(summary.hours_by_day.len(), 7);
        assert!(summary.hours_by_day.iter().all(|d| d.hours == 0.0));
        assert!(summary.hours_by_task.is_empty());
    }

    #[test]
    fn test_three_session_scenario() {
        // (A, 60, today), (A, 30, yesterday), (B, 90, two days ago)
        let sessions = vec![
            session(Some("A"), 60.0, 0),
            session(Some("A"), 30.0, 1),
            session(Some("B"), 90.0, 2),
        ];
        let mut titles = HashMap::new();
        titles.insert("A".to_string(), "Algebra".to_string());
        titles.insert("B".to_string(), "Biology".to_string());

        let summary = assemble_summary(&sessions, &titles, today(), 7);
        assert_eq!(summary.total_hours, 3.0);
        assert_eq!(summary.days_studied, 3);
        assert_eq!(summary.consistency_pct, 43);
        assert_eq!(summary.current_streak_days, 3);
        assert_eq!(summary.hours_by_task.len(), 2);
        assert!(summary
            .hours_by_task
            .iter()
            .any(|t| t.name == "Algebra" && t.hours == 1.5));
        assert!(summary
            .hours_by_task
            .iter()
            .any(|t| t.name == "Biology" && t.hours == 1.5));
    }

    // === Assembler orchestration with mock collaborators ===

    struct FakeSessions {
        rows: Result<Vec<RawSession>, ()>,
    }

    #[async_trait]
    impl SessionStore for FakeSessions {
        async fn sessions_since(
            &self,
            _user_id: &str,
            _since: DateTime<Utc>,
        ) -> Result<Vec<RawSession>, StoreError> {
            match &self.rows {
                Ok(rows) => Ok(rows.clone()),
                Err(()) => Err(StoreError::unavailable("backend down")),
            }
        }
    }

    struct FakeTasks {
        available: bool,
    }

    #[async_trait]
    impl TaskStore for FakeTasks {
        async fn task_titles(
            &self,
            ids: &[String],
        ) -> Result<HashMap<String, String>, StoreError> {
            if !self.available {
                return Err(StoreError::unavailable("backend down"));
            }
            Ok(ids
                .iter()
                .map(|id| (id.clone(), format!("Title of {}", id)))
                .collect())
        }
    }

    fn raw_session(task_id: Option<&str>, minutes: f64) -> RawSession {
        RawSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            task_id: task_id.map(String::from),
            created_at: Some(Utc::now().to_rfc3339()),
            duration_minutes: Some(minutes),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_degraded_mode_on_session_store_failure() {
        let sessions = FakeSessions { rows: Err(()) };
        let tasks = FakeTasks { available: true };

        let summary = compute_weekly_summary(&sessions, &tasks, "u1", 7).await;
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.total_pomodoros, 0);
        assert_eq!(summary.days_studied, 0);
        assert_eq!(summary.consistency_pct, 0);
        assert_eq!(summary.current_streak_days, 0);
        assert_eq!(summary.hours_by_day.len(), 7);
        assert!(summary.hours_by_task.is_empty());
    }

    #[tokio::test]
    async fn test_task_store_failure_degrades_names_only() {
        let sessions = FakeSessions {
            rows: Ok(vec![raw_session(Some("abcdef-task"), 60.0)]),
        };
        let tasks = FakeTasks { available: false };

        let summary = compute_weekly_summary(&sessions, &tasks, "u1", 7).await;
        assert_eq!(summary.total_hours, 1.0);
        assert_eq!(summary.hours_by_task.len(), 1);
        assert_eq!(summary.hours_by_task[0].name, "Task abcdef");
    }

    #[tokio::test]
    async fn test_summary_with_resolved_titles() {
        let sessions = FakeSessions {
            rows: Ok(vec![
                raw_session(Some("t1"), 50.0),
                raw_session(None, 25.0),
            ]),
        };
        let tasks = FakeTasks { available: true };

        let summary = compute_weekly_summary(&sessions, &tasks, "u1", 7).await;
        assert_eq!(summary.total_hours, 1.3); // 75 min
        assert_eq!(summary.hours_by_task.len(), 1);
        assert_eq!(summary.hours_by_task[0].name, "Title of t1");
        assert_eq!(summary.current_streak_days, 1);
    }

    #[tokio::test]
    async fn test_empty_user_id_serves_empty_summary() {
        let sessions = FakeSessions {
            rows: Ok(vec![raw_session(None, 60.0)]),
        };
        let tasks = FakeTasks { available: true };

        let summary = compute_weekly_summary(&sessions, &tasks, "", 7).await;
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.hours_by_day.len(), 7);
    }

    #[test]
    fn test_window_start_is_inclusive_lower_bound() {
        let start = window_start_utc(today(), 7);
        let local_start = start.with_timezone(&Local);
        assert_eq!(
            local_start.date_naive(),
            today() - Duration::days(6)
        );
    }
}
