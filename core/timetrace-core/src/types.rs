//! Record types shared by the store, the report builder and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Category;

/// One recorded command execution, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_s: f64,
    pub exit_code: i32,
    pub cwd: String,
    pub command: String,
    pub tag: Option<String>,
    pub project: Option<String>,
    pub category: Option<String>,
    pub session_id: Option<i64>,
    /// Joined from `sessions` at read time; never stored on the run.
    pub session_name: Option<String>,
}

impl RunRecord {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Insert payload for a run. The id and duration are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRun {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exit_code: i32,
    pub cwd: String,
    pub command: String,
    pub tag: Option<String>,
    pub project: Option<String>,
    pub category: Option<Category>,
    pub session_id: Option<i64>,
}

impl NewRun {
    pub fn duration_s(&self) -> f64 {
        elapsed_seconds(self.started_at, self.finished_at)
    }
}

/// Seconds between start and finish, clamped to zero on clock skew.
pub fn elapsed_seconds(started_at: DateTime<Utc>, finished_at: DateTime<Utc>) -> f64 {
    let micros = (finished_at - started_at).num_microseconds().unwrap_or(0);
    (micros as f64 / 1_000_000.0).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Exact-match filters applied by `Store::query_runs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFilters {
    pub tag: Option<String>,
    pub project: Option<String>,
    pub category: Option<Category>,
    pub session_id: Option<i64>,
}

impl RunFilters {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.project.is_none()
            && self.category.is_none()
            && self.session_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_run(start_s: u32, end_s: u32) -> NewRun {
        NewRun {
            started_at: Utc.with_ymd_and_hms(2026, 1, 30, 10, 0, start_s).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2026, 1, 30, 10, 0, end_s).unwrap(),
            exit_code: 0,
            cwd: "/repo".to_string(),
            command: "true".to_string(),
            tag: None,
            project: None,
            category: None,
            session_id: None,
        }
    }

    #[test]
    fn duration_is_finish_minus_start() {
        assert_eq!(new_run(5, 47).duration_s(), 42.0);
    }

    #[test]
    fn duration_clamps_clock_skew_to_zero() {
        assert_eq!(new_run(30, 10).duration_s(), 0.0);
    }

    #[test]
    fn default_filters_are_empty() {
        assert!(RunFilters::default().is_empty());
        let filters = RunFilters {
            session_id: Some(1),
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }
}
