//! Insertion-time pipeline for a single run.
//!
//! Sanitizing, ignore matching and categorization happen exactly once, here,
//! and their results are persisted. Reports never recompute them.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::classify::{categorize, Category};
use crate::config::IgnoreMatcher;
use crate::error::Result;
use crate::sanitize::{sanitize_command, DEFAULT_MAX_LEN};
use crate::sessions::SessionManager;
use crate::store::Store;
use crate::types::{elapsed_seconds, NewRun};

/// A command line after redaction, ready to run and record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub command: String,
    pub category: Category,
    pub ignored: bool,
}

impl PreparedCommand {
    /// Redacts `argv`, then checks ignore rules and categorizes the result.
    pub fn new<S: AsRef<str>>(argv: &[S], ignore: &IgnoreMatcher) -> Self {
        let command = sanitize_command(argv, DEFAULT_MAX_LEN);
        let ignored = ignore.should_ignore(&command);
        let category = categorize(&command);
        Self {
            command,
            category,
            ignored,
        }
    }
}

/// Where and under which labels a run happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub cwd: String,
    pub tag: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTiming {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exit_code: i32,
}

impl RunTiming {
    pub fn duration_s(&self) -> f64 {
        elapsed_seconds(self.started_at, self.finished_at)
    }
}

/// Result of recording. Ignored runs are not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded { run_id: i64, session_id: Option<i64> },
    Ignored,
}

pub struct Recorder<'a> {
    store: &'a Store,
}

impl<'a> Recorder<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Persists a finished run, attaching the active session if there is one.
    ///
    /// A pointer to a session row that no longer exists is logged and the
    /// run is stored without a session.
    pub fn record(
        &self,
        prepared: &PreparedCommand,
        timing: RunTiming,
        context: &RunContext,
    ) -> Result<RecordOutcome> {
        if prepared.ignored {
            debug!(command = %prepared.command, "Command matched ignore rules; not recording");
            return Ok(RecordOutcome::Ignored);
        }

        let session_id = match SessionManager::new(self.store).active()? {
            Some(active) => {
                if active.record.is_none() {
                    warn!(
                        session_id = active.id,
                        "Active session row missing; recording without session"
                    );
                }
                active.record.map(|record| record.id)
            }
            None => None,
        };
        let run = NewRun {
            started_at: timing.started_at,
            finished_at: timing.finished_at,
            exit_code: timing.exit_code,
            cwd: context.cwd.clone(),
            command: prepared.command.clone(),
            tag: non_empty(&context.tag),
            project: non_empty(&context.project),
            category: Some(prepared.category),
            session_id,
        };
        let run_id = self.store.insert_run(&run)?;
        Ok(RecordOutcome::Recorded { run_id, session_id })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
