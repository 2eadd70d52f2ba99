//! Focused-work sessions.
//!
//! The active session is a pointer in the store's `meta` table, read fresh by
//! every invocation. A session row with `ended_at IS NULL` is not by itself
//! active: after a crash the row can be left open while the pointer is gone.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{Result, TraceError};
use crate::store::Store;
use crate::types::SessionRecord;

/// The session currently marked active.
///
/// `record` is `None` when the pointer references a row that no longer
/// exists; the id is still reported so the pointer can be cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub id: i64,
    pub record: Option<SessionRecord>,
}

impl ActiveSession {
    pub fn name(&self) -> Option<&str> {
        self.record.as_ref().map(|record| record.name.as_str())
    }
}

pub struct SessionManager<'a> {
    store: &'a Store,
}

impl<'a> SessionManager<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Creates a session and makes it active.
    ///
    /// Fails without writing anything if another session is active.
    pub fn start(&self, name: &str, now: DateTime<Utc>) -> Result<SessionRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TraceError::InvalidInput(
                "session name must not be empty".to_string(),
            ));
        }

        let record = self.store.with_transaction(|store| {
            if let Some(id) = store.get_active_session()? {
                return Err(TraceError::SessionAlreadyActive { id });
            }
            let id = store.insert_session(name, now)?;
            store.set_active_session(Some(id))?;
            Ok(SessionRecord {
                id,
                name: name.to_string(),
                started_at: now,
                ended_at: None,
            })
        })?;

        info!(session_id = record.id, name = %record.name, "Session started");
        Ok(record)
    }

    /// Ends the active session and clears the pointer.
    ///
    /// Returns `None` when no session was active.
    pub fn stop(&self, now: DateTime<Utc>) -> Result<Option<ActiveSession>> {
        let stopped = self.store.with_transaction(|store| {
            let Some(id) = store.get_active_session()? else {
                return Ok(None);
            };

            match store.end_session(id, now) {
                Ok(()) => {}
                Err(TraceError::SessionNotFound(_)) => {
                    warn!(session_id = id, "Active session row missing; clearing pointer");
                }
                Err(err) => return Err(err),
            }
            store.set_active_session(None)?;

            let record = store.get_session(id)?;
            Ok(Some(ActiveSession { id, record }))
        })?;

        if let Some(session) = &stopped {
            info!(session_id = session.id, "Session stopped");
        }
        Ok(stopped)
    }

    pub fn active(&self) -> Result<Option<ActiveSession>> {
        let Some(id) = self.store.get_active_session()? else {
            return Ok(None);
        };
        let record = self.store.get_session(id)?;
        Ok(Some(ActiveSession { id, record }))
    }

    /// Id to attach to a run being recorded now, if any.
    pub fn active_id(&self) -> Result<Option<i64>> {
        self.store.get_active_session()
    }

    pub fn list(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        self.store.list_sessions(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_temp() -> (tempfile::TempDir, Store) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = Store::open(temp_dir.path().join("timetrace.db")).expect("open store");
        (temp_dir, store)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 30, hour, 0, 0).unwrap()
    }

    #[test]
    fn start_sets_active_pointer() {
        let (_dir, store) = open_temp();
        let sessions = SessionManager::new(&store);

        let started = sessions.start("  deep work ", at(9)).unwrap();
        assert_eq!(started.name, "deep work");

        let active = sessions.active().unwrap().expect("active session");
        assert_eq!(active.id, started.id);
        assert_eq!(active.name(), Some("deep work"));
        assert_eq!(sessions.active_id().unwrap(), Some(started.id));
    }

    #[test]
    fn second_start_is_rejected_without_side_effects() {
        let (_dir, store) = open_temp();
        let sessions = SessionManager::new(&store);
        let first = sessions.start("first", at(9)).unwrap();

        let err = sessions.start("second", at(10)).unwrap_err();
        assert!(matches!(err, TraceError::SessionAlreadyActive { id } if id == first.id));

        assert_eq!(sessions.list(10).unwrap().len(), 1);
        assert_eq!(sessions.active_id().unwrap(), Some(first.id));
    }

    #[test]
    fn empty_name_is_rejected() {
        let (_dir, store) = open_temp();
        let err = SessionManager::new(&store).start("   ", at(9)).unwrap_err();
        assert!(matches!(err, TraceError::InvalidInput(_)));
        assert!(store.list_sessions(10).unwrap().is_empty());
    }

    #[test]
    fn stop_ends_session_and_clears_pointer() {
        let (_dir, store) = open_temp();
        let sessions = SessionManager::new(&store);
        let started = sessions.start("focus", at(9)).unwrap();

        let stopped = sessions.stop(at(11)).unwrap().expect("stopped session");
        assert_eq!(stopped.id, started.id);
        let record = stopped.record.expect("record");
        assert_eq!(record.ended_at, Some(at(11)));

        assert!(sessions.active().unwrap().is_none());
        assert!(sessions.stop(at(12)).unwrap().is_none());

        // a new session can start once the old one is stopped
        let next = sessions.start("focus again", at(13)).unwrap();
        assert_ne!(next.id, started.id);
    }

    #[test]
    fn open_row_without_pointer_is_not_active() {
        let (_dir, store) = open_temp();
        store.insert_session("crashed", at(8)).unwrap();

        let sessions = SessionManager::new(&store);
        assert!(sessions.active().unwrap().is_none());
        sessions.start("fresh", at(9)).expect("start despite open row");
    }

    #[test]
    fn dangling_pointer_is_cleared_on_stop() {
        let (_dir, store) = open_temp();
        store.set_active_session(Some(42)).unwrap();

        let sessions = SessionManager::new(&store);
        let active = sessions.active().unwrap().expect("pointer");
        assert_eq!(active.id, 42);
        assert!(active.record.is_none());

        let stopped = sessions.stop(at(10)).unwrap().expect("stopped");
        assert_eq!(stopped.id, 42);
        assert_eq!(store.get_active_session().unwrap(), None);
    }
}
