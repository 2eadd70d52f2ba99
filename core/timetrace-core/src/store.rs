//! SQLite persistence for timetrace.
//!
//! One file holds `runs`, `sessions` and a `meta` key-value table. Every
//! invocation of the CLI opens the store, migrates it (cheap and idempotent),
//! does one or two statements and exits. WAL mode plus a busy timeout lets a
//! shell hook record a run while a report is being read in another terminal.
//!
//! Migrations are additive check-then-act steps: tables are created if
//! missing, columns introduced after the first release are added if missing,
//! and `schema_version` only ever moves forward.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{
    params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, TraceError};
use crate::types::{NewRun, RunFilters, RunRecord, SessionRecord};
use crate::window::RunWindow;

/// Highest schema version this build knows how to produce.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const META_SCHEMA_VERSION: &str = "schema_version";
const META_ACTIVE_SESSION: &str = "active_session_id";

const BUSY_TIMEOUT_MS: i64 = 5000;

const RUN_SELECT: &str = "SELECT r.id, r.started_at, r.finished_at, r.duration_s, r.exit_code, \
     r.cwd, r.command, r.tag, r.project, r.category, r.session_id, s.name \
     FROM runs r LEFT JOIN sessions s ON s.id = r.session_id";

/// Columns added to `runs` after schema v1, with their declarations.
const RUNS_V2_COLUMNS: &[(&str, &str)] = &[
    ("project", "TEXT"),
    ("category", "TEXT"),
    ("session_id", "INTEGER REFERENCES sessions(id)"),
];

pub struct Store {
    path: PathBuf,
    conn: Connection,
}

impl Store {
    /// Opens (or creates) the database at `path` and brings its schema up to
    /// date.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent).map_err(|source| TraceError::StoragePath {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(&path, flags)
            .map_err(|err| TraceError::storage(format!("open {}", path.display()), err))?;
        Self::from_connection(path, conn)
    }

    /// A private, non-persistent store. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| TraceError::storage("open in-memory database", err))?;
        Self::from_connection(PathBuf::from(":memory:"), conn)
    }

    fn from_connection(path: PathBuf, conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| TraceError::storage("enable WAL", err))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|err| TraceError::storage("set synchronous", err))?;
        conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)
            .map_err(|err| TraceError::storage("set busy_timeout", err))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|err| TraceError::storage("enable foreign keys", err))?;

        let store = Self { path, conn };
        store.migrate()?;
        debug!(path = %store.path.display(), "Store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates missing tables and columns and raises `schema_version`.
    ///
    /// Safe to run on every startup. A stored version newer than
    /// [`CURRENT_SCHEMA_VERSION`] is left untouched.
    pub fn migrate(&self) -> Result<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|err| TraceError::storage("begin migration", err))?;

        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                duration_s REAL NOT NULL,
                exit_code INTEGER NOT NULL,
                cwd TEXT NOT NULL,
                command TEXT NOT NULL,
                tag TEXT
             );
             CREATE INDEX IF NOT EXISTS idx_runs_started ON runs(started_at);
             CREATE INDEX IF NOT EXISTS idx_runs_cwd ON runs(cwd);
             CREATE INDEX IF NOT EXISTS idx_runs_tag ON runs(tag);
             CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT
             );",
        )
        .map_err(|err| TraceError::storage("create base tables", err))?;

        ensure_runs_columns(&tx)?;

        tx.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_runs_project ON runs(project);
             CREATE INDEX IF NOT EXISTS idx_runs_category ON runs(category);
             CREATE INDEX IF NOT EXISTS idx_runs_session ON runs(session_id);",
        )
        .map_err(|err| TraceError::storage("create v2 indexes", err))?;

        raise_schema_version(&tx)?;

        tx.commit()
            .map_err(|err| TraceError::storage("commit migration", err))
    }

    pub fn schema_version(&self) -> Result<Option<i64>> {
        Ok(read_meta(&self.conn, META_SCHEMA_VERSION)?.and_then(|value| value.parse().ok()))
    }

    /// Runs `op` inside one immediate transaction; any error rolls it back.
    ///
    /// Store methods called from `op` share the transaction. Do not nest.
    pub fn with_transaction<T>(&self, op: impl FnOnce(&Store) -> Result<T>) -> Result<T> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|err| TraceError::storage("begin transaction", err))?;
        let value = op(self)?;
        tx.commit()
            .map_err(|err| TraceError::storage("commit transaction", err))?;
        Ok(value)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Runs
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_run(&self, run: &NewRun) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO runs (started_at, finished_at, duration_s, exit_code, cwd, command, \
                    tag, project, category, session_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    to_db_time(run.started_at),
                    to_db_time(run.finished_at),
                    run.duration_s(),
                    run.exit_code,
                    run.cwd,
                    run.command,
                    run.tag,
                    run.project,
                    run.category.map(|category| category.as_str()),
                    run.session_id,
                ],
            )
            .map_err(|err| TraceError::storage("insert run", err))?;

        let id = self.conn.last_insert_rowid();
        debug!(run_id = id, command = %run.command, "Run recorded");
        Ok(id)
    }

    /// Runs started in `[window.start, window.end)`, oldest first.
    pub fn query_runs(
        &self,
        window: &RunWindow,
        filters: &RunFilters,
        limit: usize,
    ) -> Result<Vec<RunRecord>> {
        let mut sql = format!("{RUN_SELECT} WHERE r.started_at >= ?1 AND r.started_at < ?2");
        let mut args = vec![
            Value::Text(to_db_time(window.start)),
            Value::Text(to_db_time(window.end)),
        ];

        let mut push_filter = |column: &str, value: Value| {
            args.push(value);
            sql.push_str(&format!(" AND {column} = ?{}", args.len()));
        };
        if let Some(tag) = &filters.tag {
            push_filter("r.tag", Value::Text(tag.clone()));
        }
        if let Some(project) = &filters.project {
            push_filter("r.project", Value::Text(project.clone()));
        }
        if let Some(category) = filters.category {
            push_filter("r.category", Value::Text(category.as_str().to_string()));
        }
        if let Some(session_id) = filters.session_id {
            push_filter("r.session_id", Value::Integer(session_id));
        }

        args.push(Value::Integer(sql_limit(limit)));
        sql.push_str(&format!(
            " ORDER BY r.started_at ASC, r.id ASC LIMIT ?{}",
            args.len()
        ));

        self.collect_runs(&sql, args, "query runs")
    }

    /// The most recent runs regardless of window, newest first.
    pub fn query_recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let sql = format!("{RUN_SELECT} ORDER BY r.started_at DESC, r.id DESC LIMIT ?1");
        self.collect_runs(&sql, vec![Value::Integer(sql_limit(limit))], "query recent runs")
    }

    fn collect_runs(&self, sql: &str, args: Vec<Value>, context: &str) -> Result<Vec<RunRecord>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|err| TraceError::storage(format!("prepare {context}"), err))?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), row_to_run)
            .map_err(|err| TraceError::storage(context, err))?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row.map_err(|err| TraceError::storage(format!("decode {context}"), err))?);
        }
        Ok(runs)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────

    pub fn insert_session(&self, name: &str, started_at: DateTime<Utc>) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO sessions (name, started_at) VALUES (?1, ?2)",
                params![name, to_db_time(started_at)],
            )
            .map_err(|err| TraceError::storage("insert session", err))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn end_session(&self, id: i64, ended_at: DateTime<Utc>) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE sessions SET ended_at = ?1 WHERE id = ?2",
                params![to_db_time(ended_at), id],
            )
            .map_err(|err| TraceError::storage("end session", err))?;
        if updated == 0 {
            return Err(TraceError::SessionNotFound(id));
        }
        Ok(())
    }

    pub fn get_session(&self, id: i64) -> Result<Option<SessionRecord>> {
        self.conn
            .query_row(
                "SELECT id, name, started_at, ended_at FROM sessions WHERE id = ?1",
                params![id],
                row_to_session,
            )
            .optional()
            .map_err(|err| TraceError::storage("get session", err))
    }

    /// Sessions, most recently started first.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, started_at, ended_at FROM sessions \
                 ORDER BY started_at DESC, id DESC LIMIT ?1",
            )
            .map_err(|err| TraceError::storage("prepare list sessions", err))?;
        let rows = stmt
            .query_map(params![sql_limit(limit)], row_to_session)
            .map_err(|err| TraceError::storage("list sessions", err))?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row.map_err(|err| TraceError::storage("decode session", err))?);
        }
        Ok(sessions)
    }

    pub fn get_active_session(&self) -> Result<Option<i64>> {
        let raw = read_meta(&self.conn, META_ACTIVE_SESSION)?;
        Ok(raw.and_then(|value| match value.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(value = %value, "Ignoring malformed active session pointer");
                None
            }
        }))
    }

    pub fn set_active_session(&self, id: Option<i64>) -> Result<()> {
        match id {
            Some(id) => write_meta(&self.conn, META_ACTIVE_SESSION, &id.to_string()),
            None => self
                .conn
                .execute("DELETE FROM meta WHERE key = ?1", params![META_ACTIVE_SESSION])
                .map(|_| ())
                .map_err(|err| TraceError::storage("clear active session", err)),
        }
    }
}

fn ensure_runs_columns(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(runs)")
        .map_err(|err| TraceError::storage("read runs schema", err))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|err| TraceError::storage("read runs schema rows", err))?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row.map_err(|err| TraceError::storage("decode schema row", err))?);
    }

    for (name, declaration) in RUNS_V2_COLUMNS {
        if columns.iter().any(|column| column == name) {
            continue;
        }
        conn.execute(&format!("ALTER TABLE runs ADD COLUMN {name} {declaration}"), [])
            .map_err(|err| TraceError::storage(format!("add runs.{name} column"), err))?;
        info!(column = name, "Added runs column");
    }

    Ok(())
}

fn raise_schema_version(conn: &Connection) -> Result<()> {
    let stored = read_meta(conn, META_SCHEMA_VERSION)?;
    match stored.as_deref().map(str::parse::<i64>) {
        Some(Ok(version)) if version >= CURRENT_SCHEMA_VERSION => {
            if version > CURRENT_SCHEMA_VERSION {
                warn!(
                    stored = version,
                    supported = CURRENT_SCHEMA_VERSION,
                    "Database schema is newer than this build; continuing"
                );
            }
            Ok(())
        }
        previous => {
            if let Some(Ok(version)) = previous {
                info!(from = version, to = CURRENT_SCHEMA_VERSION, "Schema migrated");
            }
            write_meta(conn, META_SCHEMA_VERSION, &CURRENT_SCHEMA_VERSION.to_string())
        }
    }
}

fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    })
    .optional()
    .map_err(|err| TraceError::storage(format!("read meta {key}"), err))
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(|err| TraceError::storage(format!("write meta {key}"), err))?;
    Ok(())
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: get_time(row, 1)?,
        finished_at: get_time(row, 2)?,
        duration_s: row.get(3)?,
        exit_code: row.get(4)?,
        cwd: row.get(5)?,
        command: row.get(6)?,
        tag: row.get(7)?,
        project: row.get(8)?,
        category: row.get(9)?,
        session_id: row.get(10)?,
        session_name: row.get(11)?,
    })
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let ended_at = match row.get::<_, Option<String>>(3)? {
        Some(raw) => Some(parse_db_time(&raw).map_err(|err| conversion_error(3, err))?),
        None => None,
    };
    Ok(SessionRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        started_at: get_time(row, 2)?,
        ended_at,
    })
}

fn get_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_db_time(&raw).map_err(|err| conversion_error(idx, err))
}

fn conversion_error(idx: usize, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Fixed-width UTC text so that string order matches time order.
fn to_db_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn parse_db_time(value: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use chrono::{Duration, TimeZone};

    fn open_temp() -> (tempfile::TempDir, Store) {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let store = Store::open(temp_dir.path().join("timetrace.db")).expect("open store");
        (temp_dir, store)
    }

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 30, hour, minute, second).unwrap()
    }

    fn run_at(started_at: DateTime<Utc>, secs: i64, command: &str) -> NewRun {
        NewRun {
            started_at,
            finished_at: started_at + Duration::seconds(secs),
            exit_code: 0,
            cwd: "/repo".to_string(),
            command: command.to_string(),
            tag: None,
            project: None,
            category: None,
            session_id: None,
        }
    }

    fn schema_sql(store: &Store) -> Vec<String> {
        let mut stmt = store
            .conn
            .prepare("SELECT COALESCE(sql, name) FROM sqlite_master ORDER BY type, name")
            .unwrap();
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
        rows.map(|row| row.unwrap()).collect()
    }

    #[test]
    fn migrate_is_idempotent() {
        let (_dir, store) = open_temp();
        let before = schema_sql(&store);

        store.migrate().expect("second migrate");
        store.migrate().expect("third migrate");

        assert_eq!(schema_sql(&store), before);
        assert_eq!(store.schema_version().unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn in_memory_store_is_fully_migrated() {
        let store = Store::open_in_memory().expect("open in memory");
        assert_eq!(store.schema_version().unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let id = store.insert_run(&run_at(at(9, 0, 0), 4, "make")).unwrap();
        assert_eq!(store.query_recent_runs(1).unwrap()[0].id, id);
    }

    #[test]
    fn reopening_existing_store_keeps_rows() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("nested").join("timetrace.db");

        let id = {
            let store = Store::open(&path).expect("first open");
            store.insert_run(&run_at(at(9, 0, 0), 3, "ls -la")).unwrap()
        };

        let store = Store::open(&path).expect("second open");
        let runs = store.query_recent_runs(10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, id);
    }

    #[test]
    fn upgrades_v1_database_without_losing_data() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
                 CREATE TABLE runs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    started_at TEXT NOT NULL,
                    finished_at TEXT NOT NULL,
                    duration_s REAL NOT NULL,
                    exit_code INTEGER NOT NULL,
                    cwd TEXT NOT NULL,
                    command TEXT NOT NULL,
                    tag TEXT
                 );
                 INSERT INTO meta (key, value) VALUES ('schema_version', '1');
                 INSERT INTO runs (started_at, finished_at, duration_s, exit_code, cwd, command, tag)
                 VALUES ('2026-01-30T09:00:00.000000+00:00', '2026-01-30T09:00:05.000000+00:00',
                         5.0, 1, '/legacy', 'make', 'old');",
            )
            .unwrap();
        }

        let store = Store::open(&path).expect("open legacy store");
        assert_eq!(store.schema_version().unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let runs = store.query_recent_runs(10).unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.command, "make");
        assert_eq!(run.tag.as_deref(), Some("old"));
        assert_eq!(run.exit_code, 1);
        assert_eq!(run.project, None);
        assert_eq!(run.category, None);
        assert_eq!(run.session_id, None);

        let mut new_run = run_at(at(10, 0, 0), 1, "git status");
        new_run.category = Some(Category::Git);
        store.insert_run(&new_run).expect("insert after upgrade");
    }

    #[test]
    fn newer_schema_version_is_left_alone() {
        let (_dir, store) = open_temp();
        write_meta(&store.conn, META_SCHEMA_VERSION, "99").unwrap();

        store.migrate().expect("migrate over future version");
        assert_eq!(store.schema_version().unwrap(), Some(99));
    }

    #[test]
    fn insert_then_recent_round_trips_all_fields() {
        let (_dir, store) = open_temp();
        let session_id = store.insert_session("deep work", at(8, 0, 0)).unwrap();

        let run = NewRun {
            started_at: at(9, 15, 0),
            finished_at: at(9, 15, 42),
            exit_code: 3,
            cwd: "/home/me/repo".to_string(),
            command: "npm test".to_string(),
            tag: Some("client".to_string()),
            project: Some("acme".to_string()),
            category: Some(Category::Testing),
            session_id: Some(session_id),
        };
        let id = store.insert_run(&run).unwrap();

        let recent = store.query_recent_runs(1).unwrap();
        assert_eq!(recent.len(), 1);
        let got = &recent[0];
        assert_eq!(got.id, id);
        assert_eq!(got.started_at, run.started_at);
        assert_eq!(got.finished_at, run.finished_at);
        assert_eq!(got.duration_s, 42.0);
        assert_eq!(got.exit_code, 3);
        assert_eq!(got.cwd, run.cwd);
        assert_eq!(got.command, run.command);
        assert_eq!(got.tag, run.tag);
        assert_eq!(got.project, run.project);
        assert_eq!(got.category.as_deref(), Some("testing"));
        assert_eq!(got.session_id, Some(session_id));
        assert_eq!(got.session_name.as_deref(), Some("deep work"));
    }

    #[test]
    fn ids_increase_monotonically() {
        let (_dir, store) = open_temp();
        let first = store.insert_run(&run_at(at(9, 0, 0), 1, "a")).unwrap();
        let second = store.insert_run(&run_at(at(8, 0, 0), 1, "b")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn query_runs_respects_half_open_window() {
        let (_dir, store) = open_temp();
        let start = at(10, 0, 0);
        let end = at(11, 0, 0);

        // inserted out of order on purpose
        for (time, command) in [
            (at(11, 0, 0), "at-end"),
            (at(10, 30, 0), "middle"),
            (at(9, 59, 59), "before"),
            (at(10, 0, 0), "at-start"),
            (at(10, 59, 59), "last-second"),
        ] {
            store.insert_run(&run_at(time, 1, command)).unwrap();
        }

        let window = RunWindow::new(start, end, "test");
        let runs = store
            .query_runs(&window, &RunFilters::default(), 100)
            .unwrap();
        let commands: Vec<&str> = runs.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["at-start", "middle", "last-second"]);
        assert!(runs.iter().all(|r| window.contains(r.started_at)));
    }

    #[test]
    fn query_runs_applies_filters_and_limit() {
        let (_dir, store) = open_temp();
        let session_id = store.insert_session("focus", at(7, 0, 0)).unwrap();

        let mut tagged = run_at(at(9, 0, 0), 5, "cargo build");
        tagged.tag = Some("course".to_string());
        tagged.category = Some(Category::Build);
        store.insert_run(&tagged).unwrap();

        let mut in_session = run_at(at(9, 5, 0), 5, "git push");
        in_session.project = Some("site".to_string());
        in_session.category = Some(Category::Git);
        in_session.session_id = Some(session_id);
        store.insert_run(&in_session).unwrap();

        store.insert_run(&run_at(at(9, 10, 0), 5, "make")).unwrap();

        let window = RunWindow::new(at(0, 0, 0), at(23, 0, 0), "day");
        let by_tag = RunFilters {
            tag: Some("course".to_string()),
            ..Default::default()
        };
        let runs = store.query_runs(&window, &by_tag, 100).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].command, "cargo build");

        let by_category = RunFilters {
            category: Some(Category::Git),
            ..Default::default()
        };
        let runs = store.query_runs(&window, &by_category, 100).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].session_name.as_deref(), Some("focus"));

        let by_session_and_project = RunFilters {
            project: Some("site".to_string()),
            session_id: Some(session_id),
            ..Default::default()
        };
        assert_eq!(
            store
                .query_runs(&window, &by_session_and_project, 100)
                .unwrap()
                .len(),
            1
        );

        let limited = store
            .query_runs(&window, &RunFilters::default(), 2)
            .unwrap();
        let commands: Vec<&str> = limited.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["cargo build", "git push"]);
    }

    #[test]
    fn recent_runs_are_newest_first() {
        let (_dir, store) = open_temp();
        store.insert_run(&run_at(at(9, 0, 0), 1, "first")).unwrap();
        store.insert_run(&run_at(at(11, 0, 0), 1, "third")).unwrap();
        store.insert_run(&run_at(at(10, 0, 0), 1, "second")).unwrap();

        let runs = store.query_recent_runs(2).unwrap();
        let commands: Vec<&str> = runs.iter().map(|r| r.command.as_str()).collect();
        assert_eq!(commands, vec!["third", "second"]);
    }

    #[test]
    fn active_session_pointer_round_trips() {
        let (_dir, store) = open_temp();
        assert_eq!(store.get_active_session().unwrap(), None);

        store.set_active_session(Some(7)).unwrap();
        assert_eq!(store.get_active_session().unwrap(), Some(7));

        store.set_active_session(Some(8)).unwrap();
        assert_eq!(store.get_active_session().unwrap(), Some(8));

        store.set_active_session(None).unwrap();
        assert_eq!(store.get_active_session().unwrap(), None);
    }

    #[test]
    fn ends_sessions_and_lists_newest_first() {
        let (_dir, store) = open_temp();
        let first = store.insert_session("morning", at(8, 0, 0)).unwrap();
        let second = store.insert_session("afternoon", at(13, 0, 0)).unwrap();

        store.end_session(first, at(12, 0, 0)).unwrap();
        let ended = store.get_session(first).unwrap().expect("session row");
        assert_eq!(ended.ended_at, Some(at(12, 0, 0)));
        assert!(ended.is_ended());

        let sessions = store.list_sessions(10).unwrap();
        let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second, first]);

        let err = store.end_session(999, at(12, 0, 0)).unwrap_err();
        assert!(matches!(err, TraceError::SessionNotFound(999)));
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let (_dir, store) = open_temp();
        let result: Result<()> = store.with_transaction(|store| {
            store.insert_session("doomed", at(8, 0, 0))?;
            Err(TraceError::InvalidInput("abort".to_string()))
        });
        assert!(result.is_err());
        assert!(store.list_sessions(10).unwrap().is_empty());
    }

    #[test]
    fn open_fails_for_unwritable_path() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = Store::open(blocker.join("timetrace.db"))
            .err()
            .expect("open should fail");
        assert!(err.is_storage());
    }
}
