//! # timetrace-core
//!
//! Core library for timetrace: records how long shell commands take and
//! reports where the time went.
//!
//! ## Design Principles
//!
//! - **Synchronous**: no async runtime; every call completes near-instantly.
//! - **Store owns the file**: only [`Store`] reads or writes the database.
//! - **Computed once**: redaction and categorization run at insert time and
//!   are persisted, never recomputed by reports.
//! - **Total fallbacks**: classification and redaction cannot fail, so a
//!   formatting edge case never blocks recording a duration.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use timetrace_core::{build_report, render_report_text, RunFilters, RunWindow, Store};
//!
//! let store = Store::open("/tmp/timetrace.db")?;
//! let window = RunWindow::today(chrono::Local::now());
//! let runs = store.query_runs(&window, &RunFilters::default(), 10_000)?;
//! println!("{}", render_report_text(&build_report(&runs, &window.title)));
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod recorder;
pub mod report;
pub mod sanitize;
pub mod sessions;
pub mod storage;
pub mod store;
pub mod types;
pub mod window;

pub use classify::{categorize, Category};
pub use config::{IgnoreConfig, IgnoreMatcher};
pub use error::{Result, TraceError};
pub use format::{abbreviate_path, format_duration};
pub use recorder::{PreparedCommand, RecordOutcome, Recorder, RunContext, RunTiming};
pub use report::{build_report, render_report_text, CommandStats, GroupTotal, Report};
pub use sanitize::{sanitize_command, split_command_line};
pub use sessions::{ActiveSession, SessionManager};
pub use storage::StorageConfig;
pub use store::{Store, CURRENT_SCHEMA_VERSION};
pub use types::{elapsed_seconds, NewRun, RunFilters, RunRecord, SessionRecord};
pub use window::{parse_timestamp, RunWindow};
