//! Logging setup.
//!
//! Logs go to stderr so that reports and exports on stdout stay clean. The
//! level comes from `TIMETRACE_DEBUG_LOG` (forces `debug`), else `RUST_LOG`,
//! else `warn`. Setting `TIMETRACE_LOG_DIR` additionally writes a daily
//! rolling file there.

use std::env;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV_VAR: &str = "TIMETRACE_DEBUG_LOG";
const LOG_DIR_ENV_VAR: &str = "TIMETRACE_LOG_DIR";
const LOG_FILE_PREFIX: &str = "timetrace.log";

/// Installs the global subscriber. The returned guard flushes the file
/// writer on drop and must live until the process exits.
pub fn init() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(build_filter());

    let (file_layer, guard) = match log_dir() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(build_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn build_filter() -> EnvFilter {
    if debug_enabled(env::var(DEBUG_ENV_VAR).ok().as_deref()) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

fn debug_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn log_dir() -> Option<PathBuf> {
    env::var_os(LOG_DIR_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_values() {
        assert!(debug_enabled(Some("1")));
        assert!(debug_enabled(Some("yes")));
        assert!(!debug_enabled(Some("0")));
        assert!(!debug_enabled(Some("")));
        assert!(!debug_enabled(None));
    }
}
