//! `run` wraps a command and records it; `record` stores a run a shell hook
//! already timed.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use chrono::Utc;
use tracing::{debug, info};

use timetrace_core::{
    format_duration, parse_timestamp, split_command_line, IgnoreConfig, PreparedCommand,
    RecordOutcome, Recorder, Result, RunContext, RunTiming, StorageConfig, Store, TraceError,
};

pub struct RunOptions {
    pub tag: Option<String>,
    pub project: Option<String>,
    pub cwd: Option<PathBuf>,
}

pub struct RecordArgs {
    pub started: String,
    pub finished: String,
    pub exit_code: i32,
    pub cwd: String,
    pub command: String,
    pub tag: Option<String>,
    pub project: Option<String>,
}

/// Executes `argv` and records the run unless it matches an ignore rule.
/// Returns the child's exit code so the caller can pass it through.
pub fn run(storage: &StorageConfig, argv: &[String], options: RunOptions) -> Result<i32> {
    let cwd = resolve_run_dir(options.cwd.as_deref())?;
    let ignore = IgnoreConfig::load(&storage.config_file()).matcher();
    let prepared = PreparedCommand::new(argv, &ignore);

    if prepared.ignored {
        debug!(command = %prepared.command, "Ignored command; running without recording");
        return execute(argv, &cwd);
    }

    let store = Store::open(storage.db_path())?;

    let started_at = Utc::now();
    let exit_code = execute(argv, &cwd)?;
    let finished_at = Utc::now();

    let context = RunContext {
        cwd: cwd.to_string_lossy().into_owned(),
        tag: options.tag,
        project: options.project,
    };
    let timing = RunTiming {
        started_at,
        finished_at,
        exit_code,
    };
    let outcome = Recorder::new(&store).record(&prepared, timing, &context)?;

    let mark = if exit_code == 0 { "✔" } else { "✖" };
    eprintln!(
        "{mark} Finished in {} (exit {exit_code})",
        format_duration(timing.duration_s())
    );
    if let RecordOutcome::Recorded { run_id, session_id } = outcome {
        info!(run_id, exit_code, "Recorded run");
        eprintln!("{}", saved_line(run_id, &context, session_id, &prepared));
    }

    Ok(exit_code)
}

/// Stores a run timed by a shell hook. Ignored commands succeed silently.
pub fn record(storage: &StorageConfig, args: &RecordArgs) -> Result<i32> {
    let argv = split_command_line(&args.command);
    let ignore = IgnoreConfig::load(&storage.config_file()).matcher();
    let prepared = PreparedCommand::new(&argv, &ignore);
    if prepared.ignored {
        debug!(command = %prepared.command, "Ignored hook command");
        return Ok(0);
    }

    let timing = RunTiming {
        started_at: parse_timestamp(&args.started)?,
        finished_at: parse_timestamp(&args.finished)?,
        exit_code: args.exit_code,
    };
    let context = RunContext {
        cwd: absolute_path(Path::new(&args.cwd))?
            .to_string_lossy()
            .into_owned(),
        tag: args.tag.clone(),
        project: args.project.clone(),
    };

    let store = Store::open(storage.db_path())?;
    Recorder::new(&store).record(&prepared, timing, &context)?;
    Ok(0)
}

fn saved_line(
    run_id: i64,
    context: &RunContext,
    session_id: Option<i64>,
    prepared: &PreparedCommand,
) -> String {
    let mut parts = vec![format!("Saved run #{run_id}")];
    if let Some(project) = context.project.as_deref().filter(|p| !p.trim().is_empty()) {
        parts.push(format!("project={project:?}"));
    }
    if let Some(tag) = context.tag.as_deref().filter(|t| !t.trim().is_empty()) {
        parts.push(format!("tag={tag:?}"));
    }
    if let Some(session_id) = session_id {
        parts.push(format!("session={session_id}"));
    }
    parts.push(format!("category={}", prepared.category));
    parts.join("  ")
}

fn resolve_run_dir(requested: Option<&Path>) -> Result<PathBuf> {
    let dir = match requested {
        Some(path) => absolute_path(path)?,
        None => current_dir()?,
    };
    if !dir.is_dir() {
        return Err(TraceError::InvalidInput(format!(
            "Working directory does not exist: {}",
            dir.display()
        )));
    }
    Ok(dir)
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(current_dir()?.join(path))
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|err| TraceError::io("read current directory", err))
}

/// Spawns the command and waits for it. SIGINT is ignored by this process
/// while the child runs, so Ctrl-C reaches only the child and its run can
/// still be recorded.
fn execute(argv: &[String], cwd: &Path) -> Result<i32> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        TraceError::InvalidInput(
            "No command provided. Usage: timetrace run -- <command...>".to_string(),
        )
    })?;

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .spawn()
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => TraceError::CommandNotFound(program.clone()),
            _ => TraceError::io(format!("start {program}"), err),
        })?;

    let _interrupt = InterruptGuard::install();
    let status = child
        .wait()
        .map_err(|err| TraceError::io(format!("wait for {program}"), err))?;
    Ok(exit_code_of(status))
}

/// Normal exits pass through; a signal death maps to `128 + signo`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(unix)]
struct InterruptGuard {
    previous: libc::sighandler_t,
}

#[cfg(unix)]
impl InterruptGuard {
    fn install() -> Self {
        // SAFETY: SIG_IGN is a valid disposition; the previous one is restored on drop.
        let previous = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.previous != libc::SIG_ERR {
            // SAFETY: restores the disposition returned by `signal` above.
            unsafe {
                libc::signal(libc::SIGINT, self.previous);
            }
        }
    }
}

#[cfg(not(unix))]
struct InterruptGuard;

#[cfg(not(unix))]
impl InterruptGuard {
    fn install() -> Self {
        Self
    }
}
