//! timetrace: track how long shell commands take and report where the time went.
//!
//! ## Subcommands
//!
//! - `run`: execute a command and record its duration
//! - `record`: record a run without executing it (called by shell hooks)
//! - `report` / `list` / `export`: read back what was recorded
//! - `session`: start, stop and inspect focused work sessions
//! - `ignore`: manage the rules deciding which commands are recorded
//! - `init`: print shell hook code for automatic tracking

mod export;
mod hooks;
mod ignore;
mod logging;
mod report;
mod run;
mod session;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use timetrace_core::{Category, Result, RunFilters, RunWindow, StorageConfig, Store};

#[derive(Parser)]
#[command(name = "timetrace")]
#[command(about = "Track command durations and generate local-first time reports")]
#[command(version)]
struct Cli {
    /// Path to the SQLite database (default: OS data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command and record how long it took
    Run {
        /// Tag to attach to this run (e.g. "course", "client")
        #[arg(long)]
        tag: Option<String>,

        /// Project name override for grouping in reports
        #[arg(long)]
        project: Option<String>,

        /// Working directory to run the command in
        #[arg(long, value_name = "PATH")]
        cwd: Option<PathBuf>,

        /// Command to execute, after `--`
        #[arg(
            value_name = "COMMAND",
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        command: Vec<String>,
    },

    /// Record a run without executing it (used by shell hooks)
    Record {
        /// Start time (RFC 3339, or local ISO 8601 without offset)
        #[arg(long)]
        started: String,

        /// Finish time (RFC 3339, or local ISO 8601 without offset)
        #[arg(long)]
        finished: String,

        /// Exit code of the command
        #[arg(long = "exit", allow_hyphen_values = true)]
        exit_code: i32,

        /// Working directory the command ran in
        #[arg(long)]
        cwd: String,

        /// Command line as typed
        #[arg(long, allow_hyphen_values = true)]
        command: String,

        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        project: Option<String>,
    },

    /// Print a time report for a window
    Report {
        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Maximum number of runs to include
        #[arg(long, default_value_t = 10_000)]
        limit: usize,
    },

    /// List recently recorded runs
    List {
        /// Number of runs to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Export runs for a window as JSON or CSV
    Export {
        #[arg(long, value_enum, default_value_t = export::ExportFormat::Json)]
        format: export::ExportFormat,

        /// Output file (default: stdout)
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Maximum number of runs to include
        #[arg(long, default_value_t = 100_000)]
        limit: usize,
    },

    /// Manage focused work sessions
    Session {
        #[command(subcommand)]
        command: session::SessionCommand,
    },

    /// Manage ignore rules for automatic tracking
    Ignore {
        #[command(subcommand)]
        command: ignore::IgnoreCommand,
    },

    /// Print shell hook code for automatic tracking
    Init {
        #[arg(value_enum)]
        shell: hooks::Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
struct WindowArgs {
    /// Today, local time (default)
    #[arg(long)]
    today: bool,

    /// Yesterday, local time
    #[arg(long)]
    yesterday: bool,

    /// The last N days, ending now
    #[arg(long, value_name = "DAYS")]
    last: Option<u32>,
}

impl WindowArgs {
    fn resolve(&self) -> RunWindow {
        let now = chrono::Local::now();
        if self.yesterday {
            RunWindow::yesterday(now)
        } else if let Some(days) = self.last {
            RunWindow::last_days(now, days)
        } else {
            RunWindow::today(now)
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Only runs with this tag
    #[arg(long)]
    tag: Option<String>,

    /// Only runs with this project name
    #[arg(long)]
    project: Option<String>,

    /// Only runs in this category (git, container, testing, build, lint, node, other)
    #[arg(long)]
    category: Option<String>,

    /// Only runs attributed to this session id
    #[arg(long)]
    session: Option<i64>,
}

impl FilterArgs {
    fn resolve(&self) -> Result<RunFilters> {
        let category = self
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()?;
        Ok(RunFilters {
            tag: self.tag.clone(),
            project: self.project.clone(),
            category,
            session_id: self.session,
        })
    }
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = %err, "timetrace failed");
            eprintln!("Error: {err}");
            err.exit_code()
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> Result<i32> {
    if let Commands::Init { shell } = cli.command {
        println!("{}", hooks::script(shell));
        return Ok(0);
    }
    let storage = StorageConfig::resolve(cli.db.as_deref())?;

    match cli.command {
        Commands::Run {
            tag,
            project,
            cwd,
            command,
        } => run::run(
            &storage,
            &command,
            run::RunOptions {
                tag,
                project,
                cwd,
            },
        ),
        Commands::Record {
            started,
            finished,
            exit_code,
            cwd,
            command,
            tag,
            project,
        } => run::record(
            &storage,
            &run::RecordArgs {
                started,
                finished,
                exit_code,
                cwd,
                command,
                tag,
                project,
            },
        ),
        Commands::Report {
            window,
            filters,
            limit,
        } => {
            let store = Store::open(storage.db_path())?;
            report::report(&store, window.resolve(), &filters.resolve()?, limit)
        }
        Commands::List { limit } => {
            let store = Store::open(storage.db_path())?;
            report::list(&store, limit)
        }
        Commands::Export {
            format,
            out,
            window,
            filters,
            limit,
        } => {
            let store = Store::open(storage.db_path())?;
            let runs = store.query_runs(&window.resolve(), &filters.resolve()?, limit)?;
            export::export(&runs, format, out.as_deref())
        }
        Commands::Session { command } => {
            let store = Store::open(storage.db_path())?;
            session::run(&store, command)
        }
        Commands::Ignore { command } => ignore::run(&storage.config_file(), command),
        Commands::Init { .. } => Ok(0),
    }
}
