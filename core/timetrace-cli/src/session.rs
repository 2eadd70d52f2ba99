//! `session start|stop|status|list`.

use chrono::{SecondsFormat, Utc};
use clap::Subcommand;

use timetrace_core::{ActiveSession, Result, SessionManager, SessionRecord, Store};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Start a session and make it active
    Start {
        /// Session name
        name: String,
    },

    /// Stop the active session
    Stop,

    /// Show the active session
    Status,

    /// List recent sessions
    List {
        /// Number of sessions to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

pub fn run(store: &Store, command: SessionCommand) -> Result<i32> {
    let sessions = SessionManager::new(store);
    match command {
        SessionCommand::Start { name } => {
            let record = sessions.start(&name, Utc::now())?;
            println!("Started session #{}: {}", record.id, record.name);
        }
        SessionCommand::Stop => match sessions.stop(Utc::now())? {
            Some(stopped) => println!("Stopped session #{}.", stopped.id),
            None => println!("No active session."),
        },
        SessionCommand::Status => match sessions.active()? {
            Some(active) => println!("{}", status_line(&active)),
            None => println!("No active session."),
        },
        SessionCommand::List { limit } => {
            let records = sessions.list(limit)?;
            if records.is_empty() {
                println!("No sessions yet.");
            } else {
                println!("Sessions (showing {}):", records.len());
                for record in &records {
                    println!("{}", list_line(record));
                }
            }
        }
    }
    Ok(0)
}

fn status_line(active: &ActiveSession) -> String {
    match active.name() {
        Some(name) => format!("Active session: #{} - {name}", active.id),
        None => format!("Active session: #{}", active.id),
    }
}

fn list_line(record: &SessionRecord) -> String {
    let ended = record
        .ended_at
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "  #{:<5} {:<24} started={}  ended={ended}",
        record.id,
        record.name,
        record.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
