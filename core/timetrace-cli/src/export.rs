//! JSON and CSV export of recorded runs.

use std::path::Path;

use chrono::SecondsFormat;
use clap::ValueEnum;
use serde::Serialize;

use timetrace_core::{Result, RunRecord, TraceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

const CSV_HEADER: [&str; 12] = [
    "id",
    "started_at",
    "finished_at",
    "duration_s",
    "exit_code",
    "cwd",
    "command",
    "tag",
    "project",
    "category",
    "session_id",
    "session_name",
];

/// Flat, stable row shape shared by both formats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub started_at: String,
    pub finished_at: String,
    pub duration_s: f64,
    pub exit_code: i32,
    pub cwd: String,
    pub command: String,
    pub tag: Option<String>,
    pub project: Option<String>,
    pub category: Option<String>,
    pub session_id: Option<i64>,
    pub session_name: Option<String>,
}

impl From<&RunRecord> for ExportRow {
    fn from(run: &RunRecord) -> Self {
        Self {
            id: run.id,
            started_at: run.started_at.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            finished_at: run.finished_at.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            duration_s: run.duration_s,
            exit_code: run.exit_code,
            cwd: run.cwd.clone(),
            command: run.command.clone(),
            tag: run.tag.clone(),
            project: run.project.clone(),
            category: run.category.clone(),
            session_id: run.session_id,
            session_name: run.session_name.clone(),
        }
    }
}

impl ExportRow {
    fn csv_fields(&self) -> [String; 12] {
        [
            self.id.to_string(),
            self.started_at.clone(),
            self.finished_at.clone(),
            self.duration_s.to_string(),
            self.exit_code.to_string(),
            self.cwd.clone(),
            self.command.clone(),
            self.tag.clone().unwrap_or_default(),
            self.project.clone().unwrap_or_default(),
            self.category.clone().unwrap_or_default(),
            self.session_id.map(|id| id.to_string()).unwrap_or_default(),
            self.session_name.clone().unwrap_or_default(),
        ]
    }
}

/// Writes `runs` to `out`, or to stdout when no path is given.
pub fn export(runs: &[RunRecord], format: ExportFormat, out: Option<&Path>) -> Result<i32> {
    let rows: Vec<ExportRow> = runs.iter().map(ExportRow::from).collect();
    let payload = match format {
        ExportFormat::Json => render_json(&rows)?,
        ExportFormat::Csv => render_csv(&rows),
    };

    match out {
        Some(path) => {
            fs_err::write(path, payload)
                .map_err(|err| TraceError::io("write export file", err))?;
            println!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => print!("{payload}"),
    }
    Ok(0)
}

pub fn render_json(rows: &[ExportRow]) -> Result<String> {
    let mut json = serde_json::to_string_pretty(rows).map_err(|source| TraceError::Json {
        context: "serialize export".to_string(),
        source,
    })?;
    json.push('\n');
    Ok(json)
}

/// RFC 4180: comma separated, CRLF line endings, quotes doubled.
pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    push_csv_line(&mut out, CSV_HEADER.iter().copied());
    for row in rows {
        let fields = row.csv_fields();
        push_csv_line(&mut out, fields.iter().map(String::as_str));
    }
    out
}

fn push_csv_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = fields.map(csv_field).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
