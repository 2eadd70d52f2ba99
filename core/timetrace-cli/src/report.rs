//! `report` and `list`.

use chrono::Local;

use timetrace_core::{
    build_report, format_duration, render_report_text, Result, RunFilters, RunRecord, RunWindow,
    Store,
};

pub fn report(store: &Store, window: RunWindow, filters: &RunFilters, limit: usize) -> Result<i32> {
    let runs = store.query_runs(&window, filters, limit)?;
    let report = build_report(&runs, &report_title(&window, filters));
    println!("{}", render_report_text(&report));
    Ok(0)
}

pub fn list(store: &Store, limit: usize) -> Result<i32> {
    let runs = store.query_recent_runs(limit)?;
    if runs.is_empty() {
        println!("No runs recorded yet.");
        return Ok(0);
    }

    println!("Recent runs (showing {}):", runs.len());
    for run in &runs {
        println!("{}", list_line(run));
    }
    Ok(0)
}

fn report_title(window: &RunWindow, filters: &RunFilters) -> String {
    match filters.session_id {
        Some(session_id) => format!("{}  (session {session_id})", window.title),
        None => window.title.clone(),
    }
}

fn list_line(run: &RunRecord) -> String {
    let status = if run.succeeded() {
        "ok".to_string()
    } else {
        format!("fail({})", run.exit_code)
    };
    let session = match (&run.session_name, run.session_id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("#{id}"),
        (None, None) => "-".to_string(),
    };
    let when = run
        .started_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    format!(
        "  #{:<5} {when}  {:>8}  {status:<9}  proj={}  cat={}  tag={}  sess={session}  {}",
        run.id,
        format_duration(run.duration_s),
        run.project.as_deref().unwrap_or("-"),
        run.category.as_deref().unwrap_or("-"),
        run.tag.as_deref().unwrap_or("-"),
        run.command,
    )
}
