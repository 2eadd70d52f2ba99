//! Time reports over a bounded sequence of runs.
//!
//! `build_report` does the aggregation and returns plain data; rendering is a
//! separate pure step so totals and rankings can be tested without matching
//! strings.

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::classify::Category;
use crate::format::{abbreviate_path, format_duration};
use crate::types::RunRecord;

pub const TOP_PROJECTS: usize = 12;
pub const TOP_CATEGORIES: usize = 12;
pub const TOP_COMMANDS: usize = 12;
pub const TOP_FAILED: usize = 8;

/// Rows shown under "Top time sinks" in the text report.
const RENDERED_COMMANDS: usize = 8;
const BAR_WIDTH: usize = 18;
const UNKNOWN_PROJECT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandStats {
    pub command: String,
    pub total_s: f64,
    pub runs: u32,
    pub failed_runs: u32,
    pub failed_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub total_s: f64,
    pub success_s: f64,
    pub failed_s: f64,
    pub by_project: Vec<GroupTotal>,
    pub by_category: Vec<GroupTotal>,
    pub top_commands: Vec<CommandStats>,
    pub top_failed: Vec<CommandStats>,
}

impl Report {
    /// Share of tracked time spent on failed runs; `None` when nothing was
    /// tracked.
    pub fn fail_ratio(&self) -> Option<f64> {
        (self.total_s > 0.0).then(|| self.failed_s / self.total_s)
    }

    pub fn is_empty(&self) -> bool {
        self.by_project.is_empty() && self.top_commands.is_empty()
    }
}

/// Project grouping key: explicit project, else the last segment of `cwd`.
pub fn project_key(run: &RunRecord) -> String {
    if let Some(project) = run.project.as_deref().filter(|p| !p.is_empty()) {
        return project.to_string();
    }

    let trimmed = run.cwd.trim_end_matches(['/', '\\']);
    match trimmed.rsplit(['/', '\\']).next().filter(|s| !s.is_empty()) {
        Some(segment) => segment.to_string(),
        None if !run.cwd.is_empty() => abbreviate_path(&run.cwd),
        None => UNKNOWN_PROJECT.to_string(),
    }
}

fn category_key(run: &RunRecord) -> String {
    run.category
        .clone()
        .unwrap_or_else(|| Category::Other.as_str().to_string())
}

/// Sums seconds per key, remembering first-seen order for stable ranking.
#[derive(Default)]
struct DurationGroups {
    index: HashMap<String, usize>,
    totals: Vec<GroupTotal>,
}

impl DurationGroups {
    fn add(&mut self, key: String, seconds: f64) {
        match self.index.get(&key) {
            Some(&slot) => self.totals[slot].seconds += seconds,
            None => {
                self.index.insert(key.clone(), self.totals.len());
                self.totals.push(GroupTotal { key, seconds });
            }
        }
    }

    fn ranked(self, top: usize) -> Vec<GroupTotal> {
        let mut totals = self.totals;
        sort_desc_stable(&mut totals, |group| group.seconds);
        totals.truncate(top);
        totals
    }
}

#[derive(Default)]
struct CommandGroups {
    index: HashMap<String, usize>,
    stats: Vec<CommandStats>,
}

impl CommandGroups {
    fn add(&mut self, run: &RunRecord) {
        let slot = match self.index.get(&run.command) {
            Some(&slot) => slot,
            None => {
                self.index.insert(run.command.clone(), self.stats.len());
                self.stats.push(CommandStats {
                    command: run.command.clone(),
                    total_s: 0.0,
                    runs: 0,
                    failed_runs: 0,
                    failed_s: 0.0,
                });
                self.stats.len() - 1
            }
        };

        let stats = &mut self.stats[slot];
        stats.total_s += run.duration_s;
        stats.runs += 1;
        if !run.succeeded() {
            stats.failed_runs += 1;
            stats.failed_s += run.duration_s;
        }
    }

    fn ranked(self) -> (Vec<CommandStats>, Vec<CommandStats>) {
        let mut failed: Vec<CommandStats> = self
            .stats
            .iter()
            .filter(|stats| stats.failed_runs > 0)
            .cloned()
            .collect();
        sort_desc_stable(&mut failed, |stats| stats.failed_s);
        failed.truncate(TOP_FAILED);

        let mut all = self.stats;
        sort_desc_stable(&mut all, |stats| stats.total_s);
        all.truncate(TOP_COMMANDS);

        (all, failed)
    }
}

fn sort_desc_stable<T>(items: &mut [T], seconds: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| seconds(b).total_cmp(&seconds(a)));
}

/// Aggregates `runs` (already bounded by window and filters) in one pass.
pub fn build_report(runs: &[RunRecord], title: &str) -> Report {
    let mut total_s = 0.0;
    let mut success_s = 0.0;
    let mut failed_s = 0.0;
    let mut projects = DurationGroups::default();
    let mut categories = DurationGroups::default();
    let mut commands = CommandGroups::default();

    for run in runs {
        total_s += run.duration_s;
        if run.succeeded() {
            success_s += run.duration_s;
        } else {
            failed_s += run.duration_s;
        }
        projects.add(project_key(run), run.duration_s);
        categories.add(category_key(run), run.duration_s);
        commands.add(run);
    }

    let (top_commands, top_failed) = commands.ranked();
    Report {
        title: title.to_string(),
        total_s,
        success_s,
        failed_s,
        by_project: projects.ranked(TOP_PROJECTS),
        by_category: categories.ranked(TOP_CATEGORIES),
        top_commands,
        top_failed,
    }
}

fn bar(value: f64, max_value: f64) -> String {
    if max_value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max_value) * BAR_WIDTH as f64).round();
    let filled = filled.clamp(0.0, BAR_WIDTH as f64) as usize;
    format!("{}{}", "█".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

fn render_groups(out: &mut String, heading: &str, groups: &[GroupTotal], key_width: usize) {
    if groups.is_empty() {
        let _ = writeln!(out, "{heading}: (no data)");
        out.push('\n');
        return;
    }

    let max_value = groups.iter().map(|g| g.seconds).fold(0.0, f64::max);
    let _ = writeln!(out, "{heading}:");
    for group in groups {
        let row = format!(
            "  {:<width$} {:>9}  {}",
            group.key,
            format_duration(group.seconds),
            bar(group.seconds, max_value),
            width = key_width
        );
        let _ = writeln!(out, "{}", row.trim_end());
    }
    out.push('\n');
}

/// Renders a report as aligned plain text.
pub fn render_report_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.title);
    out.push('\n');

    let _ = writeln!(out, "Total tracked: {}", format_duration(report.total_s));
    let _ = writeln!(out, "Successful:   {}", format_duration(report.success_s));
    let _ = writeln!(out, "Failed:       {}", format_duration(report.failed_s));
    if let Some(ratio) = report.fail_ratio() {
        let _ = writeln!(out, "Fail ratio:   {:.0}%", ratio * 100.0);
    }
    out.push('\n');

    render_groups(&mut out, "By category", &report.by_category, 10);
    render_groups(&mut out, "By project", &report.by_project, 14);

    if report.top_commands.is_empty() {
        out.push_str("Top commands: (no data)\n\n");
    } else {
        out.push_str("Top time sinks:\n");
        for stats in report.top_commands.iter().take(RENDERED_COMMANDS) {
            let mut extra = format!("{} runs", stats.runs);
            if stats.failed_runs > 0 {
                let _ = write!(extra, ", {} failed", stats.failed_runs);
            }
            let _ = writeln!(
                out,
                "  {:>9}  ({})  {}",
                format_duration(stats.total_s),
                extra,
                stats.command
            );
        }
        out.push('\n');
    }

    if report.failed_s > 0.0 && !report.top_failed.is_empty() {
        out.push_str("Wasted time (failed commands):\n");
        for stats in &report.top_failed {
            let _ = writeln!(
                out,
                "  {:>9}  ({} failed)  {}",
                format_duration(stats.failed_s),
                stats.failed_runs,
                stats.command
            );
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "Highlight: {} spent on failures.",
            format_duration(report.failed_s)
        );
    }

    out.trim_end().to_string()
}
