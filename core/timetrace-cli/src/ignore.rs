//! `ignore list|add-prefix|add-regex|remove-prefix|remove-regex`.

use std::path::Path;

use clap::Subcommand;

use timetrace_core::{IgnoreConfig, Result};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum IgnoreCommand {
    /// Show ignore rules
    List,

    /// Ignore commands whose first word is PREFIX (e.g. "cd")
    AddPrefix { prefix: String },

    /// Ignore commands matching PATTERN
    AddRegex { pattern: String },

    /// Stop ignoring PREFIX
    RemovePrefix { prefix: String },

    /// Stop ignoring PATTERN
    RemoveRegex { pattern: String },
}

pub fn run(config_path: &Path, command: IgnoreCommand) -> Result<i32> {
    let mut config = IgnoreConfig::load(config_path);

    let message = match command {
        IgnoreCommand::List => {
            print!("{}", render_rules(&config));
            return Ok(0);
        }
        IgnoreCommand::AddPrefix { prefix } => config
            .add_prefix(&prefix)
            .then(|| format!("Added ignore prefix: {}", prefix.trim())),
        IgnoreCommand::AddRegex { pattern } => config
            .add_regex(&pattern)
            .then(|| format!("Added ignore regex: {pattern}")),
        IgnoreCommand::RemovePrefix { prefix } => config
            .remove_prefix(&prefix)
            .then(|| format!("Removed ignore prefix: {}", prefix.trim())),
        IgnoreCommand::RemoveRegex { pattern } => config
            .remove_regex(&pattern)
            .then(|| format!("Removed ignore regex: {pattern}")),
    };

    if let Some(message) = message {
        config.save(config_path)?;
        println!("{message}");
    }
    Ok(0)
}

fn render_rules(config: &IgnoreConfig) -> String {
    let mut out = String::from("Ignore prefixes:\n");
    for prefix in &config.ignore_prefixes {
        out.push_str(&format!("  - {prefix}\n"));
    }
    out.push_str("Ignore regex:\n");
    for pattern in &config.ignore_regex {
        out.push_str(&format!("  - {pattern}\n"));
    }
    out
}
