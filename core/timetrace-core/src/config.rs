//! Ignore rules deciding which commands are recorded at all.
//!
//! Stored as `config.json` next to the database. A missing or malformed file
//! yields the defaults; an invalid regex disables only that one rule.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::{Result, TraceError};

pub const DEFAULT_IGNORE_PREFIXES: &[&str] = &[
    "cd", "dir", "ls", "pwd", "clear", "cls", "exit", "history",
    // the tool itself, to avoid recursive logging
    "timetrace",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default = "default_prefixes")]
    pub ignore_prefixes: Vec<String>,
    #[serde(default)]
    pub ignore_regex: Vec<String>,
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_IGNORE_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            ignore_prefixes: default_prefixes(),
            ignore_regex: Vec::new(),
        }
    }
}

impl IgnoreConfig {
    /// Loads the config at `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        let content = match fs_err::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(error = %err, "Failed to read config; using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "Malformed config; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|source| TraceError::Json {
            context: "serialize config".to_string(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)
                .map_err(|err| TraceError::io("create config directory", err))?;
        }
        fs_err::write(path, content).map_err(|source| TraceError::ConfigWriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Compiles the rules for matching. Invalid patterns are dropped.
    pub fn matcher(&self) -> IgnoreMatcher {
        let patterns = self
            .ignore_regex
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "Skipping invalid ignore regex");
                    None
                }
            })
            .collect();
        IgnoreMatcher {
            prefixes: self.ignore_prefixes.clone(),
            patterns,
        }
    }

    pub fn should_ignore(&self, command: &str) -> bool {
        self.matcher().should_ignore(command)
    }

    /// Returns false if the prefix was blank or already present.
    pub fn add_prefix(&mut self, prefix: &str) -> bool {
        let prefix = prefix.trim();
        if prefix.is_empty() || self.ignore_prefixes.iter().any(|p| p == prefix) {
            return false;
        }
        self.ignore_prefixes.push(prefix.to_string());
        true
    }

    pub fn remove_prefix(&mut self, prefix: &str) -> bool {
        let prefix = prefix.trim();
        let before = self.ignore_prefixes.len();
        self.ignore_prefixes.retain(|p| p != prefix);
        self.ignore_prefixes.len() != before
    }

    /// Adds a pattern as-is; validity is only checked when matching.
    pub fn add_regex(&mut self, pattern: &str) -> bool {
        if pattern.is_empty() || self.ignore_regex.iter().any(|p| p == pattern) {
            return false;
        }
        self.ignore_regex.push(pattern.to_string());
        true
    }

    pub fn remove_regex(&mut self, pattern: &str) -> bool {
        let before = self.ignore_regex.len();
        self.ignore_regex.retain(|p| p != pattern);
        self.ignore_regex.len() != before
    }
}

/// Compiled ignore rules.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl IgnoreMatcher {
    /// Blank commands, a listed first word, or any regex hit are ignored.
    pub fn should_ignore(&self, command: &str) -> bool {
        let command = command.trim();
        let Some(first) = command.split_whitespace().next() else {
            return true;
        };
        let first = first.trim_matches(|c| c == '\'' || c == '"');
        if self.prefixes.iter().any(|p| p == first) {
            return true;
        }
        self.patterns.iter().any(|regex| regex.is_match(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_ignore_navigation_commands() {
        let config = IgnoreConfig::default();
        assert!(config.should_ignore("cd /tmp"));
        assert!(config.should_ignore("ls"));
        assert!(config.should_ignore("'timetrace' report"));
        assert!(config.should_ignore("   "));
        assert!(!config.should_ignore("cargo build"));
        // prefix means first word, not string prefix
        assert!(!config.should_ignore("lsof -i"));
    }

    #[test]
    fn regex_rules_match_anywhere() {
        let mut config = IgnoreConfig::default();
        config.add_regex(r"^vim?\b");
        assert!(config.should_ignore("vim notes.md"));
        assert!(config.should_ignore("vi notes.md"));
        assert!(!config.should_ignore("nvim notes.md"));
    }

    #[test]
    fn invalid_regex_is_skipped() {
        let mut config = IgnoreConfig::default();
        config.add_regex("([unclosed");
        config.add_regex("secret");
        assert!(config.should_ignore("echo secret"));
        assert!(!config.should_ignore("echo public"));
    }

    #[test]
    fn add_and_remove_rules() {
        let mut config = IgnoreConfig::default();
        assert!(config.add_prefix(" htop "));
        assert!(!config.add_prefix("htop"));
        assert!(!config.add_prefix("  "));
        assert!(config.should_ignore("htop"));
        assert!(config.remove_prefix("htop"));
        assert!(!config.remove_prefix("htop"));

        assert!(config.add_regex("foo"));
        assert!(!config.add_regex("foo"));
        assert!(config.remove_regex("foo"));
        assert!(config.ignore_regex.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.json");

        let mut config = IgnoreConfig::default();
        config.add_prefix("htop");
        config.add_regex("^make clean$");
        config.save(&path).expect("save config");

        assert_eq!(IgnoreConfig::load(&path), config);
    }

    #[test]
    fn failed_save_names_the_config_path() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        // the target is a directory, so the write itself fails
        let path = temp_dir.path().join("config.json");
        std::fs::create_dir(&path).unwrap();

        let err = IgnoreConfig::default().save(&path).unwrap_err();
        let TraceError::ConfigWriteFailed { path: failed, source } = &err else {
            panic!("expected ConfigWriteFailed, got {err:?}");
        };
        assert_eq!(failed, &path);
        assert!(source.to_string().contains("config.json"));
    }

    #[test]
    fn missing_or_malformed_file_gives_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.json");
        assert_eq!(IgnoreConfig::load(&path), IgnoreConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(IgnoreConfig::load(&path), IgnoreConfig::default());
    }

    #[test]
    fn partial_file_keeps_default_prefixes() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"ignore_regex": ["^top$"]}"#).unwrap();

        let config = IgnoreConfig::load(&path);
        assert!(config.should_ignore("cd .."));
        assert!(config.should_ignore("top"));
    }
}
