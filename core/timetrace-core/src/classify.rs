//! Coarse command categorization.
//!
//! Rules are checked in a fixed order and the first match wins. Tool
//! families overlap (`npm run build` vs `npm test`), so each family keeps its
//! own matching style: node package managers look for space-prefixed
//! keywords, JVM/.NET tools fall back to `build`, and everything else does a
//! plain substring scan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TraceError;

const GIT_PREFIXES: &[&str] = &["git"];
const CONTAINER_PREFIXES: &[&str] = &["docker", "podman"];
const NODE_PACKAGE_MANAGERS: &[&str] = &["npm", "pnpm", "yarn"];
const JVM_DOTNET_TOOLS: &[&str] = &["mvn", "gradle", "dotnet"];
const TEST_RUNNERS: &[&str] = &["pytest", "tox", "nosetests"];

const BUILD_KEYWORDS: &[&str] = &["build", "compile", "package", "bundle"];
const TEST_KEYWORDS: &[&str] = &["test", "tests"];
const LINT_KEYWORDS: &[&str] = &[
    "lint", "format", "fmt", "ruff", "flake8", "black", "prettier", "eslint",
];

/// Closed set of command categories persisted alongside each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Git,
    Container,
    Testing,
    Build,
    Lint,
    Node,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Git,
        Category::Container,
        Category::Testing,
        Category::Build,
        Category::Lint,
        Category::Node,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Git => "git",
            Category::Container => "container",
            Category::Testing => "testing",
            Category::Build => "build",
            Category::Lint => "lint",
            Category::Node => "node",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TraceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| {
                TraceError::InvalidInput(format!(
                    "unknown category '{}' (expected one of: git, container, testing, build, lint, node, other)",
                    value
                ))
            })
    }
}

/// Maps a sanitized command string to its category.
pub fn categorize(command: &str) -> Category {
    let first = match command.split_whitespace().next() {
        Some(token) => token.trim_matches(|c| c == '\'' || c == '"'),
        None => return Category::Other,
    };
    let low = command.to_lowercase();

    if GIT_PREFIXES.contains(&first) {
        return Category::Git;
    }
    if CONTAINER_PREFIXES.contains(&first) {
        return Category::Container;
    }

    if NODE_PACKAGE_MANAGERS.contains(&first) {
        if low.contains(" test") || low.ends_with(" test") {
            return Category::Testing;
        }
        if contains_spaced_keyword(&low, LINT_KEYWORDS) {
            return Category::Lint;
        }
        if contains_spaced_keyword(&low, BUILD_KEYWORDS) {
            return Category::Build;
        }
        return Category::Node;
    }

    if JVM_DOTNET_TOOLS.contains(&first) {
        if contains_keyword(&low, TEST_KEYWORDS) {
            return Category::Testing;
        }
        return Category::Build;
    }

    if TEST_RUNNERS.contains(&first) {
        return Category::Testing;
    }

    if contains_keyword(&low, LINT_KEYWORDS) {
        return Category::Lint;
    }
    if contains_keyword(&low, TEST_KEYWORDS) {
        return Category::Testing;
    }
    if contains_keyword(&low, BUILD_KEYWORDS) {
        return Category::Build;
    }

    Category::Other
}

fn contains_keyword(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

fn contains_spaced_keyword(haystack: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| haystack.contains(&format!(" {keyword}")))
}
