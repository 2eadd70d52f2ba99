//! Best-effort redaction of command lines before they are persisted.
//!
//! This is a privacy heuristic, not a security boundary: it strips values of
//! well-known secret flags and long token-looking blobs, and otherwise emits
//! arguments shell-quoted so the stored string reads as a command line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default cap on the stored command length, in characters.
pub const DEFAULT_MAX_LEN: usize = 300;

pub const REDACTED: &str = "<redacted>";

const SECRET_FLAGS: &[&str] = &[
    "--password",
    "--pass",
    "--token",
    "--apikey",
    "--api-key",
    "--secret",
    "--client-secret",
    "--access-token",
    "--refresh-token",
    "--bearer",
];

const SECRET_BLOB_MIN_LEN: usize = 40;

static RE_SECRET_BLOB: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").unwrap());
static RE_SHELL_SAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_@%+=:,./\-]+$").unwrap());

/// Renders `argv` as a redacted, shell-quoted command line of at most
/// `max_len` characters.
pub fn sanitize_command<S: AsRef<str>>(argv: &[S], max_len: usize) -> String {
    let mut tokens: Vec<String> = Vec::with_capacity(argv.len());
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_ref();

        if let Some((key, _)) = arg.split_once('=') {
            if SECRET_FLAGS.contains(&key) {
                tokens.push(format!("{key}={REDACTED}"));
                i += 1;
                continue;
            }
        }

        if SECRET_FLAGS.contains(&arg) && i + 1 < argv.len() {
            tokens.push(arg.to_string());
            tokens.push(REDACTED.to_string());
            i += 2;
            continue;
        }

        if looks_like_secret_blob(arg) {
            tokens.push(REDACTED.to_string());
        } else {
            tokens.push(shell_quote(arg));
        }
        i += 1;
    }

    truncate_chars(&tokens.join(" "), max_len)
}

/// Splits a hook-supplied command line on whitespace.
///
/// Hooks hand over the command as one string; quoting is not interpreted so
/// that a malformed line still gets recorded.
pub fn split_command_line(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Long, single-class strings mixing letters and digits are treated as tokens.
pub fn looks_like_secret_blob(value: &str) -> bool {
    if value.len() < SECRET_BLOB_MIN_LEN || !RE_SECRET_BLOB.is_match(value) {
        return false;
    }
    let has_digit = value.bytes().any(|b| b.is_ascii_digit());
    let has_alpha = value.bytes().any(|b| b.is_ascii_alphabetic());
    has_digit && has_alpha
}

/// POSIX shell quoting: safe words pass through, everything else is wrapped
/// in single quotes.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if RE_SHELL_SAFE.is_match(value) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

fn truncate_chars(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    if max_len < 3 {
        return value.chars().take(max_len).collect();
    }
    let mut out: String = value.chars().take(max_len - 3).collect();
    out.push_str("...");
    out
}
