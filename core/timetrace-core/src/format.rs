//! Human-readable durations and paths for reports and listings.

const DEFAULT_PATH_WIDTH: usize = 36;

/// Formats seconds as `1h 02m 03s`, `2m 03s` or `3s`.
///
/// Rounds to whole seconds; negative or non-finite input renders as `0s`.
pub fn format_duration(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total = seconds.round() as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;

    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Shortens a long path to its last two segments, prefixed with `…`.
pub fn abbreviate_path(path: &str) -> String {
    abbreviate_path_to(path, DEFAULT_PATH_WIDTH)
}

pub fn abbreviate_path_to(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let separator = if path.contains('\\') && !path.contains('/') {
        '\\'
    } else {
        '/'
    };
    let parts: Vec<&str> = path
        .split(|c| c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .collect();

    if parts.len() <= 2 {
        let keep = max_len.saturating_sub(1);
        let tail: String = path
            .chars()
            .rev()
            .take(keep)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("…{tail}");
    }

    format!(
        "…{sep}{}{sep}{}",
        parts[parts.len() - 2],
        parts[parts.len() - 1],
        sep = separator
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(3.0), "3s");
        assert_eq!(format_duration(61.0), "1m 01s");
        assert_eq!(format_duration(3661.0), "1h 01m 01s");
        assert_eq!(format_duration(59.6), "1m 00s");
    }

    #[test]
    fn negative_and_nan_durations_clamp_to_zero() {
        assert_eq!(format_duration(-5.0), "0s");
        assert_eq!(format_duration(f64::NAN), "0s");
    }

    #[test]
    fn short_paths_are_unchanged() {
        assert_eq!(abbreviate_path("/home/me/repo"), "/home/me/repo");
    }

    #[test]
    fn long_paths_keep_last_two_segments() {
        let path = "/home/someone/work/clients/acme/services/billing-api";
        assert_eq!(abbreviate_path(path), "…/services/billing-api");

        let windows = r"C:\Users\someone\Documents\projects\acme\billing-api";
        assert_eq!(abbreviate_path(windows), r"…\acme\billing-api");
    }

    #[test]
    fn long_single_segment_keeps_tail() {
        let path = format!("/{}", "x".repeat(50));
        let out = abbreviate_path(&path);
        assert!(out.starts_with('…'));
        assert_eq!(out.chars().count(), 36);
    }
}
