//! Report windows and timestamp parsing.
//!
//! Windows are half-open `[start, end)` ranges on `started_at`, built from
//! local-calendar days and converted to UTC for querying.

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

use crate::error::{Result, TraceError};

const TITLE_PREFIX: &str = "TimeTrace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
}

impl RunWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn today(now: DateTime<Local>) -> Self {
        let (start, end) = local_day_bounds(now.date_naive());
        let title = format!("{TITLE_PREFIX} - {} (today)", start.format("%b %d, %Y"));
        Self::new(start.with_timezone(&Utc), end.with_timezone(&Utc), title)
    }

    pub fn yesterday(now: DateTime<Local>) -> Self {
        let day = now.date_naive() - Duration::days(1);
        let (start, end) = local_day_bounds(day);
        let title = format!("{TITLE_PREFIX} - {} (yesterday)", start.format("%b %d, %Y"));
        Self::new(start.with_timezone(&Utc), end.with_timezone(&Utc), title)
    }

    /// Rolling window ending at `now`; `days` is clamped to at least one.
    ///
    /// The start never reaches back past the Unix epoch, so huge day counts
    /// cover all stored runs instead of overflowing.
    pub fn last_days(now: DateTime<Local>, days: u32) -> Self {
        let days = days.max(1);
        let end = now.with_timezone(&Utc);
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .map_or(DateTime::<Utc>::UNIX_EPOCH, |start| {
                start.max(DateTime::<Utc>::UNIX_EPOCH)
            });
        let title = format!("{TITLE_PREFIX} - last {days} days");
        Self::new(start, end, title)
    }
}

fn local_day_bounds(day: NaiveDate) -> (DateTime<Local>, DateTime<Local>) {
    let start = local_midnight(day);
    let end = local_midnight(day + Duration::days(1));
    (start, end)
}

fn local_midnight(day: NaiveDate) -> DateTime<Local> {
    let naive = day.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Midnight skipped by a DST jump: the day starts an hour later.
        LocalResult::None => Local
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive).with_timezone(&Local)),
    }
}

/// Parses an ISO 8601 timestamp. Values without an offset are local time.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return local_to_utc(naive, value);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(local_midnight(day).with_timezone(&Utc));
    }

    Err(TraceError::InvalidInput(format!(
        "invalid timestamp '{}' (expected ISO 8601, e.g. 2026-01-30T14:05:00Z)",
        value
    )))
}

fn local_to_utc(naive: NaiveDateTime, raw: &str) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            TraceError::InvalidInput(format!("timestamp '{}' does not exist in local time", raw))
        })
}
