//! Date filtering on message timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use tracing::debug;

use super::Message;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Reads a message timestamp as wall-clock time.
///
/// RFC 3339 values keep their own offset's local time; date-only values
/// resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Keeps messages stamped no earlier than `days` days before `now`.
///
/// Messages with a missing or unreadable timestamp are kept.
pub fn filter_recent(messages: Vec<Message>, days: u32, now: NaiveDateTime) -> Vec<Message> {
    let cutoff = now - TimeDelta::days(i64::from(days));
    let before = messages.len();
    let mut undated = 0usize;

    let kept: Vec<Message> = messages
        .into_iter()
        .filter(|m| match m.timestamp.as_deref().and_then(parse_timestamp) {
            Some(at) => at >= cutoff,
            None => {
                undated += 1;
                true
            }
        })
        .collect();

    debug!(
        days,
        %cutoff,
        kept = kept.len(),
        dropped = before - kept.len(),
        undated,
        "Applied recent-days filter"
    );
    kept
}
