//! Timestamp handling at the edge of the deadline engine.
//!
//! The accumulator works on `DateTime<Tz>` wall-clock fields in the policy
//! timezone. This module anchors input strings into that zone and builds
//! "calendar date at HH:00:00" instants that stay valid across DST
//! transitions.
//!
//! # Accepted start formats
//!
//! - RFC 3339 with offset: `2024-01-02T13:00:00-06:00`, `2024-01-02T19:00:00Z`
//! - Local date-time in the policy zone: `2024-01-02T13:00:00`,
//!   `2024-01-02 13:00`, with or without seconds
//! - Bare date (local midnight): `2024-01-02`
//!
//! Free-form expressions ("next Monday", "tomorrow at 2pm") are rejected.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{Result, SlaError};

/// Step used to walk out of a DST gap. Every real-world UTC offset is a
/// multiple of 15 minutes, so the first valid instant after a gap is hit exactly.
const GAP_STEP_MINUTES: i64 = 15;

/// Longest gap we are willing to walk through (one full day).
const MAX_GAP_STEPS: i64 = 24 * 60 / GAP_STEP_MINUTES;

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| SlaError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse a start timestamp and express it in `tz`.
///
/// Strings carrying an explicit offset keep their instant and are converted;
/// offset-less strings are read as wall-clock time in `tz`.
///
/// # Errors
///
/// Returns [`SlaError::InvalidDatetime`] if the string matches none of the
/// accepted formats.
pub fn parse_start(s: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(tz));
    }

    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return resolve_local(tz, naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return resolve_local(tz, date.and_time(NaiveTime::MIN));
    }

    Err(SlaError::InvalidDatetime(format!(
        "'{s}': expected RFC 3339 or YYYY-MM-DD[THH:MM[:SS]]"
    )))
}

/// Parse a holiday date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| SlaError::InvalidDatetime(format!("'{}': {}", s, e)))
}

/// Map a wall-clock time to an instant in `tz`.
///
/// Ambiguous times (DST fall back) resolve to the earlier instant. Times
/// inside a DST gap (spring forward) move to the first valid instant after it.
pub fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    let mut candidate = naive;
    for _ in 0..=MAX_GAP_STEPS {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => {
                if candidate != naive {
                    tracing::trace!(requested = %naive, resolved = %dt, "shifted out of DST gap");
                }
                return Ok(dt);
            }
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest),
            LocalResult::None => {
                candidate += chrono::Duration::minutes(GAP_STEP_MINUTES);
            }
        }
    }
    Err(SlaError::InvalidDatetime(format!(
        "local time {naive} does not exist in {}",
        tz.name()
    )))
}

/// The instant at `hour:00:00` on `date` in `tz`.
pub fn at_hour(tz: &Tz, date: NaiveDate, hour: u32) -> Result<DateTime<Tz>> {
    let naive = date
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| SlaError::InvalidDatetime(format!("hour {hour} out of range")))?;
    resolve_local(tz, naive)
}

/// Format the UTC offset as a string (e.g., "-05:00", "+09:00").
pub fn format_utc_offset<T: TimeZone>(dt: &DateTime<T>) -> String {
    let offset_secs = dt.offset().fix().local_minus_utc();
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}
