//! SLA duration input.
//!
//! A duration is given either as a single minute count or as hours plus
//! minutes, never both. The validated value is always a non-negative number
//! of business minutes.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, SlaError};

/// Upper bound on accepted durations: one hundred years of round-the-clock
/// minutes. Anything larger would walk the calendar for an unreasonable time.
pub const MAX_DURATION_MINUTES: i64 = 100 * 366 * 24 * 60;

/// A validated, non-negative SLA duration in business minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct SlaDuration(i64);

impl SlaDuration {
    pub const ZERO: SlaDuration = SlaDuration(0);

    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if minutes < 0 {
            return Err(SlaError::InvalidDuration(format!(
                "duration must be non-negative, got {minutes} minutes"
            )));
        }
        if minutes > MAX_DURATION_MINUTES {
            return Err(SlaError::InvalidDuration(format!(
                "duration of {minutes} minutes exceeds the maximum of {MAX_DURATION_MINUTES}"
            )));
        }
        Ok(Self(minutes))
    }

    pub fn from_hours_minutes(hours: i64, minutes: i64) -> Result<Self> {
        if hours < 0 || minutes < 0 {
            return Err(SlaError::InvalidDuration(format!(
                "hours and minutes must be non-negative, got {hours}h{minutes}m"
            )));
        }
        let total = hours
            .checked_mul(60)
            .and_then(|h| h.checked_add(minutes))
            .ok_or_else(|| {
                SlaError::InvalidDuration(format!("{hours}h{minutes}m overflows"))
            })?;
        Self::from_minutes(total)
    }

    /// Build a duration from the ways a caller may express it.
    ///
    /// `total` is a combined minute count; `hours`/`minutes` are the split
    /// form. Supplying `total` together with either split field is rejected
    /// before anything is computed.
    ///
    /// # Errors
    ///
    /// [`SlaError::InvalidConfiguration`] when both forms (or neither) are
    /// given, [`SlaError::InvalidDuration`] for negative or oversized values.
    pub fn from_parts(
        total: Option<i64>,
        hours: Option<i64>,
        minutes: Option<i64>,
    ) -> Result<Self> {
        match (total, hours, minutes) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                Err(SlaError::InvalidConfiguration(
                    "supply either a combined duration or hours/minutes, not both".to_string(),
                ))
            }
            (Some(total), None, None) => Self::from_minutes(total),
            (None, None, None) => Err(SlaError::InvalidConfiguration(
                "no duration supplied".to_string(),
            )),
            (None, hours, minutes) => {
                Self::from_hours_minutes(hours.unwrap_or(0), minutes.unwrap_or(0))
            }
        }
    }

    pub fn minutes(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SlaDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes) = (self.0 / 60, self.0 % 60);
        match (hours, minutes) {
            (0, m) => write!(f, "{m}m"),
            (h, 0) => write!(f, "{h}h"),
            (h, m) => write!(f, "{h}h{m}m"),
        }
    }
}
