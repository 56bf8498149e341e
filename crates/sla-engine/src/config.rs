//! Calendar configuration.
//!
//! [`CalendarConfig`] is the serializable form of a [`CalendarPolicy`]. Every
//! field has a default, so `{}` is a valid config (09:00–17:00 UTC, no
//! holidays).
//!
//! ```json
//! {
//!   "open_hour": 9,
//!   "close_hour": 17,
//!   "timezone": "America/Chicago",
//!   "holidays": ["2024-01-01"],
//!   "recurring_holidays": [
//!     { "name": "Christmas", "rule": "FREQ=YEARLY;BYMONTH=12;BYMONTHDAY=25" }
//!   ],
//!   "holiday_years": [2024, 2025]
//! }
//! ```

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlaError};
use crate::holidays::RecurringHoliday;
use crate::policy::CalendarPolicy;
use crate::timestamp::parse_timezone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    pub open_hour: u32,
    pub close_hour: u32,
    /// IANA timezone name.
    pub timezone: String,
    pub holidays: Vec<NaiveDate>,
    pub recurring_holidays: Vec<RecurringHoliday>,
    /// Years to expand recurring holidays over. When empty, the caller's
    /// fallback span is used.
    pub holiday_years: Vec<i32>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            open_hour: CalendarPolicy::DEFAULT_OPEN_HOUR,
            close_hour: CalendarPolicy::DEFAULT_CLOSE_HOUR,
            timezone: "UTC".to_string(),
            holidays: Vec::new(),
            recurring_holidays: Vec::new(),
            holiday_years: Vec::new(),
        }
    }
}

impl CalendarConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| SlaError::Config(e.to_string()))
    }

    /// Year span for recurring holiday expansion.
    pub fn years(&self, fallback: RangeInclusive<i32>) -> RangeInclusive<i32> {
        match (self.holiday_years.iter().min(), self.holiday_years.iter().max()) {
            (Some(&first), Some(&last)) => first..=last,
            _ => fallback,
        }
    }

    /// Build the immutable policy.
    ///
    /// # Errors
    ///
    /// Propagates timezone, business-hour and holiday-rule validation errors.
    pub fn to_policy(&self, fallback_years: RangeInclusive<i32>) -> Result<CalendarPolicy> {
        let tz = parse_timezone(&self.timezone)?;
        let years = self.years(fallback_years);

        let policy = CalendarPolicy::new(self.open_hour, self.close_hour, tz)?
            .with_holidays(self.holidays.iter().copied())
            .with_source(&self.recurring_holidays, years.clone())?;

        tracing::debug!(
            open_hour = policy.open_hour(),
            close_hour = policy.close_hour(),
            timezone = %tz,
            holidays = policy.holidays().len(),
            years = ?years,
            "calendar policy built"
        );
        Ok(policy)
    }
}
