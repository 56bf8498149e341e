//! Calendar policy: business hours, weekend definition, holiday dates, timezone.
//!
//! A [`CalendarPolicy`] is built once and never mutated afterwards, so a single
//! instance can be shared across threads and calculations without locking.
//! Holiday dates are plain calendar dates; membership is checked against the
//! policy timezone's local date of a timestamp.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;

use crate::error::{Result, SlaError};
use crate::holidays::HolidaySource;

/// Days that are never business days.
pub const WEEKEND: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];

/// Immutable business-calendar configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarPolicy {
    open_hour: u32,
    close_hour: u32,
    timezone: Tz,
    holidays: BTreeSet<NaiveDate>,
}

impl CalendarPolicy {
    pub const DEFAULT_OPEN_HOUR: u32 = 9;
    pub const DEFAULT_CLOSE_HOUR: u32 = 17;

    /// Create a policy with no holidays.
    ///
    /// # Errors
    ///
    /// Returns [`SlaError::InvalidConfiguration`] if either hour is outside
    /// `0..=23` or if `open_hour >= close_hour`. An empty business window would
    /// otherwise make every day unusable and the deadline search would never end.
    pub fn new(open_hour: u32, close_hour: u32, timezone: Tz) -> Result<Self> {
        if open_hour > 23 || close_hour > 23 {
            return Err(SlaError::InvalidConfiguration(format!(
                "business hours must be within 0..=23, got open={open_hour} close={close_hour}"
            )));
        }
        if open_hour >= close_hour {
            return Err(SlaError::InvalidConfiguration(format!(
                "open hour ({open_hour}) must be before close hour ({close_hour})"
            )));
        }
        Ok(Self {
            open_hour,
            close_hour,
            timezone,
            holidays: BTreeSet::new(),
        })
    }

    /// Add manually supplied holiday dates. Duplicates collapse.
    pub fn with_holidays<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.holidays.extend(dates);
        self
    }

    /// Add every date a [`HolidaySource`] yields for `years`.
    pub fn with_source(
        self,
        source: &dyn HolidaySource,
        years: RangeInclusive<i32>,
    ) -> Result<Self> {
        let dates = source.holidays(years)?;
        Ok(self.with_holidays(dates))
    }

    pub fn open_hour(&self) -> u32 {
        self.open_hour
    }

    pub fn close_hour(&self) -> u32 {
        self.close_hour
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }

    /// Length of one full business window in minutes.
    pub fn window_minutes(&self) -> i64 {
        i64::from(self.close_hour - self.open_hour) * 60
    }

    /// Whether `date` is a designated holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self {
            open_hour: Self::DEFAULT_OPEN_HOUR,
            close_hour: Self::DEFAULT_CLOSE_HOUR,
            timezone: Tz::UTC,
            holidays: BTreeSet::new(),
        }
    }
}
