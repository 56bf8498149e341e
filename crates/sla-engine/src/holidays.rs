//! Holiday sources.
//!
//! The deadline engine only ever asks "is this date a holiday?". Where the
//! dates come from is behind [`HolidaySource`]: anything that can list holiday
//! dates for a span of years. Two sources ship with the crate:
//!
//! - [`ManualHolidays`]: an explicit list of dates
//! - [`RecurringHoliday`]: an RFC 5545 RRULE (e.g. `FREQ=YEARLY;BYMONTH=12;BYMONTHDAY=25`)
//!   expanded over the requested years

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlaError};

/// Upper bound on expanded occurrences per rule.
const MAX_OCCURRENCES: u16 = 10_000;

/// Anything that can list holiday dates for a span of years.
pub trait HolidaySource {
    fn holidays(&self, years: RangeInclusive<i32>) -> Result<Vec<NaiveDate>>;
}

/// An explicit list of holiday dates.
///
/// Dates are returned as given regardless of the requested years: a manual
/// date outside the span can never match a timestamp inside it, so filtering
/// would only cost time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualHolidays {
    dates: Vec<NaiveDate>,
}

impl ManualHolidays {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self { dates }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}

impl FromIterator<NaiveDate> for ManualHolidays {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            dates: iter.into_iter().collect(),
        }
    }
}

impl HolidaySource for ManualHolidays {
    fn holidays(&self, _years: RangeInclusive<i32>) -> Result<Vec<NaiveDate>> {
        Ok(self.dates.clone())
    }
}

/// A named holiday that recurs according to an RRULE.
///
/// The rule must not carry its own `COUNT` or `UNTIL`; the expansion is
/// bounded by the years passed to [`HolidaySource::holidays`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringHoliday {
    pub name: String,
    pub rule: String,
}

impl RecurringHoliday {
    pub fn new(name: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: rule.into(),
        }
    }

    fn bounded_rule(&self, first: i32, last: i32) -> Result<String> {
        let rule = self.rule.trim();
        let rule = rule.strip_prefix("RRULE:").unwrap_or(rule);
        let upper = rule.to_ascii_uppercase();
        if upper.contains("COUNT=") || upper.contains("UNTIL=") {
            return Err(SlaError::InvalidHolidayRule(format!(
                "'{}': COUNT/UNTIL not allowed, expansion is bounded by the holiday years",
                self.name
            )));
        }
        Ok(format!(
            "DTSTART:{first:04}0101T000000Z\nRRULE:{rule};UNTIL={last:04}1231T235959Z"
        ))
    }
}

impl HolidaySource for RecurringHoliday {
    fn holidays(&self, years: RangeInclusive<i32>) -> Result<Vec<NaiveDate>> {
        let (first, last) = (*years.start(), *years.end());
        if first > last {
            return Ok(Vec::new());
        }

        let text = self.bounded_rule(first, last)?;
        let set: RRuleSet = text
            .parse()
            .map_err(|e| SlaError::InvalidHolidayRule(format!("'{}': {}", self.name, e)))?;

        let result = set.all(MAX_OCCURRENCES);
        if result.limited {
            return Err(SlaError::InvalidHolidayRule(format!(
                "'{}': more than {MAX_OCCURRENCES} occurrences in {first}..={last}",
                self.name
            )));
        }

        Ok(result.dates.iter().map(|dt| dt.date_naive()).collect())
    }
}

impl<S: HolidaySource> HolidaySource for [S] {
    fn holidays(&self, years: RangeInclusive<i32>) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        for source in self {
            dates.extend(source.holidays(years.clone())?);
        }
        Ok(dates)
    }
}

impl<S: HolidaySource> HolidaySource for Vec<S> {
    fn holidays(&self, years: RangeInclusive<i32>) -> Result<Vec<NaiveDate>> {
        self.as_slice().holidays(years)
    }
}
