//! Business-day classification predicates.
//!
//! Every predicate first re-expresses the timestamp in the policy timezone, so
//! "Saturday" and "holiday" always refer to the local calendar date the
//! business observes, whatever offset the caller's timestamp carries.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike};

use crate::policy::{CalendarPolicy, WEEKEND};

impl CalendarPolicy {
    /// True iff the local day-of-week of `ts` is Saturday or Sunday.
    pub fn is_weekend<T: TimeZone>(&self, ts: &DateTime<T>) -> bool {
        self.is_weekend_date(self.local_date(ts))
    }

    /// True iff the local calendar date of `ts` is a holiday. Time-of-day is
    /// ignored: a holiday blocks the entire day.
    pub fn is_holiday<T: TimeZone>(&self, ts: &DateTime<T>) -> bool {
        self.contains(self.local_date(ts))
    }

    pub fn is_working_day<T: TimeZone>(&self, ts: &DateTime<T>) -> bool {
        self.is_working_date(self.local_date(ts))
    }

    /// True iff `ts` falls on a working day inside `[open_hour, close_hour)`.
    pub fn is_within_business_window<T: TimeZone>(&self, ts: &DateTime<T>) -> bool {
        let local = ts.with_timezone(&self.timezone());
        self.is_working_date(local.date_naive())
            && (self.open_hour()..self.close_hour()).contains(&local.hour())
    }

    pub fn is_weekend_date(&self, date: NaiveDate) -> bool {
        WEEKEND.contains(&date.weekday())
    }

    pub fn is_working_date(&self, date: NaiveDate) -> bool {
        !(self.is_weekend_date(date) || self.contains(date))
    }

    fn local_date<T: TimeZone>(&self, ts: &DateTime<T>) -> NaiveDate {
        ts.with_timezone(&self.timezone()).date_naive()
    }
}
