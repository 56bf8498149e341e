//! Deadline accumulation over business hours.
//!
//! Given a start instant and a number of business minutes, the calculator
//! consumes minutes only inside the business window `[open_hour, close_hour)`
//! of working days and carries whatever does not fit before close to the next
//! working day's opening.
//!
//! # Algorithm
//!
//! 1. Normalize: while the current date is not a working day, or the time is
//!    at/after close, jump to the next calendar day at `open_hour:00:00`.
//! 2. Clamp: a time before opening snaps to `open_hour:00:00` the same day.
//! 3. Measure the whole minutes left before today's close.
//! 4. If the remaining duration fits, the deadline is `current + remaining`.
//!    Otherwise subtract what was available, jump to the next day's opening,
//!    and go back to 1.
//!
//! The loop is iterative; an SLA spanning years of calendar time uses constant
//! stack.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::duration::SlaDuration;
use crate::error::{Result, SlaError};
use crate::policy::CalendarPolicy;
use crate::timestamp::{at_hour, format_utc_offset};

/// Consecutive non-working days normalization will skip before giving up.
/// A holiday set covering a decade of weekdays is a configuration error.
pub const MAX_SKIPPED_DAYS: u32 = 3650;

/// Computes SLA deadlines against a fixed [`CalendarPolicy`].
#[derive(Debug, Clone, Default)]
pub struct SlaCalculator {
    policy: CalendarPolicy,
}

/// The result of a deadline computation, ready for display or serialization.
#[derive(Debug, Clone, Serialize)]
pub struct DeadlineInfo {
    /// The start instant, re-expressed in the policy timezone (RFC 3339).
    pub start: String,
    /// Where minute consumption actually began (RFC 3339).
    pub effective_start: String,
    /// The deadline in the policy timezone (RFC 3339 with offset).
    pub deadline: String,
    /// The deadline in UTC (RFC 3339).
    pub deadline_utc: String,
    /// The IANA timezone name used.
    pub timezone: String,
    /// The UTC offset at the deadline (e.g., "-06:00").
    pub utc_offset: String,
    /// Business minutes consumed.
    pub business_minutes: i64,
    /// How many times the remaining duration rolled over to another day.
    pub days_carried: u32,
}

/// Intermediate result of one accumulation run.
#[derive(Debug, Clone, Copy)]
struct Accumulation {
    effective_start: DateTime<Tz>,
    deadline: DateTime<Tz>,
    days_carried: u32,
}

impl SlaCalculator {
    pub fn new(policy: CalendarPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &CalendarPolicy {
        &self.policy
    }

    /// Compute the SLA deadline for `start` plus `duration_minutes` business minutes.
    ///
    /// The result is expressed in the policy timezone, whatever zone `start`
    /// was given in.
    ///
    /// # Errors
    ///
    /// Returns [`SlaError::InvalidDuration`] for a negative or oversized
    /// duration, and [`SlaError::DegenerateCalendar`] if no working day can be
    /// found within [`MAX_SKIPPED_DAYS`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::TimeZone;
    /// use chrono_tz::Tz;
    /// use sla_engine::{CalendarPolicy, SlaCalculator};
    ///
    /// let policy = CalendarPolicy::new(9, 17, Tz::America__Chicago).unwrap();
    /// let calc = SlaCalculator::new(policy);
    ///
    /// // Saturday 13:00 + 60 business minutes → Monday 10:00
    /// let start = Tz::America__Chicago.with_ymd_and_hms(2022, 1, 1, 13, 0, 0).unwrap();
    /// let deadline = calc.compute_deadline(&start, 60).unwrap();
    /// assert_eq!(deadline.to_rfc3339(), "2022-01-03T10:00:00-06:00");
    /// ```
    pub fn compute_deadline<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        duration_minutes: i64,
    ) -> Result<DateTime<Tz>> {
        let duration = SlaDuration::from_minutes(duration_minutes)?;
        Ok(self.accumulate(start, duration)?.deadline)
    }

    /// Compute the deadline and describe it as a serializable [`DeadlineInfo`].
    pub fn describe<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        duration: SlaDuration,
    ) -> Result<DeadlineInfo> {
        let run = self.accumulate(start, duration)?;
        let tz = self.policy.timezone();

        Ok(DeadlineInfo {
            start: start.with_timezone(&tz).to_rfc3339(),
            effective_start: run.effective_start.to_rfc3339(),
            deadline: run.deadline.to_rfc3339(),
            deadline_utc: run.deadline.with_timezone(&Utc).to_rfc3339(),
            timezone: tz.name().to_string(),
            utc_offset: format_utc_offset(&run.deadline),
            business_minutes: duration.minutes(),
            days_carried: run.days_carried,
        })
    }

    /// Advance `ts` to the nearest instant at or after it that lies inside a
    /// business window. An instant already inside one is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`SlaError::DegenerateCalendar`] if more than [`MAX_SKIPPED_DAYS`]
    /// consecutive days are non-working.
    pub fn normalize<T: TimeZone>(&self, ts: &DateTime<T>) -> Result<DateTime<Tz>> {
        let mut current = ts.with_timezone(&self.policy.timezone());
        let close_hour = self.policy.close_hour();

        let mut skipped = 0u32;
        while !self.policy.is_working_day(&current) || current.hour() >= close_hour {
            if skipped >= MAX_SKIPPED_DAYS {
                return Err(SlaError::DegenerateCalendar(format!(
                    "no working day within {MAX_SKIPPED_DAYS} days of {}",
                    ts.with_timezone(&self.policy.timezone()).date_naive()
                )));
            }
            current = self.opening_on(next_date(current.date_naive())?)?;
            skipped += 1;
        }
        if skipped > 0 {
            tracing::trace!(skipped, to = %current, "rolled forward to working day");
        }

        if current.hour() < self.policy.open_hour() {
            current = self.opening_on(current.date_naive())?;
        }
        Ok(current)
    }

    /// Opening instant of the first working day strictly after the local date of `ts`.
    pub fn next_opening<T: TimeZone>(&self, ts: &DateTime<T>) -> Result<DateTime<Tz>> {
        let date = ts.with_timezone(&self.policy.timezone()).date_naive();
        let opening = self.opening_on(next_date(date)?)?;
        self.normalize(&opening)
    }

    fn accumulate<T: TimeZone>(
        &self,
        start: &DateTime<T>,
        duration: SlaDuration,
    ) -> Result<Accumulation> {
        let effective_start = self.normalize(start)?;
        let mut current = effective_start;
        let mut remaining = duration.minutes();
        let mut days_carried = 0u32;

        loop {
            let available = self.minutes_until_close(&current)?;
            if available >= remaining {
                let deadline = Duration::try_minutes(remaining)
                    .and_then(|d| current.checked_add_signed(d))
                    .ok_or_else(|| {
                        SlaError::InvalidDuration(format!(
                            "{remaining} minutes after {current} is out of range"
                        ))
                    })?;
                tracing::debug!(
                    start = %effective_start,
                    %deadline,
                    minutes = duration.minutes(),
                    days_carried,
                    "deadline computed"
                );
                return Ok(Accumulation {
                    effective_start,
                    deadline,
                    days_carried,
                });
            }

            remaining -= available;
            days_carried += 1;
            current = self.next_opening(&current)?;
            tracing::trace!(consumed = available, remaining, next = %current, "carrying over");
        }
    }

    /// Whole minutes between `current` and close on the same local date.
    fn minutes_until_close(&self, current: &DateTime<Tz>) -> Result<i64> {
        let close = at_hour(
            &self.policy.timezone(),
            current.date_naive(),
            self.policy.close_hour(),
        )?;
        Ok((close - *current).num_minutes().max(0))
    }

    fn opening_on(&self, date: NaiveDate) -> Result<DateTime<Tz>> {
        at_hour(&self.policy.timezone(), date, self.policy.open_hour())
    }
}

fn next_date(date: NaiveDate) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| SlaError::InvalidDatetime(format!("no date after {date}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const CHICAGO: Tz = Tz::America__Chicago;

    fn chicago(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        CHICAGO.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 09:00–17:00 America/Chicago with US New Year's Day 2024 observed.
    fn calc() -> SlaCalculator {
        let policy = CalendarPolicy::new(9, 17, CHICAGO)
            .unwrap()
            .with_holidays([date(2024, 1, 1), date(2022, 12, 26)]);
        SlaCalculator::new(policy)
    }

    // ── compute_deadline: documented scenarios ──────────────────────────

    #[test]
    fn test_before_business_hours() {
        // 1 AM Monday → 9 AM + 1h
        let deadline = calc().compute_deadline(&chicago(2022, 1, 3, 1, 0), 60).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2022-01-03T10:00:00-06:00");
    }

    #[test]
    fn test_on_weekend() {
        // 1 PM Saturday → Monday 10 AM
        let deadline = calc().compute_deadline(&chicago(2022, 1, 1, 13, 0), 60).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2022-01-03T10:00:00-06:00");
    }

    #[test]
    fn test_on_holiday() {
        // 1 PM on New Year's Day 2024 (Monday) → Tuesday 10 AM
        let deadline = calc().compute_deadline(&chicago(2024, 1, 1, 13, 0), 60).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2024-01-02T10:00:00-06:00");
    }

    #[test]
    fn test_not_enough_time_left() {
        // 4 PM Monday, 2h: 1h today, 1h tomorrow from 9 AM
        let deadline = calc().compute_deadline(&chicago(2022, 1, 3, 16, 0), 120).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2022-01-04T10:00:00-06:00");
    }

    // ── compute_deadline: boundaries ────────────────────────────────────

    #[test]
    fn test_zero_duration_returns_normalized_start() {
        let c = calc();
        let inside = chicago(2022, 1, 4, 11, 30);
        assert_eq!(c.compute_deadline(&inside, 0).unwrap(), inside);

        let before_open = chicago(2022, 1, 4, 6, 0);
        assert_eq!(
            c.compute_deadline(&before_open, 0).unwrap(),
            chicago(2022, 1, 4, 9, 0)
        );
    }

    #[test]
    fn test_start_exactly_at_close_rolls_forward() {
        let deadline = calc().compute_deadline(&chicago(2022, 1, 4, 17, 0), 30).unwrap();
        assert_eq!(deadline, chicago(2022, 1, 5, 9, 30));
    }

    #[test]
    fn test_start_exactly_at_open_is_inclusive() {
        let deadline = calc().compute_deadline(&chicago(2022, 1, 4, 9, 0), 30).unwrap();
        assert_eq!(deadline, chicago(2022, 1, 4, 9, 30));
    }

    #[test]
    fn test_duration_exhausts_exactly_at_close() {
        let deadline = calc().compute_deadline(&chicago(2022, 1, 4, 16, 0), 60).unwrap();
        assert_eq!(deadline, chicago(2022, 1, 4, 17, 0));
    }

    #[test]
    fn test_friday_afternoon_carries_over_weekend() {
        // Friday Jan 7 2022 16:30, 90 min → 30 today, 60 Monday
        let deadline = calc().compute_deadline(&chicago(2022, 1, 7, 16, 30), 90).unwrap();
        assert_eq!(deadline, chicago(2022, 1, 10, 10, 0));
    }

    #[test]
    fn test_holiday_adjacent_to_weekend_skipped_in_one_pass() {
        // Dec 24 2022 is Saturday, Dec 26 (Monday) is a holiday
        let c = calc();
        let deadline = c.compute_deadline(&chicago(2022, 12, 23, 16, 0), 120).unwrap();
        assert_eq!(deadline, chicago(2022, 12, 27, 10, 0));
        // normalization from Saturday lands on Tuesday opening directly
        assert_eq!(
            c.normalize(&chicago(2022, 12, 24, 8, 0)).unwrap(),
            chicago(2022, 12, 27, 9, 0)
        );
    }

    #[test]
    fn test_multiple_full_days_plus_remainder() {
        // Monday 9:00 + 3 full days (3 * 480) + 45 min → Thursday 9:45
        let deadline = calc()
            .compute_deadline(&chicago(2022, 1, 3, 9, 0), 3 * 480 + 45)
            .unwrap();
        assert_eq!(deadline, chicago(2022, 1, 6, 9, 45));
    }

    #[test]
    fn test_seconds_are_preserved() {
        let start = CHICAGO.with_ymd_and_hms(2022, 1, 4, 10, 0, 30).single().unwrap();
        let deadline = calc().compute_deadline(&start, 60).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2022-01-04T11:00:30-06:00");
    }

    #[test]
    fn test_start_in_other_timezone_is_converted() {
        // 2022-01-03T15:00Z = 09:00 Chicago
        let start = Utc.with_ymd_and_hms(2022, 1, 3, 15, 0, 0).unwrap();
        let deadline = calc().compute_deadline(&start, 90).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2022-01-03T10:30:00-06:00");
    }

    #[test]
    fn test_carry_across_dst_change() {
        // Friday March 11 2022 16:00 CST, 2h → Monday March 14 10:00 CDT
        let deadline = calc().compute_deadline(&chicago(2022, 3, 11, 16, 0), 120).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2022-03-14T10:00:00-05:00");
    }

    #[test]
    fn test_opening_inside_dst_gap_shifts_to_gap_end() {
        // Amman springs forward at midnight on Friday March 26 2021
        // (00:00 EET → 01:00 EEST), so a 00:00 opening that day becomes 01:00.
        const AMMAN: Tz = Tz::Asia__Amman;
        let policy = CalendarPolicy::new(0, 8, AMMAN).unwrap();
        let calc = SlaCalculator::new(policy);
        let amman = |d: u32, h: u32, mi: u32| {
            AMMAN.with_ymd_and_hms(2021, 3, d, h, mi, 0).single().unwrap()
        };

        // Thursday 07:30, 60 min: 30 today, 30 from Friday's shifted opening
        let deadline = calc.compute_deadline(&amman(25, 7, 30), 60).unwrap();
        assert_eq!(deadline.to_rfc3339(), "2021-03-26T01:30:00+03:00");

        // after close on Thursday normalizes to the post-gap opening
        let normalized = calc.normalize(&amman(25, 9, 0)).unwrap();
        assert_eq!(normalized.to_rfc3339(), "2021-03-26T01:00:00+03:00");

        // Friday's window is 01:00–08:00 (420 min), then the weekend
        let deadline = calc
            .compute_deadline(&amman(25, 0, 0), 480 + 420 + 10)
            .unwrap();
        assert_eq!(deadline.to_rfc3339(), "2021-03-29T00:10:00+03:00");
    }

    // ── compute_deadline: errors ────────────────────────────────────────

    #[test]
    fn test_negative_duration_rejected() {
        let err = calc().compute_deadline(&chicago(2022, 1, 3, 9, 0), -5).unwrap_err();
        assert!(matches!(err, SlaError::InvalidDuration(_)));
    }

    #[test]
    fn test_degenerate_calendar_fails_fast() {
        let start = date(2024, 1, 1);
        let every_day = (0..4000).map(|i| start + Duration::days(i));
        let policy = CalendarPolicy::default().with_holidays(every_day);
        let calc = SlaCalculator::new(policy);
        let err = calc
            .compute_deadline(&Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(), 60)
            .unwrap_err();
        assert!(matches!(err, SlaError::DegenerateCalendar(_)), "got: {err}");
    }

    // ── normalize / next_opening ────────────────────────────────────────

    #[test]
    fn test_normalize_holiday_then_weekend() {
        // Monday Jan 3 2022 is a holiday; midnight that day → Tuesday Jan 4 09:00
        let policy = CalendarPolicy::new(9, 17, CHICAGO)
            .unwrap()
            .with_holidays([date(2022, 1, 3)]);
        let calc = SlaCalculator::new(policy);
        let normalized = calc.normalize(&chicago(2022, 1, 3, 0, 0)).unwrap();
        assert_eq!(normalized, chicago(2022, 1, 4, 9, 0));
        assert!(calc.policy().is_working_day(&normalized));
    }

    #[test]
    fn test_normalize_after_close_on_working_day() {
        let normalized = calc().normalize(&chicago(2022, 1, 4, 18, 15)).unwrap();
        assert_eq!(normalized, chicago(2022, 1, 5, 9, 0));
    }

    #[test]
    fn test_next_opening_skips_weekend() {
        let next = calc().next_opening(&chicago(2022, 1, 7, 10, 0)).unwrap();
        assert_eq!(next, chicago(2022, 1, 10, 9, 0));
        assert_eq!(next.weekday(), chrono::Weekday::Mon);
    }

    // ── describe ────────────────────────────────────────────────────────

    #[test]
    fn test_describe_reports_carry_and_offsets() {
        let duration = SlaDuration::from_minutes(120).unwrap();
        let info = calc().describe(&chicago(2022, 1, 3, 16, 0), duration).unwrap();
        assert_eq!(info.start, "2022-01-03T16:00:00-06:00");
        assert_eq!(info.effective_start, "2022-01-03T16:00:00-06:00");
        assert_eq!(info.deadline, "2022-01-04T10:00:00-06:00");
        assert_eq!(info.deadline_utc, "2022-01-04T16:00:00+00:00");
        assert_eq!(info.timezone, "America/Chicago");
        assert_eq!(info.utc_offset, "-06:00");
        assert_eq!(info.business_minutes, 120);
        assert_eq!(info.days_carried, 1);
    }

    #[test]
    fn test_describe_serializes() {
        let info = calc()
            .describe(&chicago(2022, 1, 1, 13, 0), SlaDuration::from_minutes(60).unwrap())
            .unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["effective_start"], "2022-01-03T09:00:00-06:00");
        assert_eq!(json["days_carried"], 0);
    }
}
