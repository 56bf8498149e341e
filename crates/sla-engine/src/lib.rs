//! # sla-engine
//!
//! Deterministic SLA deadline computation.
//!
//! Given a start instant and a duration in business minutes, the engine
//! returns the instant reached by consuming minutes only during business
//! hours on working days. Weekends and holidays are skipped, and whatever
//! does not fit before close carries to the next working day's opening.
//!
//! ## Modules
//!
//! - [`policy`]: opening/closing hour, timezone and holiday set
//! - [`classifier`]: weekend, holiday, working-day and business-window predicates
//! - [`deadline`]: the deadline accumulator ([`SlaCalculator`])
//! - [`duration`]: validated duration input (minutes, or hours + minutes)
//! - [`holidays`]: holiday sources (manual dates, RRULE-based recurring holidays)
//! - [`config`]: serializable calendar configuration
//! - [`timestamp`]: start-time parsing and DST-safe wall-clock construction
//! - [`error`]: error types

pub mod classifier;
pub mod config;
pub mod deadline;
pub mod duration;
pub mod error;
pub mod holidays;
pub mod policy;
pub mod timestamp;

pub use config::CalendarConfig;
pub use deadline::{DeadlineInfo, SlaCalculator, MAX_SKIPPED_DAYS};
pub use duration::{SlaDuration, MAX_DURATION_MINUTES};
pub use error::SlaError;
pub use holidays::{HolidaySource, ManualHolidays, RecurringHoliday};
pub use policy::{CalendarPolicy, WEEKEND};
pub use timestamp::{parse_date, parse_start, parse_timezone};
