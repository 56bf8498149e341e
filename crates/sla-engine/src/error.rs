//! Error types for sla-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlaError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Degenerate calendar: {0}")]
    DegenerateCalendar(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid holiday rule: {0}")]
    InvalidHolidayRule(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SlaError>;
