//! `sla`: compute SLA deadlines over business hours from the command line.
//!
//! ```text
//! sla deadline --start 2022-01-03T16:00:00 --duration 120 --timezone America/Chicago
//! sla deadline --start 2022-01-01T13:00:00-06:00 --hours 1 --config calendar.json
//! sla classify --at 2024-01-01T13:00:00 --holiday 2024-01-01
//! ```
//!
//! Output is JSON on stdout. Logs go to stderr, filtered by `RUST_LOG`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use sla_engine::{
    parse_date, parse_start, parse_timezone, CalendarConfig, DeadlineInfo, SlaCalculator,
    SlaDuration,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sla", version, about = "Compute SLA deadlines over business hours")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the deadline reached after consuming a duration of business time
    Deadline {
        /// Start time: RFC 3339, or local `YYYY-MM-DD[THH:MM[:SS]]` in the calendar timezone
        #[arg(long)]
        start: String,

        /// Total duration in business minutes (conflicts with --hours/--minutes)
        #[arg(long)]
        duration: Option<i64>,

        /// Duration hours component
        #[arg(long)]
        hours: Option<i64>,

        /// Duration minutes component
        #[arg(long)]
        minutes: Option<i64>,

        #[command(flatten)]
        calendar: CalendarArgs,
    },
    /// Classify a timestamp against the business calendar
    Classify {
        /// Timestamp to classify
        #[arg(long)]
        at: String,

        #[command(flatten)]
        calendar: CalendarArgs,
    },
}

/// Calendar options. Flags override values from `--config`.
#[derive(Args, Debug)]
struct CalendarArgs {
    /// JSON calendar config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// IANA timezone name (e.g. America/Chicago)
    #[arg(long)]
    timezone: Option<String>,

    /// Opening hour (inclusive)
    #[arg(long)]
    open_hour: Option<u32>,

    /// Closing hour (exclusive)
    #[arg(long)]
    close_hour: Option<u32>,

    /// Extra holiday date (YYYY-MM-DD); repeatable
    #[arg(long = "holiday", value_parser = parse_date)]
    holidays: Vec<NaiveDate>,
}

impl CalendarArgs {
    fn load(&self) -> Result<CalendarConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                CalendarConfig::from_json_str(&text)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => CalendarConfig::default(),
        };

        if let Some(tz) = &self.timezone {
            config.timezone = tz.clone();
        }
        if let Some(open) = self.open_hour {
            config.open_hour = open;
        }
        if let Some(close) = self.close_hour {
            config.close_hour = close;
        }
        config.holidays.extend(self.holidays.iter().copied());

        tracing::debug!(
            path = ?self.config,
            timezone = %config.timezone,
            open_hour = config.open_hour,
            close_hour = config.close_hour,
            holidays = config.holidays.len(),
            recurring = config.recurring_holidays.len(),
            "calendar config loaded"
        );
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Command::Deadline {
            start,
            duration,
            hours,
            minutes,
            calendar,
        } => {
            let duration = SlaDuration::from_parts(duration, hours, minutes)?;
            let config = calendar.load()?;
            let tz = parse_timezone(&config.timezone)?;
            let start = parse_start(&start, &tz)?;

            let info = describe_deadline(&config, &start, duration)?;
            serde_json::to_value(&info)?
        }
        Command::Classify { at, calendar } => {
            let config = calendar.load()?;
            let tz = parse_timezone(&config.timezone)?;
            let at = parse_start(&at, &tz)?;

            let policy = config.to_policy(at.year()..=at.year() + 1)?;
            let calc = SlaCalculator::new(policy);
            let policy = calc.policy();
            json!({
                "timestamp": at.to_rfc3339(),
                "timezone": tz.name(),
                "is_weekend": policy.is_weekend(&at),
                "is_holiday": policy.is_holiday(&at),
                "is_working_day": policy.is_working_day(&at),
                "is_within_business_window": policy.is_within_business_window(&at),
                "effective_start": calc.normalize(&at)?.to_rfc3339(),
            })
        }
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}

/// Compute the deadline with recurring holidays expanded over every year it
/// can reach.
///
/// Holidays outside the expanded years do not exist for the policy, so a
/// deadline past the span could land on one. Unless the config pins
/// `holiday_years`, the span starts at the start year plus one and widens to
/// the deadline's year until it covers it. Adding holidays only moves the
/// deadline later, so the span's end grows strictly on every pass.
fn describe_deadline<T: TimeZone>(
    config: &CalendarConfig,
    start: &DateTime<T>,
    duration: SlaDuration,
) -> Result<DeadlineInfo> {
    let first = start.year();
    let mut years = first..=first.saturating_add(1);

    loop {
        let calc = SlaCalculator::new(config.to_policy(years.clone())?);
        let deadline = calc.compute_deadline(start, duration.minutes())?;

        if deadline.year() > *years.end() {
            if config.holiday_years.is_empty() {
                tracing::debug!(
                    years = ?years,
                    deadline_year = deadline.year(),
                    "widening holiday years to cover deadline"
                );
                years = first..=deadline.year();
                continue;
            }
            tracing::warn!(
                holiday_years = ?config.holiday_years,
                %deadline,
                "deadline falls after the configured holiday years"
            );
        }

        return Ok(calc.describe(start, duration)?);
    }
}
