use crate::error::AppError;
use chrono::{DateTime, Duration as TimeDelta, Timelike, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const HOURLY_FORMAT: &str = "%Y-%m-%d-%H:%M";
const DAILY_FORMAT: &str = "%Y-%m-%d";

/// Cadence a scheduler unit runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalClass {
    Hourly,
    Daily,
}

/// Start/end parameters sent to the provider, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWindow {
    pub start: String,
    pub end: String,
}

impl IntervalClass {
    pub const ALL: [IntervalClass; 2] = [IntervalClass::Hourly, IntervalClass::Daily];

    /// Name used on the wire and in report file names.
    pub fn name(&self) -> &'static str {
        match self {
            IntervalClass::Hourly => "hourly",
            IntervalClass::Daily => "daily",
        }
    }

    pub fn lookback_days(&self) -> i64 {
        match self {
            IntervalClass::Hourly => 7,
            IntervalClass::Daily => 30,
        }
    }

    /// Window ending at `now` (hourly: one hour back, daily: today's UTC date)
    /// and reaching `lookback_days` into the past.
    pub fn request_window(&self, now: DateTime<Utc>) -> RequestWindow {
        let lookback = TimeDelta::days(self.lookback_days());
        match self {
            IntervalClass::Hourly => {
                let end = now - TimeDelta::hours(1);
                let start = end - lookback;
                RequestWindow {
                    start: start.format(HOURLY_FORMAT).to_string(),
                    end: end.format(HOURLY_FORMAT).to_string(),
                }
            }
            IntervalClass::Daily => {
                let end = now.date_naive();
                let start = end - lookback;
                RequestWindow {
                    start: start.format(DAILY_FORMAT).to_string(),
                    end: end.format(DAILY_FORMAT).to_string(),
                }
            }
        }
    }

    /// Time left until the next calendar boundary: top of the next hour for
    /// hourly, next UTC midnight for daily. Exactly on a boundary this is a
    /// whole period.
    pub fn until_next_boundary(&self, now: DateTime<Utc>) -> Duration {
        let (period, elapsed) = match self {
            IntervalClass::Hourly => (3_600, now.minute() * 60 + now.second()),
            IntervalClass::Daily => (86_400, now.num_seconds_from_midnight()),
        };
        let whole = Duration::from_secs(u64::from(period - elapsed));
        // nanosecond() exceeds 1e9 only during a leap second
        let fraction = Duration::from_nanos(u64::from(now.nanosecond().min(999_999_999)));
        whole.saturating_sub(fraction)
    }
}

impl fmt::Display for IntervalClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntervalClass {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(IntervalClass::Hourly),
            "daily" => Ok(IntervalClass::Daily),
            other => Err(AppError::Config(format!("{other} - invalid interval"))),
        }
    }
}
