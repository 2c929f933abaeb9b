//! Lap times as recorded by race timekeepers.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Elapsed time from the race start to a lap mark.
///
/// Stored as a time-of-day (`HH:MM:SS[.fff]`) the way timekeeping sheets
/// record it, so a crew finishing in 20 minutes and 5.5 seconds is
/// `00:20:05.500`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LapTime(pub NaiveTime);

impl LapTime {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Build a lap time from hours, minutes, seconds and milliseconds.
    pub fn from_hms_milli(hour: u32, min: u32, sec: u32, milli: u32) -> Option<Self> {
        NaiveTime::from_hms_milli_opt(hour, min, sec, milli).map(Self)
    }

    /// Elapsed time in seconds, including the fractional part.
    pub fn elapsed_seconds(&self) -> f64 {
        self.0.num_seconds_from_midnight() as f64 + self.0.nanosecond() as f64 / 1e9
    }

    /// A lap mark at midnight carries no elapsed time.
    pub fn is_positive(&self) -> bool {
        self.elapsed_seconds() > 0.0
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
    }
}

impl FromStr for LapTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::from_str(s.trim()).map(Self)
    }
}
