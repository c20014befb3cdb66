//! User-facing reminder configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Interval offered before the user picks one.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// One day. Longer cadences are better expressed with the anchor alone.
pub const MAX_INTERVAL_MINUTES: u32 = 24 * 60;

/// Daily wall-clock time of day that the first fire aligns to.
///
/// Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnchorTime {
    hour: u8,
    minute: u8,
}

impl AnchorTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidConfig(format!(
                "anchor time {hour:02}:{minute:02} is not a time of day"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

impl fmt::Display for AnchorTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parses `H:MM` or `HH:MM` in 24-hour form.
impl FromStr for AnchorTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidConfig(format!("expected HH:MM, got {s:?}"));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(invalid());
        }
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.parse::<u8>().map_err(|_| invalid())?;

        Self::new(hour, minute)
    }
}

impl TryFrom<String> for AnchorTime {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AnchorTime> for String {
    fn from(anchor: AnchorTime) -> Self {
        anchor.to_string()
    }
}

/// What the user asked for: a cadence and, optionally, when it starts.
///
/// Immutable while armed; changing it means disarm then arm again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub interval_minutes: u32,
    /// `None` starts counting from the moment of arming.
    pub anchor: Option<AnchorTime>,
}

impl ReminderConfig {
    pub fn every(interval_minutes: u32) -> Self {
        Self {
            interval_minutes,
            anchor: None,
        }
    }

    pub fn starting_at(mut self, anchor: AnchorTime) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_minutes == 0 {
            return Err(Error::InvalidConfig(
                "interval must be at least one minute".into(),
            ));
        }
        if self.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(Error::InvalidConfig(format!(
                "interval of {} minutes exceeds {MAX_INTERVAL_MINUTES}",
                self.interval_minutes
            )));
        }
        Ok(())
    }

    pub fn interval_millis(&self) -> i64 {
        interval_millis(self.interval_minutes)
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self::every(DEFAULT_INTERVAL_MINUTES)
    }
}

pub fn interval_millis(interval_minutes: u32) -> i64 {
    i64::from(interval_minutes) * 60_000
}
