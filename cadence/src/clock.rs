//! Wall-clock access.
//!
//! Scheduling works in epoch milliseconds, but the daily anchor needs the
//! local calendar date and offset, so clocks hand out [`OffsetDateTime`]
//! values already shifted to the local offset.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

pub trait Clock: Send + Sync {
    /// Current instant in the local offset.
    fn now(&self) -> OffsetDateTime;

    fn now_millis(&self) -> i64 {
        to_epoch_millis(self.now())
    }
}

/// The host's real-time clock.
///
/// The local offset is resolved once, at construction. `time` refuses to
/// read the offset once other threads exist, so construct this before
/// starting the async runtime.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self { offset }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

/// A clock slaved to tokio's clock, so a paused test runtime drives wall
/// time as well. Starts at `base` when created.
#[derive(Debug, Clone)]
pub struct TokioClock {
    base: OffsetDateTime,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn new(base: OffsetDateTime) -> Self {
        Self {
            base,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> OffsetDateTime {
        self.base + self.started.elapsed()
    }
}

pub fn to_epoch_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Inverse of [`to_epoch_millis`], rendered in `offset`. Out-of-range
/// values clamp to the epoch.
pub fn from_epoch_millis(millis: i64, offset: UtcOffset) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .to_offset(offset)
}

/// Wall-clock time of day, `HH:MM` or `hh:mm AM`.
pub fn format_time_of_day(instant: OffsetDateTime, twelve_hour: bool) -> String {
    let formatted = if twelve_hour {
        instant.format(format_description!("[hour repr:12]:[minute] [period]"))
    } else {
        instant.format(format_description!("[hour]:[minute]"))
    };
    formatted.unwrap_or_default()
}
