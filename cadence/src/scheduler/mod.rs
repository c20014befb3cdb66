//! Trigger scheduling.
//!
//! Turns a [`ReminderConfig`] and the current time into a concrete fire
//! instant, and hands that instant to a [`WakeupTimer`] that wakes the
//! reminder at or after it, even if the host was suspended in between.

mod timer;

use std::fmt;

use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime, Time};

use crate::types::{AnchorTime, ReminderConfig, interval_millis};

pub use timer::TokioWakeupTimer;

/// First fire for a freshly armed reminder.
///
/// With an anchor, this is today's anchor time (seconds zeroed) in the
/// offset of `now`, pushed to tomorrow when it is not strictly after
/// `now`. Without one, the first fire is one interval from `now`.
pub fn compute_first_fire(config: &ReminderConfig, now: OffsetDateTime) -> OffsetDateTime {
    match config.anchor {
        Some(anchor) => {
            let today = now.replace_time(anchor_time_of_day(anchor));
            if today <= now {
                today + TimeDuration::DAY
            } else {
                today
            }
        }
        None => compute_next_fire(config.interval_minutes, now),
    }
}

/// Next fire after a fire observed at `now`.
///
/// The cadence restarts from the actual fire time rather than from the
/// previous target, so late deliveries do not compound, and the anchor
/// phase is not restored either.
pub fn compute_next_fire(interval_minutes: u32, now: OffsetDateTime) -> OffsetDateTime {
    now + TimeDuration::milliseconds(interval_millis(interval_minutes))
}

/// Smallest `missed + k * interval` (k >= 1) strictly after `now_ms`.
/// Keeps the original phase when recovering from a missed fire.
pub fn catch_up_fire(missed_ms: i64, interval_minutes: u32, now_ms: i64) -> i64 {
    let interval = interval_millis(interval_minutes).max(1);
    let behind = now_ms.saturating_sub(missed_ms).max(0);
    let skipped = behind / interval + 1;
    missed_ms.saturating_add(skipped.saturating_mul(interval))
}

fn anchor_time_of_day(anchor: AnchorTime) -> Time {
    // AnchorTime only admits valid times of day.
    Time::from_hms(anchor.hour(), anchor.minute(), 0).unwrap_or(Time::MIDNIGHT)
}

/// Identity of a wake-up registration. Registering again under the same
/// identity replaces the earlier registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WakeupId(String);

impl WakeupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The one reminder this process manages.
    pub fn reminder() -> Self {
        Self::new("repeat-reminder")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WakeupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A one-shot wake-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wakeup {
    pub id: WakeupId,
    pub fire_at_ms: i64,
    /// Distinguishes this registration from earlier ones under the same
    /// identity, so a delivery that raced a replacement can be dropped.
    pub token: u64,
}

/// Delivered by a timer when a registration comes due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeupFired {
    pub id: WakeupId,
    pub token: u64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WakeupError {
    /// Exact, idle-tolerant wake-ups are not allowed anymore. Falling back
    /// to inexact timing would break the cadence, so callers must refuse.
    #[error("exact wake-up permission revoked")]
    PermissionRevoked,

    #[error("{0}")]
    Rejected(String),
}

/// Platform facility that wakes the reminder at or after an instant.
pub trait WakeupTimer: Send + Sync {
    /// Whether exact, idle-tolerant wake-ups may be scheduled right now.
    fn can_schedule_exact(&self) -> bool;

    /// Register a wake-up, replacing any outstanding one with the same id.
    fn register(&self, wakeup: Wakeup) -> Result<(), WakeupError>;

    /// Remove the outstanding registration for `id`. A no-op if there is
    /// none.
    fn cancel(&self, id: &WakeupId);

    fn pending(&self, id: &WakeupId) -> Option<Wakeup>;
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use time::macros::datetime;

    use super::*;
    use crate::clock::to_epoch_millis;

    #[test_case(1; "one minute")]
    #[test_case(15; "quarter hour")]
    #[test_case(1440; "one day")]
    fn first_fire_without_anchor_is_one_interval_out(interval: u32) {
        let now = datetime!(2026-03-14 10:17:23.456 +02:00);
        let fire = compute_first_fire(&ReminderConfig::every(interval), now);

        assert_eq!(
            to_epoch_millis(fire),
            to_epoch_millis(now) + i64::from(interval) * 60_000
        );
    }

    #[test_case(datetime!(2026-03-14 07:59 +09:00), datetime!(2026-03-14 08:00 +09:00); "one minute before")]
    #[test_case(datetime!(2026-03-14 00:00 +09:00), datetime!(2026-03-14 08:00 +09:00); "at midnight")]
    #[test_case(datetime!(2026-03-14 07:59:59.999 +09:00), datetime!(2026-03-14 08:00 +09:00); "just before")]
    #[test_case(datetime!(2026-03-14 08:00 +09:00), datetime!(2026-03-15 08:00 +09:00); "exactly at anchor")]
    #[test_case(datetime!(2026-03-14 08:01 +09:00), datetime!(2026-03-15 08:00 +09:00); "one minute after")]
    #[test_case(datetime!(2026-03-14 08:00:30 +09:00), datetime!(2026-03-15 08:00 +09:00); "seconds past anchor")]
    #[test_case(datetime!(2026-12-31 23:30 +09:00), datetime!(2027-01-01 08:00 +09:00); "across year end")]
    fn first_fire_with_anchor(now: OffsetDateTime, expected: OffsetDateTime) {
        let config = ReminderConfig::every(10).starting_at(AnchorTime::new(8, 0).unwrap());
        assert_eq!(compute_first_fire(&config, now), expected);
    }

    #[test]
    fn anchored_first_fire_is_strictly_future() {
        let config = ReminderConfig::every(10).starting_at(AnchorTime::new(23, 59).unwrap());
        let mut now = datetime!(2026-03-14 00:00 UTC);
        while now < datetime!(2026-03-15 00:00 UTC) {
            let fire = compute_first_fire(&config, now);
            assert!(fire > now);
            assert!(fire - now <= TimeDuration::DAY);
            assert_eq!((fire.hour(), fire.minute(), fire.second()), (23, 59, 0));
            now += TimeDuration::minutes(7);
        }
    }

    #[test]
    fn next_fire_counts_from_actual_fire_time() {
        let late = datetime!(2026-03-14 08:03:10 UTC);
        assert_eq!(
            compute_next_fire(15, late),
            datetime!(2026-03-14 08:18:10 UTC)
        );
    }

    #[test_case(1_000, 10, 1_001, 601_000; "barely missed")]
    #[test_case(1_000, 10, 601_000, 1_201_000; "exactly one interval behind")]
    #[test_case(1_000, 10, 3_000_000, 3_001_000; "several intervals behind")]
    #[test_case(1_000, 10, 500, 601_000; "not yet due still advances")]
    fn catch_up_keeps_phase(missed: i64, interval: u32, now: i64, expected: i64) {
        let next = catch_up_fire(missed, interval, now);
        assert_eq!(next, expected);
        assert!(next > now);
        assert_eq!((next - missed) % interval_millis(interval), 0);
    }
}
