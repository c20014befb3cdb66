//! The persisted schedule record and the phase derived from it.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::reminder::interval_millis;

/// Where the reminder is in its cycle.
///
/// ```text
///            arm                 wake-up fires
///  Idle ───────────► Armed ──────────────────────► Ringing
///   ▲                 ▲  │                           │
///   │                 │  │       acknowledge /       │
///   │                 │  └───────  auto-timeout ◄────┘
///   │     disarm      │                              │
///   └─────────────────┴────────────── disarm ────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlarmPhase {
    Idle,
    Armed,
    Ringing,
}

/// Authoritative schedule record. The store holds the only true copy;
/// everything in memory is a cache reconciled against it.
///
/// Invariants: `ringing` implies `running`, and `running` implies
/// `next_fire_epoch_millis > 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub running: bool,
    pub ringing: bool,
    pub interval_minutes: u32,
    pub next_fire_epoch_millis: i64,
}

impl ScheduleState {
    /// The resting record. The interval is kept so a front end can offer
    /// the last cadence again.
    pub fn idle(interval_minutes: u32) -> Self {
        Self {
            running: false,
            ringing: false,
            interval_minutes,
            next_fire_epoch_millis: 0,
        }
    }

    pub fn armed(interval_minutes: u32, next_fire_epoch_millis: i64) -> Self {
        Self {
            running: true,
            ringing: false,
            interval_minutes,
            next_fire_epoch_millis,
        }
    }

    pub fn phase(&self) -> AlarmPhase {
        match (self.running, self.ringing) {
            (false, _) => AlarmPhase::Idle,
            (true, false) => AlarmPhase::Armed,
            (true, true) => AlarmPhase::Ringing,
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.interval_minutes > 0
    }

    pub fn interval_millis(&self) -> i64 {
        interval_millis(self.interval_minutes)
    }

    /// Whether the record breaks one of the structural invariants.
    pub fn is_consistent(&self) -> bool {
        (!self.ringing || self.running) && (!self.running || self.next_fire_epoch_millis > 0)
    }

    /// Armed, but the expected fire instant is already behind `now_ms` by
    /// more than `grace_ms`.
    pub fn is_stale(&self, now_ms: i64, grace_ms: i64) -> bool {
        self.phase() == AlarmPhase::Armed
            && self.next_fire_epoch_millis.saturating_add(grace_ms) < now_ms
    }

    /// Milliseconds until the next fire, zero once it is due.
    pub fn remaining_millis(&self, now_ms: i64) -> Option<i64> {
        self.running
            .then(|| (self.next_fire_epoch_millis - now_ms).max(0))
    }
}
