//! Assessment of a persisted schedule record against the current time.

use chrono::{DateTime, TimeZone};

use cadence::types::{AlarmPhase, ScheduleState};

/// Where the record stands relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Idle,
    /// Next fire is ahead.
    Pending { remaining_secs: u64 },
    /// Past the fire instant but inside the grace window; a delivery may
    /// still be in flight.
    Due { late_secs: u64 },
    /// Past the grace window. The daemon's watchdog (or its next start)
    /// will reschedule.
    Stale { late_secs: u64 },
    Ringing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub phase: AlarmPhase,
    pub interval_minutes: u32,
    pub next_fire_ms: Option<i64>,
    pub timing: Timing,
    /// `ringing` without `running`, or `running` without a fire instant.
    pub inconsistent: bool,
}

pub fn assess(state: &ScheduleState, now_ms: i64, grace_ms: i64) -> Report {
    let phase = state.phase();
    let delta_ms = state.next_fire_epoch_millis - now_ms;
    let timing = match phase {
        AlarmPhase::Idle => Timing::Idle,
        AlarmPhase::Ringing => Timing::Ringing,
        AlarmPhase::Armed if delta_ms >= 0 => Timing::Pending {
            remaining_secs: ceil_secs(delta_ms),
        },
        AlarmPhase::Armed if state.is_stale(now_ms, grace_ms) => Timing::Stale {
            late_secs: ceil_secs(-delta_ms),
        },
        AlarmPhase::Armed => Timing::Due {
            late_secs: ceil_secs(-delta_ms),
        },
    };

    Report {
        phase,
        interval_minutes: state.interval_minutes,
        next_fire_ms: state.running.then_some(state.next_fire_epoch_millis),
        timing,
        inconsistent: !state.is_consistent(),
    }
}

fn ceil_secs(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0).div_ceil(1000)
}

/// Calendar date and time of day of an epoch-millisecond instant in `tz`.
pub fn format_instant<Tz: TimeZone>(ms: i64, tz: &Tz, twelve_hour: bool) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(utc) = DateTime::from_timestamp_millis(ms) else {
        return format!("{ms} ms (out of range)");
    };
    let local = utc.with_timezone(tz);
    let pattern = if twelve_hour {
        "%Y-%m-%d %I:%M %p"
    } else {
        "%Y-%m-%d %H:%M"
    };
    local.format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use test_case::test_case;

    use super::*;

    const NOW: i64 = 1_773_482_400_000;

    #[test_case(ScheduleState::idle(15), Timing::Idle; "idle")]
    #[test_case(ScheduleState::armed(15, NOW + 90_500), Timing::Pending { remaining_secs: 91 }; "pending rounds up")]
    #[test_case(ScheduleState::armed(15, NOW - 10_000), Timing::Due { late_secs: 10 }; "inside grace")]
    #[test_case(ScheduleState::armed(15, NOW - 31_000), Timing::Stale { late_secs: 31 }; "past grace")]
    fn timing_of(state: ScheduleState, expected: Timing) {
        assert_eq!(assess(&state, NOW, 30_000).timing, expected);
    }

    #[test]
    fn flags_ringing_without_running() {
        let broken = ScheduleState {
            ringing: true,
            ..ScheduleState::idle(15)
        };
        let report = assess(&broken, NOW, 30_000);

        assert!(report.inconsistent);
        assert_eq!(report.phase, AlarmPhase::Idle);
        assert_eq!(report.next_fire_ms, None);
    }

    #[test]
    fn formats_in_both_clock_styles() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        // 2026-03-14 10:00 UTC
        assert_eq!(format_instant(NOW, &tz, false), "2026-03-14 11:00");
        assert_eq!(format_instant(NOW + 3 * 3_600_000, &tz, true), "2026-03-14 02:00 PM");
    }
}
