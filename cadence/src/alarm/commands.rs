//! Command types sent from handles to the reminder service.
//!
//! Each command carries a oneshot reply channel so the caller can await
//! the result of the transition it asked for.

use tokio::sync::oneshot;

use super::machine::Reconciliation;
use crate::error::Result;
use crate::types::{Preferences, ReminderConfig, ScheduleState};

pub enum ReminderCommand {
    Arm {
        config: ReminderConfig,
        reply: oneshot::Sender<Result<ScheduleState>>,
    },

    /// Cancel the cycle and stop any active alert.
    Disarm {
        reply: oneshot::Sender<Result<ScheduleState>>,
    },

    /// Dismiss the ringing alert.
    Acknowledge {
        reply: oneshot::Sender<Result<ScheduleState>>,
    },

    /// Run the self-heal check now, as if the host just resumed.
    Reconcile {
        reply: oneshot::Sender<Result<Reconciliation>>,
    },

    /// Show one alert without touching the cadence.
    TestAlert { reply: oneshot::Sender<Result<()>> },

    SetPreferences {
        preferences: Preferences,
        reply: oneshot::Sender<Result<Preferences>>,
    },
}
