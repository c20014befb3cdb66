//! The reminder's state machine and the task that drives it.
//!
//! [`AlarmMachine`] holds the transition rules. [`ReminderService`] owns
//! the machine and the [`Notifier`](crate::notifier::Notifier) on a single
//! task, so user commands, wake-up deliveries, alert timeouts and the
//! watchdog are applied strictly one at a time.

mod commands;
mod machine;
mod service;

pub use commands::ReminderCommand;
pub use machine::{AlarmMachine, Reconciliation, ResumePolicy};
pub use service::{
    DEFAULT_STALE_GRACE, DEFAULT_WATCHDOG_PERIOD, ReminderHandle, ReminderService,
};
