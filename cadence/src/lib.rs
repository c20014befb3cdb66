//! Recurring local reminder scheduler.
//!
//! The core is the alarm scheduling and recovery state machine: it computes
//! the next fire instant, persists it before anything observable happens,
//! re-registers a wake-up after every fire, and heals itself when the
//! persisted schedule turns out to be stale after a suspension or a crash.
//!
//! Presentation (the CLI, or any other front end) talks to the core through
//! [`alarm::ReminderHandle`], usually via the HTTP API in [`api`].

pub mod alarm;
pub mod api;
pub mod api_client;
pub mod clock;
pub mod config;
pub mod error;
pub mod notifier;
pub mod permissions;
pub mod scheduler;
pub mod store;
pub mod tracing;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
