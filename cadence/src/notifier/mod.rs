//! Alert activation.
//!
//! When the reminder fires, the [`Notifier`] hands an [`Alert`] to the
//! platform's [`AlertSink`] (sound, vibration, a low-priority indicator)
//! and arms a bounded auto-timeout. If nobody dismisses the alert before
//! the timeout, the owner deactivates it and acknowledges the fire itself:
//! the reminder announced itself, and the cadence keeps going regardless.

mod command_sink;
mod log_sink;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::tracing::prelude::*;
use crate::types::{Preferences, SoundSelection};

pub use command_sink::CommandAlertSink;
pub use log_sink::LogAlertSink;

pub const DEFAULT_ALERT_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait 0 ms, vibrate 500 ms, pause 200 ms, vibrate 500 ms. Played once.
pub const REMINDER_VIBRATION: VibrationPattern = VibrationPattern {
    timings_ms: &[0, 500, 200, 500],
    repeat: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VibrationPattern {
    /// Alternating off/on durations, starting with off.
    pub timings_ms: &'static [u64],
    pub repeat: bool,
}

impl fmt::Display for VibrationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timings: Vec<String> = self.timings_ms.iter().map(u64::to_string).collect();
        f.write_str(&timings.join(","))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: &'static str,
    pub message: &'static str,
    pub sound: SoundSelection,
    pub vibration: Option<VibrationPattern>,
}

impl Alert {
    pub fn from_preferences(preferences: &Preferences) -> Self {
        Self {
            title: "Repeat Reminder",
            message: "Reminder is ringing",
            sound: preferences.sound.clone(),
            vibration: preferences
                .vibration_enabled
                .then_some(REMINDER_VIBRATION),
        }
    }
}

/// Platform side of an alert: renders audio, vibration and the indicator.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Whether alerts may be shown at all.
    fn can_post_alerts(&self) -> bool {
        true
    }

    async fn start(&self, alert: &Alert) -> anyhow::Result<()>;

    /// Stop audio and vibration and clear the indicator. Safe to call when
    /// nothing is active.
    async fn stop(&self);
}

/// Drives an [`AlertSink`] and owns the auto-timeout deadline.
pub struct Notifier {
    sink: Arc<dyn AlertSink>,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn AlertSink>, timeout: Duration) -> Self {
        Self {
            sink,
            timeout,
            deadline: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the active alert times out, if one is active.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Start an alert unless one is already showing.
    ///
    /// A sink failure is logged, not returned: the fire has already been
    /// recorded and the cadence must not depend on the alert rendering.
    pub async fn activate(&mut self, preferences: &Preferences) {
        if self.is_active() {
            debug!("Alert already active");
            return;
        }

        let alert = Alert::from_preferences(preferences);
        if let Err(e) = self.sink.start(&alert).await {
            error!(error = %e, "Failed to start alert");
        }
        self.deadline = Some(Instant::now() + self.timeout);
        debug!(timeout_ms = self.timeout.as_millis() as u64, "Alert active");
    }

    /// Stop the active alert and drop its timeout.
    pub async fn deactivate(&mut self) {
        if self.deadline.take().is_some() {
            self.sink.stop().await;
            debug!("Alert stopped");
        }
    }
}
