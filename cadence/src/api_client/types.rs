//! API data transfer objects.
//!
//! These types define the API contract shared between the server and
//! clients.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{Preferences, SoundSelection};

/// Reminder snapshot for rendering.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ReminderState {
    /// `idle`, `armed` or `ringing`.
    pub phase: String,
    pub running: bool,
    pub ringing: bool,
    pub interval_minutes: u32,
    /// Absent while idle.
    pub next_fire_epoch_millis: Option<i64>,
    /// Whole seconds until the next fire, rounded up. Absent while idle.
    pub remaining_secs: Option<u64>,
}

impl ReminderState {
    /// Remaining time as `MM:SS`. Minutes are not wrapped into hours.
    pub fn countdown(&self) -> Option<String> {
        self.remaining_secs.map(format_countdown)
    }
}

pub fn format_countdown(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ArmRequest {
    pub interval_minutes: u32,
    /// Daily anchor for the first fire, `HH:MM` (24-hour).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
}

/// Result of a self-heal check.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ReconcileResponse {
    /// `idle`, `resumed`, `healed` or `repaired`.
    pub outcome: String,
    /// The fire that was lost, when `outcome` is `healed`.
    pub missed_fire_epoch_millis: Option<i64>,
    pub state: ReminderState,
}

/// Alert preferences as exposed over the API.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct AlertPreferences {
    /// `default`, `silent`, or a sound URI.
    pub sound: String,
    pub vibration_enabled: bool,
}

impl From<Preferences> for AlertPreferences {
    fn from(preferences: Preferences) -> Self {
        let sound = match preferences.sound {
            SoundSelection::Default => "default".into(),
            SoundSelection::Silent => "silent".into(),
            SoundSelection::Uri(uri) => uri,
        };
        Self {
            sound,
            vibration_enabled: preferences.vibration_enabled,
        }
    }
}

impl From<AlertPreferences> for Preferences {
    fn from(preferences: AlertPreferences) -> Self {
        let sound = match preferences.sound.trim() {
            "" | "default" => SoundSelection::Default,
            "silent" => SoundSelection::Silent,
            uri => SoundSelection::Uri(uri.to_string()),
        };
        Self {
            sound,
            vibration_enabled: preferences.vibration_enabled,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
