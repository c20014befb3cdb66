use serde::{Deserialize, Serialize};

/// Sound played when the reminder fires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uri", rename_all = "snake_case")]
pub enum SoundSelection {
    /// The platform's default notification sound.
    #[default]
    Default,
    /// No audio at all.
    Silent,
    /// A specific sound, by URI or path.
    Uri(String),
}

impl SoundSelection {
    pub fn is_silent(&self) -> bool {
        matches!(self, SoundSelection::Silent)
    }
}

/// Alert preferences, stored alongside the schedule under the same
/// reminder identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub sound: SoundSelection,
    #[serde(default = "default_vibration")]
    pub vibration_enabled: bool,
}

fn default_vibration() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sound: SoundSelection::Default,
            vibration_enabled: default_vibration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, Preferences::default());
        assert!(prefs.vibration_enabled);
    }

    #[test]
    fn sound_selection_wire_shape() {
        let uri = SoundSelection::Uri("file:///usr/share/sounds/bell.oga".into());
        assert_eq!(
            serde_json::to_string(&uri).unwrap(),
            r#"{"kind":"uri","uri":"file:///usr/share/sounds/bell.oga"}"#
        );
        assert_eq!(
            serde_json::to_string(&SoundSelection::Silent).unwrap(),
            r#"{"kind":"silent"}"#
        );
    }
}
