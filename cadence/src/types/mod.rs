mod preferences;
mod reminder;
mod schedule;

pub use preferences::{Preferences, SoundSelection};
pub use reminder::{
    AnchorTime, DEFAULT_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES, ReminderConfig, interval_millis,
};
pub use schedule::{AlarmPhase, ScheduleState};
