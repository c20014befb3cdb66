//! Durable key/value storage for the schedule record and preferences.
//!
//! The store is the single source of truth. Every transition goes through
//! [`StateStore::compare_and_swap`] so that two writers (a wake-up delivery
//! and a user command, or two processes sharing the file) cannot interleave
//! a read-modify-write and leave a dangling registration or a stuck
//! `ringing` flag behind.

mod file;
mod memory;

use thiserror::Error;

use crate::types::{Preferences, ScheduleState};

pub use file::{FileStore, STATE_FILE_NAME};
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("state store is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("state store schema version {0} is not supported")]
    UnsupportedVersion(u8),

    #[error("state changed underneath {attempts} consecutive updates")]
    Conflict { attempts: u32 },

    #[error("timed out waiting for state store lock {0}")]
    LockTimeout(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait StateStore: Send + Sync {
    /// Current schedule record. A store that was never written yields the
    /// idle record with the default interval.
    fn load(&self) -> StoreResult<ScheduleState>;

    /// Unconditional write.
    fn save(&self, state: &ScheduleState) -> StoreResult<()>;

    /// Write `new` only if the stored record still equals `expected`.
    /// Returns whether the write happened.
    fn compare_and_swap(&self, expected: &ScheduleState, new: &ScheduleState)
    -> StoreResult<bool>;

    fn load_preferences(&self) -> StoreResult<Preferences>;

    fn save_preferences(&self, preferences: &Preferences) -> StoreResult<()>;
}
