use parking_lot::Mutex;

use super::{StateStore, StoreResult};
use crate::types::{DEFAULT_INTERVAL_MINUTES, Preferences, ScheduleState};

/// Volatile store for tests and for running without a state directory.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: ScheduleState,
    preferences: Preferences,
    writes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_state(ScheduleState::idle(DEFAULT_INTERVAL_MINUTES))
    }

    pub fn with_state(state: ScheduleState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                preferences: Preferences::default(),
                writes: 0,
            }),
        }
    }

    /// Number of schedule writes that landed.
    pub fn writes(&self) -> u64 {
        self.inner.lock().writes
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> StoreResult<ScheduleState> {
        Ok(self.inner.lock().state)
    }

    fn save(&self, state: &ScheduleState) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.state = *state;
        inner.writes += 1;
        Ok(())
    }

    fn compare_and_swap(
        &self,
        expected: &ScheduleState,
        new: &ScheduleState,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        if inner.state != *expected {
            return Ok(false);
        }
        inner.state = *new;
        inner.writes += 1;
        Ok(true)
    }

    fn load_preferences(&self) -> StoreResult<Preferences> {
        Ok(self.inner.lock().preferences.clone())
    }

    fn save_preferences(&self, preferences: &Preferences) -> StoreResult<()> {
        self.inner.lock().preferences = preferences.clone();
        Ok(())
    }
}
