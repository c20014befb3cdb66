//! JSON-file store.
//!
//! One small document holds the schedule and the preferences. Writes go to
//! a temporary file that is synced and renamed over the original, so a
//! crash leaves either the old or the new record, never a torn one.
//! Read-modify-write sequences hold an advisory lock on a sibling `.lock`
//! file, which also serializes writers living in different processes. The
//! kernel drops the lock along with its holder, so a writer that dies
//! mid-update never wedges the store and no lock is ever evicted.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{StateStore, StoreError, StoreResult};
use crate::tracing::prelude::*;
use crate::types::{DEFAULT_INTERVAL_MINUTES, Preferences, ScheduleState};

pub const STATE_FILE_NAME: &str = "reminder.json";

const SCHEMA_VERSION: u8 = 1;

const LOCK_TIMEOUT: Duration = Duration::from_millis(1500);

const LOCK_POLL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Document {
    version: u8,
    reminder: ScheduleState,
    #[serde(default)]
    preferences: Preferences,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            reminder: ScheduleState::idle(DEFAULT_INTERVAL_MINUTES),
            preferences: Preferences::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store backed by `reminder.json` inside `dir`. The directory is
    /// created on first write.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(STATE_FILE_NAME))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoreResult<Document> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::default()),
            Err(e) => return Err(e.into()),
        };

        let doc: Document = serde_json::from_slice(&bytes)?;
        if doc.version != SCHEMA_VERSION {
            return Err(StoreError::UnsupportedVersion(doc.version));
        }
        Ok(doc)
    }

    fn write(&self, doc: &Document) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(doc)?;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&json)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Run `f` over the current document while holding the lock, writing
    /// the document back if `f` asks for it.
    fn update<T>(&self, f: impl FnOnce(&mut Document) -> (bool, T)) -> StoreResult<T> {
        let _guard = self.lock()?;
        let mut doc = self.read()?;
        let (changed, out) = f(&mut doc);
        if changed {
            self.write(&doc)?;
        }
        Ok(out)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self) -> StoreResult<LockGuard> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.raw_os_error() == contended => {
                    if started.elapsed() > LOCK_TIMEOUT {
                        return Err(StoreError::LockTimeout(lock_path.display().to_string()));
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Holder's pid, for whoever finds the lock contended.
        let _ = file.set_len(0);
        let _ = write!(file, "{}", std::process::id());
        Ok(LockGuard { file })
    }
}

struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(error = %e, "Failed to unlock state store; closing releases it");
        }
    }
}

impl StateStore for FileStore {
    fn load(&self) -> StoreResult<ScheduleState> {
        Ok(self.read()?.reminder)
    }

    fn save(&self, state: &ScheduleState) -> StoreResult<()> {
        self.update(|doc| {
            doc.reminder = *state;
            (true, ())
        })
    }

    fn compare_and_swap(
        &self,
        expected: &ScheduleState,
        new: &ScheduleState,
    ) -> StoreResult<bool> {
        self.update(|doc| {
            if doc.reminder != *expected {
                return (false, false);
            }
            doc.reminder = *new;
            (true, true)
        })
    }

    fn load_preferences(&self) -> StoreResult<Preferences> {
        Ok(self.read()?.preferences)
    }

    fn save_preferences(&self, preferences: &Preferences) -> StoreResult<()> {
        self.update(|doc| {
            doc.preferences = preferences.clone();
            (true, ())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::types::SoundSelection;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::in_dir(dir.path().join("state"));
        (dir, store)
    }

    #[test]
    fn missing_file_reads_as_idle() {
        let (_dir, store) = store();
        assert_eq!(
            store.load().unwrap(),
            ScheduleState::idle(DEFAULT_INTERVAL_MINUTES)
        );
        assert_eq!(store.load_preferences().unwrap(), Preferences::default());
    }

    #[test]
    fn state_survives_a_new_store_instance() {
        let (_dir, store) = store();
        let armed = ScheduleState::armed(10, 1_760_000_000_000);
        store.save(&armed).unwrap();

        let reopened = FileStore::at(store.path());
        assert_eq!(reopened.load().unwrap(), armed);
    }

    #[test]
    fn preferences_and_schedule_share_one_document() {
        let (_dir, store) = store();
        let prefs = Preferences {
            sound: SoundSelection::Silent,
            vibration_enabled: false,
        };
        store.save_preferences(&prefs).unwrap();
        store.save(&ScheduleState::armed(5, 42)).unwrap();

        assert_eq!(store.load_preferences().unwrap(), prefs);
        assert_eq!(store.load().unwrap(), ScheduleState::armed(5, 42));
    }

    #[test]
    fn compare_and_swap_only_writes_on_match() {
        let (_dir, store) = store();
        let idle = store.load().unwrap();
        let armed = ScheduleState::armed(15, 900_000);

        assert!(store.compare_and_swap(&idle, &armed).unwrap());
        assert!(!store.compare_and_swap(&idle, &idle).unwrap());
        assert_eq!(store.load().unwrap(), armed);
    }

    #[test]
    fn lock_is_released_after_update() {
        let (_dir, store) = store();
        store.save(&ScheduleState::armed(15, 1)).unwrap();
        assert!(store.lock().is_ok());
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn leftover_lock_file_does_not_block_writers() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.lock_path(), b"4242").unwrap();

        store.save(&ScheduleState::armed(15, 1)).unwrap();
        assert_eq!(store.load().unwrap(), ScheduleState::armed(15, 1));
    }

    #[test]
    fn old_lock_is_not_taken_from_a_live_holder() {
        let (_dir, store) = store();
        let _held = store.lock().unwrap();
        OpenOptions::new()
            .write(true)
            .open(store.lock_path())
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        let err = store.save(&ScheduleState::armed(15, 1)).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));
        assert_eq!(fs::read_to_string(store.lock_path()).unwrap(), std::process::id().to_string());
    }

    #[test]
    fn held_lock_times_out() {
        let (_dir, store) = store();
        let _held = store.lock().unwrap();

        let err = store.save(&ScheduleState::armed(15, 1)).unwrap_err();
        assert!(matches!(err, StoreError::LockTimeout(_)));
    }

    #[test]
    fn malformed_file_is_an_error_not_a_reset() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), b"{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            br#"{"version":9,"reminder":{"running":false,"ringing":false,"interval_minutes":15,"next_fire_epoch_millis":0}}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load(),
            Err(StoreError::UnsupportedVersion(9))
        ));
    }
}
