//! Fakes for the platform seams.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::notifier::{Alert, AlertSink};
use crate::permissions::{Permission, Permissions};
use crate::scheduler::{Wakeup, WakeupError, WakeupId, WakeupTimer};

/// Records registrations instead of waking anything.
#[derive(Default)]
pub struct RecordingTimer {
    inner: Mutex<TimerLog>,
}

#[derive(Default)]
struct TimerLog {
    pending: Option<Wakeup>,
    registrations: Vec<Wakeup>,
    cancels: usize,
    fail_next: Option<WakeupError>,
    exact_denied: bool,
}

impl RecordingTimer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn registrations(&self) -> Vec<Wakeup> {
        self.inner.lock().registrations.clone()
    }

    pub fn cancels(&self) -> usize {
        self.inner.lock().cancels
    }

    pub fn current(&self) -> Option<Wakeup> {
        self.inner.lock().pending.clone()
    }

    pub fn fail_next(&self, err: WakeupError) {
        self.inner.lock().fail_next = Some(err);
    }

    pub fn deny_exact(&self) {
        self.inner.lock().exact_denied = true;
    }
}

impl WakeupTimer for RecordingTimer {
    fn can_schedule_exact(&self) -> bool {
        !self.inner.lock().exact_denied
    }

    fn register(&self, wakeup: Wakeup) -> Result<(), WakeupError> {
        let mut inner = self.inner.lock();
        if let Some(err) = inner.fail_next.take() {
            return Err(err);
        }
        inner.pending = Some(wakeup.clone());
        inner.registrations.push(wakeup);
        Ok(())
    }

    fn cancel(&self, _id: &WakeupId) {
        let mut inner = self.inner.lock();
        inner.pending = None;
        inner.cancels += 1;
    }

    fn pending(&self, id: &WakeupId) -> Option<Wakeup> {
        self.inner
            .lock()
            .pending
            .clone()
            .filter(|wakeup| &wakeup.id == id)
    }
}

pub struct FakePermissions {
    revoked: Mutex<HashSet<Permission>>,
}

impl FakePermissions {
    pub fn granted() -> Self {
        Self {
            revoked: Mutex::new(HashSet::new()),
        }
    }

    pub fn revoke(&self, permission: Permission) {
        self.revoked.lock().insert(permission);
    }

    pub fn grant(&self, permission: Permission) {
        self.revoked.lock().remove(&permission);
    }
}

impl Permissions for FakePermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        !self.revoked.lock().contains(&permission)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Started(Alert),
    Stopped,
}

/// Alert sink that remembers what it was asked to do.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    pub fn starts(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Started(_)))
            .count()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.events.lock().last(), Some(SinkEvent::Started(_)))
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn start(&self, alert: &Alert) -> anyhow::Result<()> {
        self.events.lock().push(SinkEvent::Started(alert.clone()));
        Ok(())
    }

    async fn stop(&self) {
        self.events.lock().push(SinkEvent::Stopped);
    }
}
