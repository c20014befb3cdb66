//! Platform permissions that gate arming.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::{Error, Result};
use crate::notifier::AlertSink;
use crate::scheduler::WakeupTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    /// Schedule exact wake-ups that fire even while the host idles.
    ExactWakeup,
    /// Surface alerts to the user.
    PostAlerts,
}

pub trait Permissions: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;
}

/// Fails with [`Error::Precondition`] naming the first missing permission.
pub fn require_all(permissions: &dyn Permissions) -> Result<()> {
    match Permission::iter().find(|p| !permissions.is_granted(*p)) {
        Some(missing) => Err(Error::Precondition(missing)),
        None => Ok(()),
    }
}

/// Asks the collaborators that actually need the permissions.
pub struct PlatformPermissions {
    timer: Arc<dyn WakeupTimer>,
    sink: Arc<dyn AlertSink>,
}

impl PlatformPermissions {
    pub fn new(timer: Arc<dyn WakeupTimer>, sink: Arc<dyn AlertSink>) -> Self {
        Self { timer, sink }
    }
}

impl Permissions for PlatformPermissions {
    fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::ExactWakeup => self.timer.can_schedule_exact(),
            Permission::PostAlerts => self.sink.can_post_alerts(),
        }
    }
}
