//! Error types shared across the reminder core.

use thiserror::Error;

use crate::permissions::Permission;
use crate::scheduler::WakeupError;
use crate::store::StoreError;
use crate::types::AlarmPhase;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A platform permission needed to keep the cadence honest is missing.
    /// Arming is refused and nothing is persisted.
    #[error("missing permission: {0}")]
    Precondition(Permission),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: AlarmPhase,
    },

    /// The timer facility rejected a registration for a reason expected to
    /// clear up by itself. Not retried here; the next self-heal recovers.
    #[error("wake-up registration rejected: {0}")]
    TransientPlatform(String),

    /// Persistence failures are fatal for the transition that hit them.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("reminder service is not running")]
    ServiceStopped,
}

impl From<WakeupError> for Error {
    fn from(err: WakeupError) -> Self {
        match err {
            WakeupError::PermissionRevoked => Error::Precondition(Permission::ExactWakeup),
            WakeupError::Rejected(reason) => Error::TransientPlatform(reason),
        }
    }
}
