//! In-process wake-up timer backed by tokio tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Wakeup, WakeupError, WakeupFired, WakeupId, WakeupTimer};
use crate::clock::Clock;
use crate::tracing::prelude::*;

/// Longest single sleep between wall-clock checks.
///
/// tokio sleeps on the monotonic clock, which stops while the host is
/// suspended. Waking up regularly to compare against the wall clock bounds
/// how late a fire can be after a resume.
pub const DEFAULT_MAX_SLICE: Duration = Duration::from_secs(30);

struct Pending {
    wakeup: Wakeup,
    cancel: CancellationToken,
}

type PendingMap = Arc<Mutex<HashMap<WakeupId, Pending>>>;

/// Wakes registrations through a channel once the wall clock reaches their
/// instant. Never fires early: a fire is only sent after the clock has been
/// observed at or past `fire_at_ms`.
pub struct TokioWakeupTimer {
    clock: Arc<dyn Clock>,
    fired_tx: mpsc::UnboundedSender<WakeupFired>,
    pending: PendingMap,
    max_slice: Duration,
}

impl TokioWakeupTimer {
    pub fn new(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<WakeupFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let timer = Self {
            clock,
            fired_tx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            max_slice: DEFAULT_MAX_SLICE,
        };
        (timer, fired_rx)
    }

    pub fn with_max_slice(mut self, max_slice: Duration) -> Self {
        self.max_slice = max_slice.max(Duration::from_millis(1));
        self
    }
}

impl WakeupTimer for TokioWakeupTimer {
    fn can_schedule_exact(&self) -> bool {
        Handle::try_current().is_ok()
    }

    fn register(&self, wakeup: Wakeup) -> Result<(), WakeupError> {
        let handle = Handle::try_current()
            .map_err(|_| WakeupError::Rejected("no async runtime to host the timer".into()))?;

        let cancel = CancellationToken::new();
        let previous = self.pending.lock().insert(
            wakeup.id.clone(),
            Pending {
                wakeup: wakeup.clone(),
                cancel: cancel.clone(),
            },
        );
        if let Some(previous) = previous {
            trace!(id = %wakeup.id, replaced_token = previous.wakeup.token, "Replacing wake-up");
            previous.cancel.cancel();
        }

        debug!(id = %wakeup.id, fire_at_ms = wakeup.fire_at_ms, token = wakeup.token, "Wake-up registered");

        handle.spawn(deliver(
            Arc::clone(&self.clock),
            wakeup,
            cancel,
            self.fired_tx.clone(),
            Arc::clone(&self.pending),
            self.max_slice,
        ));
        Ok(())
    }

    fn cancel(&self, id: &WakeupId) {
        if let Some(pending) = self.pending.lock().remove(id) {
            debug!(id = %id, token = pending.wakeup.token, "Wake-up cancelled");
            pending.cancel.cancel();
        }
    }

    fn pending(&self, id: &WakeupId) -> Option<Wakeup> {
        self.pending.lock().get(id).map(|p| p.wakeup.clone())
    }
}

impl Drop for TokioWakeupTimer {
    fn drop(&mut self) {
        for (_, pending) in self.pending.lock().drain() {
            pending.cancel.cancel();
        }
    }
}

async fn deliver(
    clock: Arc<dyn Clock>,
    wakeup: Wakeup,
    cancel: CancellationToken,
    fired_tx: mpsc::UnboundedSender<WakeupFired>,
    pending: PendingMap,
    max_slice: Duration,
) {
    loop {
        let remaining_ms = wakeup.fire_at_ms - clock.now_millis();
        if remaining_ms <= 0 {
            break;
        }
        let slice = Duration::from_millis(remaining_ms.unsigned_abs()).min(max_slice);

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(slice) => {}
        }
    }

    // Claim the registration under the lock so a concurrent cancel or
    // replacement either wins outright or sees nothing left to cancel.
    {
        let mut pending = pending.lock();
        match pending.get(&wakeup.id) {
            Some(current) if current.wakeup.token == wakeup.token => {
                pending.remove(&wakeup.id);
            }
            _ => return,
        }
    }

    let late_ms = clock.now_millis() - wakeup.fire_at_ms;
    debug!(id = %wakeup.id, token = wakeup.token, late_ms, "Wake-up fired");

    if fired_tx
        .send(WakeupFired {
            id: wakeup.id,
            token: wakeup.token,
        })
        .is_err()
    {
        debug!("Wake-up receiver closed");
    }
}
