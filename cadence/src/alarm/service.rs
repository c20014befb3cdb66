use std::sync::Arc;
use std::time::Duration;

use futures::future::OptionFuture;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::commands::ReminderCommand;
use super::machine::{AlarmMachine, Reconciliation};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::notifier::Notifier;
use crate::scheduler::WakeupFired;
use crate::store::{StateStore, StoreError, StoreResult};
use crate::tracing::prelude::*;
use crate::types::{AlarmPhase, Preferences, ReminderConfig, ScheduleState};

/// How often the service checks for a fire that never arrived.
pub const DEFAULT_WATCHDOG_PERIOD: Duration = Duration::from_secs(60);

/// How late a wake-up may be before it counts as lost.
pub const DEFAULT_STALE_GRACE: Duration = Duration::from_secs(30);

const COMMAND_QUEUE_DEPTH: usize = 16;

/// Owns the state machine and the notifier on one task.
///
/// Store access runs inline on this task. With a [`FileStore`] one
/// transition blocks it for at most the store's lock timeout (1.5 s) plus
/// the write and fsync of a small document.
///
/// [`FileStore`]: crate::store::FileStore
pub struct ReminderService {
    machine: AlarmMachine,
    notifier: Notifier,
    commands: mpsc::Receiver<ReminderCommand>,
    wakeups: mpsc::UnboundedReceiver<WakeupFired>,
    watchdog_period: Duration,
    stale_grace: Duration,
    /// Missed fire instant and when the watchdog first saw it overdue.
    overdue_since: Option<(i64, Instant)>,
}

impl ReminderService {
    pub fn new(
        machine: AlarmMachine,
        notifier: Notifier,
        wakeups: mpsc::UnboundedReceiver<WakeupFired>,
    ) -> (Self, ReminderHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let handle = ReminderHandle {
            commands: command_tx,
            store: Arc::clone(machine.store()),
            clock: Arc::clone(machine.clock()),
            state_rx: machine.subscribe(),
        };
        let service = Self {
            machine,
            notifier,
            commands: command_rx,
            wakeups,
            watchdog_period: DEFAULT_WATCHDOG_PERIOD,
            stale_grace: DEFAULT_STALE_GRACE,
            overdue_since: None,
        };
        (service, handle)
    }

    pub fn with_watchdog(mut self, period: Duration, stale_grace: Duration) -> Self {
        self.watchdog_period = period.max(Duration::from_secs(1));
        self.stale_grace = stale_grace;
        self
    }

    /// Recover after a process start.
    ///
    /// An alert cannot outlive the process that showed it, so a persisted
    /// `ringing` flag is acknowledged first. Then the record is reconciled
    /// against the clock, which also re-registers the wake-up.
    pub async fn resume(&mut self) -> Result<Reconciliation> {
        let state = self.machine.state()?;
        if state.phase() == AlarmPhase::Ringing {
            warn!("Reminder was ringing when the previous process stopped");
            self.machine.acknowledge()?;
        }

        let outcome = self.machine.reconcile()?;
        info!(?outcome, "Reminder resumed");
        Ok(outcome)
    }

    pub async fn run(mut self, cancellation: CancellationToken) {
        let mut watchdog = time::interval(self.watchdog_period);
        watchdog.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let alert_timeout = OptionFuture::from(self.notifier.deadline().map(time::sleep_until));

            tokio::select! {
                _ = cancellation.cancelled() => {
                    break;
                }
                Some(command) = self.commands.recv() => {
                    self.handle_command(command).await;
                }
                Some(fired) = self.wakeups.recv() => {
                    self.handle_wakeup(fired).await;
                }
                Some(()) = alert_timeout => {
                    self.handle_alert_timeout().await;
                }
                _ = watchdog.tick() => {
                    self.check_overdue();
                }
            }
        }

        self.notifier.deactivate().await;
        debug!("Reminder service stopped");
    }

    async fn handle_command(&mut self, command: ReminderCommand) {
        match command {
            ReminderCommand::Arm { config, reply } => {
                let _ = reply.send(self.machine.arm(&config));
            }
            ReminderCommand::Disarm { reply } => {
                let result = self.machine.disarm();
                self.notifier.deactivate().await;
                let _ = reply.send(result);
            }
            ReminderCommand::Acknowledge { reply } => {
                let result = self.machine.acknowledge();
                if result.is_ok() {
                    self.notifier.deactivate().await;
                }
                let _ = reply.send(result);
            }
            ReminderCommand::Reconcile { reply } => {
                let _ = reply.send(self.machine.reconcile());
            }
            ReminderCommand::TestAlert { reply } => {
                let _ = reply.send(self.test_alert().await);
            }
            ReminderCommand::SetPreferences { preferences, reply } => {
                let result = self
                    .machine
                    .set_preferences(&preferences)
                    .map(|()| preferences);
                let _ = reply.send(result);
            }
        }
    }

    async fn handle_wakeup(&mut self, fired: WakeupFired) {
        if fired.id != *self.machine.wakeup_id() || !self.machine.is_current(fired.token) {
            debug!(id = %fired.id, token = fired.token, "Ignoring superseded wake-up");
            return;
        }

        match self.machine.on_trigger() {
            Ok(_) => {
                let preferences = self.preferences_or_default();
                self.notifier.activate(&preferences).await;
            }
            Err(e @ Error::InvalidTransition { .. }) => {
                debug!(error = %e, "Wake-up ignored");
            }
            Err(e) => error!(error = %e, "Failed to record fire"),
        }
    }

    async fn handle_alert_timeout(&mut self) {
        self.notifier.deactivate().await;
        match self.machine.acknowledge() {
            Ok(state) => debug!(phase = %state.phase(), "Alert timed out; acknowledged"),
            // A test alert, or the user got there first.
            Err(Error::InvalidTransition { .. }) => {}
            Err(e) => error!(error = %e, "Failed to acknowledge timed out alert"),
        }
    }

    async fn test_alert(&mut self) -> Result<()> {
        let phase = self.machine.state()?.phase();
        if phase == AlarmPhase::Ringing {
            return Err(Error::InvalidTransition {
                operation: "test alert",
                phase,
            });
        }

        info!("Showing test alert");
        let preferences = self.preferences_or_default();
        self.notifier.activate(&preferences).await;
        Ok(())
    }

    /// Heal a fire that never arrived.
    ///
    /// The grace window starts when this process first observes the fire
    /// overdue, on the monotonic clock. After a host suspend the wall clock
    /// jumps past the fire instant while the pending wake-up is still one
    /// slice away from delivering; it gets the full grace window to do so
    /// before a heal replaces it.
    fn check_overdue(&mut self) {
        let state = match self.machine.state() {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "Watchdog could not read reminder state");
                return;
            }
        };

        let now_ms = self.machine.clock().now_millis();
        if !state.is_stale(now_ms, 0) {
            self.overdue_since = None;
            trace!("Watchdog: on schedule");
            return;
        }

        let missed_ms = state.next_fire_epoch_millis;
        let since = match self.overdue_since {
            Some((ms, since)) if ms == missed_ms => since,
            _ => {
                let since = Instant::now();
                self.overdue_since = Some((missed_ms, since));
                since
            }
        };
        if since.elapsed() < self.stale_grace {
            debug!(
                next_fire_ms = missed_ms,
                overdue_ms = now_ms - missed_ms,
                "Reminder overdue; waiting for the pending wake-up"
            );
            return;
        }

        self.overdue_since = None;
        warn!(
            next_fire_ms = missed_ms,
            overdue_ms = now_ms - missed_ms,
            "Reminder overdue"
        );
        if let Err(e) = self.machine.reconcile() {
            error!(error = %e, "Watchdog failed to reschedule reminder");
        }
    }

    fn preferences_or_default(&self) -> Preferences {
        self.machine.preferences().unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default alert preferences");
            Preferences::default()
        })
    }
}

/// Cloneable access to a running [`ReminderService`].
///
/// Transitions go through the service task. Reads go straight to the
/// store, which is the source of truth, on the blocking pool.
#[derive(Clone)]
pub struct ReminderHandle {
    commands: mpsc::Sender<ReminderCommand>,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    state_rx: watch::Receiver<ScheduleState>,
}

impl ReminderHandle {
    pub async fn arm(&self, config: ReminderConfig) -> Result<ScheduleState> {
        self.request(|reply| ReminderCommand::Arm { config, reply })
            .await
    }

    pub async fn disarm(&self) -> Result<ScheduleState> {
        self.request(|reply| ReminderCommand::Disarm { reply }).await
    }

    pub async fn acknowledge(&self) -> Result<ScheduleState> {
        self.request(|reply| ReminderCommand::Acknowledge { reply })
            .await
    }

    pub async fn reconcile(&self) -> Result<Reconciliation> {
        self.request(|reply| ReminderCommand::Reconcile { reply })
            .await
    }

    pub async fn test_alert(&self) -> Result<()> {
        self.request(|reply| ReminderCommand::TestAlert { reply })
            .await
    }

    pub async fn set_preferences(&self, preferences: Preferences) -> Result<Preferences> {
        self.request(|reply| ReminderCommand::SetPreferences { preferences, reply })
            .await
    }

    pub async fn state(&self) -> Result<ScheduleState> {
        let store = Arc::clone(&self.store);
        read_blocking(move || store.load()).await
    }

    pub async fn preferences(&self) -> Result<Preferences> {
        let store = Arc::clone(&self.store);
        read_blocking(move || store.load_preferences()).await
    }

    /// Receives every committed record.
    pub fn subscribe(&self) -> watch::Receiver<ScheduleState> {
        self.state_rx.clone()
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<T>>) -> ReminderCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| Error::ServiceStopped)?;
        reply_rx.await.map_err(|_| Error::ServiceStopped)?
    }
}

async fn read_blocking<T, F>(read: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(read).await {
        Ok(result) => Ok(result?),
        Err(e) => Err(StoreError::Io(std::io::Error::other(e)).into()),
    }
}
