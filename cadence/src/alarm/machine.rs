//! The reminder's state machine over the persistent store.
//!
//! Every transition is one read-decide-write critical section on the store,
//! committed with compare-and-swap and retried a bounded number of times if
//! another writer got there first. Side effects on the timer happen only
//! after the new record is durable.

use std::sync::Arc;

use strum::{Display, EnumString};
use tokio::sync::watch;

use crate::clock::{Clock, to_epoch_millis};
use crate::error::{Error, Result};
use crate::permissions::{Permissions, require_all};
use crate::scheduler::{
    Wakeup, WakeupId, WakeupTimer, catch_up_fire, compute_first_fire, compute_next_fire,
};
use crate::store::{StateStore, StoreError};
use crate::tracing::prelude::*;
use crate::types::{AlarmPhase, Preferences, ReminderConfig, ScheduleState, interval_millis};

/// Compare-and-swap attempts before a transition gives up.
const MAX_ATTEMPTS: u32 = 3;

/// How a lost wake-up is rescheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum ResumePolicy {
    /// Next fire is one interval from now. Always makes forward progress;
    /// the phase relative to the anchor is lost.
    #[default]
    #[strum(serialize = "restart")]
    RestartFromNow,

    /// Next fire is the first instant after now on the original grid
    /// (`missed + k * interval`), keeping long-run periodicity.
    #[strum(serialize = "preserve-phase")]
    PreservePhase,
}

/// Outcome of reconciling the persisted record against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Idle,
    /// On schedule. The wake-up is registered at the persisted instant.
    Resumed { next_fire_ms: i64 },
    /// The expected fire was lost and a new instant was chosen.
    Healed { missed_ms: i64, next_fire_ms: i64 },
    /// A `ringing` flag without a running cycle was cleared.
    Repaired,
}

pub struct AlarmMachine {
    store: Arc<dyn StateStore>,
    timer: Arc<dyn WakeupTimer>,
    permissions: Arc<dyn Permissions>,
    clock: Arc<dyn Clock>,
    policy: ResumePolicy,
    wakeup_id: WakeupId,
    /// Token of the latest registration. Deliveries carrying any other
    /// token were superseded.
    token: u64,
    state_tx: watch::Sender<ScheduleState>,
}

impl AlarmMachine {
    pub fn new(
        store: Arc<dyn StateStore>,
        timer: Arc<dyn WakeupTimer>,
        permissions: Arc<dyn Permissions>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let state = store.load()?;
        let (state_tx, _) = watch::channel(state);
        Ok(Self {
            store,
            timer,
            permissions,
            clock,
            policy: ResumePolicy::default(),
            wakeup_id: WakeupId::reminder(),
            token: 0,
            state_tx,
        })
    }

    pub fn with_policy(mut self, policy: ResumePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn wakeup_id(&self) -> &WakeupId {
        &self.wakeup_id
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether a delivery with `token` belongs to the live registration.
    pub fn is_current(&self, token: u64) -> bool {
        self.token != 0 && token == self.token
    }

    /// Change notifications carrying each committed record.
    pub fn subscribe(&self) -> watch::Receiver<ScheduleState> {
        self.state_tx.subscribe()
    }

    /// Fresh snapshot from the store.
    pub fn state(&self) -> Result<ScheduleState> {
        let state = self.store.load()?;
        self.publish(state);
        Ok(state)
    }

    pub fn preferences(&self) -> Result<Preferences> {
        Ok(self.store.load_preferences()?)
    }

    pub fn set_preferences(&self, preferences: &Preferences) -> Result<()> {
        self.store.save_preferences(preferences)?;
        debug!(?preferences, "Preferences saved");
        Ok(())
    }

    /// Start counting toward the first fire. Only valid from `Idle`.
    pub fn arm(&mut self, config: &ReminderConfig) -> Result<ScheduleState> {
        config.validate()?;
        require_all(self.permissions.as_ref())?;

        let now = self.clock.now();
        let armed = ScheduleState::armed(
            config.interval_minutes,
            to_epoch_millis(compute_first_fire(config, now)),
        );
        let (_, state) = self.transition(|current| match current.phase() {
            AlarmPhase::Idle => Ok(Some(armed)),
            phase => Err(Error::InvalidTransition {
                operation: "arm",
                phase,
            }),
        })?;

        match self.register(state.next_fire_epoch_millis) {
            Ok(()) => {}
            Err(Error::Precondition(permission)) => {
                // Revoked between the check and the registration. Undo, so
                // no armed record is left without a wake-up behind it.
                self.transition(|current| {
                    Ok((*current == state).then(|| ScheduleState::idle(state.interval_minutes)))
                })?;
                self.timer.cancel(&self.wakeup_id);
                return Err(Error::Precondition(permission));
            }
            Err(e) => warn!(error = %e, "Wake-up registration failed; self-heal will retry"),
        }

        info!(
            phase = %state.phase(),
            next_fire_ms = state.next_fire_epoch_millis,
            interval_min = state.interval_minutes,
            anchor = ?config.anchor.map(|a| a.to_string()),
            "Reminder armed"
        );
        Ok(state)
    }

    /// Record a fire. Valid while `Armed`, or `Ringing` when a fire comes
    /// due before the previous one was acknowledged.
    ///
    /// A repeating reminder gets its next instant in the same write, and
    /// the wake-up is registered before any alert is shown, so a missing
    /// acknowledgment never stalls the cadence.
    pub fn on_trigger(&mut self) -> Result<ScheduleState> {
        let now = self.clock.now();
        let (_, state) = self.transition(|current| {
            if current.phase() == AlarmPhase::Idle {
                return Err(Error::InvalidTransition {
                    operation: "fire",
                    phase: AlarmPhase::Idle,
                });
            }
            let mut next = ScheduleState {
                ringing: true,
                ..*current
            };
            if current.is_repeating() {
                next.next_fire_epoch_millis =
                    to_epoch_millis(compute_next_fire(current.interval_minutes, now));
            }
            Ok(Some(next))
        })?;

        if state.is_repeating() {
            if let Err(e) = self.register(state.next_fire_epoch_millis) {
                warn!(error = %e, "Failed to register next wake-up; self-heal will retry");
            }
        }

        info!(
            phase = %state.phase(),
            next_fire_ms = state.next_fire_epoch_millis,
            interval_min = state.interval_minutes,
            "Reminder fired"
        );
        Ok(state)
    }

    /// End the ringing window, by the user or the alert timeout.
    pub fn acknowledge(&mut self) -> Result<ScheduleState> {
        let (_, state) = self.transition(|current| match current.phase() {
            AlarmPhase::Ringing if current.is_repeating() => Ok(Some(ScheduleState {
                ringing: false,
                ..*current
            })),
            AlarmPhase::Ringing => Ok(Some(ScheduleState::idle(current.interval_minutes))),
            phase => Err(Error::InvalidTransition {
                operation: "acknowledge",
                phase,
            }),
        })?;

        info!(
            phase = %state.phase(),
            next_fire_ms = state.next_fire_epoch_millis,
            interval_min = state.interval_minutes,
            "Reminder acknowledged"
        );
        Ok(state)
    }

    /// Stop the cycle. From `Idle` this only makes sure nothing is left
    /// registered.
    pub fn disarm(&mut self) -> Result<ScheduleState> {
        let (before, state) = self.transition(|current| {
            let idle = ScheduleState::idle(current.interval_minutes);
            Ok((*current != idle).then_some(idle))
        })?;

        self.timer.cancel(&self.wakeup_id);
        self.token = self.token.wrapping_add(1);

        if before.phase() == AlarmPhase::Idle {
            debug!("Disarm while idle");
        } else {
            info!(
                phase = %state.phase(),
                interval_min = state.interval_minutes,
                "Reminder disarmed"
            );
        }
        Ok(state)
    }

    /// Bring the persisted record and the timer back in line with the
    /// wall clock. Run on every resume and whenever the watchdog finds the
    /// schedule overdue.
    pub fn reconcile(&mut self) -> Result<Reconciliation> {
        let now_ms = self.clock.now_millis();
        let policy = self.policy;

        let (before, after) = self.transition(|current| {
            if current.ringing && !current.running {
                return Ok(Some(ScheduleState::idle(current.interval_minutes)));
            }
            if current.running && !current.ringing && current.next_fire_epoch_millis < now_ms {
                let interval = current.interval_minutes.max(1);
                let next_fire_ms = match policy {
                    ResumePolicy::PreservePhase if current.next_fire_epoch_millis > 0 => {
                        catch_up_fire(current.next_fire_epoch_millis, interval, now_ms)
                    }
                    _ => now_ms.saturating_add(interval_millis(interval)),
                };
                return Ok(Some(ScheduleState {
                    next_fire_epoch_millis: next_fire_ms,
                    ..*current
                }));
            }
            Ok(None)
        })?;

        if before.ringing && !before.running {
            warn!("Cleared a ringing flag left without a running cycle");
            self.timer.cancel(&self.wakeup_id);
            return Ok(Reconciliation::Repaired);
        }
        if !after.running {
            return Ok(Reconciliation::Idle);
        }

        let next_fire_ms = after.next_fire_epoch_millis;
        if before.next_fire_epoch_millis != next_fire_ms {
            if let Err(e) = self.register(next_fire_ms) {
                warn!(error = %e, "Failed to register healed wake-up");
            }
            warn!(
                phase = %after.phase(),
                missed_ms = before.next_fire_epoch_millis,
                next_fire_ms,
                interval_min = after.interval_minutes,
                policy = %policy,
                "Reminder missed a fire; rescheduled"
            );
            return Ok(Reconciliation::Healed {
                missed_ms: before.next_fire_epoch_millis,
                next_fire_ms,
            });
        }

        if !self.is_registered_at(next_fire_ms) {
            if let Err(e) = self.register(next_fire_ms) {
                warn!(error = %e, "Failed to restore wake-up");
            }
            debug!(next_fire_ms, "Wake-up restored");
        }
        Ok(Reconciliation::Resumed { next_fire_ms })
    }

    fn is_registered_at(&self, fire_at_ms: i64) -> bool {
        self.timer
            .pending(&self.wakeup_id)
            .is_some_and(|w| w.fire_at_ms == fire_at_ms && w.token == self.token)
    }

    fn register(&mut self, fire_at_ms: i64) -> Result<()> {
        self.token = self.token.wrapping_add(1).max(1);
        self.timer.register(Wakeup {
            id: self.wakeup_id.clone(),
            fire_at_ms,
            token: self.token,
        })?;
        Ok(())
    }

    /// One critical section: load, let `decide` pick the next record (or
    /// `None` to leave it), commit with compare-and-swap. Returns the record
    /// before and after.
    fn transition<F>(&self, mut decide: F) -> Result<(ScheduleState, ScheduleState)>
    where
        F: FnMut(&ScheduleState) -> Result<Option<ScheduleState>>,
    {
        for attempt in 1..=MAX_ATTEMPTS {
            let current = self.store.load()?;
            let Some(next) = decide(&current)? else {
                self.publish(current);
                return Ok((current, current));
            };
            if self.store.compare_and_swap(&current, &next).inspect_err(|e| {
                error!(error = %e, "Failed to persist reminder state");
            })? {
                self.publish(next);
                return Ok((current, next));
            }
            debug!(attempt, "Reminder state changed underneath; retrying");
        }
        Err(StoreError::Conflict {
            attempts: MAX_ATTEMPTS,
        }
        .into())
    }

    fn publish(&self, state: ScheduleState) {
        self.state_tx.send_if_modified(|cached| {
            let changed = *cached != state;
            *cached = state;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::datetime;

    use super::*;
    use crate::clock::ManualClock;
    use crate::permissions::Permission;
    use crate::scheduler::WakeupError;
    use crate::store::{MemoryStore, StoreResult};
    use crate::test_utils::{FakePermissions, RecordingTimer};
    use crate::types::AnchorTime;

    const FIFTEEN_MIN_MS: i64 = 900_000;

    struct Fixture {
        machine: AlarmMachine,
        store: Arc<MemoryStore>,
        timer: Arc<RecordingTimer>,
        permissions: Arc<FakePermissions>,
        clock: ManualClock,
    }

    fn fixture_with(state: ScheduleState) -> Fixture {
        let store = Arc::new(MemoryStore::with_state(state));
        let timer = RecordingTimer::new();
        let permissions = Arc::new(FakePermissions::granted());
        let clock = ManualClock::new(datetime!(2026-03-14 10:00 UTC));
        let machine = AlarmMachine::new(
            store.clone(),
            timer.clone(),
            permissions.clone(),
            Arc::new(clock.clone()),
        )
        .unwrap();
        Fixture {
            machine,
            store,
            timer,
            permissions,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(ScheduleState::idle(15))
    }

    #[test]
    fn should_walk_through_a_full_cycle() {
        let mut f = fixture();
        let t0 = f.clock.now_millis();

        let armed = f.machine.arm(&ReminderConfig::every(15)).unwrap();
        assert_eq!(armed.next_fire_epoch_millis, t0 + FIFTEEN_MIN_MS);
        assert_eq!(f.timer.current().unwrap().fire_at_ms, t0 + FIFTEEN_MIN_MS);

        f.clock.advance(Duration::from_secs(900));
        let ringing = f.machine.on_trigger().unwrap();
        assert!(ringing.ringing);
        assert_eq!(ringing.next_fire_epoch_millis, t0 + 2 * FIFTEEN_MIN_MS);
        assert_eq!(f.timer.current().unwrap().fire_at_ms, t0 + 2 * FIFTEEN_MIN_MS);

        let acked = f.machine.acknowledge().unwrap();
        assert!(!acked.ringing);
        assert!(acked.running);
        assert_eq!(acked.next_fire_epoch_millis, t0 + 2 * FIFTEEN_MIN_MS);

        let idle = f.machine.disarm().unwrap();
        assert!(!idle.running);
        assert!(!idle.ringing);
        assert!(f.timer.current().is_none());
        assert_eq!(f.store.load().unwrap(), idle);
    }

    #[test]
    fn should_align_first_fire_to_anchor() {
        let mut f = fixture();
        f.clock.set(datetime!(2026-03-14 07:59 UTC));
        let anchor = AnchorTime::new(8, 0).unwrap();

        let state = f
            .machine
            .arm(&ReminderConfig::every(10).starting_at(anchor))
            .unwrap();
        assert_eq!(
            state.next_fire_epoch_millis,
            to_epoch_millis(datetime!(2026-03-14 08:00 UTC))
        );
    }

    #[test]
    fn should_reject_arm_while_armed() {
        let mut f = fixture();
        f.machine.arm(&ReminderConfig::every(15)).unwrap();

        match f.machine.arm(&ReminderConfig::every(5)) {
            Err(Error::InvalidTransition {
                operation: "arm",
                phase: AlarmPhase::Armed,
            }) => {}
            other => panic!("expected invalid transition, got {other:?}"),
        }
        assert_eq!(f.timer.registrations().len(), 1);
    }

    #[test]
    fn should_reject_invalid_interval_without_writing() {
        let mut f = fixture();

        assert!(matches!(
            f.machine.arm(&ReminderConfig::every(0)),
            Err(Error::InvalidConfig(_))
        ));
        assert_eq!(f.store.writes(), 0);
        assert!(f.timer.registrations().is_empty());
    }

    #[test]
    fn should_refuse_arm_without_permission() {
        let mut f = fixture();
        f.permissions.revoke(Permission::ExactWakeup);

        assert!(matches!(
            f.machine.arm(&ReminderConfig::every(15)),
            Err(Error::Precondition(Permission::ExactWakeup))
        ));
        assert_eq!(f.store.writes(), 0);

        f.permissions.grant(Permission::ExactWakeup);
        assert!(f.machine.arm(&ReminderConfig::every(15)).is_ok());
    }

    #[test]
    fn should_roll_back_when_registration_is_refused() {
        let mut f = fixture();
        f.timer.fail_next(WakeupError::PermissionRevoked);

        assert!(matches!(
            f.machine.arm(&ReminderConfig::every(15)),
            Err(Error::Precondition(Permission::ExactWakeup))
        ));
        assert_eq!(f.store.load().unwrap().phase(), AlarmPhase::Idle);
        assert!(f.timer.current().is_none());
    }

    #[test]
    fn should_stay_armed_when_registration_fails_transiently() {
        let mut f = fixture();
        f.timer.fail_next(WakeupError::Rejected("busy".into()));

        let state = f.machine.arm(&ReminderConfig::every(15)).unwrap();
        assert_eq!(state.phase(), AlarmPhase::Armed);
        assert!(f.timer.current().is_none());

        // The watchdog finds it overdue later and heals.
        f.clock.advance(Duration::from_secs(901));
        assert!(matches!(
            f.machine.reconcile().unwrap(),
            Reconciliation::Healed { .. }
        ));
        assert!(f.timer.current().is_some());
    }

    #[test]
    fn should_reject_fire_and_acknowledge_while_idle() {
        let mut f = fixture();

        assert!(matches!(
            f.machine.on_trigger(),
            Err(Error::InvalidTransition { .. })
        ));
        assert!(matches!(
            f.machine.acknowledge(),
            Err(Error::InvalidTransition {
                operation: "acknowledge",
                phase: AlarmPhase::Idle
            })
        ));
    }

    #[test]
    fn should_keep_cadence_when_fire_arrives_while_ringing() {
        let mut f = fixture();
        f.machine.arm(&ReminderConfig::every(1)).unwrap();
        f.clock.advance(Duration::from_secs(60));
        f.machine.on_trigger().unwrap();
        f.clock.advance(Duration::from_secs(60));

        let state = f.machine.on_trigger().unwrap();
        assert!(state.ringing);
        assert_eq!(state.next_fire_epoch_millis, f.clock.now_millis() + 60_000);
    }

    #[test]
    fn should_treat_disarm_while_idle_as_noop() {
        let mut f = fixture();

        let state = f.machine.disarm().unwrap();
        assert_eq!(state, ScheduleState::idle(15));
        assert_eq!(f.store.writes(), 0);
        assert_eq!(f.timer.cancels(), 1);
    }

    #[test]
    fn should_disarm_from_ringing() {
        let mut f = fixture();
        f.machine.arm(&ReminderConfig::every(15)).unwrap();
        f.clock.advance(Duration::from_secs(900));
        f.machine.on_trigger().unwrap();

        let state = f.machine.disarm().unwrap();
        assert_eq!(state.phase(), AlarmPhase::Idle);
        assert!(f.timer.current().is_none());
    }

    #[test]
    fn should_drop_deliveries_from_replaced_registrations() {
        let mut f = fixture();
        f.machine.arm(&ReminderConfig::every(15)).unwrap();
        let first = f.timer.current().unwrap().token;
        assert!(f.machine.is_current(first));

        f.clock.advance(Duration::from_secs(900));
        f.machine.on_trigger().unwrap();
        assert!(!f.machine.is_current(first));

        let second = f.timer.current().unwrap().token;
        f.machine.disarm().unwrap();
        assert!(!f.machine.is_current(second));
    }

    #[test]
    fn should_heal_stale_state_from_now() {
        let mut f = fixture();
        let now = f.clock.now_millis();
        f.store
            .save(&ScheduleState::armed(15, now - 1))
            .unwrap();

        let outcome = f.machine.reconcile().unwrap();
        assert_eq!(
            outcome,
            Reconciliation::Healed {
                missed_ms: now - 1,
                next_fire_ms: now + FIFTEEN_MIN_MS,
            }
        );

        let state = f.store.load().unwrap();
        assert!(state.running);
        assert!(state.next_fire_epoch_millis > now);
        assert_eq!(f.timer.current().unwrap().fire_at_ms, now + FIFTEEN_MIN_MS);
    }

    #[test]
    fn should_heal_stale_state_on_original_grid() {
        let mut f = fixture();
        f.machine = AlarmMachine::new(
            f.store.clone(),
            f.timer.clone(),
            f.permissions.clone(),
            Arc::new(f.clock.clone()),
        )
        .unwrap()
        .with_policy(ResumePolicy::PreservePhase);

        let now = f.clock.now_millis();
        let missed = now - 2 * FIFTEEN_MIN_MS - 1_000;
        f.store.save(&ScheduleState::armed(15, missed)).unwrap();

        let outcome = f.machine.reconcile().unwrap();
        assert_eq!(
            outcome,
            Reconciliation::Healed {
                missed_ms: missed,
                next_fire_ms: missed + 3 * FIFTEEN_MIN_MS,
            }
        );
    }

    #[test]
    fn should_restore_registration_when_on_schedule() {
        let mut f = fixture();
        let next = f.clock.now_millis() + 60_000;
        f.store.save(&ScheduleState::armed(15, next)).unwrap();

        assert_eq!(
            f.machine.reconcile().unwrap(),
            Reconciliation::Resumed { next_fire_ms: next }
        );
        assert_eq!(f.timer.registrations().len(), 1);

        // Already registered: nothing to do the second time.
        f.machine.reconcile().unwrap();
        assert_eq!(f.timer.registrations().len(), 1);
    }

    #[test]
    fn should_repair_ringing_without_running() {
        let mut f = fixture_with(ScheduleState {
            ringing: true,
            ..ScheduleState::idle(15)
        });

        assert_eq!(f.machine.reconcile().unwrap(), Reconciliation::Repaired);
        assert_eq!(f.store.load().unwrap(), ScheduleState::idle(15));
    }

    #[test]
    fn should_leave_idle_alone() {
        let mut f = fixture();
        assert_eq!(f.machine.reconcile().unwrap(), Reconciliation::Idle);
        assert_eq!(f.store.writes(), 0);
    }

    #[test]
    fn should_publish_committed_states() {
        let mut f = fixture();
        let mut rx = f.machine.subscribe();

        f.machine.arm(&ReminderConfig::every(15)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase(), AlarmPhase::Armed);

        f.machine.state().unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn should_keep_ringing_implies_running_across_sequences() {
        let mut f = fixture();
        let ops: [fn(&mut AlarmMachine) -> Result<ScheduleState>; 4] = [
            |m| m.arm(&ReminderConfig::every(1)),
            AlarmMachine::on_trigger,
            AlarmMachine::acknowledge,
            AlarmMachine::disarm,
        ];

        // Every sequence of length four over the operations.
        for seq in 0..ops.len().pow(4) {
            let mut i = seq;
            for _ in 0..4 {
                let _ = ops[i % ops.len()](&mut f.machine);
                i /= ops.len();
                f.clock.advance(Duration::from_secs(60));

                let state = f.store.load().unwrap();
                assert!(state.is_consistent(), "broken record {state:?}");
            }
            f.machine.disarm().unwrap();
        }
    }

    /// Store where every compare-and-swap loses.
    struct ContendedStore(MemoryStore);

    impl StateStore for ContendedStore {
        fn load(&self) -> StoreResult<ScheduleState> {
            self.0.load()
        }
        fn save(&self, state: &ScheduleState) -> StoreResult<()> {
            self.0.save(state)
        }
        fn compare_and_swap(&self, _: &ScheduleState, _: &ScheduleState) -> StoreResult<bool> {
            Ok(false)
        }
        fn load_preferences(&self) -> StoreResult<Preferences> {
            self.0.load_preferences()
        }
        fn save_preferences(&self, preferences: &Preferences) -> StoreResult<()> {
            self.0.save_preferences(preferences)
        }
    }

    #[test]
    fn should_give_up_after_repeated_conflicts() {
        let timer = RecordingTimer::new();
        let mut machine = AlarmMachine::new(
            Arc::new(ContendedStore(MemoryStore::new())),
            timer.clone(),
            Arc::new(FakePermissions::granted()),
            Arc::new(ManualClock::new(datetime!(2026-03-14 10:00 UTC))),
        )
        .unwrap();

        assert!(matches!(
            machine.arm(&ReminderConfig::every(15)),
            Err(Error::Store(StoreError::Conflict { attempts: 3 }))
        ));
        assert!(timer.registrations().is_empty());
    }

    #[test]
    fn resume_policy_parses_from_config_names() {
        assert_eq!(
            "restart".parse::<ResumePolicy>().unwrap(),
            ResumePolicy::RestartFromNow
        );
        assert_eq!(
            "preserve-phase".parse::<ResumePolicy>().unwrap(),
            ResumePolicy::PreservePhase
        );
        assert!("sometimes".parse::<ResumePolicy>().is_err());
    }
}
