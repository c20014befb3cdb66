//! Reminder daemon.
//!
//! Hosts the reminder state machine, the wake-up timer, the alert notifier
//! and the local HTTP API. Configuration comes from `CADENCE_*` environment
//! variables; see [`cadence::config`].

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use cadence::alarm::{AlarmMachine, ReminderService};
use cadence::api::{self, SharedState};
use cadence::clock::{Clock, SystemClock};
use cadence::config::DaemonConfig;
use cadence::notifier::{AlertSink, CommandAlertSink, LogAlertSink, Notifier};
use cadence::permissions::PlatformPermissions;
use cadence::scheduler::{TokioWakeupTimer, WakeupTimer};
use cadence::store::{FileStore, StateStore};
use cadence::tracing::prelude::*;

fn main() -> Result<()> {
    // The local UTC offset can only be read while the process is still
    // single-threaded.
    let clock = SystemClock::new();

    cadence::tracing::init_journald_or_stdout();
    let config = DaemonConfig::from_env()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?
        .block_on(run(config, clock))
}

async fn run(config: DaemonConfig, clock: SystemClock) -> Result<()> {
    info!(
        state_file = %config.state_file().display(),
        api_addr = %config.api_addr,
        utc_offset = %clock.offset(),
        resume_policy = %config.resume_policy,
        "Starting cadenced"
    );

    let clock: Arc<dyn Clock> = Arc::new(clock);
    let store: Arc<dyn StateStore> = Arc::new(FileStore::in_dir(&config.state_dir));

    let (timer, wakeups) = TokioWakeupTimer::new(Arc::clone(&clock));
    let timer: Arc<dyn WakeupTimer> = Arc::new(timer);

    let sink: Arc<dyn AlertSink> = match &config.alert_command {
        Some(command) => Arc::new(CommandAlertSink::new(command.clone())),
        None => Arc::new(LogAlertSink),
    };
    let permissions = Arc::new(PlatformPermissions::new(
        Arc::clone(&timer),
        Arc::clone(&sink),
    ));

    let machine = AlarmMachine::new(store, timer, permissions, clock)
        .context("failed to load reminder state")?
        .with_policy(config.resume_policy);
    let notifier = Notifier::new(sink, config.alert_timeout);

    let (service, handle) = ReminderService::new(machine, notifier, wakeups);
    let mut service = service.with_watchdog(config.watchdog_period, config.stale_grace);
    service
        .resume()
        .await
        .context("failed to resume reminder")?;

    let running = CancellationToken::new();
    let service_task = tokio::spawn(service.run(running.clone()));
    let mut api_task = tokio::spawn(api::serve(
        config.api_addr,
        SharedState { reminder: handle },
        running.clone(),
    ));

    let result = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutting down");
            Ok(())
        }
        result = &mut api_task => {
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(e).context("API task panicked"),
            }
        }
    };

    running.cancel();
    let _ = service_task.await;
    if !api_task.is_finished() {
        let _ = api_task.await;
    }

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
