//! Alert sink that delegates to a user-supplied shell command.
//!
//! The command sees the alert through its environment:
//!
//! | Variable          | Value                                          |
//! |-------------------|------------------------------------------------|
//! | `CADENCE_TITLE`   | alert title                                    |
//! | `CADENCE_MESSAGE` | alert message                                  |
//! | `CADENCE_SOUND`   | `default`, a URI, or empty when silent         |
//! | `CADENCE_VIBRATE` | pattern as `off,on,off,...` ms, or empty       |
//!
//! A command still running when the alert stops is killed.

use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::{Alert, AlertSink};
use crate::tracing::prelude::*;
use crate::types::SoundSelection;

pub struct CommandAlertSink {
    command: String,
    child: Mutex<Option<Child>>,
}

impl CommandAlertSink {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            child: Mutex::new(None),
        }
    }
}

#[async_trait]
impl AlertSink for CommandAlertSink {
    fn can_post_alerts(&self) -> bool {
        !self.command.trim().is_empty()
    }

    async fn start(&self, alert: &Alert) -> anyhow::Result<()> {
        let sound = match &alert.sound {
            SoundSelection::Default => "default".to_string(),
            SoundSelection::Silent => String::new(),
            SoundSelection::Uri(uri) => uri.clone(),
        };
        let vibrate = alert
            .vibration
            .map(|pattern| pattern.to_string())
            .unwrap_or_default();

        let child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .env("CADENCE_TITLE", alert.title)
            .env("CADENCE_MESSAGE", alert.message)
            .env("CADENCE_SOUND", sound)
            .env("CADENCE_VIBRATE", vibrate)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn alert command {:?}", self.command))?;

        debug!(pid = child.id(), "Alert command started");

        if let Some(mut previous) = self.child.lock().await.replace(child) {
            let _ = previous.start_kill();
        }
        Ok(())
    }

    async fn stop(&self) {
        let Some(mut child) = self.child.lock().await.take() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => trace!(%status, "Alert command already finished"),
            _ => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to stop alert command");
                }
            }
        }
    }
}
