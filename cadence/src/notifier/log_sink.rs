use async_trait::async_trait;

use super::{Alert, AlertSink};
use crate::tracing::prelude::*;
use crate::types::SoundSelection;

/// Renders alerts as log events. Used when no platform command is set.
#[derive(Debug, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn start(&self, alert: &Alert) -> anyhow::Result<()> {
        let sound = match &alert.sound {
            SoundSelection::Default => "default",
            SoundSelection::Silent => "silent",
            SoundSelection::Uri(uri) => uri.as_str(),
        };
        let vibration = alert
            .vibration
            .map(|pattern| pattern.to_string())
            .unwrap_or_else(|| "off".into());

        info!(sound, vibration = %vibration, "{}: {}", alert.title, alert.message);
        Ok(())
    }

    async fn stop(&self) {
        debug!("Alert cleared");
    }
}
