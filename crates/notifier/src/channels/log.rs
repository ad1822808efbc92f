//! Log channel - alerts go to the tracing output only

use std::path::Path;

use contracts::{ContractError, DeliveryReport, NotificationChannel};
use tracing::info;

/// Channel for runs without a messaging backend
#[derive(Debug, Default)]
pub struct LogChannel {
    sent: u64,
}

impl LogChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts logged so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    fn delivered(&mut self) -> DeliveryReport {
        self.sent += 1;
        DeliveryReport {
            delivered: 1,
            failed: 0,
        }
    }
}

impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_text(&mut self, text: &str) -> Result<DeliveryReport, ContractError> {
        info!(channel = "log", "{text}");
        Ok(self.delivered())
    }

    async fn send_artifact(
        &mut self,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<DeliveryReport, ContractError> {
        info!(
            channel = "log",
            path = %path.display(),
            caption = caption.unwrap_or_default(),
            "Recording available"
        );
        Ok(self.delivered())
    }

    async fn refresh_subscribers(&mut self) -> Result<DeliveryReport, ContractError> {
        Ok(DeliveryReport::default())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
