//! Notification collaborator interfaces

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Message handed to the notification collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "payload")]
pub enum Alert {
    /// Plain text broadcast
    Text(String),
    /// Finished recording
    Artifact {
        path: PathBuf,
        caption: Option<String>,
    },
    /// Poll for new subscribers
    RefreshSubscribers,
}

impl Alert {
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Alert::Text(_) => "text",
            Alert::Artifact { .. } => "artifact",
            Alert::RefreshSubscribers => "refresh",
        }
    }
}

/// Non-blocking alert entry point used by the frame loop
///
/// Returns `false` when the alert was dropped (queue full or closed).
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: Alert) -> bool;
}

/// Per-call delivery outcome across all recipients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Notification channel
///
/// Runs on the notifier worker, never on the frame loop.
#[trait_variant::make(NotificationChannel: Send)]
pub trait LocalNotificationChannel {
    /// Channel name (used for logging/metrics)
    fn name(&self) -> &str;

    async fn send_text(&mut self, text: &str) -> Result<DeliveryReport, ContractError>;

    async fn send_artifact(
        &mut self,
        path: &std::path::Path,
        caption: Option<&str>,
    ) -> Result<DeliveryReport, ContractError>;

    /// Pick up new subscribers; the report counts welcome messages sent
    async fn refresh_subscribers(&mut self) -> Result<DeliveryReport, ContractError>;

    async fn close(&mut self) -> Result<(), ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_serializes_with_kind_tag() {
        let alert = Alert::Artifact {
            path: PathBuf::from("recordings/incident.mp4"),
            caption: None,
        };
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["kind"], "artifact");
        assert_eq!(alert.kind(), "artifact");
    }

    #[test]
    fn test_report_merge() {
        let mut total = DeliveryReport::default();
        total.merge(DeliveryReport { delivered: 2, failed: 1 });
        total.merge(DeliveryReport { delivered: 1, failed: 0 });
        assert_eq!(total, DeliveryReport { delivered: 3, failed: 1 });
    }
}
