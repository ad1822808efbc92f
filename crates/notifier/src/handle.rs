//! NotifierHandle - runs a notification channel behind an isolated queue and worker task

use std::sync::Arc;
use std::time::Duration;

use contracts::{Alert, AlertPublisher, NotificationChannel};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::NotifierMetrics;

/// Cloneable, non-blocking entry point into the notifier queue
#[derive(Clone)]
pub struct AlertSender {
    channel: Arc<str>,
    tx: mpsc::Sender<Alert>,
    metrics: Arc<NotifierMetrics>,
}

impl AlertPublisher for AlertSender {
    /// Returns true if queued, false if the queue is full or closed (alert dropped)
    fn publish(&self, alert: Alert) -> bool {
        match self.tx.try_send(alert) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(a)) => {
                self.metrics.inc_dropped_count();
                metrics::counter!(
                    "incident_recorder_alerts_total",
                    "channel" => self.channel.to_string(),
                    "status" => "dropped"
                )
                .increment(1);
                warn!(channel = %self.channel, kind = a.kind(), "Notifier queue full, alert dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(a)) => {
                self.metrics.inc_dropped_count();
                error!(channel = %self.channel, kind = a.kind(), "Notifier worker closed unexpectedly");
                false
            }
        }
    }
}

/// Handle to a running notifier worker
pub struct NotifierHandle {
    sender: AlertSender,
    worker_handle: JoinHandle<()>,
}

impl NotifierHandle {
    /// Spawn the worker task that owns `channel`
    pub fn spawn<C: NotificationChannel + Send + 'static>(channel: C, queue_capacity: usize) -> Self {
        let name: Arc<str> = Arc::from(channel.name());
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(NotifierMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.to_string();
        let worker_handle = tokio::spawn(async move {
            notifier_worker(channel, rx, worker_metrics, worker_name).await;
        });

        Self {
            sender: AlertSender {
                channel: name,
                tx,
                metrics,
            },
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.sender.channel
    }

    pub fn metrics(&self) -> &Arc<NotifierMetrics> {
        &self.sender.metrics
    }

    /// Publisher handed to the frame loop
    pub fn publisher(&self) -> AlertSender {
        self.sender.clone()
    }

    /// Drain queued alerts and close the channel
    ///
    /// The worker stops once every `AlertSender` clone is dropped. If it is
    /// still busy after `grace`, it is aborted.
    #[instrument(name = "notifier_handle_shutdown", skip(self), fields(channel = %self.sender.channel))]
    pub async fn shutdown(self, grace: Duration) {
        let Self {
            sender,
            mut worker_handle,
        } = self;
        let channel = sender.channel.clone();
        drop(sender);

        match tokio::time::timeout(grace, &mut worker_handle).await {
            Ok(Ok(())) => debug!(channel = %channel, "NotifierHandle shutdown complete"),
            Ok(Err(e)) => error!(channel = %channel, error = ?e, "Notifier worker panicked"),
            Err(_) => {
                warn!(channel = %channel, grace_ms = grace.as_millis() as u64, "Notifier worker still busy, aborting");
                worker_handle.abort();
            }
        }
    }
}

impl AlertPublisher for NotifierHandle {
    fn publish(&self, alert: Alert) -> bool {
        self.sender.publish(alert)
    }
}

/// Worker task that consumes alerts and hands them to the channel
#[instrument(
    name = "notifier_worker_loop",
    skip(channel, rx, metrics),
    fields(channel = %name)
)]
async fn notifier_worker<C: NotificationChannel>(
    mut channel: C,
    mut rx: mpsc::Receiver<Alert>,
    metrics: Arc<NotifierMetrics>,
    name: String,
) {
    debug!(channel = %name, "Notifier worker started");

    while let Some(alert) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let result = match &alert {
            Alert::Text(text) => channel.send_text(text).await,
            Alert::Artifact { path, caption } => {
                channel.send_artifact(path, caption.as_deref()).await
            }
            Alert::RefreshSubscribers => channel.refresh_subscribers().await,
        };

        match result {
            Ok(report) => {
                metrics.inc_sent_count();
                metrics.add_report(report.delivered, report.failed);
                metrics::counter!(
                    "incident_recorder_alerts_total",
                    "channel" => name.clone(),
                    "status" => "delivered"
                )
                .increment(report.delivered as u64);
                if report.failed > 0 {
                    metrics::counter!(
                        "incident_recorder_alerts_total",
                        "channel" => name.clone(),
                        "status" => "failed"
                    )
                    .increment(report.failed as u64);
                    warn!(
                        channel = %name,
                        kind = alert.kind(),
                        delivered = report.delivered,
                        failed = report.failed,
                        "Alert partially delivered"
                    );
                }
            }
            Err(e) => {
                metrics.inc_failure_count();
                metrics::counter!(
                    "incident_recorder_alerts_total",
                    "channel" => name.clone(),
                    "status" => "error"
                )
                .increment(1);
                // Keep going; one failed delivery must not stop the worker
                error!(channel = %name, kind = alert.kind(), error = %e, "Alert delivery failed");
            }
        }
    }

    if let Err(e) = channel.close().await {
        error!(channel = %name, error = %e, "Close failed on shutdown");
    }

    debug!(channel = %name, "Notifier worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, DeliveryReport};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tokio::time::sleep;

    #[derive(Default)]
    struct Seen {
        texts: Vec<String>,
        artifacts: Vec<PathBuf>,
        refreshes: usize,
        closed: bool,
    }

    /// Mock channel for testing
    struct MockChannel {
        seen: Arc<Mutex<Seen>>,
        fail_texts: bool,
        delay_ms: u64,
    }

    impl MockChannel {
        fn new(seen: Arc<Mutex<Seen>>) -> Self {
            Self {
                seen,
                fail_texts: false,
                delay_ms: 0,
            }
        }
    }

    impl NotificationChannel for MockChannel {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send_text(&mut self, text: &str) -> Result<DeliveryReport, ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_texts {
                return Err(ContractError::notify("mock", "mock failure"));
            }
            self.seen.lock().unwrap().texts.push(text.to_string());
            Ok(DeliveryReport {
                delivered: 2,
                failed: 0,
            })
        }

        async fn send_artifact(
            &mut self,
            path: &Path,
            _caption: Option<&str>,
        ) -> Result<DeliveryReport, ContractError> {
            self.seen.lock().unwrap().artifacts.push(path.to_path_buf());
            Ok(DeliveryReport {
                delivered: 1,
                failed: 1,
            })
        }

        async fn refresh_subscribers(&mut self) -> Result<DeliveryReport, ContractError> {
            self.seen.lock().unwrap().refreshes += 1;
            Ok(DeliveryReport::default())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            self.seen.lock().unwrap().closed = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_alerts_delivered_in_order_then_closed() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let handle = NotifierHandle::spawn(MockChannel::new(seen.clone()), 8);
        let publisher = handle.publisher();

        assert!(publisher.publish(Alert::text("one")));
        assert!(publisher.publish(Alert::RefreshSubscribers));
        assert!(publisher.publish(Alert::Artifact {
            path: PathBuf::from("a.mp4"),
            caption: None,
        }));
        assert!(handle.publish(Alert::text("two")));
        drop(publisher);

        let metrics = Arc::clone(handle.metrics());
        handle.shutdown(Duration::from_secs(5)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.texts, vec!["one", "two"]);
        assert_eq!(seen.artifacts, vec![PathBuf::from("a.mp4")]);
        assert_eq!(seen.refreshes, 1);
        assert!(seen.closed);

        let snap = metrics.snapshot();
        assert_eq!(snap.sent_count, 4);
        assert_eq!(snap.delivered_count, 5);
        assert_eq!(snap.recipient_failures, 1);
    }

    #[tokio::test]
    async fn test_queue_full_drops_without_blocking() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let channel = MockChannel {
            delay_ms: 100,
            ..MockChannel::new(seen)
        };
        let handle = NotifierHandle::spawn(channel, 2);

        for i in 0..10 {
            handle.publish(Alert::text(format!("alert {i}")));
        }

        assert!(handle.metrics().dropped_count() > 0);
        handle.shutdown(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_delivery_failure_isolated() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let channel = MockChannel {
            fail_texts: true,
            ..MockChannel::new(seen.clone())
        };
        let handle = NotifierHandle::spawn(channel, 8);

        handle.publish(Alert::text("lost"));
        handle.publish(Alert::RefreshSubscribers);
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown(Duration::from_secs(5)).await;

        assert_eq!(metrics.failure_count(), 1);
        assert_eq!(metrics.sent_count(), 1);
        assert_eq!(seen.lock().unwrap().refreshes, 1);
    }
}
