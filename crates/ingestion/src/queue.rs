//! Bounded capture queue
//!
//! Runs a `FrameSource` on its own task and hands frames to the driver
//! through a bounded `async-channel`. When the driver falls behind, the
//! configured `DropPolicy` decides which frame is lost.

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::{ContractError, DropPolicy, Frame, FrameSource};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::{BackpressureConfig, IngestionMetrics};

/// Message carried by the queue; an error ends the stream
type Item = Result<Frame, ContractError>;

/// Capture queue constructor
pub struct CaptureQueue;

impl CaptureQueue {
    /// Spawn the producer task and return the consumer side
    pub fn spawn<S>(source: S, config: BackpressureConfig) -> QueuedSource
    where
        S: FrameSource + Send + 'static,
    {
        let (tx, rx) = bounded(config.channel_capacity.max(1));
        let metrics = Arc::new(IngestionMetrics::new());
        let name = format!("queued:{}", source.name());

        let handle = tokio::spawn(produce(
            source,
            tx,
            rx.clone(),
            metrics.clone(),
            config.drop_policy,
        ));

        QueuedSource {
            name,
            rx,
            metrics,
            handle: Some(handle),
        }
    }
}

async fn produce<S: FrameSource>(
    mut source: S,
    tx: Sender<Item>,
    spill: Receiver<Item>,
    metrics: Arc<IngestionMetrics>,
    drop_policy: DropPolicy,
) {
    let source_name = source.name().to_string();
    debug!(source = %source_name, "capture producer started");

    loop {
        match source.next_frame().await {
            Ok(Some(frame)) => {
                metrics.record_received();
                if !send_frame(&tx, &spill, frame, &metrics, &source_name, drop_policy) {
                    break;
                }
                metrics.update_queue_len(tx.len());
            }
            Ok(None) => {
                debug!(source = %source_name, "capture source exhausted");
                break;
            }
            Err(err) => {
                metrics.record_capture_error();
                warn!(source = %source_name, error = %err, "capture failed");
                // Errors are never dropped; wait for room
                let _ = tx.send(Err(err)).await;
                break;
            }
        }
    }
    // Dropping tx lets the consumer drain and then observe end of stream
}

/// Send frame, handling backpressure policy. Returns false once the consumer is gone.
#[inline]
fn send_frame(
    tx: &Sender<Item>,
    spill: &Receiver<Item>,
    frame: Frame,
    metrics: &IngestionMetrics,
    source_name: &str,
    drop_policy: DropPolicy,
) -> bool {
    match tx.try_send(Ok(frame)) {
        Ok(()) => {
            trace!(source = %source_name, "frame queued");
            true
        }
        Err(TrySendError::Full(item)) => {
            metrics.record_dropped();
            match drop_policy {
                DropPolicy::DropNewest => {
                    trace!(source = %source_name, "frame dropped (newest)");
                    true
                }
                DropPolicy::DropOldest => {
                    if let Ok(Ok(old)) = spill.try_recv() {
                        trace!(source = %source_name, frame_id = old.frame_id, "frame dropped (oldest)");
                    }
                    match tx.try_send(item) {
                        Ok(()) => true,
                        Err(TrySendError::Full(_)) => true,
                        Err(TrySendError::Closed(_)) => false,
                    }
                }
            }
        }
        Err(TrySendError::Closed(_)) => {
            warn!(source = %source_name, "capture queue closed");
            false
        }
    }
}

/// Consumer side of a capture queue
pub struct QueuedSource {
    name: String,
    rx: Receiver<Item>,
    metrics: Arc<IngestionMetrics>,
    handle: Option<JoinHandle<()>>,
}

impl QueuedSource {
    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

impl FrameSource for QueuedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        match self.rx.recv().await {
            Ok(item) => {
                self.metrics.update_queue_len(self.rx.len());
                item.map(Some)
            }
            Err(_) => {
                if let Some(handle) = self.handle.take() {
                    if let Err(err) = handle.await {
                        warn!(source = %self.name, error = %err, "capture producer task failed");
                    }
                }
                Ok(None)
            }
        }
    }
}

impl Drop for QueuedSource {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockFrameSource, MockSourceConfig};

    fn mock(frames: u64) -> MockFrameSource {
        MockFrameSource::new(MockSourceConfig {
            width: 4,
            height: 4,
            fps: 10,
            frame_count: Some(frames),
            pace: false,
        })
    }

    #[tokio::test]
    async fn test_queue_delivers_all_frames_in_order() {
        let mut queued = CaptureQueue::spawn(mock(20), BackpressureConfig::new(64, DropPolicy::DropNewest));

        let mut ids = Vec::new();
        while let Some(frame) = queued.next_frame().await.unwrap() {
            ids.push(frame.frame_id);
        }
        assert_eq!(ids, (0..20).collect::<Vec<_>>());
        assert_eq!(queued.metrics().snapshot().frames_dropped, 0);
    }

    #[test]
    fn test_drop_oldest_keeps_latest() {
        let (tx, rx) = bounded::<Item>(2);
        let metrics = IngestionMetrics::new();
        for id in 0..4 {
            let frame = Frame::filled(id, id as f64, 1, 1, [0, 0, 0]);
            assert!(send_frame(&tx, &rx, frame, &metrics, "test", DropPolicy::DropOldest));
        }
        let ids: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|item| item.unwrap().frame_id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(metrics.snapshot().frames_dropped, 2);
    }

    #[test]
    fn test_drop_newest_keeps_earliest() {
        let (tx, rx) = bounded::<Item>(2);
        let metrics = IngestionMetrics::new();
        for id in 0..4 {
            let frame = Frame::filled(id, id as f64, 1, 1, [0, 0, 0]);
            send_frame(&tx, &rx, frame, &metrics, "test", DropPolicy::DropNewest);
        }
        let ids: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|item| item.unwrap().frame_id)
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_closed_queue_stops_producer() {
        let (tx, rx) = bounded::<Item>(1);
        rx.close();
        let metrics = IngestionMetrics::new();
        let frame = Frame::filled(0, 0.0, 1, 1, [0, 0, 0]);
        assert!(!send_frame(&tx, &rx, frame, &metrics, "test", DropPolicy::DropOldest));
    }
}
