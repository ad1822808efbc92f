//! Frame pipeline driver - one task owns capture, detection, state and recording.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use contracts::{
    Alert, AlertPublisher, Detector, Frame, FrameRenderer, FrameSource, IncidentAction,
    RecorderBlueprint, SinkFactory,
};
use incident_engine::{reduce, FrameRingBuffer, IncidentStateMachine};
use ingestion::normalize;
use recorder::{annotate, RecordingSessionManager, SessionMessages};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{PeriodicTask, PipelineError, PipelineStats, StopReason};

/// Run limits
#[derive(Debug, Clone, Default)]
pub struct PipelineLimits {
    /// Maximum number of frames to process (None = unlimited)
    pub max_frames: Option<u64>,

    /// Wall-clock budget (None = no timeout)
    pub timeout: Option<Duration>,
}

enum Pulled {
    Frame(Frame),
    EndOfStream,
    Stopped,
}

/// Per-frame driver
///
/// Each cycle: periodic refresh check, stop check, capture, normalize, ring
/// buffer push, detection, signal reduction, state machine update, session
/// start/stop, live append, overlay render.
pub struct FramePipeline<S, F>
where
    S: FrameSource,
    F: SinkFactory,
{
    source: S,
    detector: Box<dyn Detector>,
    renderer: Box<dyn FrameRenderer>,
    ring: FrameRingBuffer,
    machine: IncidentStateMachine,
    sessions: RecordingSessionManager<F>,
    publisher: Arc<dyn AlertPublisher>,
    refresh: PeriodicTask,
    start_message: Option<String>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
    tolerate_errors: bool,
    limits: PipelineLimits,
    stop: watch::Receiver<bool>,
    stats: PipelineStats,
    last_timestamp: f64,
}

impl<S, F> FramePipeline<S, F>
where
    S: FrameSource,
    F: SinkFactory,
{
    pub fn new(
        blueprint: &RecorderBlueprint,
        source: S,
        detector: Box<dyn Detector>,
        renderer: Box<dyn FrameRenderer>,
        factory: F,
        publisher: Arc<dyn AlertPublisher>,
    ) -> Self {
        let sessions = RecordingSessionManager::new(
            factory,
            &blueprint.recording,
            blueprint.stream_spec(),
            Arc::clone(&publisher),
        )
        .with_messages(SessionMessages {
            subject: capitalize(&blueprint.detection.label),
            caption: Some(blueprint.notifier.telegram.caption.clone()),
        });

        // Never raised unless a real signal is attached
        let (_, stop) = watch::channel(false);

        Self {
            source,
            detector,
            renderer,
            ring: FrameRingBuffer::new(blueprint.buffer_capacity()),
            machine: IncidentStateMachine::new(&blueprint.incident),
            sessions,
            publisher,
            refresh: PeriodicTask::new(
                Duration::from_secs(blueprint.notifier.refresh_interval_secs),
                Instant::now(),
            ),
            start_message: blueprint.notifier.start_message.clone(),
            width: blueprint.frame.width,
            height: blueprint.frame.height,
            confidence_threshold: blueprint.detection.confidence_threshold,
            tolerate_errors: blueprint.detection.tolerate_errors,
            limits: PipelineLimits::default(),
            stop,
            stats: PipelineStats::default(),
            last_timestamp: 0.0,
        }
    }

    pub fn with_limits(mut self, limits: PipelineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Stop once `stop` turns true; checked once per cycle and while waiting for a frame
    pub fn with_stop_signal(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = stop;
        self
    }

    /// Run until end of stream, stop, limit or fatal error
    ///
    /// An open recording session is always finalized before returning.
    #[instrument(name = "frame_pipeline_run", skip(self), fields(source = self.source.name()))]
    pub async fn run(mut self) -> Result<PipelineStats, PipelineError> {
        let started = Instant::now();
        let deadline = self.limits.timeout.map(|t| started + t);

        info!(
            capacity = self.ring.capacity(),
            width = self.width,
            height = self.height,
            detector = self.detector.name(),
            renderer = self.renderer.name(),
            "Frame pipeline started"
        );
        if let Some(message) = self.start_message.take() {
            self.publisher.publish(Alert::Text(message));
        }

        let outcome = loop {
            if self.refresh.poll(Instant::now()) {
                debug!("Subscriber refresh due");
                self.publisher.publish(Alert::RefreshSubscribers);
            }

            if *self.stop.borrow() {
                break Ok(StopReason::Stopped);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(
                    timeout = ?self.limits.timeout,
                    "Pipeline timed out"
                );
                break Ok(StopReason::Timeout);
            }
            if self
                .limits
                .max_frames
                .is_some_and(|max| self.stats.frames_processed >= max)
            {
                info!(frames = self.stats.frames_processed, "Reached max frames limit");
                break Ok(StopReason::MaxFrames);
            }

            match self.pull().await {
                Ok(Pulled::Frame(frame)) => {
                    if let Err(e) = self.process(frame).await {
                        break Err(e);
                    }
                }
                Ok(Pulled::EndOfStream) => break Ok(StopReason::EndOfStream),
                Ok(Pulled::Stopped) => break Ok(StopReason::Stopped),
                Err(e) => break Err(e),
            }
        };

        // Finalize before reporting, whatever ended the loop
        self.machine.force_stop(self.last_timestamp);
        self.finish_session().await;

        self.stats.buffer_evictions = self.ring.evicted_count();
        self.stats.duration = started.elapsed();

        match outcome {
            Ok(reason) => {
                self.stats.stop_reason = reason;
                info!(
                    reason = %reason,
                    frames = self.stats.frames_processed,
                    incidents = self.stats.incidents_started,
                    duration_secs = self.stats.duration.as_secs_f64(),
                    "Frame pipeline finished"
                );
                Ok(self.stats)
            }
            Err(e) => {
                warn!(error = %e, frame_id = ?e.frame_id(), "Frame pipeline aborted");
                Err(e)
            }
        }
    }

    async fn pull(&mut self) -> Result<Pulled, PipelineError> {
        let stop = &mut self.stop;
        let source = &mut self.source;
        tokio::select! {
            biased;
            _ = wait_for_stop(stop) => Ok(Pulled::Stopped),
            next = source.next_frame() => match next {
                Ok(Some(frame)) => Ok(Pulled::Frame(frame)),
                Ok(None) => Ok(Pulled::EndOfStream),
                Err(e) => Err(PipelineError::Capture(e)),
            },
        }
    }

    async fn process(&mut self, raw: Frame) -> Result<(), PipelineError> {
        let frame_id = raw.frame_id;
        let frame = normalize(raw, self.width, self.height)
            .map_err(|source| PipelineError::Normalize { frame_id, source })?;
        self.last_timestamp = frame.timestamp;

        // Frame payloads are shared, so this is a reference-counted copy
        self.ring.push(frame.clone());

        let detect_started = Instant::now();
        let detections = match self.detector.detect(&frame, self.confidence_threshold) {
            Ok(detections) => detections,
            Err(source) if self.tolerate_errors => {
                warn!(frame_id, error = %source, "Detection failed, treating frame as empty");
                self.stats.detector_errors += 1;
                Vec::new()
            }
            Err(source) => return Err(PipelineError::Detection { frame_id, source }),
        };
        let latency_ms = detect_started.elapsed().as_secs_f64() * 1000.0;
        observability::record_detection_latency_ms(latency_ms);

        let reading = reduce(detections);
        self.stats.frames_processed += 1;
        if reading.present {
            self.stats.frames_with_detections += 1;
        }
        self.stats
            .incident_metrics
            .update_frame(reading.max_confidence, latency_ms);
        observability::record_frame(frame_id, reading.annotations.len());

        let mut opened_this_cycle = false;
        match self.machine.update(reading.present, frame.timestamp) {
            Some(IncidentAction::Start { at }) => {
                let snapshot = self.ring.snapshot();
                debug!(frame_id, at, preroll = snapshot.len(), "Opening recording session");
                self.stats.incidents_started += 1;
                self.stats.incident_metrics.incident_started();
                observability::record_incident_started(snapshot.len());
                opened_this_cycle = self.sessions.start(snapshot, Local::now()).await;
            }
            Some(IncidentAction::Stop { at }) => {
                debug!(frame_id, at, "Closing recording session");
                self.finish_session().await;
            }
            None => {}
        }

        // The start frame is already the last pre-roll frame
        if self.sessions.is_open() && !opened_this_cycle {
            self.sessions.append(&frame).await;
        }

        let display = annotate(&frame, &reading.annotations);
        if let Err(e) = self.renderer.render(&display) {
            warn!(frame_id, renderer = self.renderer.name(), error = %e, "Render failed");
            self.stats.render_failures += 1;
            observability::record_render_failure();
        }

        observability::record_state(self.machine.state());
        observability::record_buffer_depth(self.ring.len(), self.ring.capacity());
        Ok(())
    }

    async fn finish_session(&mut self) {
        let Some(summary) = self.sessions.stop().await else {
            return;
        };
        self.stats
            .incident_metrics
            .recording_completed(summary.total_frames(), summary.degraded);
        observability::record_recording_completed(summary.total_frames(), summary.degraded);
        self.stats.record_session(summary);
    }
}

/// Resolves once the flag is raised; never resolves if the sender is gone
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    if stop.wait_for(|raised| *raised).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
