//! Recording session manager
//!
//! Owns at most one open recording. A session is opened with the ring
//! buffer snapshot as pre-roll, receives live frames until stopped, and is
//! handed to the notifier as an artifact once its sink closes cleanly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use contracts::{
    Alert, AlertPublisher, Frame, RecordingConfig, SinkFactory, StreamSpec, VideoSink,
};
use tracing::{error, info, instrument, warn};

/// Outcome of a finished session
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub path: PathBuf,
    pub preroll_frames: usize,
    pub live_frames: usize,
    pub started_at: DateTime<Local>,
    /// Sink could not be created or failed mid-session; no artifact delivered
    pub degraded: bool,
}

impl RecordingSummary {
    /// Frames that reached the artifact
    pub fn total_frames(&self) -> usize {
        self.preroll_frames + self.live_frames
    }
}

/// Alert wording
#[derive(Debug, Clone)]
pub struct SessionMessages {
    /// Target class named in alerts, e.g. "Weapon"
    pub subject: String,
    /// Caption attached to delivered recordings
    pub caption: Option<String>,
}

impl Default for SessionMessages {
    fn default() -> Self {
        Self {
            subject: "Weapon".to_string(),
            caption: None,
        }
    }
}

impl SessionMessages {
    fn started(&self) -> String {
        format!("🚨 ALERT: {} detected! Started recording.", self.subject)
    }

    fn start_failed(&self, reason: &str) -> String {
        format!(
            "🚨 ALERT: {} detected! Recording could not be started: {reason}",
            self.subject
        )
    }

    fn write_failed(&self, reason: &str) -> String {
        format!("Recording of {} incident failed: {reason}", self.subject.to_lowercase())
    }
}

struct Session<S> {
    /// None once the session is degraded
    sink: Option<S>,
    path: PathBuf,
    started_at: DateTime<Local>,
    preroll_frames: usize,
    live_frames: usize,
    degraded: bool,
}

/// Recording session manager
pub struct RecordingSessionManager<F: SinkFactory> {
    factory: F,
    output_dir: PathBuf,
    file_prefix: String,
    spec: StreamSpec,
    publisher: Arc<dyn AlertPublisher>,
    messages: SessionMessages,
    session: Option<Session<F::Sink>>,
    completed: u64,
}

impl<F: SinkFactory> RecordingSessionManager<F> {
    pub fn new(
        factory: F,
        config: &RecordingConfig,
        spec: StreamSpec,
        publisher: Arc<dyn AlertPublisher>,
    ) -> Self {
        Self {
            factory,
            output_dir: config.output_dir.clone(),
            file_prefix: config.file_prefix.clone(),
            spec,
            publisher,
            messages: SessionMessages::default(),
            session: None,
            completed: 0,
        }
    }

    pub fn with_messages(mut self, messages: SessionMessages) -> Self {
        self.messages = messages;
        self
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Artifact path of the open session
    pub fn current_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Sessions stopped so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Open a session seeded with `snapshot` as pre-roll
    ///
    /// Returns false (and does nothing) if a session is already open. Sink
    /// failures leave a degraded session open so that `stop` stays balanced.
    #[instrument(
        name = "recording_session_start",
        skip(self, snapshot),
        fields(preroll = snapshot.len())
    )]
    pub async fn start(&mut self, snapshot: Vec<Frame>, wall_clock: DateTime<Local>) -> bool {
        if let Some(open) = &self.session {
            warn!(path = %open.path.display(), "start ignored, session already open");
            return false;
        }

        let path = match self.allocate_path(wall_clock) {
            Ok(path) => path,
            Err(e) => {
                let fallback = self.output_dir.join(self.file_name(wall_clock, 0));
                self.open_degraded(fallback, wall_clock, &e.to_string());
                return true;
            }
        };

        let mut sink = match self.factory.create(path.clone(), &self.spec).await {
            Ok(sink) => sink,
            Err(e) => {
                self.open_degraded(path, wall_clock, &e.to_string());
                return true;
            }
        };

        let mut session = Session {
            sink: None,
            path,
            started_at: wall_clock,
            preroll_frames: 0,
            live_frames: 0,
            degraded: false,
        };

        for frame in &snapshot {
            if let Err(e) = sink.write(frame).await {
                error!(path = %session.path.display(), frame_id = frame.frame_id, error = %e, "pre-roll write failed");
                metrics::counter!("incident_recorder_sink_errors_total").increment(1);
                if let Err(close_err) = sink.close().await {
                    warn!(error = %close_err, "close after failed write also failed");
                }
                session.degraded = true;
                self.publisher
                    .publish(Alert::text(self.messages.write_failed(&e.to_string())));
                self.session = Some(session);
                return true;
            }
            session.preroll_frames += 1;
        }

        info!(
            path = %session.path.display(),
            preroll_frames = session.preroll_frames,
            "recording started"
        );
        session.sink = Some(sink);
        self.session = Some(session);
        self.publisher.publish(Alert::text(self.messages.started()));
        true
    }

    fn open_degraded(&mut self, path: PathBuf, wall_clock: DateTime<Local>, reason: &str) {
        error!(path = %path.display(), error = %reason, "recording sink could not be created");
        metrics::counter!("incident_recorder_sink_errors_total").increment(1);
        self.session = Some(Session {
            sink: None,
            path,
            started_at: wall_clock,
            preroll_frames: 0,
            live_frames: 0,
            degraded: true,
        });
        self.publisher
            .publish(Alert::text(self.messages.start_failed(reason)));
    }

    /// Append a live frame to the open session
    ///
    /// No-op without an open session; frames are dropped while degraded.
    pub async fn append(&mut self, frame: &Frame) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(sink) = session.sink.as_mut() else {
            return;
        };

        match sink.write(frame).await {
            Ok(()) => session.live_frames += 1,
            Err(e) => {
                error!(
                    path = %session.path.display(),
                    frame_id = frame.frame_id,
                    error = %e,
                    "recording write failed, dropping remaining frames"
                );
                metrics::counter!("incident_recorder_sink_errors_total").increment(1);
                if let Some(mut sink) = session.sink.take() {
                    if let Err(close_err) = sink.close().await {
                        warn!(error = %close_err, "close after failed write also failed");
                    }
                }
                session.degraded = true;
                self.publisher
                    .publish(Alert::text(self.messages.write_failed(&e.to_string())));
            }
        }
    }

    /// Finalize the open session and publish its artifact
    ///
    /// Returns None when no session is open.
    #[instrument(name = "recording_session_stop", skip(self))]
    pub async fn stop(&mut self) -> Option<RecordingSummary> {
        let mut session = self.session.take()?;
        self.completed += 1;

        if let Some(mut sink) = session.sink.take() {
            let closed = match sink.flush().await {
                Ok(()) => sink.close().await,
                Err(e) => {
                    // Flush failed; still release the sink
                    let _ = sink.close().await;
                    Err(e)
                }
            };
            if let Err(e) = closed {
                error!(path = %session.path.display(), error = %e, "recording finalize failed");
                metrics::counter!("incident_recorder_sink_errors_total").increment(1);
                session.degraded = true;
            }
        }

        let summary = RecordingSummary {
            path: session.path,
            preroll_frames: session.preroll_frames,
            live_frames: session.live_frames,
            started_at: session.started_at,
            degraded: session.degraded,
        };

        if summary.degraded {
            warn!(path = %summary.path.display(), "recording stopped without artifact");
        } else {
            info!(
                path = %summary.path.display(),
                frames = summary.total_frames(),
                "Saved video and stopped recording"
            );
            self.publisher.publish(Alert::Artifact {
                path: summary.path.clone(),
                caption: self.messages.caption.clone(),
            });
        }
        Some(summary)
    }

    fn file_name(&self, wall_clock: DateTime<Local>, attempt: u32) -> String {
        let stamp = wall_clock.format("%Y%m%d-%H%M%S");
        let ext = self.factory.extension();
        let suffix = if attempt == 0 {
            String::new()
        } else {
            format!("_{attempt}")
        };
        if ext.is_empty() {
            format!("{}_{stamp}{suffix}", self.file_prefix)
        } else {
            format!("{}_{stamp}{suffix}.{ext}", self.file_prefix)
        }
    }

    /// `{prefix}_{%Y%m%d-%H%M%S}[_{n}].{ext}` under the output directory,
    /// numbered when a file of that name already exists
    fn allocate_path(&self, wall_clock: DateTime<Local>) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut attempt = 0;
        loop {
            let candidate = self.output_dir.join(self.file_name(wall_clock, attempt));
            if !candidate.exists() {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }
}
