//! Incident recorder metrics
//!
//! Thin wrappers over the `metrics` facade, called once per frame or per
//! incident boundary, plus an in-memory aggregator for the end-of-run summary.

use contracts::IncidentState;
use metrics::{counter, gauge, histogram};

/// Record one processed frame
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_frame;
///
/// let signal = reduce(detections);
/// record_frame(frame.frame_id, signal.annotations.len());
/// ```
pub fn record_frame(frame_id: u64, detections: usize) {
    counter!("incident_recorder_frames_total").increment(1);
    gauge!("incident_recorder_last_frame_id").set(frame_id as f64);

    if detections > 0 {
        counter!("incident_recorder_detections_total").increment(detections as u64);
        counter!("incident_recorder_frames_with_detections_total").increment(1);
    }
}

/// Detector wall time for one frame
pub fn record_detection_latency_ms(latency_ms: f64) {
    histogram!("incident_recorder_detection_latency_ms").record(latency_ms);
}

/// Ring buffer fill level
pub fn record_buffer_depth(depth: usize, capacity: usize) {
    gauge!("incident_recorder_buffer_depth").set(depth as f64);
    gauge!("incident_recorder_buffer_capacity").set(capacity as f64);
}

/// Current state machine state (0 idle, 1 triggering, 2 recording)
pub fn record_state(state: IncidentState) {
    gauge!("incident_recorder_state").set(state.as_gauge());
}

pub fn record_incident_started(preroll_frames: usize) {
    counter!("incident_recorder_incidents_started_total").increment(1);
    histogram!("incident_recorder_preroll_frames").record(preroll_frames as f64);
}

/// Session closed; `degraded` sessions produced no artifact
pub fn record_recording_completed(frames: usize, degraded: bool) {
    let status = if degraded { "degraded" } else { "complete" };
    counter!(
        "incident_recorder_recordings_completed_total",
        "status" => status
    )
    .increment(1);
    histogram!("incident_recorder_recording_frames").record(frames as f64);
}

pub fn record_render_failure() {
    counter!("incident_recorder_render_failures_total").increment(1);
}

/// In-memory run aggregator
///
/// Kept by the driver alongside the Prometheus facade so a run summary is
/// available even when no exporter is installed.
#[derive(Debug, Clone, Default)]
pub struct IncidentMetricsAggregator {
    pub total_frames: u64,
    pub frames_with_detections: u64,
    pub incidents_started: u64,
    pub recordings_completed: u64,
    pub degraded_recordings: u64,
    pub detection_latency_ms: RunningStats,
    /// Best confidence on frames with a detection
    pub confidence: RunningStats,
    pub recording_frames: RunningStats,
}

impl IncidentMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_frame(&mut self, max_confidence: Option<f32>, latency_ms: f64) {
        self.total_frames += 1;
        self.detection_latency_ms.push(latency_ms);
        if let Some(confidence) = max_confidence {
            self.frames_with_detections += 1;
            self.confidence.push(f64::from(confidence));
        }
    }

    pub fn incident_started(&mut self) {
        self.incidents_started += 1;
    }

    pub fn recording_completed(&mut self, frames: usize, degraded: bool) {
        self.recordings_completed += 1;
        if degraded {
            self.degraded_recordings += 1;
        } else {
            self.recording_frames.push(frames as f64);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            frames_with_detections: self.frames_with_detections,
            detection_rate: if self.total_frames > 0 {
                self.frames_with_detections as f64 / self.total_frames as f64 * 100.0
            } else {
                0.0
            },
            incidents_started: self.incidents_started,
            recordings_completed: self.recordings_completed,
            degraded_recordings: self.degraded_recordings,
            detection_latency_ms: StatsSummary::from(&self.detection_latency_ms),
            confidence: StatsSummary::from(&self.confidence),
            recording_frames: StatsSummary::from(&self.recording_frames),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_with_detections: u64,
    pub detection_rate: f64,
    pub incidents_started: u64,
    pub recordings_completed: u64,
    pub degraded_recordings: u64,
    pub detection_latency_ms: StatsSummary,
    pub confidence: StatsSummary,
    pub recording_frames: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Incident Metrics Summary ===")?;
        writeln!(f, "Total frames: {}", self.total_frames)?;
        writeln!(
            f,
            "Frames with detections: {} ({:.2}%)",
            self.frames_with_detections, self.detection_rate
        )?;
        writeln!(f, "Incidents started: {}", self.incidents_started)?;
        writeln!(
            f,
            "Recordings completed: {} ({} degraded)",
            self.recordings_completed, self.degraded_recordings
        )?;
        writeln!(f, "Detection latency (ms): {}", self.detection_latency_ms)?;
        writeln!(f, "Confidence: {}", self.confidence)?;
        writeln!(f, "Frames per recording: {}", self.recording_frames)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
