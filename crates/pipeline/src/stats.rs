//! Pipeline statistics and metrics.

use std::fmt;
use std::time::Duration;

use observability::IncidentMetricsAggregator;
use recorder::RecordingSummary;

/// Closed sessions kept in `PipelineStats::recordings`; counters cover all of them
pub const MAX_RECORDING_HISTORY: usize = 64;

/// Why the frame loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Source reported end of stream
    #[default]
    EndOfStream,
    /// Stop flag raised (signal or caller)
    Stopped,
    MaxFrames,
    Timeout,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::EndOfStream => "end of stream",
            StopReason::Stopped => "stop requested",
            StopReason::MaxFrames => "max frames reached",
            StopReason::Timeout => "timeout",
        })
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub frames_processed: u64,

    pub frames_with_detections: u64,

    pub incidents_started: u64,

    /// Sessions closed, degraded ones included
    pub recordings_completed: u64,

    /// Frames that reached delivered artifacts (pre-roll + live)
    pub frames_recorded: u64,

    /// Frames the ring buffer dropped on overflow
    pub buffer_evictions: u64,

    /// Detector failures downgraded to "no detection"
    pub detector_errors: u64,

    pub render_failures: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    pub stop_reason: StopReason,

    /// Most recent closed sessions, oldest first, at most `MAX_RECORDING_HISTORY`
    pub recordings: Vec<RecordingSummary>,

    pub incident_metrics: IncidentMetricsAggregator,
}

impl PipelineStats {
    /// Frames per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Count a closed session and keep its summary, evicting the oldest past the cap
    pub fn record_session(&mut self, summary: RecordingSummary) {
        self.recordings_completed += 1;
        if !summary.degraded {
            self.frames_recorded += summary.total_frames() as u64;
        }
        if self.recordings.len() == MAX_RECORDING_HISTORY {
            self.recordings.remove(0);
        }
        self.recordings.push(summary);
    }

    /// Recordings that were delivered as artifacts
    pub fn artifacts(&self) -> impl Iterator<Item = &RecordingSummary> {
        self.recordings.iter().filter(|r| !r.degraded)
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=================== Pipeline Statistics ===================\n");

        println!("Overview");
        println!("   Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   Stopped by: {}", self.stop_reason);
        println!("   Frames processed: {}", self.frames_processed);
        println!("   FPS: {:.2}", self.fps());
        println!("   Buffer evictions: {}", self.buffer_evictions);
        println!("   Detector errors tolerated: {}", self.detector_errors);
        println!("   Render failures: {}", self.render_failures);

        println!("\nIncidents");
        println!("   Started: {}", self.incidents_started);
        println!("   Recordings closed: {}", self.recordings_completed);
        println!("   Frames recorded: {}", self.frames_recorded);
        if self.recordings_completed as usize > self.recordings.len() {
            println!("   (last {} shown)", self.recordings.len());
        }
        for rec in &self.recordings {
            let status = if rec.degraded { "degraded" } else { "ok" };
            println!(
                "   - {} [{}] {} frames ({} pre-roll)",
                rec.path.display(),
                status,
                rec.total_frames(),
                rec.preroll_frames
            );
        }

        println!("\n{}", self.incident_metrics.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_zero_duration() {
        let stats = PipelineStats::default();
        assert_eq!(stats.fps(), 0.0);
    }

    #[test]
    fn test_fps() {
        let stats = PipelineStats {
            frames_processed: 50,
            duration: Duration::from_secs(5),
            ..Default::default()
        };
        assert!((stats.fps() - 10.0).abs() < 1e-9);
    }

    fn summary(index: usize, degraded: bool) -> RecordingSummary {
        RecordingSummary {
            path: format!("/recordings/incident_{index}").into(),
            preroll_frames: 10,
            live_frames: 5,
            started_at: chrono::Local::now(),
            degraded,
        }
    }

    #[test]
    fn test_recording_history_is_bounded() {
        let mut stats = PipelineStats::default();
        let total = MAX_RECORDING_HISTORY + 10;
        for index in 0..total {
            stats.record_session(summary(index, index % 2 == 1));
        }

        assert_eq!(stats.recordings_completed, total as u64);
        assert_eq!(stats.frames_recorded, (total as u64 / 2) * 15);
        assert_eq!(stats.recordings.len(), MAX_RECORDING_HISTORY);
        assert_eq!(
            stats.recordings[0].path,
            std::path::PathBuf::from("/recordings/incident_10")
        );
        assert_eq!(
            stats.recordings.last().map(|r| r.path.clone()),
            Some(format!("/recordings/incident_{}", total - 1).into())
        );
    }
}
