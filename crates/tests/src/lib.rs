//! # Integration Tests
//!
//! End-to-end runs across the workspace crates.
//!
//! Covers:
//! - Contract smoke checks
//! - Config text -> source -> detector -> driver -> frame_dir sink -> notifier
//! - Ring buffer overflow and session exclusivity scenarios

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::IncidentState::default(), contracts::IncidentState::Idle);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{AlertPublisher, Frame, RecorderBlueprint};
    use incident_engine::{FrameRingBuffer, IncidentStateMachine};
    use ingestion::{build_detector, AnySource};
    use notifier::{AnyChannel, NotifierHandle};
    use pipeline::{FramePipeline, StopReason};
    use recorder::{build_renderer, AnySinkFactory, SessionManifest};

    fn config(output_dir: &std::path::Path, intervals: &str, frames: u64, queued: bool) -> String {
        let queue = if queued {
            "\n[source.queue]\ncapacity = 256\ndrop_policy = \"drop_newest\"\n"
        } else {
            ""
        };
        format!(
            r#"
[source]
kind = "mock"
mock_frames = {frames}
{queue}
[frame]
width = 16
height = 12
fps = 10

[detection]
backend = "scripted"
class_names = ["weapon"]
label = "weapon"
scripted = [{intervals}]

[incident]
buffer_seconds = 3.0
trigger_seconds = 1.95
end_seconds = 0.95

[recording]
sink = "frame_dir"
output_dir = "{}"

[notifier]
channel = "log"
"#,
            output_dir.display()
        )
    }

    fn load(content: &str) -> RecorderBlueprint {
        ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap()
    }

    /// Run the full pipeline the way the CLI wires it
    async fn run(blueprint: &RecorderBlueprint) -> (pipeline::PipelineStats, notifier::NotifierSnapshot) {
        let source = AnySource::from_blueprint(blueprint).unwrap();
        let detector = build_detector(&blueprint.detection).unwrap();
        let renderer = build_renderer(&blueprint.render);
        let factory = AnySinkFactory::from_config(&blueprint.recording);
        let channel = AnyChannel::from_config(&blueprint.notifier).unwrap();

        let notifier = NotifierHandle::spawn(channel, blueprint.notifier.queue_capacity);
        let metrics = notifier.metrics().clone();
        let publisher: Arc<dyn AlertPublisher> = Arc::new(notifier.publisher());

        let stats = FramePipeline::new(blueprint, source, detector, renderer, factory, publisher)
            .run()
            .await
            .unwrap();

        notifier.shutdown(Duration::from_secs(5)).await;
        (stats, metrics.snapshot())
    }

    /// Presence over [1, 5) at 10 fps: trigger at frame 30, stop at frame 59
    #[tokio::test]
    async fn test_e2e_single_incident_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = load(&config(
            dir.path(),
            "{ start_s = 1.0, end_s = 5.0 }",
            100,
            false,
        ));
        assert_eq!(blueprint.buffer_capacity(), 30);

        let (stats, notified) = run(&blueprint).await;

        assert_eq!(stats.stop_reason, StopReason::EndOfStream);
        assert_eq!(stats.frames_processed, 100);
        assert_eq!(stats.incidents_started, 1);
        assert_eq!(stats.recordings_completed, 1);

        let rec = &stats.recordings[0];
        assert!(!rec.degraded);
        assert!(rec.path.starts_with(dir.path()));
        assert_eq!(rec.preroll_frames, 30);
        assert_eq!(rec.live_frames, 28);

        let manifest = SessionManifest::read(&rec.path).unwrap();
        assert_eq!(manifest.frames, 58);
        assert_eq!(manifest.first_frame_id, Some(1));
        assert_eq!(manifest.last_frame_id, Some(58));

        // start message, incident alert, finished recording
        assert_eq!(notified.sent_count, 3);
        assert_eq!(notified.failure_count, 0);
        assert_eq!(notified.dropped_count, 0);
    }

    #[tokio::test]
    async fn test_e2e_sessions_never_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = load(&config(
            dir.path(),
            "{ start_s = 1.0, end_s = 5.0 }, { start_s = 8.0, end_s = 12.0 }",
            150,
            false,
        ));

        let (stats, notified) = run(&blueprint).await;

        assert_eq!(stats.incidents_started, 2);
        assert_eq!(stats.recordings_completed, 2);
        assert_ne!(stats.recordings[0].path, stats.recordings[1].path);

        let first = SessionManifest::read(&stats.recordings[0].path).unwrap();
        let second = SessionManifest::read(&stats.recordings[1].path).unwrap();
        let first_last = first.last_frame_id.unwrap();
        let second_first = second.first_frame_id.unwrap();
        assert!(first_last < second_first, "{first_last} >= {second_first}");
        assert_eq!(second.last_frame_id, Some(128));

        assert_eq!(notified.sent_count, 5);
    }

    #[tokio::test]
    async fn test_e2e_queued_source_matches_inline() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = load(&config(
            dir.path(),
            "{ start_s = 1.0, end_s = 5.0 }",
            100,
            true,
        ));

        let (stats, _) = run(&blueprint).await;

        assert_eq!(stats.frames_processed, 100);
        assert_eq!(stats.recordings.len(), 1);
        assert_eq!(stats.recordings[0].total_frames(), 58);
    }

    #[tokio::test]
    async fn test_e2e_short_presence_never_records() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = load(&config(
            dir.path(),
            "{ start_s = 1.0, end_s = 2.5 }",
            60,
            false,
        ));

        let (stats, notified) = run(&blueprint).await;

        assert_eq!(stats.frames_with_detections, 15);
        assert_eq!(stats.incidents_started, 0);
        assert!(stats.recordings.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        // only the start message
        assert_eq!(notified.sent_count, 1);
    }

    #[test]
    fn test_ring_buffer_keeps_latest_window() {
        let mut ring = FrameRingBuffer::new(100);
        for id in 0..150u64 {
            ring.push(Frame::filled(id, id as f64 / 30.0, 4, 4, [0, 0, 0]));
        }

        let snapshot = ring.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.first().map(|f| f.frame_id), Some(50));
        assert_eq!(snapshot.last().map(|f| f.frame_id), Some(149));
        assert_eq!(ring.evicted_count(), 50);
        // snapshot does not drain
        assert_eq!(ring.len(), 100);
    }

    #[test]
    fn test_flicker_inside_grace_keeps_one_recording() {
        let mut machine = IncidentStateMachine::with_thresholds(2.0, 20.0);
        let mut starts = 0;
        let mut stops = 0;

        // present for 3 s, absent 10 s, present again 3 s, then quiet for 25 s
        for step in 0..410u32 {
            let t = f64::from(step) / 10.0;
            let present = t < 3.0 || (13.0..16.0).contains(&t);
            match machine.update(present, t) {
                Some(contracts::IncidentAction::Start { .. }) => starts += 1,
                Some(contracts::IncidentAction::Stop { .. }) => stops += 1,
                None => {}
            }
        }

        assert_eq!(starts, 1);
        assert_eq!(stops, 1);
        assert!(!machine.is_recording());
    }

    #[test]
    fn test_example_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config.example.toml");
        let blueprint = ConfigLoader::load_from_path(&path).unwrap();
        let json = serde_json::to_value(&blueprint).unwrap();
        assert!(json.get("incident").is_some());
    }
}
