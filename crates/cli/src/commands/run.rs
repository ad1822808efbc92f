//! `run` command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::{AlertPublisher, RecorderBlueprint, SourceKind};
use ingestion::{build_detector, AnySource};
use notifier::{AnyChannel, NotifierHandle};
use pipeline::{FramePipeline, PipelineLimits};
use recorder::{build_renderer, AnySinkFactory};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        source = ?blueprint.source.kind,
        detector = ?blueprint.detection.backend,
        sink = ?blueprint.recording.sink,
        channel = ?blueprint.notifier.channel,
        buffer_frames = blueprint.buffer_capacity(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    // Build components
    let source = AnySource::from_blueprint(&blueprint)
        .map_err(|e| CliError::setup("frame source", e))?;
    let detector =
        build_detector(&blueprint.detection).map_err(|e| CliError::setup("detector", e))?;
    let renderer = build_renderer(&blueprint.render);
    let factory = AnySinkFactory::from_config(&blueprint.recording);
    let channel = AnyChannel::from_config(&blueprint.notifier)
        .map_err(|e| CliError::setup("notification channel", e))?;

    let notifier = NotifierHandle::spawn(channel, blueprint.notifier.queue_capacity);
    let publisher: Arc<dyn AlertPublisher> = Arc::new(notifier.publisher());

    // Setup graceful shutdown: the flag lets the driver close an open recording
    let (stop_tx, stop_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping pipeline...");
        let _ = stop_tx.send(true);
    });

    let limits = PipelineLimits {
        max_frames: (args.max_frames != 0).then_some(args.max_frames),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
    };

    info!("Starting pipeline...");
    let result = FramePipeline::new(&blueprint, source, detector, renderer, factory, publisher)
        .with_limits(limits)
        .with_stop_signal(stop_rx)
        .run()
        .await;

    signal_task.abort();

    // Let the final artifact upload finish
    notifier
        .shutdown(Duration::from_secs(args.drain_timeout))
        .await;

    let stats = result.context("Pipeline execution failed")?;
    info!(
        frames = stats.frames_processed,
        incidents = stats.incidents_started,
        recordings = stats.recordings_completed,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed successfully"
    );
    stats.print_summary();

    info!("Incident Recorder finished");
    Ok(())
}

/// Apply command-line overrides, then re-run validation on the result
fn apply_overrides(blueprint: &mut RecorderBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(ref dir) = args.source {
        info!(path = %dir.display(), "Overriding frame source from CLI");
        blueprint.source.kind = SourceKind::ImageDir;
        blueprint.source.path = Some(dir.clone());
    }
    if let Some(ref dir) = args.output_dir {
        info!(path = %dir.display(), "Overriding output directory from CLI");
        blueprint.recording.output_dir = dir.clone();
    }

    config_loader::validate(blueprint).map_err(|e| CliError::invalid_override(e.to_string()))?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RecorderBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source: {:?}", blueprint.source.kind);
    if let Some(ref path) = blueprint.source.path {
        println!("  Path: {}", path.display());
    }
    println!(
        "  Working frame: {}x{} @ {} fps",
        blueprint.frame.width, blueprint.frame.height, blueprint.frame.fps
    );

    println!("\nDetection: {:?}", blueprint.detection.backend);
    println!("  Classes: {:?}", blueprint.detection.class_names);
    println!("  Confidence >= {}", blueprint.detection.confidence_threshold);

    println!("\nIncident:");
    println!(
        "  Pre-roll: {}s ({} frames)",
        blueprint.incident.buffer_seconds,
        blueprint.buffer_capacity()
    );
    println!("  Trigger after: {}s", blueprint.incident.trigger_seconds);
    println!("  Stop after quiet: {}s", blueprint.incident.end_seconds);

    println!("\nRecording: {:?}", blueprint.recording.sink);
    println!("  Output: {}", blueprint.recording.output_dir.display());

    println!("\nNotifier: {:?}", blueprint.notifier.channel);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: PathBuf::from("config.toml"),
            source: None,
            output_dir: None,
            max_frames: 0,
            timeout: 0,
            dry_run: false,
            metrics_port: 0,
            drain_timeout: 30,
        }
    }

    #[test]
    fn test_source_override_switches_to_image_dir() {
        let mut blueprint = RecorderBlueprint::default();
        let args = RunArgs {
            source: Some(PathBuf::from("frames")),
            output_dir: Some(PathBuf::from("out")),
            ..args()
        };

        apply_overrides(&mut blueprint, &args).unwrap();
        assert_eq!(blueprint.source.kind, SourceKind::ImageDir);
        assert_eq!(blueprint.source.path, Some(PathBuf::from("frames")));
        assert_eq!(blueprint.recording.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_no_overrides_keeps_blueprint() {
        let mut blueprint = RecorderBlueprint::default();
        apply_overrides(&mut blueprint, &args()).unwrap();
        assert_eq!(blueprint.source.kind, SourceKind::Mock);
    }

    #[tokio::test]
    async fn test_missing_config_is_reported() {
        let args = RunArgs {
            config: PathBuf::from("/nonexistent/incident.toml"),
            ..args()
        };
        let err = run_pipeline(&args).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
