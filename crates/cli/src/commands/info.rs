//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RecorderBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    detection: DetectionInfo,
    incident: IncidentInfo,
    recording: RecordingInfo,
    notifier: NotifierInfo,
    render: String,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    width: u32,
    height: u32,
    fps: u32,
    queued: bool,
}

#[derive(Serialize)]
struct DetectionInfo {
    backend: String,
    class_names: Vec<String>,
    confidence_threshold: f32,
    tolerate_errors: bool,
}

#[derive(Serialize)]
struct IncidentInfo {
    buffer_seconds: f64,
    buffer_frames: usize,
    trigger_seconds: f64,
    end_seconds: f64,
}

#[derive(Serialize)]
struct RecordingInfo {
    sink: String,
    output_dir: String,
    file_prefix: String,
}

#[derive(Serialize)]
struct NotifierInfo {
    channel: String,
    queue_capacity: usize,
    refresh_interval_secs: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.resolved {
        let toml = config_loader::ConfigLoader::to_toml(&blueprint)
            .context("Failed to serialize resolved config")?;
        println!("{}", toml);
    } else if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &RecorderBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source: SourceInfo {
            kind: format!("{:?}", blueprint.source.kind),
            path: blueprint
                .source
                .path
                .as_ref()
                .map(|p| p.display().to_string()),
            width: blueprint.frame.width,
            height: blueprint.frame.height,
            fps: blueprint.frame.fps,
            queued: blueprint.source.queue.is_some(),
        },
        detection: DetectionInfo {
            backend: format!("{:?}", blueprint.detection.backend),
            class_names: blueprint.detection.class_names.clone(),
            confidence_threshold: blueprint.detection.confidence_threshold,
            tolerate_errors: blueprint.detection.tolerate_errors,
        },
        incident: IncidentInfo {
            buffer_seconds: blueprint.incident.buffer_seconds,
            buffer_frames: blueprint.buffer_capacity(),
            trigger_seconds: blueprint.incident.trigger_seconds,
            end_seconds: blueprint.incident.end_seconds,
        },
        recording: RecordingInfo {
            sink: format!("{:?}", blueprint.recording.sink),
            output_dir: blueprint.recording.output_dir.display().to_string(),
            file_prefix: blueprint.recording.file_prefix.clone(),
        },
        notifier: NotifierInfo {
            channel: format!("{:?}", blueprint.notifier.channel),
            queue_capacity: blueprint.notifier.queue_capacity,
            refresh_interval_secs: blueprint.notifier.refresh_interval_secs,
        },
        render: format!("{:?}", blueprint.render.kind),
    }
}

fn print_config_info(blueprint: &RecorderBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Incident Recorder Configuration                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let source = &blueprint.source;
    println!("📷 Source");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Kind: {:?}", source.kind);
    if let Some(ref path) = source.path {
        println!("   ├─ Path: {}", path.display());
    }
    match &source.queue {
        Some(queue) => println!(
            "   ├─ Capture queue: {} ({:?})",
            queue.capacity, queue.drop_policy
        ),
        None => println!("   ├─ Capture queue: (inline)"),
    }
    println!(
        "   └─ Frame: {}x{} @ {} fps",
        blueprint.frame.width, blueprint.frame.height, blueprint.frame.fps
    );

    let detection = &blueprint.detection;
    println!("\n🔍 Detection");
    println!("   ├─ Backend: {:?}", detection.backend);
    println!("   ├─ Classes: {:?}", detection.class_names);
    println!("   ├─ Confidence: >= {}", detection.confidence_threshold);
    println!("   └─ Tolerate errors: {}", detection.tolerate_errors);

    let incident = &blueprint.incident;
    println!("\n⏱️  Incident");
    println!(
        "   ├─ Pre-roll: {}s ({} frames)",
        incident.buffer_seconds,
        blueprint.buffer_capacity()
    );
    println!("   ├─ Trigger: presence > {}s", incident.trigger_seconds);
    println!("   └─ End: absence > {}s", incident.end_seconds);

    let recording = &blueprint.recording;
    println!("\n🎬 Recording");
    println!("   ├─ Sink: {:?}", recording.sink);
    println!("   ├─ Output: {}", recording.output_dir.display());
    println!("   └─ Prefix: {}", recording.file_prefix);

    let notifier = &blueprint.notifier;
    println!("\n📤 Notifier");
    println!("   ├─ Channel: {:?}", notifier.channel);
    println!("   ├─ Queue: {}", notifier.queue_capacity);
    println!(
        "   └─ Subscriber refresh: every {}s",
        notifier.refresh_interval_secs
    );

    println!();
}
