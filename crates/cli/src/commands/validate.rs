//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ChannelKind, DetectorBackend, RecorderBlueprint, RecordingSinkKind, RenderKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    source: String,
    frame: String,
    detector: String,
    buffer_frames: usize,
    trigger_seconds: f64,
    end_seconds: f64,
    sink: String,
    channel: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&blueprint)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(blueprint: &RecorderBlueprint) -> ConfigSummary {
    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        source: format!("{:?}", blueprint.source.kind),
        frame: format!(
            "{}x{}@{}",
            blueprint.frame.width, blueprint.frame.height, blueprint.frame.fps
        ),
        detector: format!("{:?}", blueprint.detection.backend),
        buffer_frames: blueprint.buffer_capacity(),
        trigger_seconds: blueprint.incident.trigger_seconds,
        end_seconds: blueprint.incident.end_seconds,
        sink: format!("{:?}", blueprint.recording.sink),
        channel: format!("{:?}", blueprint.notifier.channel),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RecorderBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.detection.backend == DetectorBackend::None {
        warnings.push("detection.backend is 'none' - no incident will ever trigger".to_string());
    }

    if blueprint.detection.class_names.is_empty() {
        warnings.push("detection.class_names is empty - every detected class counts".to_string());
    }

    if blueprint.incident.end_seconds < blueprint.incident.trigger_seconds {
        warnings.push(format!(
            "incident.end_seconds ({}) is shorter than trigger_seconds ({}) - recordings may flap",
            blueprint.incident.end_seconds, blueprint.incident.trigger_seconds
        ));
    }

    if blueprint.incident.trigger_seconds >= blueprint.incident.buffer_seconds {
        warnings.push(format!(
            "incident.buffer_seconds ({}) does not cover trigger_seconds ({}) - recordings will miss the start of the presence streak",
            blueprint.incident.buffer_seconds, blueprint.incident.trigger_seconds
        ));
    }

    if blueprint.recording.sink == RecordingSinkKind::Ffmpeg {
        warnings.push(format!(
            "recording.sink is 'ffmpeg' - '{}' must be on PATH at runtime",
            blueprint.recording.ffmpeg.binary.display()
        ));
    }

    if blueprint.notifier.channel == ChannelKind::Telegram {
        let var = &blueprint.notifier.telegram.token_env;
        if std::env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) {
            warnings.push(format!(
                "notifier.telegram.token_env '{var}' is not set in this environment"
            ));
        }
    }

    if blueprint.render.kind == RenderKind::Preview && blueprint.render.every_n_frames == 1 {
        warnings.push("render preview rewrites the image on every frame".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source: {} ({})", summary.source, summary.frame);
            println!("  Detector: {}", summary.detector);
            println!(
                "  Incident: pre-roll {} frames, trigger > {}s, end > {}s",
                summary.buffer_frames, summary.trigger_seconds, summary.end_seconds
            );
            println!("  Sink: {}", summary.sink);
            println!("  Channel: {}", summary.channel);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_has_summary() {
        let file = write_config(
            "[frame]\nwidth = 640\nheight = 360\nfps = 10\n\n[recording]\nsink = \"frame_dir\"\n",
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.frame, "640x360@10");
        assert_eq!(summary.buffer_frames, 100);
        // default detector never triggers
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("detection.backend")));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let file = write_config("[frame]\nfps = 0\n");
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });

        assert!(!result.valid);
        assert!(result.error.unwrap().contains("frame.fps"));
    }

    #[test]
    fn test_short_preroll_is_a_warning() {
        let file = write_config(
            "[incident]\nbuffer_seconds = 1.0\ntrigger_seconds = 2.0\n\n[recording]\nsink = \"frame_dir\"\n",
        );
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });

        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("incident.buffer_seconds")));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/config.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.summary.is_none());
    }
}
