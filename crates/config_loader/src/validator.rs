//! Configuration validation
//!
//! Rules:
//! - field ranges declared on the blueprint types (`validator` derive)
//! - `image_dir` source has a path
//! - `replay` detector has a replay file; `scripted` intervals are non-empty and ordered
//! - class names are non-blank
//! - recording prefix is a plain file name
//! - telegram channel names a token variable

use contracts::{
    ChannelKind, ContractError, DetectorBackend, RecorderBlueprint, SourceKind,
};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate RecorderBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    validate_ranges(blueprint)?;
    validate_source(blueprint)?;
    validate_detection(blueprint)?;
    validate_recording(blueprint)?;
    validate_notifier(blueprint)?;
    Ok(())
}

/// Run the derived range checks and report the first offending field path
fn validate_ranges(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    match blueprint.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_violation(&errors, "")
                .unwrap_or_else(|| ("blueprint".to_string(), errors.to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

fn first_violation(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = match &err.message {
                        Some(message) => message.to_string(),
                        None => format!("failed '{}' check", err.code),
                    };
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                if let Some(found) = first_violation(nested, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    if let Some(found) = first_violation(nested, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Validate capture source
fn validate_source(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let source = &blueprint.source;
    if source.kind == SourceKind::ImageDir && source.path.is_none() {
        return Err(ContractError::config_validation(
            "source.path",
            "path is required for source kind 'image_dir'",
        ));
    }
    if source.kind == SourceKind::Mock && source.mock_frames == Some(0) {
        return Err(ContractError::config_validation(
            "source.mock_frames",
            "mock_frames must be > 0 (omit for an endless stream)",
        ));
    }
    Ok(())
}

/// Validate detection settings
fn validate_detection(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let detection = &blueprint.detection;

    for (idx, name) in detection.class_names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("detection.class_names[{idx}]"),
                "class name cannot be empty",
            ));
        }
    }

    match detection.backend {
        DetectorBackend::Replay if detection.replay_path.is_none() => {
            Err(ContractError::config_validation(
                "detection.replay_path",
                "replay_path is required for backend 'replay'",
            ))
        }
        DetectorBackend::Scripted => {
            for (idx, interval) in detection.scripted.iter().enumerate() {
                if interval.start_s < 0.0 || interval.end_s <= interval.start_s {
                    return Err(ContractError::config_validation(
                        format!("detection.scripted[{idx}]"),
                        format!(
                            "interval must satisfy 0 <= start_s < end_s, got [{}, {})",
                            interval.start_s, interval.end_s
                        ),
                    ));
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Validate recording output
fn validate_recording(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let prefix = &blueprint.recording.file_prefix;
    if prefix.is_empty() {
        return Err(ContractError::config_validation(
            "recording.file_prefix",
            "file_prefix cannot be empty",
        ));
    }
    if prefix.contains(['/', '\\']) {
        return Err(ContractError::config_validation(
            "recording.file_prefix",
            format!("file_prefix '{prefix}' must not contain path separators"),
        ));
    }
    Ok(())
}

/// Validate notification channel
fn validate_notifier(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let notifier = &blueprint.notifier;
    if notifier.channel == ChannelKind::Telegram {
        if notifier.telegram.token_env.trim().is_empty() {
            return Err(ContractError::config_validation(
                "notifier.telegram.token_env",
                "token_env cannot be empty",
            ));
        }
        if notifier.telegram.api_base.trim().is_empty() {
            return Err(ContractError::config_validation(
                "notifier.telegram.api_base",
                "api_base cannot be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ScriptedInterval;
    use std::path::PathBuf;

    fn minimal_blueprint() -> RecorderBlueprint {
        RecorderBlueprint::default()
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_zero_fps_reports_field_path() {
        let mut bp = minimal_blueprint();
        bp.frame.fps = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("frame.fps"), "got: {err}");
    }

    #[test]
    fn test_confidence_out_of_range() {
        let mut bp = minimal_blueprint();
        bp.detection.confidence_threshold = -0.1;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("detection.confidence_threshold"), "got: {err}");
    }

    #[test]
    fn test_non_positive_end_seconds() {
        let mut bp = minimal_blueprint();
        bp.incident.end_seconds = 0.0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("incident.end_seconds"), "got: {err}");
    }

    #[test]
    fn test_image_dir_requires_path() {
        let mut bp = minimal_blueprint();
        bp.source.kind = SourceKind::ImageDir;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("source.path"), "got: {err}");

        bp.source.path = Some(PathBuf::from("frames"));
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_replay_requires_path() {
        let mut bp = minimal_blueprint();
        bp.detection.backend = DetectorBackend::Replay;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("replay_path"), "got: {err}");
    }

    #[test]
    fn test_scripted_interval_order() {
        let mut bp = minimal_blueprint();
        bp.detection.backend = DetectorBackend::Scripted;
        bp.detection.scripted = vec![ScriptedInterval {
            start_s: 5.0,
            end_s: 2.0,
        }];
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("detection.scripted[0]"), "got: {err}");
    }

    #[test]
    fn test_trigger_longer_than_buffer_is_accepted() {
        // A short pre-roll with a longer trigger only trims the clip head
        let mut bp = minimal_blueprint();
        bp.incident.buffer_seconds = 1.0;
        bp.incident.trigger_seconds = 2.0;
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_prefix_with_separator() {
        let mut bp = minimal_blueprint();
        bp.recording.file_prefix = "../escape".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("path separators"), "got: {err}");
    }

    #[test]
    fn test_telegram_requires_token_env() {
        let mut bp = minimal_blueprint();
        bp.notifier.channel = ChannelKind::Telegram;
        bp.notifier.telegram.token_env = "  ".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("token_env"), "got: {err}");
    }
}
