//! Configuration parsing
//!
//! Supports TOML (primary) and JSON (optional).

use contracts::{ContractError, RecorderBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<RecorderBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<RecorderBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<RecorderBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DetectorBackend, RecordingSinkKind, SourceKind};

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[source]
kind = "image_dir"
path = "frames"
loop_playback = true

[frame]
width = 640
height = 480
fps = 15

[detection]
backend = "scripted"
class_names = ["weapon", "knife"]
confidence_threshold = 0.6
label = "knife"

[[detection.scripted]]
start_s = 1.0
end_s = 5.0

[incident]
buffer_seconds = 4.0
trigger_seconds = 1.5
end_seconds = 6.0

[recording]
output_dir = "out"
sink = "frame_dir"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.source.kind, SourceKind::ImageDir);
        assert!(bp.source.loop_playback);
        assert_eq!(bp.frame.fps, 15);
        assert_eq!(bp.detection.backend, DetectorBackend::Scripted);
        assert_eq!(bp.detection.class_names.len(), 2);
        assert_eq!(bp.detection.scripted.len(), 1);
        assert_eq!(bp.incident.trigger_seconds, 1.5);
        assert_eq!(bp.recording.sink, RecordingSinkKind::FrameDir);
        assert_eq!(bp.buffer_capacity(), 60);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "frame": { "width": 320, "height": 240, "fps": 5 },
            "notifier": { "channel": "telegram", "telegram": { "token_env": "BOT_TOKEN" } }
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.frame.width, 320);
        assert_eq!(bp.notifier.telegram.token_env, "BOT_TOKEN");
        assert_eq!(bp.notifier.queue_capacity, 64);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_unknown_enum_value_is_parse_error() {
        let content = "[recording]\nsink = \"gif\"\n";
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
