//! Layered error definitions
//!
//! Categorized by source: config / capture / detection / sink / notify

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Capture Errors =====
    /// Frame acquisition failed
    #[error("capture error from '{source_name}': {message}")]
    Capture {
        source_name: String,
        message: String,
    },

    /// Frame buffer does not match its declared geometry
    #[error("malformed frame {frame_id}: expected {expected} bytes, got {actual}")]
    MalformedFrame {
        frame_id: u64,
        expected: usize,
        actual: usize,
    },

    // ===== Detection Errors =====
    /// Detector failed on a frame
    #[error("detector '{detector}' failed on frame {frame_id}: {message}")]
    Detection {
        detector: String,
        frame_id: u64,
        message: String,
    },

    // ===== Sink Errors =====
    /// Sink creation error
    #[error("sink '{sink_name}' could not be created: {message}")]
    SinkCreate { sink_name: String, message: String },

    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== Render Errors =====
    /// Render sink error
    #[error("renderer '{renderer}' error: {message}")]
    Render { renderer: String, message: String },

    // ===== Notification Errors =====
    /// Notification channel delivery error
    #[error("notification channel '{channel}' error: {message}")]
    Notify { channel: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create capture error
    pub fn capture(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capture {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create detection error
    pub fn detection(detector: impl Into<String>, frame_id: u64, message: impl Into<String>) -> Self {
        Self::Detection {
            detector: detector.into(),
            frame_id,
            message: message.into(),
        }
    }

    /// Create sink creation error
    pub fn sink_create(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreate {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create render error
    pub fn render(renderer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            renderer: renderer.into(),
            message: message.into(),
        }
    }

    /// Create notification error
    pub fn notify(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Notify {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = ContractError::detection("replay", 42, "no such frame");
        assert_eq!(
            err.to_string(),
            "detector 'replay' failed on frame 42: no such frame"
        );

        let err = ContractError::config_validation("incident.end_seconds", "must be > 0");
        assert!(err.to_string().contains("incident.end_seconds"));
    }
}
