//! Recorder error types

use thiserror::Error;

/// Recorder-specific errors
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Frame geometry differs from the stream the sink was opened with
    #[error("frame {frame_id} is {width}x{height}, sink expects {expected_width}x{expected_height}")]
    GeometryMismatch {
        frame_id: u64,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// Encoder process exited unsuccessfully
    #[error("encoder exited with {status}: {stderr}")]
    EncoderFailed { status: String, stderr: String },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecorderError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
