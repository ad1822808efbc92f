//! Ingestion error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Image file could not be decoded
    #[error("failed to decode image {path:?}: {message}")]
    ImageDecode { path: PathBuf, message: String },

    /// Directory holds no supported images
    #[error("no images found in {path:?}")]
    EmptyDirectory { path: PathBuf },

    /// Pixel buffer could not be wrapped as an image
    #[error("frame {frame_id} buffer does not match {width}x{height}")]
    BadGeometry {
        frame_id: u64,
        width: u32,
        height: u32,
    },

    /// Replay file line is not valid JSON
    #[error("replay file {path:?} line {line}: {message}")]
    ReplayParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Capture queue closed by the consumer
    #[error("capture queue closed for source {source_name}")]
    ChannelClosed { source_name: String },

    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<IngestionError> for ContractError {
    fn from(err: IngestionError) -> Self {
        ContractError::capture("ingestion", err.to_string())
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
