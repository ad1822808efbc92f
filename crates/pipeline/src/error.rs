//! Pipeline error types

use contracts::ContractError;
use ingestion::IngestionError;
use thiserror::Error;

/// Errors that end a pipeline run
///
/// Any open recording session is finalized before one of these is returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Frame source failed
    #[error("capture failed: {0}")]
    Capture(#[source] ContractError),

    /// Frame could not be brought to the working resolution
    #[error("frame {frame_id} could not be normalized: {source}")]
    Normalize {
        frame_id: u64,
        #[source]
        source: IngestionError,
    },

    /// Detector failed and errors are not tolerated
    #[error("detection failed on frame {frame_id}: {source}")]
    Detection {
        frame_id: u64,
        #[source]
        source: ContractError,
    },
}

impl PipelineError {
    /// Frame the error occurred on, if any
    pub fn frame_id(&self) -> Option<u64> {
        match self {
            PipelineError::Capture(_) => None,
            PipelineError::Normalize { frame_id, .. } | PipelineError::Detection { frame_id, .. } => {
                Some(*frame_id)
            }
        }
    }
}
