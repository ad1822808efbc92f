//! VideoSink trait - recording output interface
//!
//! Defines the abstract interface for recording sinks and the factory the
//! session manager uses to open one per incident.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ContractError, Frame, PixelFormat};

/// Geometry and rate of the stream written to a sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: PixelFormat,
}

/// Video output trait
///
/// All recording sink implementations must implement this trait.
#[trait_variant::make(VideoSink: Send)]
pub trait LocalVideoSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Artifact location
    fn path(&self) -> &Path;

    /// Append one frame
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, frame: &Frame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Finalize the artifact. Must be called exactly once.
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Opens a fresh sink per recording session
pub trait SinkFactory: Send + Sync {
    type Sink: VideoSink;

    /// File extension of produced artifacts (empty for directories)
    fn extension(&self) -> &str;

    fn create(
        &self,
        path: PathBuf,
        spec: &StreamSpec,
    ) -> impl Future<Output = Result<Self::Sink, ContractError>> + Send;
}
