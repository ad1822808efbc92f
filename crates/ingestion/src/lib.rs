//! # Ingestion
//!
//! Frame capture and detection inputs.
//!
//! Responsibilities:
//! - Capture sources (synthetic mock, image directory)
//! - Normalization to the working resolution
//! - Optional bounded capture queue with drop policy
//! - Shipped detectors (null, scripted, replay) and the class filter
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::FrameSource;
//! use ingestion::{build_detector, normalize, AnySource};
//!
//! let mut source = AnySource::from_blueprint(&blueprint)?;
//! let mut detector = build_detector(&blueprint.detection)?;
//! while let Some(frame) = source.next_frame().await? {
//!     let frame = normalize(frame, blueprint.frame.width, blueprint.frame.height)?;
//!     let detections = detector.detect(&frame, blueprint.detection.confidence_threshold)?;
//! }
//! ```

mod config;
mod detect;
mod error;
mod normalize;
mod queue;
mod source;

// Re-exports
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use detect::{
    build_detector, ClassFilter, NullDetector, ReplayDetector, ReplayRecord, ScriptedDetector,
};
pub use error::{IngestionError, Result};
pub use normalize::normalize;
pub use queue::{CaptureQueue, QueuedSource};
pub use source::{AnySource, ImageDirSource, MockFrameSource, MockSourceConfig};
