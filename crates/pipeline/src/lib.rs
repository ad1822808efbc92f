//! # Pipeline
//!
//! Frame pipeline driver for the incident recorder.
//!
//! One task owns the ring buffer, state machine and recording session and
//! runs them once per captured frame. Subscriber refresh is scheduled
//! cooperatively and only enqueued to the notifier.

mod driver;
mod error;
mod periodic;
mod stats;

pub use driver::{FramePipeline, PipelineLimits};
pub use error::PipelineError;
pub use periodic::PeriodicTask;
pub use stats::{PipelineStats, StopReason, MAX_RECORDING_HISTORY};
