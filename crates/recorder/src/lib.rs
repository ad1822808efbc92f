//! # Recorder
//!
//! Recording side of the incident pipeline.
//!
//! - `RecordingSessionManager`: one session per incident, pre-roll + live frames
//! - Sinks: ffmpeg encoder process or PNG frame directory
//! - Overlay and preview rendering for the operator view

mod error;
mod overlay;
mod render;
mod session;
mod sinks;

pub use error::RecorderError;
pub use overlay::annotate;
pub use render::{build_renderer, NullRenderer, PreviewRenderer};
pub use session::{RecordingSessionManager, RecordingSummary, SessionMessages};
pub use sinks::{
    encoder_args, AnySink, AnySinkFactory, FfmpegSink, FfmpegSinkFactory, FrameDirSink,
    FrameDirSinkFactory, SessionManifest,
};
