//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the
//! frame and detection data model, the incident state vocabulary, the
//! collaborator traits (capture, detection, rendering, recording sinks,
//! notification) and the `RecorderBlueprint` configuration.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frame timestamps are seconds (f64) on the capture source's clock
//! - `frame_id` is monotonic per source, used for ordering/diagnostics
//! - Recording file names use the wall clock at recording start

mod blueprint;
mod detection;
mod error;
mod frame;
mod incident;
mod notify;
mod sink;
mod source;

pub use blueprint::*;
pub use detection::*;
pub use error::*;
pub use frame::*;
pub use incident::*;
pub use notify::*;
pub use sink::*;
pub use source::*;
