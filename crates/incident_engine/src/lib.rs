//! # Incident Engine
//!
//! Pure, synchronous per-frame core of the recorder.
//!
//! Responsible for:
//! - Rolling pre-roll reservoir (`FrameRingBuffer`)
//! - Collapsing detections into a presence signal (`reduce`)
//! - Debounced Idle / Triggering / Recording decisions (`IncidentStateMachine`)
//!
//! ## Usage
//!
//! ```ignore
//! use incident_engine::{reduce, FrameRingBuffer, IncidentStateMachine};
//!
//! let mut ring = FrameRingBuffer::new(blueprint.buffer_capacity());
//! let mut machine = IncidentStateMachine::new(&blueprint.incident);
//!
//! ring.push(frame.clone());
//! let reading = reduce(detections);
//! if let Some(action) = machine.update(reading.present, frame.timestamp) {
//!     // start or stop the recording session
//! }
//! ```

mod buffer;
mod machine;
mod reducer;

pub use buffer::FrameRingBuffer;
pub use contracts::{IncidentAction, IncidentConfig, IncidentState};
pub use machine::IncidentStateMachine;
pub use reducer::{reduce, SignalReading};
