//! Capture, detection and render collaborator interfaces
//!
//! The driver owns one instance of each and calls them from a single task.

use crate::{ContractError, Detection, Frame};

/// Frame source trait
///
/// `Ok(None)` signals end of stream; `Err` is a capture failure.
#[trait_variant::make(FrameSource: Send)]
pub trait LocalFrameSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Acquire the next frame
    async fn next_frame(&mut self) -> Result<Option<Frame>, ContractError>;
}

/// Object detector
///
/// Detection is blocking; returned detections are already filtered by
/// `confidence_threshold`.
pub trait Detector: Send {
    fn name(&self) -> &str;

    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, ContractError>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, ContractError> {
        (**self).detect(frame, confidence_threshold)
    }
}

/// Display sink for annotated frames. Failures are non-fatal to the caller.
pub trait FrameRenderer: Send {
    fn name(&self) -> &str;

    fn render(&mut self, frame: &Frame) -> Result<(), ContractError>;
}

impl<R: FrameRenderer + ?Sized> FrameRenderer for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render(&mut self, frame: &Frame) -> Result<(), ContractError> {
        (**self).render(frame)
    }
}
