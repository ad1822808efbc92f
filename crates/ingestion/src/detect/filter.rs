//! Class-name filter decorator.

use std::collections::HashSet;

use contracts::{ContractError, Detection, Detector, Frame};
use tracing::trace;

/// Keeps only detections whose label is in the configured class set
///
/// An empty class set passes everything through.
pub struct ClassFilter<D> {
    inner: D,
    classes: HashSet<String>,
}

impl<D: Detector> ClassFilter<D> {
    pub fn new(inner: D, classes: impl IntoIterator<Item = String>) -> Self {
        Self {
            inner,
            classes: classes.into_iter().collect(),
        }
    }

    fn accepts(&self, detection: &Detection) -> bool {
        self.classes.is_empty() || self.classes.contains(&detection.label)
    }
}

impl<D: Detector> Detector for ClassFilter<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, ContractError> {
        let raw = self.inner.detect(frame, confidence_threshold)?;
        let total = raw.len();
        let kept: Vec<Detection> = raw.into_iter().filter(|d| self.accepts(d)).collect();
        if kept.len() != total {
            trace!(frame_id = frame.frame_id, total, kept = kept.len(), "class filter applied");
        }
        Ok(kept)
    }
}
