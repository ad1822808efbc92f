//! Per-frame detection signal reduction. Stateless.

use contracts::Detection;

/// Presence signal for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalReading {
    /// At least one target detection in this frame
    pub present: bool,

    /// Detections to draw on the display copy
    pub annotations: Vec<Detection>,

    /// Highest confidence among `annotations`
    pub max_confidence: Option<f32>,
}

/// Collapse filtered detections into a presence signal
///
/// Input is already filtered by confidence threshold and class.
pub fn reduce(detections: Vec<Detection>) -> SignalReading {
    let max_confidence = detections
        .iter()
        .map(|d| d.confidence)
        .reduce(f32::max);

    SignalReading {
        present: !detections.is_empty(),
        annotations: detections,
        max_confidence,
    }
}
