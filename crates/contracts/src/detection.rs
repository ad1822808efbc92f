//! Detection - detector output

use serde::{Deserialize, Serialize};

/// Axis-aligned box in frame pixel coordinates (x1,y1 top-left; x2,y2 bottom-right)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Scale coordinates, used when a frame is resized after detection input
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }
}

/// A single detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label as reported by the model
    pub label: String,

    /// Confidence in [0, 1]
    pub confidence: f32,

    /// Bounding box in pixels
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Overlay caption, e.g. `weapon 0.87`
    pub fn caption(&self) -> String {
        format!("{} {:.2}", self.label, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_format() {
        let det = Detection::new("weapon", 0.8712, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(det.caption(), "weapon 0.87");
    }

    #[test]
    fn test_inverted_box_has_zero_extent() {
        let bbox = BoundingBox::new(10.0, 10.0, 5.0, 20.0);
        assert_eq!(bbox.width(), 0.0);
        assert_eq!(bbox.height(), 10.0);
    }
}
