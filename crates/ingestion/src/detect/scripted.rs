//! Scripted detector: presence inside configured time intervals.

use contracts::{BoundingBox, ContractError, Detection, Detector, Frame, ScriptedInterval};

const SCRIPTED_CONFIDENCE: f32 = 0.9;

/// Reports one centered detection whenever the frame timestamp falls inside
/// a configured interval
pub struct ScriptedDetector {
    intervals: Vec<ScriptedInterval>,
    label: String,
}

impl ScriptedDetector {
    pub fn new(intervals: Vec<ScriptedInterval>, label: impl Into<String>) -> Self {
        Self {
            intervals,
            label: label.into(),
        }
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, ContractError> {
        let active = self.intervals.iter().any(|i| i.contains(frame.timestamp));
        if !active || SCRIPTED_CONFIDENCE < confidence_threshold {
            return Ok(Vec::new());
        }

        let (w, h) = (frame.width as f32, frame.height as f32);
        let bbox = BoundingBox::new(w * 0.25, h * 0.25, w * 0.75, h * 0.75);
        Ok(vec![Detection::new(
            self.label.clone(),
            SCRIPTED_CONFIDENCE,
            bbox,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_inside_intervals_only() {
        let mut detector = ScriptedDetector::new(
            vec![
                ScriptedInterval {
                    start_s: 1.0,
                    end_s: 2.0,
                },
                ScriptedInterval {
                    start_s: 5.0,
                    end_s: 6.0,
                },
            ],
            "weapon",
        );

        let hits: Vec<bool> = [0.5, 1.0, 1.5, 2.0, 5.5, 6.0]
            .iter()
            .map(|&t| {
                let frame = Frame::filled(0, t, 8, 8, [0, 0, 0]);
                !detector.detect(&frame, 0.5).unwrap().is_empty()
            })
            .collect();
        assert_eq!(hits, vec![false, true, true, false, true, false]);
    }

    #[test]
    fn test_threshold_above_confidence_suppresses() {
        let mut detector = ScriptedDetector::new(
            vec![ScriptedInterval {
                start_s: 0.0,
                end_s: 10.0,
            }],
            "weapon",
        );
        let frame = Frame::filled(0, 1.0, 8, 8, [0, 0, 0]);
        assert!(detector.detect(&frame, 0.95).unwrap().is_empty());
        let found = detector.detect(&frame, 0.5).unwrap();
        assert_eq!(found[0].bbox, BoundingBox::new(2.0, 2.0, 6.0, 6.0));
    }
}
