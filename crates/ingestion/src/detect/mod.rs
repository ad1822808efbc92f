//! Shipped detectors
//!
//! The object-detection model is an external collaborator; these cover
//! offline replay, scripted scenarios and a detector that never fires.

mod filter;
mod replay;
mod scripted;

use contracts::{ContractError, DetectionConfig, Detection, Detector, DetectorBackend, Frame};

pub use filter::ClassFilter;
pub use replay::{ReplayDetector, ReplayRecord};
pub use scripted::ScriptedDetector;

use crate::IngestionError;

/// Detector that reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetector;

impl Detector for NullDetector {
    fn name(&self) -> &str {
        "null"
    }

    fn detect(&mut self, _frame: &Frame, _threshold: f32) -> Result<Vec<Detection>, ContractError> {
        Ok(Vec::new())
    }
}

/// Build the configured detector wrapped in the class filter
pub fn build_detector(config: &DetectionConfig) -> Result<Box<dyn Detector>, IngestionError> {
    let inner: Box<dyn Detector> = match config.backend {
        DetectorBackend::None => Box::new(NullDetector),
        DetectorBackend::Scripted => Box::new(ScriptedDetector::new(
            config.scripted.clone(),
            config.label.clone(),
        )),
        DetectorBackend::Replay => {
            let path = config
                .replay_path
                .as_deref()
                .ok_or_else(|| IngestionError::ReplayParse {
                    path: Default::default(),
                    line: 0,
                    message: "replay_path is not set".to_string(),
                })?;
            Box::new(ReplayDetector::from_path(path)?)
        }
    };
    Ok(Box::new(ClassFilter::new(inner, config.class_names.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ScriptedInterval;

    #[test]
    fn test_build_scripted_detector_applies_class_filter() {
        let config = DetectionConfig {
            backend: DetectorBackend::Scripted,
            class_names: vec!["weapon".into()],
            scripted: vec![ScriptedInterval {
                start_s: 0.0,
                end_s: 10.0,
            }],
            label: "person".into(),
            ..DetectionConfig::default()
        };
        let mut detector = build_detector(&config).unwrap();
        let frame = Frame::filled(0, 1.0, 10, 10, [0, 0, 0]);
        assert!(detector.detect(&frame, 0.5).unwrap().is_empty());
    }

    #[test]
    fn test_build_null_detector() {
        let mut detector = build_detector(&DetectionConfig::default()).unwrap();
        let frame = Frame::filled(0, 0.0, 2, 2, [0, 0, 0]);
        assert!(detector.detect(&frame, 0.0).unwrap().is_empty());
    }
}
