//! Replay detector: detections recorded offline, one JSON object per line.
//!
//! ```text
//! {"frame_id": 12, "detections": [{"label": "weapon", "confidence": 0.81, "bbox": {"x1": 10, "y1": 20, "x2": 90, "y2": 140}}]}
//! ```
//!
//! Frames without a line have no detections.

use std::collections::HashMap;
use std::path::Path;

use contracts::{ContractError, Detection, Detector, Frame};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::IngestionError;

/// One line of a replay file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub frame_id: u64,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Replays recorded detections keyed by frame id
pub struct ReplayDetector {
    by_frame: HashMap<u64, Vec<Detection>>,
}

impl ReplayDetector {
    pub fn from_path(path: &Path) -> Result<Self, IngestionError> {
        let content = std::fs::read_to_string(path).map_err(|e| IngestionError::io(path, e))?;
        let detector = Self::parse(&content).map_err(|(line, message)| {
            IngestionError::ReplayParse {
                path: path.to_path_buf(),
                line,
                message,
            }
        })?;
        info!(
            path = %path.display(),
            frames = detector.by_frame.len(),
            "replay detections loaded"
        );
        Ok(detector)
    }

    /// Parse JSON lines; blank lines are skipped. Error carries the 1-based line.
    fn parse(content: &str) -> Result<Self, (usize, String)> {
        let mut by_frame: HashMap<u64, Vec<Detection>> = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: ReplayRecord =
                serde_json::from_str(line).map_err(|e| (idx + 1, e.to_string()))?;
            by_frame
                .entry(record.frame_id)
                .or_default()
                .extend(record.detections);
        }
        Ok(Self { by_frame })
    }

    pub fn from_records(records: impl IntoIterator<Item = ReplayRecord>) -> Self {
        let mut by_frame: HashMap<u64, Vec<Detection>> = HashMap::new();
        for record in records {
            by_frame
                .entry(record.frame_id)
                .or_default()
                .extend(record.detections);
        }
        Self { by_frame }
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        "replay"
    }

    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, ContractError> {
        Ok(self
            .by_frame
            .get(&frame.frame_id)
            .map(|detections| {
                detections
                    .iter()
                    .filter(|d| d.confidence >= confidence_threshold)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REPLAY: &str = r#"
{"frame_id": 1, "detections": [{"label": "weapon", "confidence": 0.8, "bbox": {"x1": 0, "y1": 0, "x2": 5, "y2": 5}}]}

{"frame_id": 2, "detections": [{"label": "weapon", "confidence": 0.3, "bbox": {"x1": 0, "y1": 0, "x2": 5, "y2": 5}}]}
"#;

    #[test]
    fn test_replay_by_frame_id_with_threshold() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REPLAY.as_bytes()).unwrap();
        let mut detector = ReplayDetector::from_path(file.path()).unwrap();

        let hit = detector.detect(&Frame::filled(1, 0.0, 1, 1, [0; 3]), 0.5).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].label, "weapon");

        let low = detector.detect(&Frame::filled(2, 0.0, 1, 1, [0; 3]), 0.5).unwrap();
        assert!(low.is_empty());

        let missing = detector.detect(&Frame::filled(9, 0.0, 1, 1, [0; 3]), 0.5).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"frame_id\": 1}\nnot json\n").unwrap();
        let err = ReplayDetector::from_path(file.path()).err().unwrap();
        assert!(matches!(err, IngestionError::ReplayParse { line: 2, .. }));
    }
}
