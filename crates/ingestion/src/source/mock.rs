//! Synthetic frame source for runs without a camera.

use std::time::Duration;

use bytes::Bytes;
use contracts::{ContractError, Frame, FrameSource, PixelFormat};
use tracing::{debug, trace};

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,

    /// Frames to produce (None = endless)
    pub frame_count: Option<u64>,

    /// Sleep `1 / fps` between frames
    pub pace: bool,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            fps: 10,
            frame_count: Some(100),
            pace: false,
        }
    }
}

/// Mock frame source
///
/// Emits a dark background with a bright square sweeping left to right.
/// Timestamps are `frame_id / fps`, independent of wall time.
pub struct MockFrameSource {
    config: MockSourceConfig,
    next_id: u64,
}

impl MockFrameSource {
    pub fn new(config: MockSourceConfig) -> Self {
        debug!(
            width = config.width,
            height = config.height,
            fps = config.fps,
            frame_count = ?config.frame_count,
            "mock frame source created"
        );
        Self { config, next_id: 0 }
    }

    fn render(&self, frame_id: u64) -> Bytes {
        let MockSourceConfig { width, height, .. } = self.config;
        let mut data = vec![24u8; width as usize * height as usize * 3];

        let side = (width.min(height) / 4).max(1);
        let span = width.saturating_sub(side).max(1);
        let x0 = (frame_id % u64::from(span)) as u32;
        let y0 = height.saturating_sub(side) / 2;

        for y in y0..(y0 + side).min(height) {
            for x in x0..(x0 + side).min(width) {
                let idx = (y as usize * width as usize + x as usize) * 3;
                data[idx..idx + 3].copy_from_slice(&[230, 230, 230]);
            }
        }
        Bytes::from(data)
    }
}

impl FrameSource for MockFrameSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        if let Some(limit) = self.config.frame_count {
            if self.next_id >= limit {
                debug!(frames = self.next_id, "mock frame source exhausted");
                return Ok(None);
            }
        }

        let fps = self.config.fps.max(1);
        if self.config.pace && self.next_id > 0 {
            tokio::time::sleep(Duration::from_secs_f64(1.0 / f64::from(fps))).await;
        }

        let frame_id = self.next_id;
        self.next_id += 1;

        let frame = Frame {
            frame_id,
            timestamp: frame_id as f64 / f64::from(fps),
            width: self.config.width,
            height: self.config.height,
            format: PixelFormat::Rgb8,
            data: self.render(frame_id),
        };
        trace!(frame_id, timestamp = frame.timestamp, "mock frame produced");
        Ok(Some(frame))
    }
}
