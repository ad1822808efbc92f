//! Frame - capture output
//!
//! A single video frame as produced by a `FrameSource`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Pixel layout of `Frame::data`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    #[default]
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Video frame
///
/// Pixel data is immutable and reference counted, so cloning a frame into the
/// ring buffer or a recording sink never aliases a frame the driver mutates:
/// overlays are drawn on an owned copy (see `Frame::to_pixels`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonic sequence number assigned by the source
    pub frame_id: u64,

    /// Capture timestamp (seconds, source clock)
    pub timestamp: f64,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel layout
    pub format: PixelFormat,

    /// Row-major pixel data, no padding
    pub data: Bytes,
}

impl Frame {
    /// Create a frame, checking that `data` matches the declared geometry
    pub fn new(
        frame_id: u64,
        timestamp: f64,
        width: u32,
        height: u32,
        format: PixelFormat,
        data: impl Into<Bytes>,
    ) -> Result<Self, ContractError> {
        let frame = Self {
            frame_id,
            timestamp,
            width,
            height,
            format,
            data: data.into(),
        };
        let expected = frame.expected_len();
        if frame.data.len() != expected {
            return Err(ContractError::MalformedFrame {
                frame_id,
                expected,
                actual: frame.data.len(),
            });
        }
        Ok(frame)
    }

    /// Solid-color frame (tests and synthetic sources)
    pub fn filled(
        frame_id: u64,
        timestamp: f64,
        width: u32,
        height: u32,
        rgb: [u8; 3],
    ) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            frame_id,
            timestamp,
            width,
            height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(data),
        }
    }

    /// Byte length implied by width, height and format
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Owned copy of the pixel data, safe to mutate
    pub fn to_pixels(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Same frame metadata with replaced pixel data
    pub fn with_pixels(&self, pixels: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(pixels),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = Frame::new(7, 0.0, 2, 2, PixelFormat::Rgb8, vec![0u8; 11]);
        assert!(matches!(
            result,
            Err(ContractError::MalformedFrame {
                frame_id: 7,
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn test_filled_frame_geometry() {
        let frame = Frame::filled(1, 0.5, 4, 3, [10, 20, 30]);
        assert_eq!(frame.data.len(), frame.expected_len());
        assert_eq!(&frame.data[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_with_pixels_does_not_touch_original() {
        let frame = Frame::filled(1, 0.0, 1, 1, [1, 2, 3]);
        let mut pixels = frame.to_pixels();
        pixels[0] = 255;
        let annotated = frame.with_pixels(pixels);
        assert_eq!(frame.data[0], 1);
        assert_eq!(annotated.data[0], 255);
        assert_eq!(annotated.frame_id, frame.frame_id);
    }
}
