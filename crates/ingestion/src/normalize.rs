//! Frame normalization to the working resolution.

use contracts::{Frame, PixelFormat};
use image::{imageops, imageops::FilterType, RgbImage, RgbaImage};

use crate::IngestionError;

/// Resize to `width x height` RGB8
///
/// Frames already at the working geometry pass through without copying,
/// provided their buffer holds exactly `width * height * 3` bytes.
pub fn normalize(frame: Frame, width: u32, height: u32) -> Result<Frame, IngestionError> {
    if frame.format == PixelFormat::Rgb8 && frame.width == width && frame.height == height {
        if frame.data.len() != frame.expected_len() {
            return Err(IngestionError::BadGeometry {
                frame_id: frame.frame_id,
                width: frame.width,
                height: frame.height,
            });
        }
        return Ok(frame);
    }

    let rgb = to_rgb_image(&frame)?;
    let resized = if rgb.dimensions() == (width, height) {
        rgb
    } else {
        imageops::resize(&rgb, width, height, FilterType::Triangle)
    };

    Ok(Frame {
        frame_id: frame.frame_id,
        timestamp: frame.timestamp,
        width,
        height,
        format: PixelFormat::Rgb8,
        data: resized.into_raw().into(),
    })
}

fn to_rgb_image(frame: &Frame) -> Result<RgbImage, IngestionError> {
    let bad_geometry = || IngestionError::BadGeometry {
        frame_id: frame.frame_id,
        width: frame.width,
        height: frame.height,
    };

    match frame.format {
        PixelFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .ok_or_else(bad_geometry),
        PixelFormat::Rgba8 => {
            let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
                .ok_or_else(bad_geometry)?;
            Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_passthrough_shares_buffer() {
        let frame = Frame::filled(1, 0.0, 8, 4, [1, 2, 3]);
        let ptr = frame.data.as_ptr();
        let out = normalize(frame, 8, 4).unwrap();
        assert_eq!(out.data.as_ptr(), ptr);
    }

    #[test]
    fn test_resize_changes_geometry() {
        let frame = Frame::filled(3, 1.5, 8, 4, [100, 100, 100]);
        let out = normalize(frame, 4, 2).unwrap();
        assert_eq!((out.width, out.height), (4, 2));
        assert_eq!(out.data.len(), out.expected_len());
        assert_eq!(out.frame_id, 3);
        assert_eq!(out.timestamp, 1.5);
        assert_eq!(out.data[0], 100);
    }

    #[test]
    fn test_rgba_converted() {
        let frame = Frame {
            frame_id: 0,
            timestamp: 0.0,
            width: 1,
            height: 1,
            format: PixelFormat::Rgba8,
            data: Bytes::from_static(&[9, 8, 7, 255]),
        };
        let out = normalize(frame, 1, 1).unwrap();
        assert_eq!(out.format, PixelFormat::Rgb8);
        assert_eq!(&out.data[..], &[9, 8, 7]);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let frame = Frame {
            frame_id: 5,
            timestamp: 0.0,
            width: 2,
            height: 2,
            format: PixelFormat::Rgb8,
            data: Bytes::from_static(&[0; 5]),
        };
        assert!(matches!(
            normalize(frame, 4, 4),
            Err(IngestionError::BadGeometry { frame_id: 5, .. })
        ));
    }

    #[test]
    fn test_wrong_length_at_working_geometry_rejected() {
        let frame = |len: usize| Frame {
            frame_id: 6,
            timestamp: 0.0,
            width: 2,
            height: 2,
            format: PixelFormat::Rgb8,
            data: Bytes::from(vec![0u8; len]),
        };
        for len in [11, 13] {
            assert!(matches!(
                normalize(frame(len), 2, 2),
                Err(IngestionError::BadGeometry { frame_id: 6, .. })
            ));
        }
        assert!(normalize(frame(12), 2, 2).is_ok());
    }
}
