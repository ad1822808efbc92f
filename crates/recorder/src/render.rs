//! Renderers for annotated frames

use std::path::PathBuf;

use contracts::{ContractError, Frame, FrameRenderer, PixelFormat, RenderConfig, RenderKind};
use tracing::debug;

/// Discards frames
#[derive(Debug, Default)]
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn name(&self) -> &str {
        "null"
    }

    fn render(&mut self, _frame: &Frame) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Keeps the latest annotated frame in an image file
///
/// The file is replaced atomically (write to a sibling, then rename) so a
/// viewer never sees a half-written image.
#[derive(Debug)]
pub struct PreviewRenderer {
    path: PathBuf,
    every_n_frames: u64,
    seen: u64,
}

impl PreviewRenderer {
    pub fn new(path: PathBuf, every_n_frames: u64) -> Self {
        Self {
            path,
            every_n_frames: every_n_frames.max(1),
            seen: 0,
        }
    }

    fn write(&self, frame: &Frame) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let color = match frame.format {
            PixelFormat::Rgb8 => image::ColorType::Rgb8,
            PixelFormat::Rgba8 => image::ColorType::Rgba8,
        };
        let format = image::ImageFormat::from_path(&self.path).unwrap_or(image::ImageFormat::Png);
        image::save_buffer_with_format(
            &staging,
            &frame.data,
            frame.width,
            frame.height,
            color,
            format,
        )
        .map_err(std::io::Error::other)?;
        std::fs::rename(&staging, &self.path)
    }
}

impl FrameRenderer for PreviewRenderer {
    fn name(&self) -> &str {
        "preview"
    }

    fn render(&mut self, frame: &Frame) -> Result<(), ContractError> {
        let due = self.seen % self.every_n_frames == 0;
        self.seen += 1;
        if !due {
            return Ok(());
        }
        self.write(frame)
            .map_err(|e| ContractError::render(self.name(), e.to_string()))?;
        debug!(frame_id = frame.frame_id, path = %self.path.display(), "preview updated");
        Ok(())
    }
}

/// Build the configured renderer
pub fn build_renderer(config: &RenderConfig) -> Box<dyn FrameRenderer> {
    match config.kind {
        RenderKind::None => Box::new(NullRenderer),
        RenderKind::Preview => Box::new(PreviewRenderer::new(
            config.preview_path.clone(),
            config.every_n_frames,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_written_every_n_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.png");
        let mut renderer = PreviewRenderer::new(path.clone(), 2);

        renderer.render(&Frame::filled(0, 0.0, 2, 2, [10, 10, 10])).unwrap();
        let first = image::open(&path).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(0, 0).0, [10, 10, 10]);

        // Skipped frame leaves the file alone
        renderer.render(&Frame::filled(1, 0.1, 2, 2, [20, 20, 20])).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8().get_pixel(0, 0).0, [10, 10, 10]);

        renderer.render(&Frame::filled(2, 0.2, 2, 2, [30, 30, 30])).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8().get_pixel(0, 0).0, [30, 30, 30]);
    }

    #[test]
    fn test_unwritable_preview_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let mut renderer = PreviewRenderer::new(blocker.join("preview.png"), 1);
        let result = renderer.render(&Frame::filled(0, 0.0, 1, 1, [0; 3]));
        assert!(matches!(result, Err(ContractError::Render { .. })));
    }
}
