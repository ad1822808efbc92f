//! Frames from an ordered directory of image files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use contracts::{ContractError, Frame, FrameSource, PixelFormat};
use tracing::{debug, info, instrument};

use crate::IngestionError;

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Image directory source
///
/// Files are read in lexicographic order. Timestamps advance by `1 / fps`
/// per frame and keep increasing across loop restarts.
pub struct ImageDirSource {
    name: String,
    files: Vec<PathBuf>,
    cursor: usize,
    next_id: u64,
    fps: u32,
    loop_playback: bool,
    pace: bool,
}

impl ImageDirSource {
    #[instrument(name = "image_dir_open", skip_all, fields(path = %dir.as_ref().display()))]
    pub fn open(
        dir: impl AsRef<Path>,
        fps: u32,
        loop_playback: bool,
        pace: bool,
    ) -> Result<Self, IngestionError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| IngestionError::io(dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| IngestionError::io(dir, e))?.path();
            if is_supported(&path) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(IngestionError::EmptyDirectory {
                path: dir.to_path_buf(),
            });
        }
        info!(count = files.len(), "image directory source opened");

        Ok(Self {
            name: format!("image_dir:{}", dir.display()),
            files,
            cursor: 0,
            next_id: 0,
            fps: fps.max(1),
            loop_playback,
            pace,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn decode(&self, path: &Path, frame_id: u64) -> Result<Frame, IngestionError> {
        let image = image::open(path).map_err(|e| IngestionError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        Ok(Frame {
            frame_id,
            timestamp: frame_id as f64 / f64::from(self.fps),
            width,
            height,
            format: PixelFormat::Rgb8,
            data: rgb.into_raw().into(),
        })
    }
}

fn is_supported(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        if self.cursor >= self.files.len() {
            if !self.loop_playback {
                debug!(frames = self.next_id, "image directory exhausted");
                return Ok(None);
            }
            self.cursor = 0;
        }

        if self.pace && self.next_id > 0 {
            tokio::time::sleep(Duration::from_secs_f64(1.0 / f64::from(self.fps))).await;
        }

        let path = self.files[self.cursor].clone();
        let frame = self.decode(&path, self.next_id)?;
        self.cursor += 1;
        self.next_id += 1;
        Ok(Some(frame))
    }
}
