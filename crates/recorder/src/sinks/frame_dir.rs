//! FrameDirSink - one PNG per frame plus a session manifest

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, Frame, PixelFormat, SinkFactory, StreamSpec, VideoSink};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

/// Written to `session.json` on close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frames: u64,
    pub first_frame_id: Option<u64>,
    pub last_frame_id: Option<u64>,
    pub first_timestamp: Option<f64>,
    pub last_timestamp: Option<f64>,
}

impl SessionManifest {
    pub const FILE_NAME: &'static str = "session.json";

    /// Read the manifest of a finished session directory
    pub fn read(dir: &Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(dir.join(Self::FILE_NAME))?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Sink that writes frames to a directory
pub struct FrameDirSink {
    name: String,
    dir: PathBuf,
    manifest: SessionManifest,
    closed: bool,
}

impl FrameDirSink {
    /// Create the session directory
    pub fn create(dir: PathBuf, spec: &StreamSpec) -> std::io::Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self {
            name: "frame_dir".to_string(),
            dir,
            manifest: SessionManifest {
                width: spec.width,
                height: spec.height,
                fps: spec.fps,
                frames: 0,
                first_frame_id: None,
                last_frame_id: None,
                first_timestamp: None,
                last_timestamp: None,
            },
            closed: false,
        })
    }

    fn save_frame(&self, frame: &Frame) -> std::io::Result<()> {
        let path = self.dir.join(format!("{:06}.png", self.manifest.frames));
        let color = match frame.format {
            PixelFormat::Rgb8 => image::ColorType::Rgb8,
            PixelFormat::Rgba8 => image::ColorType::Rgba8,
        };
        image::save_buffer(path, &frame.data, frame.width, frame.height, color)
            .map_err(std::io::Error::other)
    }

    fn persist_frame(&mut self, frame: &Frame) -> Result<(), ContractError> {
        if self.closed {
            return Err(ContractError::sink_write(&self.name, "sink already closed"));
        }
        self.save_frame(frame).map_err(|e| {
            error!(sink = %self.name, frame_id = frame.frame_id, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;

        let manifest = &mut self.manifest;
        manifest.frames += 1;
        manifest.first_frame_id.get_or_insert(frame.frame_id);
        manifest.first_timestamp.get_or_insert(frame.timestamp);
        manifest.last_frame_id = Some(frame.frame_id);
        manifest.last_timestamp = Some(frame.timestamp);
        Ok(())
    }

    fn write_manifest(&self) -> std::io::Result<()> {
        let file = fs::File::create(self.dir.join(SessionManifest::FILE_NAME))?;
        serde_json::to_writer_pretty(file, &self.manifest)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl VideoSink for FrameDirSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.dir
    }

    #[instrument(
        name = "frame_dir_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame_id = frame.frame_id)
    )]
    async fn write(&mut self, frame: &Frame) -> Result<(), ContractError> {
        self.persist_frame(frame)
    }

    #[instrument(name = "frame_dir_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "frame_dir_sink_close", skip(self), fields(path = %self.dir.display()))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.write_manifest()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        debug!(sink = %self.name, frames = self.manifest.frames, "FrameDirSink closed");
        Ok(())
    }
}

/// Factory for `FrameDirSink`
#[derive(Debug, Clone, Default)]
pub struct FrameDirSinkFactory;

impl SinkFactory for FrameDirSinkFactory {
    type Sink = FrameDirSink;

    fn extension(&self) -> &str {
        ""
    }

    async fn create(&self, path: PathBuf, spec: &StreamSpec) -> Result<FrameDirSink, ContractError> {
        FrameDirSink::create(path, spec)
            .map_err(|e| ContractError::sink_create("frame_dir", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn spec() -> StreamSpec {
        StreamSpec {
            width: 4,
            height: 2,
            fps: 10,
            format: PixelFormat::Rgb8,
        }
    }

    #[tokio::test]
    async fn test_frame_dir_sink_write_and_manifest() {
        let dir = tempdir().unwrap();
        let session_dir = dir.path().join("incident_1");

        let mut sink = FrameDirSinkFactory
            .create(session_dir.clone(), &spec())
            .await
            .unwrap();
        for id in 5..8 {
            sink.write(&Frame::filled(id, id as f64 / 10.0, 4, 2, [1, 2, 3]))
                .await
                .unwrap();
        }
        sink.flush().await.unwrap();
        sink.close().await.unwrap();

        assert!(session_dir.join("000000.png").exists());
        assert!(session_dir.join("000002.png").exists());

        let manifest = SessionManifest::read(&session_dir).unwrap();
        assert_eq!(manifest.frames, 3);
        assert_eq!(manifest.first_frame_id, Some(5));
        assert_eq!(manifest.last_frame_id, Some(7));
        assert_eq!(manifest.fps, 10);
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = FrameDirSink::create(dir.path().join("s"), &spec()).unwrap();
        sink.close().await.unwrap();
        let result = sink.write(&Frame::filled(0, 0.0, 4, 2, [0; 3])).await;
        assert!(matches!(result, Err(ContractError::SinkWrite { .. })));
    }
}
