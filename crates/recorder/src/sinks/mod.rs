//! Recording sinks

mod ffmpeg;
mod frame_dir;

use std::path::{Path, PathBuf};

use contracts::{
    ContractError, Frame, RecordingConfig, RecordingSinkKind, SinkFactory, StreamSpec, VideoSink,
};

pub use ffmpeg::{encoder_args, FfmpegSink, FfmpegSinkFactory};
pub use frame_dir::{FrameDirSink, FrameDirSinkFactory, SessionManifest};

/// Configured sink factory
pub enum AnySinkFactory {
    Ffmpeg(FfmpegSinkFactory),
    FrameDir(FrameDirSinkFactory),
}

impl AnySinkFactory {
    pub fn from_config(config: &RecordingConfig) -> Self {
        match config.sink {
            RecordingSinkKind::Ffmpeg => Self::Ffmpeg(FfmpegSinkFactory::new(config.ffmpeg.clone())),
            RecordingSinkKind::FrameDir => Self::FrameDir(FrameDirSinkFactory),
        }
    }
}

/// Sink produced by `AnySinkFactory`
pub enum AnySink {
    Ffmpeg(FfmpegSink),
    FrameDir(FrameDirSink),
}

impl SinkFactory for AnySinkFactory {
    type Sink = AnySink;

    fn extension(&self) -> &str {
        match self {
            AnySinkFactory::Ffmpeg(f) => f.extension(),
            AnySinkFactory::FrameDir(f) => f.extension(),
        }
    }

    async fn create(&self, path: PathBuf, spec: &StreamSpec) -> Result<AnySink, ContractError> {
        match self {
            AnySinkFactory::Ffmpeg(f) => f.create(path, spec).await.map(AnySink::Ffmpeg),
            AnySinkFactory::FrameDir(f) => f.create(path, spec).await.map(AnySink::FrameDir),
        }
    }
}

impl VideoSink for AnySink {
    fn name(&self) -> &str {
        match self {
            AnySink::Ffmpeg(s) => s.name(),
            AnySink::FrameDir(s) => s.name(),
        }
    }

    fn path(&self) -> &Path {
        match self {
            AnySink::Ffmpeg(s) => s.path(),
            AnySink::FrameDir(s) => s.path(),
        }
    }

    async fn write(&mut self, frame: &Frame) -> Result<(), ContractError> {
        match self {
            AnySink::Ffmpeg(s) => s.write(frame).await,
            AnySink::FrameDir(s) => s.write(frame).await,
        }
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        match self {
            AnySink::Ffmpeg(s) => s.flush().await,
            AnySink::FrameDir(s) => s.flush().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            AnySink::Ffmpeg(s) => s.close().await,
            AnySink::FrameDir(s) => s.close().await,
        }
    }
}
