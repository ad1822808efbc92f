//! Capture sources

mod image_dir;
mod mock;

use contracts::{ContractError, Frame, FrameSource, RecorderBlueprint, SourceKind};

pub use image_dir::ImageDirSource;
pub use mock::{MockFrameSource, MockSourceConfig};

use crate::queue::{CaptureQueue, QueuedSource};
use crate::{BackpressureConfig, IngestionError};

/// Any configured capture source
///
/// `FrameSource` is not object safe, so configured sources are dispatched
/// through this enum.
pub enum AnySource {
    Mock(MockFrameSource),
    ImageDir(ImageDirSource),
    Queued(QueuedSource),
}

impl AnySource {
    /// Build the source described by the blueprint
    ///
    /// With a `[source.queue]` section the source runs on its own task
    /// behind a bounded capture queue; this requires a tokio runtime.
    pub fn from_blueprint(blueprint: &RecorderBlueprint) -> Result<Self, IngestionError> {
        let direct = Self::direct(blueprint)?;
        match &blueprint.source.queue {
            Some(queue) => {
                let config = BackpressureConfig::from(queue);
                let queued = match direct {
                    AnySource::Mock(source) => CaptureQueue::spawn(source, config),
                    AnySource::ImageDir(source) => CaptureQueue::spawn(source, config),
                    AnySource::Queued(source) => return Ok(AnySource::Queued(source)),
                };
                Ok(AnySource::Queued(queued))
            }
            None => Ok(direct),
        }
    }

    fn direct(blueprint: &RecorderBlueprint) -> Result<Self, IngestionError> {
        let source = &blueprint.source;
        let frame = &blueprint.frame;
        match source.kind {
            SourceKind::Mock => Ok(AnySource::Mock(MockFrameSource::new(MockSourceConfig {
                width: frame.width,
                height: frame.height,
                fps: frame.fps,
                frame_count: source.mock_frames,
                pace: source.pace,
            }))),
            SourceKind::ImageDir => {
                let path = source.path.clone().ok_or_else(|| IngestionError::EmptyDirectory {
                    path: Default::default(),
                })?;
                Ok(AnySource::ImageDir(ImageDirSource::open(
                    path,
                    frame.fps,
                    source.loop_playback,
                    source.pace,
                )?))
            }
        }
    }
}

impl FrameSource for AnySource {
    fn name(&self) -> &str {
        match self {
            AnySource::Mock(source) => source.name(),
            AnySource::ImageDir(source) => source.name(),
            AnySource::Queued(source) => source.name(),
        }
    }

    async fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        match self {
            AnySource::Mock(source) => source.next_frame().await,
            AnySource::ImageDir(source) => source.next_frame().await,
            AnySource::Queued(source) => source.next_frame().await,
        }
    }
}
