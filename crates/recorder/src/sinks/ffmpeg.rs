//! FfmpegSink - raw frames piped into an ffmpeg child process

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use contracts::{
    ContractError, FfmpegConfig, Frame, PixelFormat, SinkFactory, StreamSpec, VideoSink,
};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::RecorderError;

/// Encoder diagnostics kept for the error message
const STDERR_TAIL_LINES: usize = 20;

/// Sink that encodes frames to mp4 through ffmpeg
pub struct FfmpegSink {
    name: String,
    path: PathBuf,
    spec: StreamSpec,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    /// Drains stderr while frames are written, yields the last lines
    stderr_task: Option<JoinHandle<String>>,
    frames_written: u64,
}

impl FfmpegSink {
    /// Spawn ffmpeg reading rawvideo from stdin
    pub fn spawn(
        config: &FfmpegConfig,
        path: PathBuf,
        spec: &StreamSpec,
    ) -> Result<Self, RecorderError> {
        let args = encoder_args(config, &path, spec);
        debug!(binary = %config.binary.display(), args = ?args, "spawning encoder");

        let mut child = Command::new(&config.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RecorderError::sink_creation(
                    "ffmpeg",
                    format!("failed to spawn {}: {e}", config.binary.display()),
                )
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RecorderError::sink_creation("ffmpeg", "encoder stdin unavailable"))?;
        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(drain_stderr(stderr, STDERR_TAIL_LINES)));

        info!(path = %path.display(), width = spec.width, height = spec.height, fps = spec.fps, "encoder started");

        Ok(Self {
            name: "ffmpeg".to_string(),
            path,
            spec: *spec,
            child: Some(child),
            stdin: Some(stdin),
            stderr_task,
            frames_written: 0,
        })
    }

    fn check_geometry(&self, frame: &Frame) -> Result<(), RecorderError> {
        if frame.width != self.spec.width
            || frame.height != self.spec.height
            || frame.format != self.spec.format
        {
            return Err(RecorderError::GeometryMismatch {
                frame_id: frame.frame_id,
                width: frame.width,
                height: frame.height,
                expected_width: self.spec.width,
                expected_height: self.spec.height,
            });
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), RecorderError> {
        // Closing stdin signals end of input
        if let Some(mut stdin) = self.stdin.take() {
            stdin.shutdown().await?;
        }
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().await?;
        let stderr = match self.stderr_task.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };
        if !status.success() {
            return Err(RecorderError::EncoderFailed {
                status: status.to_string(),
                stderr,
            });
        }
        Ok(())
    }
}

/// Read encoder stderr to the end so the pipe never fills, logging each line
///
/// Returns the last `keep` lines joined by newlines.
async fn drain_stderr<R: AsyncRead + Unpin>(reader: R, keep: usize) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut tail = VecDeque::with_capacity(keep);
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                warn!(encoder = "ffmpeg", "{line}");
                if tail.len() == keep {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "encoder stderr closed");
                break;
            }
        }
    }
    Vec::from(tail).join("\n")
}

/// ffmpeg command line for a rawvideo stdin stream
pub fn encoder_args(config: &FfmpegConfig, path: &Path, spec: &StreamSpec) -> Vec<String> {
    let pix_fmt = match spec.format {
        PixelFormat::Rgb8 => "rgb24",
        PixelFormat::Rgba8 => "rgba",
    };
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        pix_fmt.into(),
        "-s".into(),
        format!("{}x{}", spec.width, spec.height),
        "-r".into(),
        spec.fps.to_string(),
        "-i".into(),
        "-".into(),
        "-an".into(),
        "-c:v".into(),
        config.codec.clone(),
        "-preset".into(),
        config.preset.clone(),
        "-crf".into(),
        config.crf.to_string(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-movflags".into(),
        "+faststart".into(),
        path.display().to_string(),
    ]
}

impl VideoSink for FfmpegSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(
        name = "ffmpeg_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame_id = frame.frame_id)
    )]
    async fn write(&mut self, frame: &Frame) -> Result<(), ContractError> {
        self.check_geometry(frame)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ContractError::sink_write(&self.name, "encoder already closed"));
        };
        stdin.write_all(&frame.data).await.map_err(|e| {
            error!(sink = %self.name, frame_id = frame.frame_id, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;
        self.frames_written += 1;
        Ok(())
    }

    #[instrument(name = "ffmpeg_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(stdin) = self.stdin.as_mut() {
            stdin
                .flush()
                .await
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "ffmpeg_sink_close", skip(self), fields(path = %self.path.display()))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.finish()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        info!(sink = %self.name, frames = self.frames_written, "encoder finished");
        Ok(())
    }
}

/// Factory for `FfmpegSink`
#[derive(Debug, Clone, Default)]
pub struct FfmpegSinkFactory {
    config: FfmpegConfig,
}

impl FfmpegSinkFactory {
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }
}

impl SinkFactory for FfmpegSinkFactory {
    type Sink = FfmpegSink;

    fn extension(&self) -> &str {
        "mp4"
    }

    async fn create(&self, path: PathBuf, spec: &StreamSpec) -> Result<FfmpegSink, ContractError> {
        FfmpegSink::spawn(&self.config, path, spec)
            .map_err(|e| ContractError::sink_create("ffmpeg", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> StreamSpec {
        StreamSpec {
            width: 1080,
            height: 720,
            fps: 10,
            format: PixelFormat::Rgb8,
        }
    }

    #[test]
    fn test_encoder_args_describe_raw_input() {
        let args = encoder_args(&FfmpegConfig::default(), Path::new("out.mp4"), &spec());
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 1080x720 -r 10 -i -"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.contains("-movflags +faststart"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[tokio::test]
    async fn test_stderr_drained_past_pipe_capacity() {
        // Far more than a pipe buffer holds; only the tail is kept
        let noisy: String = (0..20_000).map(|i| format!("warning line {i}\n")).collect();
        let tail = drain_stderr(noisy.as_bytes(), 3).await;
        assert_eq!(
            tail,
            "warning line 19997\nwarning line 19998\nwarning line 19999"
        );
    }

    #[tokio::test]
    async fn test_stderr_tail_skips_blank_lines() {
        let tail = drain_stderr(&b"\n  \nencoder died\n"[..], 5).await;
        assert_eq!(tail, "encoder died");
    }

    #[tokio::test]
    async fn test_missing_binary_is_create_error() {
        let factory = FfmpegSinkFactory::new(FfmpegConfig {
            binary: PathBuf::from("/nonexistent/ffmpeg-binary"),
            ..FfmpegConfig::default()
        });
        let result = factory.create(PathBuf::from("x.mp4"), &spec()).await;
        assert!(matches!(result, Err(ContractError::SinkCreate { .. })));
    }
}
