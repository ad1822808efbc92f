//! RecorderBlueprint - Config Loader output
//!
//! Describes a complete recorder run: capture source, working frame geometry,
//! detection, incident thresholds, recording output, notification and render.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::{PixelFormat, StreamSpec};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete recorder configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RecorderBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    #[serde(default)]
    #[validate(nested)]
    pub source: SourceConfig,

    #[serde(default)]
    #[validate(nested)]
    pub frame: FrameConfig,

    #[serde(default)]
    #[validate(nested)]
    pub detection: DetectionConfig,

    #[serde(default)]
    #[validate(nested)]
    pub incident: IncidentConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    #[validate(nested)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    #[validate(nested)]
    pub render: RenderConfig,
}

impl RecorderBlueprint {
    /// Ring buffer capacity in frames
    pub fn buffer_capacity(&self) -> usize {
        self.incident.buffer_capacity(self.frame.fps)
    }

    /// Stream geometry handed to recording sinks
    pub fn stream_spec(&self) -> StreamSpec {
        StreamSpec {
            width: self.frame.width,
            height: self.frame.height,
            fps: self.frame.fps,
            format: PixelFormat::Rgb8,
        }
    }
}

// ===== Source =====

/// Capture source kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Synthetic frames
    #[default]
    Mock,
    /// Ordered image files from a directory
    ImageDir,
}

/// Capture source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Directory for `image_dir`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Sleep between frames to emulate a live camera
    #[serde(default)]
    pub pace: bool,

    /// Restart from the first image at end of directory
    #[serde(default)]
    pub loop_playback: bool,

    /// Frame count for `mock` (None = endless)
    #[serde(default = "default_mock_frames")]
    pub mock_frames: Option<u64>,

    /// Run capture on its own task behind a bounded queue
    #[serde(default)]
    #[validate(nested)]
    pub queue: Option<QueueConfig>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: None,
            pace: false,
            loop_playback: false,
            mock_frames: default_mock_frames(),
            queue: None,
        }
    }
}

fn default_mock_frames() -> Option<u64> {
    Some(300)
}

/// Capture queue configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    #[serde(default = "default_capture_queue_capacity")]
    #[validate(range(min = 1))]
    pub capacity: usize,

    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_capture_queue_capacity() -> usize {
    32
}

/// Drop policy (when backpressure is full)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop the oldest queued frame
    #[default]
    DropOldest,
    /// Drop the incoming frame
    DropNewest,
}

// ===== Frame =====

/// Working frame geometry and rate
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FrameConfig {
    #[serde(default = "default_width")]
    #[validate(range(min = 1))]
    pub width: u32,

    #[serde(default = "default_height")]
    #[validate(range(min = 1))]
    pub height: u32,

    /// Target frame rate; also the output artifact rate
    #[serde(default = "default_fps")]
    #[validate(range(min = 1, max = 240))]
    pub fps: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    720
}

fn default_fps() -> u32 {
    10
}

// ===== Detection =====

/// Detector backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorBackend {
    /// Never detects anything
    #[default]
    None,
    /// Detections read from a JSON-lines file keyed by frame id
    Replay,
    /// Synthetic detections inside configured time intervals
    Scripted,
}

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DetectionConfig {
    #[serde(default)]
    pub backend: DetectorBackend,

    /// Class names that count as the target (empty = any class)
    #[serde(default = "default_class_names")]
    pub class_names: Vec<String>,

    #[serde(default = "default_confidence_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_threshold: f32,

    /// Treat a detector error as "no detection" instead of stopping the run
    #[serde(default)]
    pub tolerate_errors: bool,

    /// Input for `replay`
    #[serde(default)]
    pub replay_path: Option<PathBuf>,

    /// Presence intervals for `scripted`
    #[serde(default)]
    pub scripted: Vec<ScriptedInterval>,

    /// Label reported by `scripted`
    #[serde(default = "default_scripted_label")]
    pub label: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackend::default(),
            class_names: default_class_names(),
            confidence_threshold: default_confidence_threshold(),
            tolerate_errors: false,
            replay_path: None,
            scripted: Vec::new(),
            label: default_scripted_label(),
        }
    }
}

/// Half-open presence interval `[start_s, end_s)` on the frame clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInterval {
    pub start_s: f64,
    pub end_s: f64,
}

impl ScriptedInterval {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_s && t < self.end_s
    }
}

fn default_class_names() -> Vec<String> {
    vec!["weapon".to_string()]
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_scripted_label() -> String {
    "weapon".to_string()
}

// ===== Incident =====

/// Incident thresholds (seconds)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IncidentConfig {
    /// Pre-roll window length
    #[serde(default = "default_buffer_seconds")]
    #[validate(range(exclusive_min = 0.0))]
    pub buffer_seconds: f64,

    /// Presence must persist longer than this to start recording
    #[serde(default = "default_trigger_seconds")]
    #[validate(range(min = 0.0))]
    pub trigger_seconds: f64,

    /// Absence must persist longer than this to stop recording
    #[serde(default = "default_end_seconds")]
    #[validate(range(exclusive_min = 0.0))]
    pub end_seconds: f64,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            buffer_seconds: default_buffer_seconds(),
            trigger_seconds: default_trigger_seconds(),
            end_seconds: default_end_seconds(),
        }
    }
}

impl IncidentConfig {
    /// `buffer_seconds * fps`, rounded, at least one frame
    pub fn buffer_capacity(&self, fps: u32) -> usize {
        let frames = (self.buffer_seconds * f64::from(fps)).round();
        if frames.is_finite() && frames >= 1.0 {
            frames as usize
        } else {
            1
        }
    }
}

fn default_buffer_seconds() -> f64 {
    10.0
}

fn default_trigger_seconds() -> f64 {
    2.0
}

fn default_end_seconds() -> f64 {
    20.0
}

// ===== Recording =====

/// Recording sink kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingSinkKind {
    /// mp4 via an ffmpeg child process
    #[default]
    Ffmpeg,
    /// One PNG per frame plus a manifest
    FrameDir,
}

/// Recording output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    #[serde(default)]
    pub sink: RecordingSinkKind,

    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            sink: RecordingSinkKind::default(),
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_file_prefix() -> String {
    "incident".to_string()
}

/// ffmpeg encoder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    #[serde(default = "default_ffmpeg_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_codec")]
    pub codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u8,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: default_ffmpeg_binary(),
            codec: default_codec(),
            preset: default_preset(),
            crf: default_crf(),
        }
    }
}

fn default_ffmpeg_binary() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    23
}

// ===== Notifier =====

/// Notification channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Alerts are only logged
    #[default]
    Log,
    /// Telegram Bot API
    Telegram,
}

/// Notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotifierConfig {
    #[serde(default)]
    pub channel: ChannelKind,

    /// Alert queue capacity between the frame loop and the worker
    #[serde(default = "default_notifier_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// Subscriber refresh period
    #[serde(default = "default_refresh_interval_secs")]
    #[validate(range(min = 1))]
    pub refresh_interval_secs: u64,

    /// Broadcast when the pipeline starts (None = silent)
    #[serde(default = "default_start_message")]
    pub start_message: Option<String>,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::default(),
            queue_capacity: default_notifier_queue_capacity(),
            refresh_interval_secs: default_refresh_interval_secs(),
            start_message: default_start_message(),
            telegram: TelegramConfig::default(),
        }
    }
}

fn default_notifier_queue_capacity() -> usize {
    64
}

fn default_refresh_interval_secs() -> u64 {
    60
}

fn default_start_message() -> Option<String> {
    Some("Starting video processing...".to_string())
}

/// Telegram Bot API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the bot token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_subscribers_path")]
    pub subscribers_path: PathBuf,

    #[serde(default = "default_caption")]
    pub caption: String,

    /// Send videos hidden behind a spoiler
    #[serde(default = "default_spoiler")]
    pub spoiler: bool,

    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token_env: default_token_env(),
            subscribers_path: default_subscribers_path(),
            caption: default_caption(),
            spoiler: default_spoiler(),
            welcome_message: default_welcome_message(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_token_env() -> String {
    "TOKEN".to_string()
}

fn default_subscribers_path() -> PathBuf {
    PathBuf::from("subscribers.json")
}

fn default_caption() -> String {
    "Here's the video!".to_string()
}

fn default_spoiler() -> bool {
    true
}

fn default_welcome_message() -> String {
    "Subscribed to incident alerts.".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

// ===== Render =====

/// Renderer kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    /// Annotated frames are discarded
    #[default]
    None,
    /// Latest annotated frame written to an image file
    Preview,
}

/// Render configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenderConfig {
    #[serde(default)]
    pub kind: RenderKind,

    #[serde(default = "default_preview_path")]
    pub preview_path: PathBuf,

    /// Write every n-th frame only
    #[serde(default = "default_every_n_frames")]
    #[validate(range(min = 1))]
    pub every_n_frames: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            kind: RenderKind::default(),
            preview_path: default_preview_path(),
            every_n_frames: default_every_n_frames(),
        }
    }
}

fn default_preview_path() -> PathBuf {
    PathBuf::from("preview.png")
}

fn default_every_n_frames() -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_capacity_is_seconds_times_fps() {
        let incident = IncidentConfig::default();
        assert_eq!(incident.buffer_capacity(10), 100);
        assert_eq!(incident.buffer_capacity(30), 300);
    }

    #[test]
    fn buffer_capacity_never_zero() {
        let incident = IncidentConfig {
            buffer_seconds: 0.01,
            ..IncidentConfig::default()
        };
        assert_eq!(incident.buffer_capacity(10), 1);
    }

    #[test]
    fn defaults_from_empty_json() {
        let blueprint: RecorderBlueprint = serde_json::from_str("{}").unwrap();
        assert_eq!(blueprint.frame.width, 1080);
        assert_eq!(blueprint.frame.height, 720);
        assert_eq!(blueprint.incident.trigger_seconds, 2.0);
        assert_eq!(blueprint.incident.end_seconds, 20.0);
        assert_eq!(blueprint.detection.class_names, vec!["weapon".to_string()]);
        assert_eq!(blueprint.notifier.telegram.token_env, "TOKEN");
        assert_eq!(blueprint.buffer_capacity(), 100);
    }

    #[test]
    fn derived_validation_rejects_out_of_range() {
        let mut blueprint = RecorderBlueprint::default();
        assert!(blueprint.validate().is_ok());

        blueprint.detection.confidence_threshold = 1.5;
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn scripted_interval_is_half_open() {
        let interval = ScriptedInterval {
            start_s: 2.0,
            end_s: 4.0,
        };
        assert!(interval.contains(2.0));
        assert!(interval.contains(3.99));
        assert!(!interval.contains(4.0));
    }
}
