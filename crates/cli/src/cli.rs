//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Incident Recorder - debounced incident recording from a video stream
#[derive(Parser, Debug)]
#[command(
    name = "incident-recorder",
    author,
    version,
    about = "Records video incidents with pre-roll when a target class persists",
    long_about = "Watches a frame stream, runs a detector on every frame and opens a \n\
                  recording (including the buffered seconds before the trigger) once \n\
                  the target class persists. Recordings are closed after a quiet \n\
                  grace period and delivered to subscribers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "INCIDENT_RECORDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "INCIDENT_RECORDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the recorder until the source ends or a stop signal arrives
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "INCIDENT_RECORDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Read frames from this image directory instead of the configured source
    #[arg(long, env = "INCIDENT_RECORDER_SOURCE")]
    pub source: Option<PathBuf>,

    /// Override the recordings directory
    #[arg(short, long, env = "INCIDENT_RECORDER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of frames to process (0 = unlimited)
    #[arg(long, default_value = "0", env = "INCIDENT_RECORDER_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "INCIDENT_RECORDER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running the pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "INCIDENT_RECORDER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Seconds to wait for queued alerts (e.g. video uploads) on shutdown
    #[arg(long, default_value = "30")]
    pub drain_timeout: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration (defaults filled in) as TOML
    #[arg(long, conflicts_with = "json")]
    pub resolved: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "incident-recorder",
            "-v",
            "run",
            "--config",
            "cam.toml",
            "--source",
            "frames/",
            "--max-frames",
            "50",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("cam.toml"));
        assert_eq!(args.source, Some(PathBuf::from("frames/")));
        assert_eq!(args.max_frames, 50);
        assert!(args.dry_run);
    }
}
