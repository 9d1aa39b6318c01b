//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::domain::capture::Quality;
use crate::domain::recording::Duration;

use super::logging::Verbosity;

/// ScreenRec - screen recording that only reports "started" once frames flow
#[derive(Parser, Debug)]
#[command(name = "screenrec")]
#[command(version)]
#[command(about = "Record the screen through ffmpeg with validated start and graceful stop")]
#[command(long_about = None)]
pub struct Cli {
    /// Recording duration (e.g., 30s, 5m, 1h). Without it, records until Ctrl+C
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Screen id to capture (see `screenrec devices`)
    #[arg(long, value_name = "ID")]
    pub screen: Option<String>,

    /// Audio input id for the microphone (implies --mic)
    #[arg(long, value_name = "ID")]
    pub audio: Option<String>,

    /// Capture the microphone
    #[arg(long)]
    pub mic: bool,

    /// Capture system audio (only with backends that support it)
    #[arg(long)]
    pub system_audio: bool,

    /// Video quality preset
    #[arg(long, value_name = "QUALITY")]
    pub video_quality: Option<QualityArg>,

    /// Audio quality preset
    #[arg(long, value_name = "QUALITY")]
    pub audio_quality: Option<QualityArg>,

    /// Output file (default: <output_dir>/recording-<timestamp>.mp4)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the microphone to a separate WAV file
    #[arg(long, value_name = "FILE")]
    pub audio_output: Option<PathBuf>,

    /// Print recording events as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            return Verbosity::Quiet;
        }
        match self.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }

    /// Whether any flag asks for microphone capture
    pub fn wants_microphone(&self) -> bool {
        self.mic || self.audio.is_some()
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List screens and audio inputs
    Devices {
        /// Re-enumerate instead of using the cached listing
        #[arg(long)]
        refresh: bool,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List registered capture backends and which one this host selects
    Backends {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Quality argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum QualityArg {
    Low,
    Medium,
    High,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => Quality::Low,
            QualityArg::Medium => Quality::Medium,
            QualityArg::High => Quality::High,
        }
    }
}

/// Parsed options for a recording run
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub duration: Option<Duration>,
    pub screen: Option<String>,
    pub audio_device: Option<String>,
    pub microphone: bool,
    pub system_audio: bool,
    pub video_quality: Quality,
    pub audio_quality: Quality,
    pub output: Option<PathBuf>,
    pub audio_output: Option<PathBuf>,
    pub json: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "ffmpeg_path",
    "output_dir",
    "screen",
    "audio_device",
    "microphone",
    "system_audio",
    "video_quality",
    "audio_quality",
    "duration",
    "startup_timeout",
    "stop_timeout",
    "error_table",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["screenrec"]);
        assert!(cli.duration.is_none());
        assert!(cli.screen.is_none());
        assert!(!cli.wants_microphone());
        assert!(!cli.system_audio);
        assert!(!cli.json);
        assert_eq!(cli.verbosity(), Verbosity::Normal);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_duration() {
        let cli = Cli::parse_from(["screenrec", "-d", "30s"]);
        assert_eq!(cli.duration, Some("30s".to_string()));
    }

    #[test]
    fn cli_parses_record_flags() {
        let cli = Cli::parse_from([
            "screenrec",
            "--screen",
            "1",
            "--mic",
            "--video-quality",
            "high",
            "-o",
            "/tmp/out.mp4",
            "--audio-output",
            "/tmp/out.wav",
            "--json",
        ]);
        assert_eq!(cli.screen.as_deref(), Some("1"));
        assert!(cli.wants_microphone());
        assert_eq!(cli.video_quality, Some(QualityArg::High));
        assert_eq!(cli.output, Some(PathBuf::from("/tmp/out.mp4")));
        assert_eq!(cli.audio_output, Some(PathBuf::from("/tmp/out.wav")));
        assert!(cli.json);
    }

    #[test]
    fn audio_device_implies_microphone() {
        let cli = Cli::parse_from(["screenrec", "--audio", "0"]);
        assert!(cli.wants_microphone());
    }

    #[test]
    fn verbosity_flags() {
        assert_eq!(Cli::parse_from(["screenrec", "-v"]).verbosity(), Verbosity::Debug);
        assert_eq!(Cli::parse_from(["screenrec", "-vv"]).verbosity(), Verbosity::Trace);
        assert_eq!(Cli::parse_from(["screenrec", "-q"]).verbosity(), Verbosity::Quiet);
        assert!(Cli::try_parse_from(["screenrec", "-q", "-v"]).is_err());
    }

    #[test]
    fn cli_parses_devices() {
        let cli = Cli::parse_from(["screenrec", "devices", "--refresh", "--json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Devices {
                refresh: true,
                json: true
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["screenrec", "config", "set", "video_quality", "high"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "video_quality");
            assert_eq!(value, "high");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn rejects_unknown_quality() {
        assert!(Cli::try_parse_from(["screenrec", "--video-quality", "ultra"]).is_err());
    }

    #[test]
    fn quality_arg_converts() {
        assert_eq!(Quality::from(QualityArg::Low), Quality::Low);
        assert_eq!(Quality::from(QualityArg::High), Quality::High);
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("ffmpeg_path"));
        assert!(is_valid_config_key("error_table"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
