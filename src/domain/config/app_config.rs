//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::capture::Quality;
use crate::domain::recording::Duration;

/// Executable looked up on PATH when no path is configured
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub ffmpeg_path: Option<String>,
    pub output_dir: Option<String>,
    pub screen: Option<String>,
    pub audio_device: Option<String>,
    pub microphone: Option<bool>,
    pub system_audio: Option<bool>,
    pub video_quality: Option<String>,
    pub audio_quality: Option<String>,
    pub duration: Option<String>,
    pub startup_timeout: Option<String>,
    pub stop_timeout: Option<String>,
    pub error_table: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            ffmpeg_path: Some(DEFAULT_FFMPEG.to_string()),
            output_dir: None,
            screen: None,
            audio_device: None,
            microphone: Some(false),
            system_audio: Some(false),
            video_quality: Some(Quality::Medium.to_string()),
            audio_quality: Some(Quality::Medium.to_string()),
            duration: None,
            startup_timeout: Some(Duration::default_startup_timeout().to_string()),
            stop_timeout: Some(Duration::default_stop_timeout().to_string()),
            error_table: None,
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Overrides read from `SCREENREC_FFMPEG` and `SCREENREC_OUTPUT_DIR`
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            ffmpeg_path: non_empty("SCREENREC_FFMPEG"),
            output_dir: non_empty("SCREENREC_OUTPUT_DIR"),
            ..Self::default()
        }
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            ffmpeg_path: other.ffmpeg_path.or(self.ffmpeg_path),
            output_dir: other.output_dir.or(self.output_dir),
            screen: other.screen.or(self.screen),
            audio_device: other.audio_device.or(self.audio_device),
            microphone: other.microphone.or(self.microphone),
            system_audio: other.system_audio.or(self.system_audio),
            video_quality: other.video_quality.or(self.video_quality),
            audio_quality: other.audio_quality.or(self.audio_quality),
            duration: other.duration.or(self.duration),
            startup_timeout: other.startup_timeout.or(self.startup_timeout),
            stop_timeout: other.stop_timeout.or(self.stop_timeout),
            error_table: other.error_table.or(self.error_table),
        }
    }

    pub fn ffmpeg_path_or_default(&self) -> &str {
        self.ffmpeg_path.as_deref().unwrap_or(DEFAULT_FFMPEG)
    }

    /// Configured directory, else the user's video directory, else the temp dir
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(dirs::video_dir)
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn microphone_or_default(&self) -> bool {
        self.microphone.unwrap_or(false)
    }

    pub fn system_audio_or_default(&self) -> bool {
        self.system_audio.unwrap_or(false)
    }

    /// Get video quality, or medium if not set/invalid
    pub fn video_quality_or_default(&self) -> Quality {
        self.video_quality
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get audio quality, or medium if not set/invalid
    pub fn audio_quality_or_default(&self) -> Quality {
        self.audio_quality
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn startup_timeout_or_default(&self) -> Duration {
        self.startup_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_startup_timeout)
    }

    pub fn stop_timeout_or_default(&self) -> Duration {
        self.stop_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_stop_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.ffmpeg_path_or_default(), "ffmpeg");
        assert_eq!(config.microphone, Some(false));
        assert_eq!(config.video_quality, Some("medium".to_string()));
        assert_eq!(config.startup_timeout_or_default().as_secs(), 15);
        assert_eq!(config.stop_timeout_or_default().as_secs(), 10);
        assert!(config.duration.is_none());
        assert!(config.error_table.is_none());
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.ffmpeg_path.is_none());
        assert!(config.output_dir.is_none());
        assert!(config.microphone.is_none());
        assert!(config.stop_timeout.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            ffmpeg_path: Some("/usr/bin/ffmpeg".to_string()),
            screen: Some("1".to_string()),
            video_quality: Some("low".to_string()),
            ..Default::default()
        };

        let other = AppConfig {
            ffmpeg_path: Some("/opt/ffmpeg".to_string()),
            screen: None, // Should not override
            video_quality: Some("high".to_string()),
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.ffmpeg_path, Some("/opt/ffmpeg".to_string()));
        assert_eq!(merged.screen, Some("1".to_string()));
        assert_eq!(merged.video_quality_or_default(), Quality::High);
    }

    #[test]
    fn merge_preserves_base_when_other_is_none() {
        let base = AppConfig {
            microphone: Some(true),
            error_table: Some("/etc/table.toml".to_string()),
            ..Default::default()
        };

        let merged = base.merge(AppConfig::empty());

        assert!(merged.microphone_or_default());
        assert_eq!(merged.error_table, Some("/etc/table.toml".to_string()));
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let config = AppConfig::from_env_with(|key| match key {
            "SCREENREC_FFMPEG" => Some("/custom/ffmpeg".to_string()),
            "SCREENREC_OUTPUT_DIR" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.ffmpeg_path, Some("/custom/ffmpeg".to_string()));
        assert!(config.output_dir.is_none());
        assert!(config.screen.is_none());
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = AppConfig {
            video_quality: Some("ultra".to_string()),
            startup_timeout: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.video_quality_or_default(), Quality::Medium);
        assert_eq!(config.startup_timeout_or_default().as_secs(), 15);
    }

    #[test]
    fn timeouts_parse() {
        let config = AppConfig {
            startup_timeout: Some("30s".to_string()),
            stop_timeout: Some("1m".to_string()),
            ..Default::default()
        };
        assert_eq!(config.startup_timeout_or_default().as_secs(), 30);
        assert_eq!(config.stop_timeout_or_default().as_secs(), 60);
    }

    #[test]
    fn output_dir_uses_configured_value() {
        let config = AppConfig {
            output_dir: Some("/tmp/recordings".to_string()),
            ..Default::default()
        };
        assert_eq!(config.output_dir_or_default(), PathBuf::from("/tmp/recordings"));
    }

    #[test]
    fn toml_round_trip_of_partial_config() {
        let config: AppConfig = toml::from_str("screen = \"2\"\nmicrophone = true\n").unwrap();
        assert_eq!(config.screen, Some("2".to_string()));
        assert_eq!(config.microphone, Some(true));
        assert!(config.ffmpeg_path.is_none());
    }
}
