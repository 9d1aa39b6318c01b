//! Normalized recording request

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::QualityParseError;

/// Coarse quality preset for video or audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Quality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(QualityParseError {
                input: s.to_string(),
            }),
        }
    }
}

/// A recording request as accepted by a backend.
///
/// Device ids left as `None` resolve to the first enumerated device.
/// Once handed to a supervisor the request is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub target_screen_id: Option<String>,
    pub audio_input_id: Option<String>,
    pub include_microphone: bool,
    pub include_system_audio: bool,
    pub video_quality: Quality,
    pub audio_quality: Quality,
    pub output_path: PathBuf,
    pub audio_output_path: Option<PathBuf>,
}

impl CaptureRequest {
    /// Screen-only request with medium quality
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            target_screen_id: None,
            audio_input_id: None,
            include_microphone: false,
            include_system_audio: false,
            video_quality: Quality::default(),
            audio_quality: Quality::default(),
            output_path: output_path.into(),
            audio_output_path: None,
        }
    }

    pub fn with_screen(mut self, id: impl Into<String>) -> Self {
        self.target_screen_id = Some(id.into());
        self
    }

    pub fn with_microphone(mut self, audio_input_id: Option<String>) -> Self {
        self.include_microphone = true;
        self.audio_input_id = audio_input_id;
        self
    }

    pub fn with_system_audio(mut self, enabled: bool) -> Self {
        self.include_system_audio = enabled;
        self
    }

    pub fn with_quality(mut self, video: Quality, audio: Quality) -> Self {
        self.video_quality = video;
        self.audio_quality = audio;
        self
    }

    pub fn with_audio_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_output_path = Some(path.into());
        self
    }
}

/// Device ids after the request has been resolved against an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevices {
    pub screen_id: String,
    /// Present only when the microphone was requested
    pub audio_input_id: Option<String>,
}
