//! Capture device descriptors

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a device captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Screen,
    AudioInput,
}

impl DeviceKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::AudioInput => "audio_input",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A selectable screen or audio input.
///
/// `id` is whatever the capture tool expects on its command line: an
/// index on macOS, a device name on Windows, a display or source name on
/// Linux. Indices can shift between runs, so descriptors are never cached
/// across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub display_name: String,
    pub kind: DeviceKind,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
        }
    }

    pub fn screen(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, DeviceKind::Screen)
    }

    pub fn audio_input(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, DeviceKind::AudioInput)
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.display_name)
    }
}

/// Result of one device enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceList {
    pub screens: Vec<DeviceDescriptor>,
    pub audio_inputs: Vec<DeviceDescriptor>,
    /// The screens are synthesized defaults, not an enumeration result
    #[serde(default)]
    pub screens_fallback: bool,
    /// The audio inputs are synthesized defaults, not an enumeration result
    #[serde(default)]
    pub audio_inputs_fallback: bool,
}

impl DeviceList {
    /// True when either kind holds synthesized defaults
    pub fn is_fallback(&self) -> bool {
        self.screens_fallback || self.audio_inputs_fallback
    }

    pub fn is_fallback_for(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Screen => self.screens_fallback,
            DeviceKind::AudioInput => self.audio_inputs_fallback,
        }
    }

    pub fn find_screen(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.screens.iter().find(|d| d.id == id)
    }

    pub fn find_audio_input(&self, id: &str) -> Option<&DeviceDescriptor> {
        self.audio_inputs.iter().find(|d| d.id == id)
    }

    pub fn default_screen(&self) -> Option<&DeviceDescriptor> {
        self.screens.first()
    }

    pub fn default_audio_input(&self) -> Option<&DeviceDescriptor> {
        self.audio_inputs.first()
    }
}
