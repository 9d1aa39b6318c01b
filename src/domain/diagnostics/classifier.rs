//! Maps capture-tool diagnostic text to user-facing error categories.
//!
//! The rule table is ordered: the first rule whose pattern occurs in the
//! text wins, and a lower rule index counts as a more specific diagnosis.
//! The table is data, not code. It carries a version string and can be
//! replaced from a TOML file when the capture tool's wording changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

/// Version tag of the table compiled into the binary
pub const BUILTIN_TABLE_VERSION: &str = "builtin-1";

const FALLBACK_MESSAGE: &str =
    "Recording failed to start. Check your screen and audio device selection.";

/// Closed set of classified capture failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    PermissionDenied,
    UnsupportedPixelFormat,
    UnsupportedConfiguration,
    DeviceNotFound,
    DeviceBusy,
    ExcessiveDuplication,
    NoFramesProduced,
    /// No frames confirmed before the startup timeout
    Timeout,
    /// The process went away while recording
    ProcessDied,
    /// No rule matched
    StartupFailed,
}

impl ErrorCategory {
    /// Stable machine-readable code, used in error events
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::UnsupportedPixelFormat => "unsupported_pixel_format",
            Self::UnsupportedConfiguration => "unsupported_configuration",
            Self::DeviceNotFound => "device_not_found",
            Self::DeviceBusy => "device_busy",
            Self::ExcessiveDuplication => "excessive_duplication",
            Self::NoFramesProduced => "no_frames_produced",
            Self::Timeout => "timeout",
            Self::ProcessDied => "process_died_unexpectedly",
            Self::StartupFailed => "startup_failed",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One row of the table: any of `patterns` (case-insensitive substring)
/// selects `category` with remediation `message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRule {
    pub category: ErrorCategory,
    pub patterns: Vec<String>,
    pub message: String,
}

impl ErrorRule {
    fn new(category: ErrorCategory, patterns: &[&str], message: &str) -> Self {
        Self {
            category,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            message: message.to_string(),
        }
    }
}

/// Versioned, ordered rule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTable {
    pub version: String,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    pub rules: Vec<ErrorRule>,
}

fn default_fallback_message() -> String {
    FALLBACK_MESSAGE.to_string()
}

impl ErrorTable {
    /// Table matching ffmpeg's wording across avfoundation, gdigrab,
    /// dshow, x11grab and pulse inputs
    pub fn builtin() -> Self {
        use ErrorCategory::*;

        Self {
            version: BUILTIN_TABLE_VERSION.to_string(),
            fallback_message: default_fallback_message(),
            rules: vec![
                ErrorRule::new(
                    PermissionDenied,
                    &[
                        "permission denied",
                        "input/output error",
                        "operation not permitted",
                        "not authorized to capture",
                    ],
                    "Screen recording permission denied. Grant screen and microphone access \
                     to this application in your system privacy settings, then try again.",
                ),
                ErrorRule::new(
                    UnsupportedPixelFormat,
                    &[
                        "unsupported pixel format",
                        "selected pixel format",
                        "pixel format is not supported",
                    ],
                    "The capture device does not support the required pixel format. \
                     Try a different screen or update the capture tool.",
                ),
                ErrorRule::new(
                    UnsupportedConfiguration,
                    &[
                        "selected framerate",
                        "is not supported by the device",
                        "configuration of video device failed",
                        "could not set video options",
                    ],
                    "The capture device rejected the requested frame rate or size. \
                     Try a different screen or a lower quality setting.",
                ),
                ErrorRule::new(
                    DeviceNotFound,
                    &[
                        "invalid device index",
                        "device not found",
                        "could not find video device",
                        "could not find audio only device",
                        "cannot open display",
                        "no such file or directory",
                    ],
                    "The selected screen or audio device was not found. \
                     Refresh the device list and choose another device.",
                ),
                ErrorRule::new(
                    DeviceBusy,
                    &[
                        "device or resource busy",
                        "device busy",
                        "could not lock device",
                    ],
                    "The capture device is busy. Close other applications that are \
                     recording the screen or microphone and try again.",
                ),
                ErrorRule::new(
                    ExcessiveDuplication,
                    &["frames duplicated"],
                    "The capture source is not delivering new frames. Make sure the \
                     selected screen is active and screen recording permission is granted.",
                ),
                ErrorRule::new(
                    NoFramesProduced,
                    &["output file is empty", "nothing was encoded"],
                    "No frames were captured. Check screen recording permission and \
                     the selected screen.",
                ),
                ErrorRule::new(
                    Timeout,
                    &["connection timed out", "operation timed out"],
                    "The capture tool did not confirm any frames in time. Check screen \
                     recording permission and the selected screen, or raise startup_timeout.",
                ),
                ErrorRule::new(
                    ProcessDied,
                    &["received signal", "segmentation fault"],
                    "The capture tool stopped while recording. Check that the selected \
                     devices are still connected and the output disk has free space, \
                     then start a new recording.",
                ),
            ],
        }
    }

    /// Parse a table from TOML, rejecting rules that could never match
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let table: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for (index, rule) in table.rules.iter().enumerate() {
            if rule.patterns.is_empty() || rule.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::ValidationError {
                    key: format!("rules[{}].patterns", index),
                    message: "patterns must be non-empty strings".to_string(),
                });
            }
        }

        Ok(table)
    }
}

impl Default for ErrorTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Outcome of classifying diagnostic text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    pub category: ErrorCategory,
    pub message: String,
    /// Index of the matching rule; `usize::MAX` for the fallback
    pub rank: usize,
    /// The diagnostic line that matched, if any
    pub evidence: Option<String>,
}

impl Diagnosis {
    pub fn is_fallback(&self) -> bool {
        self.rank == usize::MAX
    }

    pub fn is_more_specific_than(&self, other: &Diagnosis) -> bool {
        self.rank < other.rank
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Table-driven classifier.
///
/// Patterns are lower-cased once at construction; matching is
/// case-insensitive substring search.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    table: ErrorTable,
    lowered: Vec<Vec<String>>,
}

impl ErrorClassifier {
    pub fn new(table: ErrorTable) -> Self {
        let lowered = table
            .rules
            .iter()
            .map(|rule| rule.patterns.iter().map(|p| p.to_lowercase()).collect())
            .collect();
        Self { table, lowered }
    }

    pub fn builtin() -> Self {
        Self::new(ErrorTable::builtin())
    }

    pub fn version(&self) -> &str {
        &self.table.version
    }

    /// Classify arbitrary text; falls back to `StartupFailed`
    pub fn classify(&self, text: &str) -> Diagnosis {
        text.lines()
            .filter_map(|line| self.classify_line(line))
            .min_by_key(|d| d.rank)
            .unwrap_or_else(|| self.fallback())
    }

    /// Classify a single line; None when no rule matches
    pub fn classify_line(&self, line: &str) -> Option<Diagnosis> {
        let lowered = line.to_lowercase();
        self.lowered
            .iter()
            .position(|patterns| patterns.iter().any(|p| lowered.contains(p.as_str())))
            .map(|rank| {
                let rule = &self.table.rules[rank];
                Diagnosis {
                    category: rule.category,
                    message: rule.message.clone(),
                    rank,
                    evidence: Some(line.trim().to_string()),
                }
            })
    }

    /// Table entry for a category decided outside the diagnostic stream,
    /// e.g. a device id missing from the enumeration
    pub fn diagnosis_for(&self, category: ErrorCategory) -> Diagnosis {
        if let Some(rank) = self.table.rules.iter().position(|r| r.category == category) {
            return Diagnosis {
                category,
                message: self.table.rules[rank].message.clone(),
                rank,
                evidence: None,
            };
        }

        // A custom table may omit the category; keep the built-in wording
        let builtin = ErrorTable::builtin();
        match builtin.rules.iter().find(|r| r.category == category) {
            Some(rule) => Diagnosis {
                category,
                message: rule.message.clone(),
                rank: usize::MAX - 1,
                evidence: None,
            },
            None => self.fallback(),
        }
    }

    /// Generic "startup failed" diagnosis
    pub fn fallback(&self) -> Diagnosis {
        Diagnosis {
            category: ErrorCategory::StartupFailed,
            message: self.table.fallback_message.clone(),
            rank: usize::MAX,
            evidence: None,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
