//! Events published by a recording backend

use std::path::PathBuf;

use serde::Serialize;

/// Everything a caller can observe about a session, in emission order.
///
/// `Started` is only ever sent after frames were confirmed; `Completed`
/// and `Error` only after the capture process has exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecordingEvent {
    Started {
        output_path: PathBuf,
        audio_path: Option<PathBuf>,
    },
    Progress {
        duration_ms: u64,
    },
    Paused,
    Resumed,
    Completed {
        output_path: PathBuf,
        audio_path: Option<PathBuf>,
        duration_ms: u64,
    },
    Error {
        message: String,
        code: String,
    },
}

impl RecordingEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }

    /// Completed and Error end a session
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}
