//! Capture backend port
//!
//! Every way of recording the screen, whether it spawns the capture tool
//! or binds a native OS framework, is exposed to the rest of the
//! application through [`CaptureBackend`].

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::capture::{
    CaptureRequest, DeviceDescriptor, DeviceList, InvalidStateTransition, Platform,
    RecordingEvent, SessionState,
};
use crate::domain::diagnostics::Diagnosis;

/// Capture errors.
///
/// Classified failures carry the [`Diagnosis`] drawn from the error table,
/// so their display text is the table's remediation message.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("{0}")]
    Classified(Diagnosis),

    /// Carries the most specific diagnosis seen before the process went
    /// away, or the table's `ProcessDied` entry
    #[error("{diagnosis}")]
    ProcessDiedUnexpectedly { diagnosis: Diagnosis },

    #[error("{diagnosis} (waited {after_ms}ms to {operation})")]
    Timeout {
        diagnosis: Diagnosis,
        operation: String,
        after_ms: u64,
    },

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error(transparent)]
    InvalidStateTransition(#[from] InvalidStateTransition),

    #[error("Backend '{backend}' does not support {capability}")]
    CapabilityNotSupported { backend: String, capability: String },

    #[error("{message} (capture tool exited with {})", exit_label(.code))]
    ExitedEarly { code: Option<i32>, message: String },

    #[error("Capture tool not found: {program}. Install ffmpeg or set ffmpeg_path")]
    ToolNotFound { program: String },

    #[error("Failed to spawn capture tool: {0}")]
    SpawnFailed(String),

    #[error("Backend '{backend}' failed to initialize: {message}")]
    InitializationFailed { backend: String, message: String },

    #[error("No capture backend available on {platform}: {reason}")]
    NoBackendAvailable { platform: Platform, reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

impl CaptureError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Classified(d) => d.category.code(),
            Self::ProcessDiedUnexpectedly { .. } => "process_died_unexpectedly",
            Self::Timeout { .. } => "timeout",
            Self::AlreadyRecording => "already_recording",
            Self::InvalidStateTransition(_) => "invalid_state_transition",
            Self::CapabilityNotSupported { .. } => "capability_not_supported",
            Self::ExitedEarly { .. } => "exited_early",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::SpawnFailed(_) => "spawn_failed",
            Self::InitializationFailed { .. } => "initialization_failed",
            Self::NoBackendAvailable { .. } => "no_backend_available",
            Self::Io(_) => "io_error",
        }
    }

    /// Classified diagnosis behind this error, if any
    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        match self {
            Self::Classified(d) => Some(d),
            Self::ProcessDiedUnexpectedly { diagnosis } | Self::Timeout { diagnosis, .. } => {
                Some(diagnosis)
            }
            _ => None,
        }
    }

    /// The `error` event reported to subscribers
    pub fn to_event(&self) -> RecordingEvent {
        RecordingEvent::Error {
            message: self.to_string(),
            code: self.code().to_string(),
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Optional features a backend may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BackendCapabilities {
    pub pause: bool,
    pub system_audio: bool,
}

impl BackendCapabilities {
    /// True when every capability in `required` is present here
    pub fn covers(&self, required: &BackendCapabilities) -> bool {
        (!required.pause || self.pause) && (!required.system_audio || self.system_audio)
    }
}

/// Snapshot of a backend's session
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackendStatus {
    pub backend: String,
    pub state: SessionState,
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub output_path: Option<PathBuf>,
    pub audio_output_path: Option<PathBuf>,
    /// Recorded time with pauses excluded
    pub elapsed_ms: u64,
    pub validated_frame_count: u64,
    pub is_paused: bool,
    pub last_error: Option<String>,
}

/// Returned by a start that was confirmed by real frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRecording {
    pub session_id: Uuid,
    pub output_path: PathBuf,
    pub audio_output_path: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
}

/// Returned by a successful stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRecording {
    pub output_path: PathBuf,
    pub audio_output_path: Option<PathBuf>,
    pub duration: StdDuration,
    /// The capture tool ignored the graceful stop and was killed
    pub forced: bool,
}

/// Port for a screen capture backend
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Name used by the router and in logs
    fn name(&self) -> &str;

    fn capabilities(&self) -> BackendCapabilities;

    /// Prepare the backend. A failure makes the router try the next one.
    async fn initialize(&self) -> Result<(), CaptureError>;

    async fn get_available_screens(&self) -> Result<Vec<DeviceDescriptor>, CaptureError>;

    async fn get_available_audio_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError>;

    /// Both device kinds at once; `refresh` forces a new enumeration where
    /// the backend caches one.
    async fn list_devices(&self, refresh: bool) -> Result<DeviceList, CaptureError> {
        let _ = refresh;
        Ok(DeviceList {
            screens: self.get_available_screens().await?,
            audio_inputs: self.get_available_audio_devices().await?,
            screens_fallback: false,
            audio_inputs_fallback: false,
        })
    }

    /// Start recording. Resolves only once the backend has confirmed that
    /// output is actually being produced.
    async fn start_recording(&self, request: CaptureRequest)
        -> Result<StartedRecording, CaptureError>;

    async fn stop_recording(&self) -> Result<CompletedRecording, CaptureError>;

    /// Callers check `capabilities().pause` first
    async fn pause_recording(&self) -> Result<(), CaptureError> {
        Err(CaptureError::CapabilityNotSupported {
            backend: self.name().to_string(),
            capability: "pause".to_string(),
        })
    }

    async fn resume_recording(&self) -> Result<(), CaptureError> {
        Err(CaptureError::CapabilityNotSupported {
            backend: self.name().to_string(),
            capability: "resume".to_string(),
        })
    }

    async fn get_status(&self) -> BackendStatus;

    /// Event stream; subscribe before starting to see `started`
    fn subscribe(&self) -> broadcast::Receiver<RecordingEvent>;
}
