//! Recording session state machine

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::clock::RecordingClock;
use crate::domain::diagnostics::Diagnosis;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Validating,
    Recording,
    Paused,
    Stopping,
    Completed,
    Failed,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Validating => "validating",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// A capture process exists or is about to
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Starting | Self::Validating | Self::Recording | Self::Paused | Self::Stopping
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// The one recording session a supervisor owns.
///
/// State machine:
///   IDLE -> STARTING (begin)
///   STARTING -> VALIDATING (await_frames)
///   VALIDATING -> RECORDING (mark_validated, needs enough frames)
///   RECORDING <-> PAUSED (pause / resume)
///   RECORDING | PAUSED -> STOPPING (begin_stop)
///   STOPPING -> COMPLETED (complete)
///   any active state -> FAILED (fail)
///   any state -> IDLE (reset)
#[derive(Debug, Default)]
pub struct RecordingSession {
    session_id: Option<Uuid>,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    output_path: Option<PathBuf>,
    audio_output_path: Option<PathBuf>,
    last_error: Option<Diagnosis>,
    validated_frame_count: u64,
    clock: RecordingClock,
}

impl RecordingSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    pub fn audio_output_path(&self) -> Option<&Path> {
        self.audio_output_path.as_deref()
    }

    pub fn last_error(&self) -> Option<&Diagnosis> {
        self.last_error.as_ref()
    }

    pub fn validated_frame_count(&self) -> u64 {
        self.validated_frame_count
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// Recorded time, pause intervals excluded
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.clock.elapsed(now)
    }

    fn reject(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }

    /// Transition from IDLE to STARTING. Output paths are fixed here and
    /// cannot change until the session is reset.
    pub fn begin(
        &mut self,
        output_path: PathBuf,
        audio_output_path: Option<PathBuf>,
    ) -> Result<Uuid, InvalidStateTransition> {
        if self.state != SessionState::Idle {
            return Err(self.reject("start recording"));
        }
        let id = Uuid::new_v4();
        self.session_id = Some(id);
        self.started_at = Some(Utc::now());
        self.output_path = Some(output_path);
        self.audio_output_path = audio_output_path;
        self.last_error = None;
        self.validated_frame_count = 0;
        self.clock = RecordingClock::new();
        self.state = SessionState::Starting;
        Ok(id)
    }

    /// Transition from STARTING to VALIDATING once the process is spawned
    pub fn await_frames(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Starting {
            return Err(self.reject("wait for frames"));
        }
        self.state = SessionState::Validating;
        Ok(())
    }

    /// Transition from VALIDATING to RECORDING.
    /// Refused unless `frames` has reached `threshold`.
    pub fn mark_validated(
        &mut self,
        frames: u64,
        threshold: u64,
        now: Instant,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Validating {
            return Err(self.reject("mark recording as validated"));
        }
        if frames == 0 || frames < threshold {
            return Err(self.reject(&format!(
                "mark recording as validated with {} of {} frames",
                frames, threshold
            )));
        }
        self.validated_frame_count = frames;
        self.clock.start(now);
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Record a newer frame count while recording
    pub fn update_frames(&mut self, frames: u64) {
        if matches!(self.state, SessionState::Recording | SessionState::Paused) {
            self.validated_frame_count = self.validated_frame_count.max(frames);
        }
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Recording {
            return Err(self.reject("pause"));
        }
        self.clock.pause(now);
        self.state = SessionState::Paused;
        Ok(())
    }

    /// Transition from PAUSED to RECORDING
    pub fn resume(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Paused {
            return Err(self.reject("resume"));
        }
        self.clock.resume(now);
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Transition from RECORDING or PAUSED to STOPPING; freezes the clock
    pub fn begin_stop(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        if !matches!(self.state, SessionState::Recording | SessionState::Paused) {
            return Err(self.reject("stop recording"));
        }
        self.clock.stop(now);
        self.state = SessionState::Stopping;
        Ok(())
    }

    /// Transition from STOPPING to COMPLETED
    pub fn complete(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Stopping {
            return Err(self.reject("complete recording"));
        }
        self.state = SessionState::Completed;
        Ok(())
    }

    /// Keep the most specific diagnosis seen so far
    pub fn note_error(&mut self, diagnosis: Diagnosis) {
        let replace = self
            .last_error
            .as_ref()
            .map_or(true, |current| diagnosis.is_more_specific_than(current));
        if replace {
            self.last_error = Some(diagnosis);
        }
    }

    /// Move an active session to FAILED
    pub fn fail(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        if !self.state.is_active() {
            return Err(self.reject("fail"));
        }
        self.clock.stop(now);
        self.state = SessionState::Failed;
        Ok(())
    }

    /// Clear every field and return to IDLE. Always succeeds.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
