//! Domain layer - Core business logic
//!
//! Contains value objects, the recording session state machine,
//! diagnostic parsing and domain errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod recording;

// Re-export common types
pub use capture::{
    CaptureRequest, DeviceDescriptor, DeviceKind, DeviceList, OsVersion, Platform, Quality,
    RecordingEvent, RecordingSession, SessionState,
};
pub use config::AppConfig;
pub use diagnostics::{Diagnosis, ErrorCategory, ErrorClassifier, ErrorTable};
pub use error::*;
pub use recording::Duration;
