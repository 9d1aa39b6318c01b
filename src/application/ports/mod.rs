//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod backend;
pub mod config;

// Re-export common types
pub use backend::{
    BackendCapabilities, BackendStatus, CaptureBackend, CaptureError, CompletedRecording,
    StartedRecording,
};
pub use config::ConfigStore;
