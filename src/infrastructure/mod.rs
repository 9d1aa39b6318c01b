//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like ffmpeg and the filesystem.

pub mod capture;
pub mod config;

// Re-export adapters
pub use capture::{default_router, detect_host, FfmpegBackend, ProcessSupervisor, SupervisorSettings};
pub use config::XdgConfigStore;
