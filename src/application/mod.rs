//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations, the backend router and
//! trait definitions for external system interactions.

pub mod ports;
pub mod record;
pub mod router;

// Re-export use cases
pub use record::{
    RecordCallbacks, RecordControl, RecordError, RecordInput, RecordOutput, RecordScreenUseCase,
};
pub use router::{BackendConstraints, BackendFactory, BackendInfo, BackendRouter, HostEnvironment};
