//! ScreenRec - supervised screen recording through ffmpeg
//!
//! Wraps an external capture process in a session lifecycle that only
//! reports a recording as started once frames are confirmed, classifies
//! the tool's diagnostic output into actionable errors, and stops
//! gracefully with a forced-kill fallback.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Devices, requests, the session state machine, diagnostics parsing
//! - **Application**: The capture backend port, backend router and record use case
//! - **Infrastructure**: The ffmpeg backend (device registry, argument builder,
//!   process supervisor) and the XDG config store
//! - **CLI**: Command-line interface, argument parsing, logging and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
