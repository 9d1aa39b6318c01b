//! Recording value objects

pub mod duration;

pub use duration::{Duration, DEFAULT_STARTUP_TIMEOUT_SECS, DEFAULT_STOP_TIMEOUT_SECS};
