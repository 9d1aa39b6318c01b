//! ffmpeg capture backend
//!
//! - `devices`: enumeration through the listing mode
//! - `args`: per-platform invocation
//! - `process`: spawned process handle
//! - `diagnostics`: status and error lines from stderr
//! - `supervisor`: session lifecycle
//! - `backend`: the above behind the `CaptureBackend` port

pub mod args;
pub mod backend;
pub mod devices;
pub mod diagnostics;
pub mod process;
pub mod supervisor;

pub use backend::{FfmpegBackend, BACKEND_NAME};
pub use devices::{DeviceRegistry, UnknownDevice};
pub use process::{ProcessExit, ProcessHandle, ProcessSignal};
pub use supervisor::{ProcessSupervisor, SupervisorSettings};
