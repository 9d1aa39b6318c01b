//! Capture domain: devices, requests, sessions and events

pub mod clock;
pub mod device;
pub mod event;
pub mod platform;
pub mod request;
pub mod session;

pub use clock::RecordingClock;
pub use device::{DeviceDescriptor, DeviceKind, DeviceList};
pub use event::RecordingEvent;
pub use platform::{OsVersion, Platform};
pub use request::{CaptureRequest, Quality, ResolvedDevices};
pub use session::{InvalidStateTransition, RecordingSession, SessionState};
