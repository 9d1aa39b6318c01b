//! Capture backends and their wiring

pub mod ffmpeg;

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::application::ports::{BackendCapabilities, CaptureBackend};
use crate::application::{BackendRouter, HostEnvironment};
use crate::domain::capture::{OsVersion, Platform};
use crate::domain::diagnostics::ErrorClassifier;

pub use ffmpeg::{FfmpegBackend, ProcessSupervisor, SupervisorSettings};

const VERSION_PROBE_TIMEOUT: StdDuration = StdDuration::from_secs(2);

/// Router with the ffmpeg backend as its universal fallback.
/// Native backends are registered on top by the caller.
pub fn default_router(settings: SupervisorSettings, classifier: Arc<ErrorClassifier>) -> BackendRouter {
    let capabilities = BackendCapabilities {
        pause: settings.supports_pause(),
        system_audio: false,
    };
    BackendRouter::new(
        ffmpeg::BACKEND_NAME,
        Box::new(move || {
            Ok(Arc::new(FfmpegBackend::new(settings.clone(), Arc::clone(&classifier)))
                as Arc<dyn CaptureBackend>)
        }),
    )
    .with_fallback_capabilities(capabilities)
}

/// Platform of this build and, where it can be asked, the OS version
pub async fn detect_host() -> HostEnvironment {
    let platform = Platform::current();
    let probe: Option<(&str, &[&str])> = match platform {
        Platform::MacOs => Some(("sw_vers", &["-productVersion"][..])),
        Platform::Linux => Some(("uname", &["-r"][..])),
        Platform::Windows => None,
    };

    let os_version = match probe {
        Some((program, args)) => probe_version(program, args).await,
        None => None,
    };
    debug!(%platform, os_version = ?os_version, "Detected host");

    HostEnvironment::new(platform, os_version)
}

async fn probe_version(program: &str, args: &[&str]) -> Option<OsVersion> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = timeout(VERSION_PROBE_TIMEOUT, output).await.ok()?.ok()?;
    if !output.status.success() {
        return None;
    }
    OsVersion::parse_lenient(&String::from_utf8_lossy(&output.stdout))
}
