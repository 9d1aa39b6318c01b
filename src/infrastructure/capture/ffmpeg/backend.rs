//! Generic capture backend: device registry, argument builder and process
//! supervisor behind the [`CaptureBackend`] port

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::info;

use crate::application::ports::{
    BackendCapabilities, BackendStatus, CaptureBackend, CaptureError, CompletedRecording,
    StartedRecording,
};
use crate::domain::capture::{CaptureRequest, DeviceDescriptor, DeviceList, RecordingEvent};
use crate::domain::diagnostics::ErrorClassifier;

use super::devices::{DeviceRegistry, LIST_TIMEOUT};
use super::supervisor::{ProcessSupervisor, SupervisorSettings};

/// Name the router knows this backend by
pub const BACKEND_NAME: &str = "ffmpeg";

/// Spawn-based backend that works wherever ffmpeg does
pub struct FfmpegBackend {
    registry: DeviceRegistry,
    supervisor: ProcessSupervisor,
}

impl FfmpegBackend {
    pub fn new(settings: SupervisorSettings, classifier: Arc<ErrorClassifier>) -> Self {
        let registry = DeviceRegistry::new(settings.program.clone(), settings.platform);
        Self {
            registry,
            supervisor: ProcessSupervisor::new(settings, classifier),
        }
    }

    /// Replace the device registry, e.g. to pin the X display
    pub fn with_registry(mut self, registry: DeviceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Run `<program> -version` and return its first line
    async fn probe_tool(&self) -> Result<String, CaptureError> {
        let program = self.supervisor.settings().program.as_str();
        let output = Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(LIST_TIMEOUT, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CaptureError::ToolNotFound {
                    program: program.to_string(),
                })
            }
            Ok(Err(e)) => {
                return Err(CaptureError::InitializationFailed {
                    backend: BACKEND_NAME.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(CaptureError::InitializationFailed {
                    backend: BACKEND_NAME.to_string(),
                    message: format!("{} -version did not finish", program),
                })
            }
        };

        if !output.status.success() {
            return Err(CaptureError::InitializationFailed {
                backend: BACKEND_NAME.to_string(),
                message: format!("{} -version exited with {}", program, output.status),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

#[async_trait]
impl CaptureBackend for FfmpegBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            pause: self.supervisor.settings().supports_pause(),
            system_audio: false,
        }
    }

    async fn initialize(&self) -> Result<(), CaptureError> {
        let version = self.probe_tool().await?;
        info!(
            program = %self.supervisor.settings().program,
            %version,
            "Capture tool available"
        );
        self.registry.initialize().await;
        Ok(())
    }

    async fn get_available_screens(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        Ok(self.registry.list_devices().await.screens)
    }

    async fn get_available_audio_devices(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        Ok(self.registry.list_devices().await.audio_inputs)
    }

    async fn list_devices(&self, refresh: bool) -> Result<DeviceList, CaptureError> {
        if refresh {
            Ok(self.registry.refresh().await)
        } else {
            Ok(self.registry.list_devices().await)
        }
    }

    async fn start_recording(
        &self,
        request: CaptureRequest,
    ) -> Result<StartedRecording, CaptureError> {
        let devices = self.registry.list_devices().await;
        self.supervisor.start(request, &devices).await
    }

    async fn stop_recording(&self) -> Result<CompletedRecording, CaptureError> {
        self.supervisor.stop().await
    }

    async fn pause_recording(&self) -> Result<(), CaptureError> {
        self.supervisor.pause().await
    }

    async fn resume_recording(&self) -> Result<(), CaptureError> {
        self.supervisor.resume().await
    }

    async fn get_status(&self) -> BackendStatus {
        self.supervisor.status().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.supervisor.subscribe()
    }
}
