//! Record screen use case

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::domain::capture::{CaptureRequest, RecordingEvent};
use crate::domain::recording::Duration;

use super::ports::{CaptureBackend, CaptureError, CompletedRecording, StartedRecording};

/// Errors from the record use case
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The backend reported a failure while recording
    #[error("Recording interrupted: {message}")]
    Interrupted { message: String, code: String },
}

impl RecordError {
    pub fn code(&self) -> &str {
        match self {
            Self::Capture(e) => e.code(),
            Self::Interrupted { code, .. } => code,
        }
    }
}

/// Requests from the user while a recording runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordControl {
    Stop,
    TogglePause,
}

/// Input parameters for the record use case
#[derive(Debug, Clone)]
pub struct RecordInput {
    pub request: CaptureRequest,
    /// Recorded time after which to stop; paused time does not count.
    /// None records until [`RecordControl::Stop`].
    pub duration: Option<Duration>,
}

/// Output from the record use case
#[derive(Debug, Clone)]
pub struct RecordOutput {
    pub started: StartedRecording,
    pub completed: CompletedRecording,
}

/// Callbacks for events and non-fatal problems
#[derive(Default)]
#[allow(clippy::type_complexity)]
pub struct RecordCallbacks {
    /// Every event the backend publishes, in order
    pub on_event: Option<Box<dyn Fn(&RecordingEvent) + Send + Sync>>,
    /// A control request could not be honoured
    pub on_warning: Option<Box<dyn Fn(&str) + Send + Sync>>,
}

impl RecordCallbacks {
    fn event(&self, event: &RecordingEvent) {
        if let Some(ref cb) = self.on_event {
            cb(event);
        }
    }

    fn warning(&self, message: &str) {
        if let Some(ref cb) = self.on_warning {
            cb(message);
        }
    }
}

/// Start, wait for a stop condition, stop
pub struct RecordScreenUseCase {
    backend: Arc<dyn CaptureBackend>,
}

impl RecordScreenUseCase {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CaptureBackend> {
        &self.backend
    }

    /// Execute one recording.
    ///
    /// `controls` may be closed at any time; the recording then runs until
    /// the duration elapses or the backend fails.
    pub async fn execute(
        &self,
        input: RecordInput,
        mut controls: mpsc::Receiver<RecordControl>,
        callbacks: RecordCallbacks,
    ) -> Result<RecordOutput, RecordError> {
        // Subscribe first so `started` is not missed
        let mut events = self.backend.subscribe();
        let started = self.backend.start_recording(input.request).await?;

        let limit = input.duration.map(|d| d.as_std());
        let mut deadline = limit.map(|l| Instant::now() + l);
        let mut controls_open = true;

        loop {
            tokio::select! {
                _ = wait_for(deadline) => {
                    debug!("Recording duration reached");
                    break;
                }
                control = controls.recv(), if controls_open => match control {
                    Some(RecordControl::Stop) => break,
                    Some(RecordControl::TogglePause) => {
                        deadline = self.toggle_pause(limit, &callbacks).await.unwrap_or(deadline);
                    }
                    None => controls_open = false,
                },
                event = events.recv() => match event {
                    Ok(event) => {
                        callbacks.event(&event);
                        if let RecordingEvent::Error { message, code } = event {
                            return Err(RecordError::Interrupted { message, code });
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(RecordError::Interrupted {
                            message: "capture backend went away".to_string(),
                            code: "process_died_unexpectedly".to_string(),
                        });
                    }
                },
            }
        }

        let completed = self.backend.stop_recording().await?;

        // Forward what was published during stop, `completed` included
        while let Ok(event) = events.try_recv() {
            callbacks.event(&event);
        }

        Ok(RecordOutput { started, completed })
    }

    /// Pause or resume. Returns the new deadline, or None when nothing
    /// changed.
    async fn toggle_pause(
        &self,
        limit: Option<std::time::Duration>,
        callbacks: &RecordCallbacks,
    ) -> Option<Option<Instant>> {
        if !self.backend.capabilities().pause {
            callbacks.warning(&format!(
                "Pause is not supported by the {} backend",
                self.backend.name()
            ));
            return None;
        }

        let status = self.backend.get_status().await;
        let result = if status.is_paused {
            self.backend.resume_recording().await
        } else {
            self.backend.pause_recording().await
        };

        if let Err(e) = result {
            warn!(error = %e, "Pause toggle failed");
            callbacks.warning(&e.to_string());
            return None;
        }

        if status.is_paused {
            // Resumed: the remaining budget is the limit minus recorded time
            let recorded = std::time::Duration::from_millis(status.elapsed_ms);
            Some(limit.map(|l| Instant::now() + l.saturating_sub(recorded)))
        } else {
            // Paused: no deadline until resumed
            Some(None)
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BackendCapabilities, BackendStatus};
    use crate::domain::capture::DeviceDescriptor;
    use crate::domain::diagnostics::{ErrorCategory, ErrorClassifier};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use uuid::Uuid;

    struct MockBackend {
        pause: bool,
        paused: AtomicBool,
        fail_start: bool,
        pause_calls: AtomicUsize,
        resume_calls: AtomicUsize,
        stop_calls: AtomicUsize,
        events: broadcast::Sender<RecordingEvent>,
    }

    impl MockBackend {
        fn new(pause: bool) -> Self {
            let (events, _) = broadcast::channel(16);
            Self {
                pause,
                paused: AtomicBool::new(false),
                fail_start: false,
                pause_calls: AtomicUsize::new(0),
                resume_calls: AtomicUsize::new(0),
                stop_calls: AtomicUsize::new(0),
                events,
            }
        }
    }

    #[async_trait]
    impl CaptureBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn capabilities(&self) -> BackendCapabilities {
            BackendCapabilities {
                pause: self.pause,
                system_audio: false,
            }
        }

        async fn initialize(&self) -> Result<(), CaptureError> {
            Ok(())
        }

        async fn get_available_screens(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
            Ok(vec![DeviceDescriptor::screen("1", "Capture screen 0")])
        }

        async fn get_available_audio_devices(
            &self,
        ) -> Result<Vec<DeviceDescriptor>, CaptureError> {
            Ok(vec![])
        }

        async fn start_recording(
            &self,
            request: CaptureRequest,
        ) -> Result<StartedRecording, CaptureError> {
            if self.fail_start {
                return Err(CaptureError::Timeout {
                    diagnosis: ErrorClassifier::builtin().diagnosis_for(ErrorCategory::Timeout),
                    operation: "confirm frames".to_string(),
                    after_ms: 15_000,
                });
            }
            let _ = self.events.send(RecordingEvent::Started {
                output_path: request.output_path.clone(),
                audio_path: None,
            });
            Ok(StartedRecording {
                session_id: Uuid::new_v4(),
                output_path: request.output_path,
                audio_output_path: None,
                started_at: chrono::Utc::now(),
            })
        }

        async fn stop_recording(&self) -> Result<CompletedRecording, CaptureError> {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            let _ = self.events.send(RecordingEvent::Completed {
                output_path: PathBuf::from("/tmp/out.mp4"),
                audio_path: None,
                duration_ms: 100,
            });
            Ok(CompletedRecording {
                output_path: PathBuf::from("/tmp/out.mp4"),
                audio_output_path: None,
                duration: StdDuration::from_millis(100),
                forced: false,
            })
        }

        async fn pause_recording(&self) -> Result<(), CaptureError> {
            self.pause_calls.fetch_add(1, Ordering::SeqCst);
            self.paused.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn resume_recording(&self) -> Result<(), CaptureError> {
            self.resume_calls.fetch_add(1, Ordering::SeqCst);
            self.paused.store(false, Ordering::SeqCst);
            Ok(())
        }

        async fn get_status(&self) -> BackendStatus {
            BackendStatus {
                is_paused: self.paused.load(Ordering::SeqCst),
                ..BackendStatus::default()
            }
        }

        fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
            self.events.subscribe()
        }
    }

    fn input(duration: Option<Duration>) -> RecordInput {
        RecordInput {
            request: CaptureRequest::new("/tmp/out.mp4"),
            duration,
        }
    }

    fn collecting() -> (RecordCallbacks, Arc<std::sync::Mutex<Vec<String>>>) {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callbacks = RecordCallbacks {
            on_event: Some(Box::new(move |e| sink.lock().unwrap().push(e.name().to_string()))),
            on_warning: None,
        };
        (callbacks, seen)
    }

    #[tokio::test]
    async fn stops_when_duration_elapses() {
        let backend = Arc::new(MockBackend::new(true));
        let use_case = RecordScreenUseCase::new(backend.clone());
        let (_tx, rx) = mpsc::channel(4);
        let (callbacks, seen) = collecting();

        let output = use_case
            .execute(input(Some(Duration::from_millis(50))), rx, callbacks)
            .await
            .unwrap();

        assert_eq!(output.completed.output_path, PathBuf::from("/tmp/out.mp4"));
        assert_eq!(backend.stop_calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec!["started", "completed"]);
    }

    #[tokio::test]
    async fn stop_control_ends_unbounded_recording() {
        let backend = Arc::new(MockBackend::new(true));
        let use_case = RecordScreenUseCase::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);
        tx.send(RecordControl::Stop).await.unwrap();

        use_case
            .execute(input(None), rx, RecordCallbacks::default())
            .await
            .unwrap();
        assert_eq!(backend.stop_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn toggle_pauses_then_resumes() {
        let backend = Arc::new(MockBackend::new(true));
        let use_case = RecordScreenUseCase::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);
        tx.send(RecordControl::TogglePause).await.unwrap();
        tx.send(RecordControl::TogglePause).await.unwrap();
        tx.send(RecordControl::Stop).await.unwrap();

        use_case
            .execute(input(None), rx, RecordCallbacks::default())
            .await
            .unwrap();
        assert_eq!(backend.pause_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.resume_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn toggle_without_capability_warns() {
        let backend = Arc::new(MockBackend::new(false));
        let use_case = RecordScreenUseCase::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);
        tx.send(RecordControl::TogglePause).await.unwrap();
        tx.send(RecordControl::Stop).await.unwrap();

        let warnings = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&warnings);
        let callbacks = RecordCallbacks {
            on_event: None,
            on_warning: Some(Box::new(move |w| sink.lock().unwrap().push(w.to_string()))),
        };

        use_case.execute(input(None), rx, callbacks).await.unwrap();
        assert_eq!(backend.pause_calls.load(Ordering::SeqCst), 0);
        assert!(warnings.lock().unwrap()[0].contains("not supported"));
    }

    #[tokio::test]
    async fn start_failure_is_returned() {
        let mut backend = MockBackend::new(true);
        backend.fail_start = true;
        let backend = Arc::new(backend);
        let use_case = RecordScreenUseCase::new(backend.clone());
        let (_tx, rx) = mpsc::channel(4);

        let err = use_case
            .execute(input(None), rx, RecordCallbacks::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "timeout");
        assert_eq!(backend.stop_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn error_event_interrupts_recording() {
        let backend = Arc::new(MockBackend::new(true));
        let use_case = RecordScreenUseCase::new(backend.clone());
        let (_tx, rx) = mpsc::channel(4);

        let events = backend.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(30)).await;
            let _ = events.send(RecordingEvent::Error {
                message: "Capture process died unexpectedly".to_string(),
                code: "process_died_unexpectedly".to_string(),
            });
        });

        let err = use_case
            .execute(input(None), rx, RecordCallbacks::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "process_died_unexpectedly");
        assert_eq!(backend.stop_calls.load(Ordering::SeqCst), 0);
    }
}
