//! Recording process supervisor
//!
//! Owns at most one recording session. A start only succeeds once the
//! capture tool's own status output proves that frames are being produced;
//! every failure funnels through one cleanup path that kills the process,
//! stops the background tasks and resets the session to idle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use tokio::sync::{broadcast, oneshot, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::ports::{
    BackendStatus, CaptureError, CompletedRecording, StartedRecording,
};
use crate::domain::capture::{
    CaptureRequest, DeviceList, Platform, RecordingEvent, RecordingSession, SessionState,
};
use crate::domain::diagnostics::{ErrorCategory, ErrorClassifier, VALIDATION_THRESHOLD};
use crate::domain::recording::{DEFAULT_STARTUP_TIMEOUT_SECS, DEFAULT_STOP_TIMEOUT_SECS};

use super::args;
use super::devices;
use super::diagnostics::{spawn_reader, DiagnosticState, SharedDiagnostics};
use super::process::{ExitWatch, ProcessHandle, ProcessSignal};

/// Interval between liveness probes while recording
pub const LIVENESS_INTERVAL: StdDuration = StdDuration::from_secs(5);
/// Interval between progress events
pub const PROGRESS_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Grace period for the readers to drain after the process exits
const READER_DRAIN: StdDuration = StdDuration::from_millis(500);
/// Bound on reaping after a forced kill
const KILL_GRACE: StdDuration = StdDuration::from_secs(2);

const EVENT_CAPACITY: usize = 64;

/// Supervisor tuning
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub program: String,
    pub platform: Platform,
    pub startup_timeout: StdDuration,
    pub stop_timeout: StdDuration,
    pub liveness_interval: StdDuration,
    pub progress_interval: StdDuration,
    pub validation_threshold: u64,
}

impl SupervisorSettings {
    pub fn new(program: impl Into<String>, platform: Platform) -> Self {
        Self {
            program: program.into(),
            platform,
            startup_timeout: StdDuration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            stop_timeout: StdDuration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
            liveness_interval: LIVENESS_INTERVAL,
            progress_interval: PROGRESS_INTERVAL,
            validation_threshold: VALIDATION_THRESHOLD,
        }
    }

    /// Pause needs stop/continue signals
    pub fn supports_pause(&self) -> bool {
        cfg!(unix) && self.platform.supports_signals()
    }
}

#[derive(Default)]
struct Inner {
    session: RecordingSession,
    process: Option<ProcessHandle>,
    diagnostics: Option<SharedDiagnostics>,
    readers: Vec<JoinHandle<()>>,
    monitor_shutdown: Option<oneshot::Sender<()>>,
}

enum StartOutcome {
    Validated,
    Exited(Option<i32>),
    TimedOut,
}

/// Supervises one capture process at a time
pub struct ProcessSupervisor {
    settings: SupervisorSettings,
    classifier: Arc<ErrorClassifier>,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<RecordingEvent>,
}

impl ProcessSupervisor {
    pub fn new(settings: SupervisorSettings, classifier: Arc<ErrorClassifier>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            settings,
            classifier,
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
        }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.session.state()
    }

    fn emit(&self, event: RecordingEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Start a session and resolve once frames are confirmed.
    ///
    /// The request is checked against `devices`; an id the enumeration does
    /// not know is rejected before anything is spawned.
    pub async fn start(
        &self,
        request: CaptureRequest,
        devices: &DeviceList,
    ) -> Result<StartedRecording, CaptureError> {
        let mut inner = self.inner.lock().await;
        if !inner.session.is_idle() {
            return Err(CaptureError::AlreadyRecording);
        }

        let resolved = match devices::resolve(devices, &request) {
            Ok(resolved) => resolved,
            Err(unknown) => {
                let mut diagnosis = self.classifier.diagnosis_for(ErrorCategory::DeviceNotFound);
                diagnosis.evidence = Some(unknown.to_string());
                warn!(kind = %unknown.kind, id = %unknown.id, "Rejecting request for unknown device");
                let err = CaptureError::Classified(diagnosis);
                self.emit(err.to_event());
                return Err(err);
            }
        };

        let session_id = inner
            .session
            .begin(request.output_path.clone(), request.audio_output_path.clone())?;

        if let Err(e) = create_parent_dirs(&request).await {
            return Err(self.fail_locked(&mut inner, e));
        }

        let argv = args::build(self.settings.platform, &request, &resolved);
        info!(
            %session_id,
            program = %self.settings.program,
            output = %request.output_path.display(),
            screen = %resolved.screen_id,
            audio = ?resolved.audio_input_id,
            "Starting capture process"
        );
        debug!(args = ?argv, "Capture arguments");

        let (handle, output) =
            match ProcessHandle::spawn(&self.settings.program, &argv, self.settings.platform) {
                Ok(spawned) => spawned,
                Err(e) => return Err(self.fail_locked(&mut inner, e)),
            };
        let mut exit = handle.exit_watch();

        if let Err(e) = inner.session.await_frames() {
            inner.process = Some(handle);
            return Err(self.fail_locked(&mut inner, e.into()));
        }

        let diagnostics: SharedDiagnostics = Arc::new(Mutex::new(DiagnosticState::new(
            self.settings.validation_threshold,
        )));
        let validated = Arc::new(Notify::new());
        if let Some(stderr) = output.stderr {
            inner.readers.push(spawn_reader(
                stderr,
                Arc::clone(&diagnostics),
                Arc::clone(&self.classifier),
                Arc::clone(&validated),
            ));
        }
        if let Some(stdout) = output.stdout {
            inner.readers.push(spawn_reader(
                stdout,
                Arc::clone(&diagnostics),
                Arc::clone(&self.classifier),
                Arc::clone(&validated),
            ));
        }
        inner.diagnostics = Some(Arc::clone(&diagnostics));
        inner.process = Some(handle);

        // Other operations are rejected while Validating
        drop(inner);

        let outcome = tokio::select! {
            biased;
            _ = validated.notified() => StartOutcome::Validated,
            status = exit.wait() => StartOutcome::Exited(status.code),
            _ = sleep(self.settings.startup_timeout) => StartOutcome::TimedOut,
        };

        let mut inner = self.inner.lock().await;
        if inner.session.session_id() != Some(session_id) {
            // Cleaned up from outside while validating
            return Err(self.died());
        }

        match outcome {
            StartOutcome::Validated => {
                let frames = diagnostics.lock().await.frames();
                if let Err(e) = inner.session.mark_validated(
                    frames,
                    self.settings.validation_threshold,
                    Instant::now(),
                ) {
                    return Err(self.fail_locked(&mut inner, e.into()));
                }

                let (shutdown_tx, shutdown_rx) = oneshot::channel();
                inner.monitor_shutdown = Some(shutdown_tx);
                self.spawn_monitor(session_id, exit, diagnostics, shutdown_rx);

                let started = StartedRecording {
                    session_id,
                    output_path: request.output_path.clone(),
                    audio_output_path: request.audio_output_path.clone(),
                    started_at: inner.session.started_at().unwrap_or_else(chrono::Utc::now),
                };
                info!(%session_id, frames, "Recording started");
                self.emit(RecordingEvent::Started {
                    output_path: started.output_path.clone(),
                    audio_path: started.audio_output_path.clone(),
                });
                Ok(started)
            }
            StartOutcome::Exited(code) => {
                // Let the readers drain what the process printed last
                for reader in inner.readers.drain(..) {
                    let _ = timeout(READER_DRAIN, reader).await;
                }
                let err = match diagnostics.lock().await.last_error().cloned() {
                    Some(diagnosis) => CaptureError::Classified(diagnosis),
                    None => CaptureError::ExitedEarly {
                        code,
                        message: self.classifier.fallback().message,
                    },
                };
                warn!(%session_id, ?code, "Capture process exited before producing frames");
                Err(self.fail_locked(&mut inner, err))
            }
            StartOutcome::TimedOut => {
                let err = match diagnostics.lock().await.last_error().cloned() {
                    Some(diagnosis) => CaptureError::Classified(diagnosis),
                    None => CaptureError::Timeout {
                        diagnosis: self.classifier.diagnosis_for(ErrorCategory::Timeout),
                        operation: "confirm frame production".to_string(),
                        after_ms: self.settings.startup_timeout.as_millis() as u64,
                    },
                };
                warn!(%session_id, "No frames confirmed before the startup timeout");
                Err(self.fail_locked(&mut inner, err))
            }
        }
    }

    /// Suspend the capture process
    pub async fn pause(&self) -> Result<(), CaptureError> {
        if !self.settings.supports_pause() {
            return Err(self.pause_unsupported("pause"));
        }

        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        inner.session.pause(now)?;

        let signalled = match inner.process.as_ref() {
            Some(process) => process.signal(ProcessSignal::Stop),
            None => Err(self.died()),
        };
        if let Err(e) = signalled {
            let _ = inner.session.resume(now);
            return Err(e);
        }

        debug!("Recording paused");
        self.emit(RecordingEvent::Paused);
        Ok(())
    }

    /// Continue a paused capture process
    pub async fn resume(&self) -> Result<(), CaptureError> {
        if !self.settings.supports_pause() {
            return Err(self.pause_unsupported("resume"));
        }

        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        inner.session.resume(now)?;

        let signalled = match inner.process.as_ref() {
            Some(process) => process.signal(ProcessSignal::Continue),
            None => Err(self.died()),
        };
        if let Err(e) = signalled {
            let _ = inner.session.pause(now);
            return Err(e);
        }

        debug!("Recording resumed");
        self.emit(RecordingEvent::Resumed);
        Ok(())
    }

    fn died(&self) -> CaptureError {
        CaptureError::ProcessDiedUnexpectedly {
            diagnosis: self.classifier.diagnosis_for(ErrorCategory::ProcessDied),
        }
    }

    fn pause_unsupported(&self, capability: &str) -> CaptureError {
        CaptureError::CapabilityNotSupported {
            backend: "ffmpeg".to_string(),
            capability: format!("{} on {}", capability, self.settings.platform),
        }
    }

    /// Stop gracefully, killing the process if it ignores the request for
    /// longer than the stop timeout. Returns with the session back at idle.
    pub async fn stop(&self) -> Result<CompletedRecording, CaptureError> {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let was_paused = inner.session.is_paused();
        inner.session.begin_stop(now)?;

        let session_id = inner.session.session_id();
        let duration = inner.session.elapsed(now);
        let output_path = inner
            .session
            .output_path()
            .map(PathBuf::from)
            .unwrap_or_default();
        let audio_output_path = inner.session.audio_output_path().map(PathBuf::from);

        if let Some(tx) = inner.monitor_shutdown.take() {
            let _ = tx.send(());
        }
        let process = inner.process.take();
        let readers: Vec<JoinHandle<()>> = inner.readers.drain(..).collect();
        drop(inner);

        let mut forced = false;
        if let Some(mut process) = process {
            if was_paused {
                // A stopped process cannot act on the quit request
                if let Err(e) = process.signal(ProcessSignal::Continue) {
                    debug!(error = %e, "Continue before stop failed");
                }
            }
            if let Err(e) = process.request_stop(self.settings.platform).await {
                debug!(error = %e, "Graceful stop request failed");
            }

            match timeout(self.settings.stop_timeout, process.wait()).await {
                Ok(exit) => debug!(code = ?exit.code, "Capture process finished"),
                Err(_) => {
                    warn!(
                        ?session_id,
                        timeout_ms = self.settings.stop_timeout.as_millis() as u64,
                        "Capture process ignored stop request, killing it"
                    );
                    forced = true;
                    process.force_kill();
                    if timeout(KILL_GRACE, process.wait()).await.is_err() {
                        warn!(?session_id, "Capture process did not exit after kill");
                    }
                }
            }
        }

        for reader in readers {
            let _ = timeout(READER_DRAIN, reader).await;
        }

        let mut inner = self.inner.lock().await;
        if let Err(e) = inner.session.complete() {
            debug!(error = %e, "Session changed while stopping");
        }
        cleanup(&mut inner);
        drop(inner);

        info!(
            ?session_id,
            duration_ms = duration.as_millis() as u64,
            forced,
            output = %output_path.display(),
            "Recording completed"
        );
        self.emit(RecordingEvent::Completed {
            output_path: output_path.clone(),
            audio_path: audio_output_path.clone(),
            duration_ms: duration.as_millis() as u64,
        });

        Ok(CompletedRecording {
            output_path,
            audio_output_path,
            duration,
            forced,
        })
    }

    pub async fn status(&self) -> BackendStatus {
        let mut inner = self.inner.lock().await;
        if let Some(diagnostics) = inner.diagnostics.clone() {
            let diagnostics = diagnostics.lock().await;
            inner.session.update_frames(diagnostics.frames());
            if let Some(diagnosis) = diagnostics.last_error() {
                inner.session.note_error(diagnosis.clone());
            }
        }

        let session = &inner.session;
        BackendStatus {
            backend: "ffmpeg".to_string(),
            state: session.state(),
            session_id: session.session_id(),
            started_at: session.started_at(),
            output_path: session.output_path().map(PathBuf::from),
            audio_output_path: session.audio_output_path().map(PathBuf::from),
            elapsed_ms: session.elapsed(Instant::now()).as_millis() as u64,
            validated_frame_count: session.validated_frame_count(),
            is_paused: session.is_paused(),
            last_error: session.last_error().map(|d| d.message.clone()),
        }
    }

    /// Kill any process, stop every background task and return to idle.
    /// Safe to call in any state, any number of times.
    pub async fn force_cleanup(&self) {
        let mut inner = self.inner.lock().await;
        cleanup(&mut inner);
    }

    /// Fail the current session: log the diagnostic tail, clean up and
    /// publish the error
    fn fail_locked(&self, inner: &mut Inner, err: CaptureError) -> CaptureError {
        let _ = inner.session.fail(Instant::now());
        if let Some(diagnostics) = inner.diagnostics.as_ref() {
            if let Ok(diagnostics) = diagnostics.try_lock() {
                for line in diagnostics.tail() {
                    debug!(line = %line, "capture tool tail");
                }
            }
        }
        warn!(code = err.code(), error = %err, "Recording failed");
        cleanup(inner);
        self.emit(err.to_event());
        err
    }

    fn spawn_monitor(
        &self,
        session_id: uuid::Uuid,
        exit: ExitWatch,
        diagnostics: SharedDiagnostics,
        shutdown: oneshot::Receiver<()>,
    ) {
        let monitor = Monitor {
            session_id,
            inner: Arc::clone(&self.inner),
            events: self.events.clone(),
            classifier: Arc::clone(&self.classifier),
            diagnostics,
            liveness_interval: self.settings.liveness_interval,
            progress_interval: self.settings.progress_interval,
        };
        tokio::spawn(monitor.run(exit, shutdown));
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_lock() {
            cleanup(&mut inner);
        }
    }
}

fn cleanup(inner: &mut Inner) {
    if let Some(tx) = inner.monitor_shutdown.take() {
        let _ = tx.send(());
    }
    if let Some(mut process) = inner.process.take() {
        process.force_kill();
    }
    for reader in inner.readers.drain(..) {
        reader.abort();
    }
    inner.diagnostics = None;
    inner.session.reset();
}

async fn create_parent_dirs(request: &CaptureRequest) -> Result<(), CaptureError> {
    let paths = std::iter::once(&request.output_path).chain(request.audio_output_path.as_ref());
    for path in paths {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Watches a validated session for exit, liveness and progress
struct Monitor {
    session_id: uuid::Uuid,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<RecordingEvent>,
    classifier: Arc<ErrorClassifier>,
    diagnostics: SharedDiagnostics,
    liveness_interval: StdDuration,
    progress_interval: StdDuration,
}

impl Monitor {
    async fn run(self, mut exit: ExitWatch, mut shutdown: oneshot::Receiver<()>) {
        let mut liveness = interval(self.liveness_interval);
        let mut progress = interval(self.progress_interval);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
        progress.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Both intervals fire immediately; skip that first tick
        liveness.tick().await;
        progress.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                status = exit.wait() => {
                    self.process_gone(Some(status.code)).await;
                    break;
                }
                _ = liveness.tick() => {
                    if self.is_dead().await {
                        self.process_gone(None).await;
                        break;
                    }
                }
                _ = progress.tick() => self.report_progress().await,
            }
        }
    }

    async fn is_dead(&self) -> bool {
        let inner = self.inner.lock().await;
        match inner.process.as_ref() {
            Some(process) => !process.is_alive(),
            None => false,
        }
    }

    async fn report_progress(&self) {
        let mut inner = self.inner.lock().await;
        if inner.session.session_id() != Some(self.session_id)
            || inner.session.state() != SessionState::Recording
        {
            return;
        }
        let frames = self.diagnostics.lock().await.frames();
        inner.session.update_frames(frames);
        let elapsed = inner.session.elapsed(Instant::now());
        let _ = self.events.send(RecordingEvent::Progress {
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    /// Process exited or vanished while recording, not because of stop()
    async fn process_gone(&self, code: Option<Option<i32>>) {
        let mut inner = self.inner.lock().await;
        let ours = inner.session.session_id() == Some(self.session_id);
        if !ours
            || !matches!(
                inner.session.state(),
                SessionState::Recording | SessionState::Paused
            )
        {
            return;
        }

        let diagnosis = self
            .diagnostics
            .lock()
            .await
            .last_error()
            .cloned()
            .unwrap_or_else(|| self.classifier.diagnosis_for(ErrorCategory::ProcessDied));
        let err = CaptureError::ProcessDiedUnexpectedly { diagnosis };
        match code {
            Some(code) => warn!(session_id = %self.session_id, ?code, "Capture process exited during recording"),
            None => warn!(session_id = %self.session_id, "Capture process vanished during recording"),
        }

        let _ = inner.session.fail(Instant::now());
        let _ = self.events.send(err.to_event());
        cleanup(&mut inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let settings = SupervisorSettings::new("ffmpeg", Platform::MacOs);
        assert_eq!(settings.startup_timeout, StdDuration::from_secs(15));
        assert_eq!(settings.stop_timeout, StdDuration::from_secs(10));
        assert_eq!(settings.liveness_interval, StdDuration::from_secs(5));
        assert_eq!(settings.validation_threshold, 5);
        assert!(!SupervisorSettings::new("ffmpeg", Platform::Windows).supports_pause());
    }

    #[tokio::test]
    async fn stop_without_session_is_rejected() {
        let supervisor = ProcessSupervisor::new(
            SupervisorSettings::new("ffmpeg", Platform::current()),
            Arc::new(ErrorClassifier::builtin()),
        );
        let err = supervisor.stop().await.unwrap_err();
        assert_eq!(err.code(), "invalid_state_transition");
        assert_eq!(supervisor.state().await, SessionState::Idle);
    }

    #[tokio::test]
    async fn pause_without_session_is_rejected() {
        let supervisor = ProcessSupervisor::new(
            SupervisorSettings::new("ffmpeg", Platform::Linux),
            Arc::new(ErrorClassifier::builtin()),
        );
        let err = supervisor.pause().await.unwrap_err();
        if cfg!(unix) {
            assert_eq!(err.code(), "invalid_state_transition");
        } else {
            assert_eq!(err.code(), "capability_not_supported");
        }
    }

    #[tokio::test]
    async fn unknown_screen_is_rejected_before_spawn() {
        let supervisor = ProcessSupervisor::new(
            SupervisorSettings::new("/nonexistent/ffmpeg", Platform::MacOs),
            Arc::new(ErrorClassifier::builtin()),
        );
        let mut events = supervisor.subscribe();
        let devices = DeviceList {
            screens: vec![crate::domain::capture::DeviceDescriptor::screen("1", "Capture screen 0")],
            audio_inputs: vec![],
            screens_fallback: false,
            audio_inputs_fallback: false,
        };

        let err = supervisor
            .start(CaptureRequest::new("/tmp/screenrec-unknown.mp4").with_screen("9"), &devices)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "device_not_found");
        assert_eq!(supervisor.state().await, SessionState::Idle);
        assert!(matches!(events.try_recv(), Ok(RecordingEvent::Error { .. })));
    }

    #[tokio::test]
    async fn missing_tool_fails_and_resets() {
        let supervisor = ProcessSupervisor::new(
            SupervisorSettings::new("/nonexistent/ffmpeg", Platform::MacOs),
            Arc::new(ErrorClassifier::builtin()),
        );
        let devices = devices::fallback_devices(Platform::MacOs, None);
        let dir = std::env::temp_dir().join("screenrec-supervisor-unit");

        let err = supervisor
            .start(CaptureRequest::new(dir.join("out.mp4")), &devices)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "tool_not_found");
        assert_eq!(supervisor.state().await, SessionState::Idle);
        supervisor.force_cleanup().await;
        supervisor.force_cleanup().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn liveness_probe_catches_process_that_vanished_silently() {
        let mut settings = SupervisorSettings::new("sh", Platform::Linux);
        settings.liveness_interval = StdDuration::from_millis(50);
        settings.progress_interval = StdDuration::from_secs(3600);
        let supervisor = ProcessSupervisor::new(settings, Arc::new(ErrorClassifier::builtin()));
        let mut events = supervisor.subscribe();

        // The process is gone, but the exit watch handed to the monitor never fires
        let argv = vec!["-c".to_string(), "exit 0".to_string()];
        let (handle, _output) = ProcessHandle::spawn("sh", &argv, Platform::Linux).unwrap();
        handle.wait().await;
        let (_exit_tx, exit) = ExitWatch::detached();

        let mut inner = supervisor.inner.lock().await;
        let session_id = inner
            .session
            .begin(PathBuf::from("/tmp/screenrec-liveness.mp4"), None)
            .unwrap();
        inner.session.await_frames().unwrap();
        inner.session.mark_validated(5, 5, Instant::now()).unwrap();
        inner.process = Some(handle);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        inner.monitor_shutdown = Some(shutdown_tx);
        drop(inner);

        let diagnostics: SharedDiagnostics = Arc::new(Mutex::new(DiagnosticState::new(5)));
        supervisor.spawn_monitor(session_id, exit, diagnostics, shutdown_rx);

        let event = timeout(StdDuration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            RecordingEvent::Error { code, message } => {
                assert_eq!(code, "process_died_unexpectedly");
                assert_eq!(
                    message,
                    ErrorClassifier::builtin()
                        .diagnosis_for(ErrorCategory::ProcessDied)
                        .message
                );
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(supervisor.state().await, SessionState::Idle);
    }
}
