//! Command runners: record, devices, backends

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::application::ports::{BackendCapabilities, CaptureBackend, CaptureError, ConfigStore};
use crate::application::{RecordCallbacks, RecordInput, RecordScreenUseCase};
use crate::domain::capture::{CaptureRequest, Platform, RecordingEvent};
use crate::domain::config::AppConfig;
use crate::domain::diagnostics::ErrorClassifier;
use crate::domain::error::ConfigError;
use crate::infrastructure::{default_router, detect_host, SupervisorSettings, XdgConfigStore};

use super::args::RecordOptions;
use super::presenter::Presenter;
use super::signals::ControlSignals;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Record until the duration elapses, Ctrl+C, or a failure
pub async fn run_record(options: RecordOptions, config: &AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();

    let classifier = match load_classifier(config, &XdgConfigStore::new()).await {
        Ok(classifier) => classifier,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let required = BackendCapabilities {
        pause: false,
        system_audio: options.system_audio,
    };
    presenter.start_spinner("Preparing capture backend...");
    let backend = match select_backend(config, classifier, required).await {
        Ok(backend) => backend,
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let request = build_request(&options, config, Local::now());
    let output_path = request.output_path.clone();

    let (signals, controls) = match ControlSignals::setup() {
        Ok(pair) => pair,
        Err(e) => {
            presenter.spinner_fail(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    presenter.update_spinner(&format!(
        "Waiting for frames from {}...",
        backend.name()
    ));
    let presenter = Arc::new(std::sync::Mutex::new(presenter));
    let total_ms = options.duration.map(|d| d.as_millis());
    let json = options.json;

    let on_event = {
        let presenter = Arc::clone(&presenter);
        move |event: &RecordingEvent| {
            let Ok(mut presenter) = presenter.lock() else {
                return;
            };
            if json {
                presenter.json_line(event);
            }
            show_event(&mut presenter, event, total_ms);
        }
    };
    let on_warning = {
        let presenter = Arc::clone(&presenter);
        move |message: &str| {
            if let Ok(presenter) = presenter.lock() {
                presenter.warn(message);
            }
        }
    };
    let callbacks = RecordCallbacks {
        on_event: Some(Box::new(on_event)),
        on_warning: Some(Box::new(on_warning)),
    };

    let use_case = RecordScreenUseCase::new(backend);
    let input = RecordInput {
        request,
        duration: options.duration,
    };
    let result = use_case.execute(input, controls, callbacks).await;
    drop(signals);

    let Ok(mut presenter) = presenter.lock() else {
        return ExitCode::from(EXIT_ERROR);
    };
    match result {
        Ok(output) => {
            presenter.stop_spinner();
            let completed = output.completed;
            if completed.forced {
                presenter.warn("Capture tool did not exit in time and was killed");
            }
            presenter.success(&format!(
                "Recorded {}",
                presenter.format_elapsed(completed.duration.as_millis() as u64)
            ));
            if !json {
                presenter.output(&completed.output_path.to_string_lossy());
                if let Some(audio) = completed.audio_output_path {
                    presenter.output(&audio.to_string_lossy());
                }
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            debug!(code = e.code(), output = %output_path.display(), "Recording failed");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn show_event(presenter: &mut Presenter, event: &RecordingEvent, total_ms: Option<u64>) {
    match event {
        RecordingEvent::Started { output_path, .. } => {
            presenter.spinner_success(&format!("Recording to {}", output_path.display()));
            presenter.start_spinner("Recording");
            presenter.update_recording_progress(0, total_ms);
        }
        RecordingEvent::Progress { duration_ms } => {
            presenter.update_recording_progress(*duration_ms, total_ms);
        }
        RecordingEvent::Paused => presenter.update_spinner("Paused (send SIGUSR1 to resume)"),
        RecordingEvent::Resumed => presenter.update_spinner("Resumed"),
        RecordingEvent::Completed { .. } | RecordingEvent::Error { .. } => {}
    }
}

/// Print the devices the selected backend can capture
pub async fn run_devices(refresh: bool, json: bool, config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let classifier = match load_classifier(config, &XdgConfigStore::new()).await {
        Ok(classifier) => classifier,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let backend = match select_backend(config, classifier, BackendCapabilities::default()).await
    {
        Ok(backend) => backend,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match backend.list_devices(refresh).await {
        Ok(devices) if json => {
            presenter.json_pretty(&devices);
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(devices) => {
            presenter.device_list(&devices);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Describe the registered backends and which one this host would use
pub async fn run_backends(json: bool, config: &AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let host = detect_host().await;
    let router = default_router(
        supervisor_settings(config),
        Arc::new(ErrorClassifier::builtin()),
    );
    let rows = router.describe(&host);
    let selected = rows.iter().find(|r| r.eligible).map(|r| r.name.clone());

    if json {
        presenter.json_pretty(&serde_json::json!({
            "host": host,
            "selected": selected,
            "backends": rows,
        }));
    } else {
        let version = host
            .os_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        presenter.info(&format!("Host: {} {}", host.platform, version));
        presenter.backend_list(&rows, selected.as_deref());
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Built-in error table, or the one named by `error_table`
pub async fn load_classifier<S: ConfigStore>(
    config: &AppConfig,
    store: &S,
) -> Result<Arc<ErrorClassifier>, ConfigError> {
    let classifier = match config.error_table.as_deref() {
        Some(path) => {
            let table = store.load_error_table(Path::new(path)).await?;
            ErrorClassifier::new(table)
        }
        None => ErrorClassifier::builtin(),
    };
    debug!(version = classifier.version(), "Error table loaded");
    Ok(Arc::new(classifier))
}

/// Supervisor settings for this platform from merged config
pub fn supervisor_settings(config: &AppConfig) -> SupervisorSettings {
    let mut settings = SupervisorSettings::new(config.ffmpeg_path_or_default(), Platform::current());
    settings.startup_timeout = config.startup_timeout_or_default().as_std();
    settings.stop_timeout = config.stop_timeout_or_default().as_std();
    settings
}

async fn select_backend(
    config: &AppConfig,
    classifier: Arc<ErrorClassifier>,
    required: BackendCapabilities,
) -> Result<Arc<dyn CaptureBackend>, CaptureError> {
    let host = detect_host().await;
    let router = default_router(supervisor_settings(config), classifier);
    router
        .select_backend_with(&host, required)
        .await
        .map_err(|e| match e {
            CaptureError::NoBackendAvailable { .. } if required.system_audio => {
                CaptureError::CapabilityNotSupported {
                    backend: "any available".to_string(),
                    capability: "system_audio".to_string(),
                }
            }
            other => other,
        })
}

/// Turn options into a request, filling the output path when absent
pub fn build_request(
    options: &RecordOptions,
    config: &AppConfig,
    now: DateTime<Local>,
) -> CaptureRequest {
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&config.output_dir_or_default(), now));

    let mut request = CaptureRequest::new(output)
        .with_system_audio(options.system_audio)
        .with_quality(options.video_quality, options.audio_quality);
    if let Some(ref screen) = options.screen {
        request = request.with_screen(screen.clone());
    }
    if options.microphone {
        request = request.with_microphone(options.audio_device.clone());
        if let Some(ref audio) = options.audio_output {
            request = request.with_audio_output(audio.clone());
        }
    } else if options.audio_output.is_some() {
        warn!("--audio-output ignored without microphone capture");
    }
    request
}

/// `<dir>/recording-<YYYYMMDD-HHMMSS>.mp4`
pub fn default_output_path(dir: &Path, now: DateTime<Local>) -> PathBuf {
    dir.join(format!("recording-{}.mp4", now.format("%Y%m%d-%H%M%S")))
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, path = %store.path().display(), "Ignoring unreadable config file");
            AppConfig::empty()
        }
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(AppConfig::from_env())
        .merge(cli_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capture::Quality;
    use chrono::TimeZone;

    fn options() -> RecordOptions {
        RecordOptions {
            duration: None,
            screen: None,
            audio_device: None,
            microphone: false,
            system_audio: false,
            video_quality: Quality::Medium,
            audio_quality: Quality::Medium,
            output: None,
            audio_output: None,
            json: false,
        }
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 5, 7).unwrap()
    }

    #[test]
    fn default_output_uses_timestamp() {
        let path = default_output_path(Path::new("/videos"), noon());
        assert_eq!(path, PathBuf::from("/videos/recording-20240309-120507.mp4"));
    }

    #[test]
    fn request_uses_configured_output_dir() {
        let config = AppConfig {
            output_dir: Some("/srv/rec".to_string()),
            ..AppConfig::defaults()
        };
        let request = build_request(&options(), &config, noon());
        assert_eq!(
            request.output_path,
            PathBuf::from("/srv/rec/recording-20240309-120507.mp4")
        );
        assert!(!request.include_microphone);
    }

    #[test]
    fn audio_output_requires_microphone() {
        let mut opts = options();
        opts.output = Some(PathBuf::from("/tmp/a.mp4"));
        opts.audio_output = Some(PathBuf::from("/tmp/a.wav"));
        let request = build_request(&opts, &AppConfig::defaults(), noon());
        assert_eq!(request.audio_output_path, None);

        opts.microphone = true;
        opts.audio_device = Some("0".to_string());
        let request = build_request(&opts, &AppConfig::defaults(), noon());
        assert_eq!(request.audio_output_path, Some(PathBuf::from("/tmp/a.wav")));
        assert_eq!(request.audio_input_id.as_deref(), Some("0"));
    }

    #[test]
    fn settings_follow_config() {
        let config = AppConfig {
            ffmpeg_path: Some("/opt/ffmpeg".to_string()),
            stop_timeout: Some("3s".to_string()),
            ..AppConfig::defaults()
        };
        let settings = supervisor_settings(&config);
        assert_eq!(settings.program, "/opt/ffmpeg");
        assert_eq!(settings.stop_timeout.as_secs(), 3);
        assert_eq!(settings.startup_timeout.as_secs(), 15);
    }

    #[tokio::test]
    async fn builtin_classifier_without_table() {
        let store = XdgConfigStore::with_path("/nonexistent/config.toml");
        let classifier = load_classifier(&AppConfig::defaults(), &store).await.unwrap();
        assert_eq!(classifier.version(), "builtin-1");
    }

    #[tokio::test]
    async fn missing_error_table_is_an_error() {
        let store = XdgConfigStore::with_path("/nonexistent/config.toml");
        let config = AppConfig {
            error_table: Some("errors.toml".to_string()),
            ..AppConfig::defaults()
        };
        assert!(load_classifier(&config, &store).await.is_err());
    }
}
