//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::capture::Quality;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    validate_config_value(key, value)?;

    let mut config = store.load().await?;
    apply(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    presenter.output(value_of(&config, key).as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, value_of(&config, key).as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

/// Store an already validated value
fn apply(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let text = Some(value.to_string());
    match key {
        "ffmpeg_path" => config.ffmpeg_path = text,
        "output_dir" => config.output_dir = text,
        "screen" => config.screen = text,
        "audio_device" => config.audio_device = text,
        "microphone" => config.microphone = Some(bool_value(key, value)?),
        "system_audio" => config.system_audio = Some(bool_value(key, value)?),
        "video_quality" => config.video_quality = Some(value.to_lowercase()),
        "audio_quality" => config.audio_quality = Some(value.to_lowercase()),
        "duration" => config.duration = text,
        "startup_timeout" => config.startup_timeout = text,
        "stop_timeout" => config.stop_timeout = text,
        "error_table" => config.error_table = text,
        _ => return check_key(key),
    }
    Ok(())
}

fn value_of(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "ffmpeg_path" => config.ffmpeg_path.clone(),
        "output_dir" => config.output_dir.clone(),
        "screen" => config.screen.clone(),
        "audio_device" => config.audio_device.clone(),
        "microphone" => config.microphone.map(|b| b.to_string()),
        "system_audio" => config.system_audio.map(|b| b.to_string()),
        "video_quality" => config.video_quality.clone(),
        "audio_quality" => config.audio_quality.clone(),
        "duration" => config.duration.clone(),
        "startup_timeout" => config.startup_timeout.clone(),
        "stop_timeout" => config.stop_timeout.clone(),
        "error_table" => config.error_table.clone(),
        _ => None,
    }
}

/// Validate a config value based on key type
fn validate_config_value(key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "duration" | "startup_timeout" | "stop_timeout" => {
            value
                .parse::<Duration>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "video_quality" | "audio_quality" => {
            value
                .parse::<Quality>()
                .map_err(|e| invalid(e.to_string()))?;
        }
        "microphone" | "system_audio" => {
            bool_value(key, value)?;
        }
        "ffmpeg_path" | "output_dir" | "error_table" => {
            if value.trim().is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
        }
        _ => {} // device ids are opaque
    }
    Ok(())
}

fn bool_value(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::ValidationError {
        key: key.to_string(),
        message: "Value must be 'true' or 'false'".to_string(),
    })
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
