//! ScreenRec CLI entry point

use std::process::ExitCode;

use clap::Parser;

use screenrec::cli::{
    app::{load_merged_config, run_backends, run_devices, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, RecordOptions},
    config_cmd::handle_config_command,
    logging::init_logging,
    presenter::Presenter,
};
use screenrec::domain::capture::Quality;
use screenrec::domain::config::AppConfig;
use screenrec::domain::recording::Duration;
use screenrec::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    let presenter = Presenter::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        screen: cli.screen.clone(),
        audio_device: cli.audio.clone(),
        microphone: if cli.wants_microphone() { Some(true) } else { None },
        system_audio: if cli.system_audio { Some(true) } else { None },
        video_quality: cli.video_quality.map(|q| Quality::from(q).to_string()),
        audio_quality: cli.audio_quality.map(|q| Quality::from(q).to_string()),
        duration: cli.duration.clone(),
        ..AppConfig::empty()
    };

    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices { refresh, json }) => {
            let config = load_merged_config(AppConfig::empty()).await;
            return run_devices(refresh, json, &config).await;
        }
        Some(Commands::Backends { json }) => {
            let config = load_merged_config(AppConfig::empty()).await;
            return run_backends(json, &config).await;
        }
        None => {}
    }

    // Merge config
    let config = load_merged_config(cli_config).await;

    // Only a duration given on the command line is a usage error
    let duration = match config.duration.as_ref() {
        Some(s) => match s.parse::<Duration>() {
            Ok(d) => Some(d),
            Err(e) if cli.duration.is_some() => {
                presenter.error(&format!("Invalid duration: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
            Err(e) => {
                presenter.error(&format!("Invalid duration in config: {}", e));
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => None,
    };

    let options = RecordOptions {
        duration,
        screen: config.screen.clone(),
        audio_device: config.audio_device.clone(),
        microphone: config.microphone_or_default(),
        system_audio: config.system_audio_or_default(),
        video_quality: config.video_quality_or_default(),
        audio_quality: config.audio_quality_or_default(),
        output: cli.output.clone(),
        audio_output: cli.audio_output.clone(),
        json: cli.json,
    };

    run_record(options, &config).await
}
