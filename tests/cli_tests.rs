//! CLI integration tests

use std::process::Command;

fn screenrec_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_screenrec"));
    // Keep the user's real config out of the way
    cmd.env("XDG_CONFIG_HOME", "/nonexistent/screenrec-tests")
        .env_remove("SCREENREC_FFMPEG")
        .env_remove("SCREENREC_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let output = screenrec_bin()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--duration"));
    assert!(stdout.contains("--screen"));
    assert!(stdout.contains("--mic"));
    assert!(stdout.contains("--system-audio"));
    assert!(stdout.contains("--audio-output"));
    assert!(stdout.contains("devices"));
    assert!(stdout.contains("backends"));
}

#[test]
fn version_output() {
    let output = screenrec_bin()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("screenrec"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let output = screenrec_bin()
        .args(["config", "path"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("screenrec"));
    assert!(stdout.contains("config.toml"));
}

#[test]
fn config_help() {
    let output = screenrec_bin()
        .args(["config", "--help"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("init"));
    assert!(stdout.contains("set"));
    assert!(stdout.contains("get"));
    assert!(stdout.contains("list"));
    assert!(stdout.contains("path"));
}

#[test]
fn invalid_duration_is_usage_error() {
    let output = screenrec_bin()
        .args(["--duration", "invalid"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid duration"),
        "Expected error about invalid duration, got: {}",
        stderr
    );
}

#[test]
fn invalid_quality_error() {
    let output = screenrec_bin()
        .args(["--video-quality", "ultra"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("possible values"),
        "Expected error about invalid quality, got: {}",
        stderr
    );
}

#[test]
fn backends_lists_the_fallback() {
    let output = screenrec_bin()
        .args(["backends", "--json"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("backends --json prints JSON");
    assert_eq!(json["selected"], "ffmpeg");
    assert_eq!(json["backends"][0]["name"], "ffmpeg");
    assert_eq!(json["backends"][0]["fallback"], true);
}

#[cfg(unix)]
mod with_fake_tool {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    const FAKE_FFMPEG: &str = r#"#!/bin/sh
case "$*" in
  *-version*) echo "ffmpeg version 6.1-fake"; exit 0 ;;
  *-sources*|*-list_devices*) echo "* alsa_input.fake [Fake Mic]"; exit 0 ;;
esac
for last; do :; done
trap 'printf data > "$last"; exit 0' INT TERM
i=0
while :; do
  i=$((i+1))
  printf 'frame=%5d fps=30\r' "$i" >&2
  sleep 0.05
done
"#;

    fn install_fake(dir: &Path) -> PathBuf {
        let path = dir.join("ffmpeg");
        fs::write(&path, FAKE_FFMPEG).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn records_for_duration_and_prints_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = install_fake(dir.path());
        let out = dir.path().join("clips/demo.mp4");

        let output = screenrec_bin()
            .env("SCREENREC_FFMPEG", &fake)
            .args(["-d", "1s", "-o"])
            .arg(&out)
            .output()
            .expect("Failed to execute command");

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(output.status.success(), "stderr: {}", stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("demo.mp4"));
        assert_eq!(fs::read_to_string(&out).unwrap(), "data");
    }

    #[test]
    fn json_mode_streams_events() {
        let dir = tempfile::tempdir().unwrap();
        let fake = install_fake(dir.path());
        let out = dir.path().join("demo.mp4");

        let output = screenrec_bin()
            .env("SCREENREC_FFMPEG", &fake)
            .args(["-d", "1s", "--json", "-o"])
            .arg(&out)
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success());
        let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| serde_json::from_str(line).expect("one JSON event per line"))
            .collect();
        assert_eq!(events.first().unwrap()["event"], "started");
        assert_eq!(events.last().unwrap()["event"], "completed");
    }

    #[test]
    fn devices_json_lists_fake_sources() {
        let dir = tempfile::tempdir().unwrap();
        let fake = install_fake(dir.path());

        let output = screenrec_bin()
            .env("SCREENREC_FFMPEG", &fake)
            .args(["devices", "--json"])
            .output()
            .expect("Failed to execute command");

        assert!(output.status.success());
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert!(!json["screens"].as_array().unwrap().is_empty());
        assert!(!json["audio_inputs"].as_array().unwrap().is_empty());
    }
}
