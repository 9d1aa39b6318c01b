//! ffmpeg invocation builder
//!
//! Pure translation of a resolved request into argv. The encode profile is
//! fixed: a low-latency preset, two threads, yuv420p and a two hour cap.
//! More permissive settings fail on some capture devices.

use std::path::Path;

use crate::domain::capture::{CaptureRequest, Platform, Quality, ResolvedDevices};

/// Capture and output frame rate
pub const FRAME_RATE: u32 = 30;
/// Encoder thread cap
pub const ENCODER_THREADS: u32 = 2;
/// Hard limit on a single recording, in seconds
pub const MAX_RECORDING_SECS: u64 = 7200;
/// Pixel format every player can decode
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Sample rate of the optional raw audio output
const RAW_AUDIO_SAMPLE_RATE: u32 = 48_000;

fn crf(quality: Quality) -> &'static str {
    match quality {
        Quality::Low => "32",
        Quality::Medium => "28",
        Quality::High => "23",
    }
}

fn audio_bitrate(quality: Quality) -> &'static str {
    match quality {
        Quality::Low => "64k",
        Quality::Medium => "128k",
        Quality::High => "192k",
    }
}

/// Build the capture tool's argv (without the program name)
pub fn build(platform: Platform, request: &CaptureRequest, devices: &ResolvedDevices) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];

    // Microphone only; system audio needs a native backend
    let audio = if request.include_microphone {
        devices.audio_input_id.as_deref()
    } else {
        None
    };

    push_inputs(&mut args, platform, &devices.screen_id, audio);
    push_video_profile(&mut args, request.video_quality);

    if audio.is_some() {
        args.extend([
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            audio_bitrate(request.audio_quality).into(),
        ]);
    }

    args.push(path_arg(&request.output_path));

    if let (Some(_), Some(audio_path)) = (audio, request.audio_output_path.as_deref()) {
        push_raw_audio_output(&mut args, platform, audio_path);
    }

    args
}

fn push_inputs(args: &mut Vec<String>, platform: Platform, screen: &str, audio: Option<&str>) {
    let framerate = FRAME_RATE.to_string();

    match platform {
        Platform::MacOs => {
            // One device pair selects both streams: "<video>:<audio>"
            let selector = format!("{}:{}", screen, audio.unwrap_or("none"));
            args.extend([
                "-f".into(),
                "avfoundation".into(),
                "-capture_cursor".into(),
                "1".into(),
                "-framerate".into(),
                framerate,
                "-i".into(),
                selector,
            ]);
        }
        Platform::Linux => {
            let display = if screen.contains('+') {
                screen.to_string()
            } else {
                format!("{}+0,0", screen)
            };
            args.extend([
                "-f".into(),
                "x11grab".into(),
                "-draw_mouse".into(),
                "1".into(),
                "-framerate".into(),
                framerate,
                "-i".into(),
                display,
            ]);
            if let Some(source) = audio {
                args.extend(["-f".into(), "pulse".into(), "-i".into(), source.into()]);
            }
        }
        Platform::Windows => {
            args.extend([
                "-f".into(),
                "gdigrab".into(),
                "-draw_mouse".into(),
                "1".into(),
                "-framerate".into(),
                framerate,
                "-i".into(),
                screen.into(),
            ]);
            if let Some(device) = audio {
                args.extend([
                    "-f".into(),
                    "dshow".into(),
                    "-i".into(),
                    format!("audio={}", device),
                ]);
            }
        }
    }
}

fn push_video_profile(args: &mut Vec<String>, quality: Quality) {
    args.extend([
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-tune".into(),
        "zerolatency".into(),
        "-crf".into(),
        crf(quality).into(),
        "-threads".into(),
        ENCODER_THREADS.to_string(),
        "-pix_fmt".into(),
        PIXEL_FORMAT.into(),
        "-r".into(),
        FRAME_RATE.to_string(),
        "-t".into(),
        MAX_RECORDING_SECS.to_string(),
    ]);
}

/// Second output from the same invocation: the microphone as 16-bit PCM
fn push_raw_audio_output(args: &mut Vec<String>, platform: Platform, path: &Path) {
    // avfoundation carries audio on the screen input; elsewhere it is input 1
    let stream = match platform {
        Platform::MacOs => "0:a",
        Platform::Linux | Platform::Windows => "1:a",
    };
    args.extend([
        "-map".into(),
        stream.into(),
        "-vn".into(),
        "-c:a".into(),
        "pcm_s16le".into(),
        "-ar".into(),
        RAW_AUDIO_SAMPLE_RATE.to_string(),
        "-t".into(),
        MAX_RECORDING_SECS.to_string(),
        path_arg(path),
    ]);
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Argv for the device-listing mode
pub fn list_devices(platform: Platform) -> Vec<String> {
    let tail: &[&str] = match platform {
        Platform::MacOs => &["-f", "avfoundation", "-list_devices", "true", "-i", ""],
        Platform::Windows => &["-f", "dshow", "-list_devices", "true", "-i", "dummy"],
        Platform::Linux => &["-sources", "pulse"],
    };
    let mut args = vec!["-hide_banner".to_string()];
    args.extend(tail.iter().map(|s| s.to_string()));
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn resolved(screen: &str, audio: Option<&str>) -> ResolvedDevices {
        ResolvedDevices {
            screen_id: screen.to_string(),
            audio_input_id: audio.map(str::to_string),
        }
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    const AUDIO_MARKERS: &[&str] = &["pulse", "dshow", "-c:a", "-b:a", "pcm_s16le"];

    fn assert_no_audio(args: &[String]) {
        for marker in AUDIO_MARKERS {
            assert!(
                !args.iter().any(|a| a == marker),
                "unexpected {} in {:?}",
                marker,
                args
            );
        }
        assert!(!args.iter().any(|a| a.starts_with("audio=")));
    }

    #[test]
    fn without_microphone_no_audio_arguments_on_any_platform() {
        let request = CaptureRequest::new("/tmp/out.mp4").with_audio_output("/tmp/out.wav");
        for platform in [Platform::MacOs, Platform::Linux, Platform::Windows] {
            let args = build(platform, &request, &resolved("1", Some("0")));
            assert_no_audio(&args);
        }
    }

    #[test]
    fn macos_uses_device_pair_selector() {
        let request = CaptureRequest::new("/tmp/out.mp4").with_microphone(Some("0".into()));
        let args = build(Platform::MacOs, &request, &resolved("1", Some("0")));
        assert!(has_pair(&args, "-f", "avfoundation"));
        assert!(has_pair(&args, "-i", "1:0"));
        assert!(has_pair(&args, "-c:a", "aac"));

        let video_only = build(
            Platform::MacOs,
            &CaptureRequest::new("/tmp/out.mp4"),
            &resolved("1", None),
        );
        assert!(has_pair(&video_only, "-i", "1:none"));
    }

    #[test]
    fn linux_uses_display_and_geometry() {
        let request = CaptureRequest::new("/tmp/out.mp4").with_microphone(None);
        let args = build(Platform::Linux, &request, &resolved(":1.0", Some("default")));
        assert!(has_pair(&args, "-f", "x11grab"));
        assert!(has_pair(&args, "-i", ":1.0+0,0"));
        assert!(has_pair(&args, "-f", "pulse"));
        assert!(has_pair(&args, "-i", "default"));

        let explicit = build(Platform::Linux, &request, &resolved(":0.0+100,200", None));
        assert!(has_pair(&explicit, "-i", ":0.0+100,200"));
    }

    #[test]
    fn windows_uses_display_grab() {
        let request = CaptureRequest::new("C:/out.mp4").with_microphone(None);
        let args = build(
            Platform::Windows,
            &request,
            &resolved("desktop", Some("Microphone (Realtek Audio)")),
        );
        assert!(has_pair(&args, "-f", "gdigrab"));
        assert!(has_pair(&args, "-i", "desktop"));
        assert!(has_pair(&args, "-i", "audio=Microphone (Realtek Audio)"));
    }

    #[test]
    fn system_audio_alone_adds_no_audio_input() {
        let request = CaptureRequest::new("/tmp/out.mp4").with_system_audio(true);
        let args = build(Platform::MacOs, &request, &resolved("1", Some("0")));
        assert_no_audio(&args);
        assert!(has_pair(&args, "-i", "1:none"));
    }

    #[test]
    fn fixed_stability_profile_is_always_applied() {
        for quality in [Quality::Low, Quality::Medium, Quality::High] {
            let request = CaptureRequest::new("/tmp/out.mp4").with_quality(quality, quality);
            let args = build(Platform::Linux, &request, &resolved(":0.0", None));
            assert!(has_pair(&args, "-preset", "ultrafast"));
            assert!(has_pair(&args, "-threads", "2"));
            assert!(has_pair(&args, "-pix_fmt", "yuv420p"));
            assert!(has_pair(&args, "-t", "7200"));
        }
    }

    #[test]
    fn quality_selects_crf_and_bitrate() {
        let request = CaptureRequest::new("/tmp/out.mp4")
            .with_microphone(None)
            .with_quality(Quality::High, Quality::Low);
        let args = build(Platform::MacOs, &request, &resolved("1", Some("0")));
        assert!(has_pair(&args, "-crf", "23"));
        assert!(has_pair(&args, "-b:a", "64k"));
    }

    #[test]
    fn always_overwrites_and_ends_with_output() {
        let request = CaptureRequest::new("/tmp/out.mp4");
        let args = build(Platform::MacOs, &request, &resolved("1", None));
        assert_eq!(args[0], "-y");
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn raw_audio_output_with_microphone() {
        let request = CaptureRequest::new("/tmp/out.mp4")
            .with_microphone(None)
            .with_audio_output(PathBuf::from("/tmp/out.wav"));

        let mac = build(Platform::MacOs, &request, &resolved("1", Some("0")));
        assert!(has_pair(&mac, "-map", "0:a"));
        assert!(has_pair(&mac, "-c:a", "pcm_s16le"));
        assert_eq!(mac.last().map(String::as_str), Some("/tmp/out.wav"));

        let linux = build(Platform::Linux, &request, &resolved(":0.0", Some("default")));
        assert!(has_pair(&linux, "-map", "1:a"));
    }

    #[test]
    fn deterministic() {
        let request = CaptureRequest::new("/tmp/out.mp4").with_microphone(None);
        let devices = resolved("2", Some("1"));
        assert_eq!(
            build(Platform::MacOs, &request, &devices),
            build(Platform::MacOs, &request, &devices)
        );
    }

    #[test]
    fn listing_args_per_platform() {
        assert!(list_devices(Platform::MacOs).contains(&"avfoundation".to_string()));
        assert!(list_devices(Platform::Windows).contains(&"dshow".to_string()));
        assert_eq!(
            list_devices(Platform::Linux),
            vec!["-hide_banner", "-sources", "pulse"]
        );
    }
}
