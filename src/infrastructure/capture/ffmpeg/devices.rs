//! Device enumeration through ffmpeg's listing mode

use std::process::Stdio;
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::capture::{
    CaptureRequest, DeviceDescriptor, DeviceKind, DeviceList, Platform, ResolvedDevices,
};

use super::args;

/// Upper bound on one listing invocation
pub const LIST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// X display used when `$DISPLAY` is unset
const DEFAULT_X_DISPLAY: &str = ":0.0";

/// A requested device id that the enumeration does not know
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No {kind} device with id '{id}'")]
pub struct UnknownDevice {
    pub kind: DeviceKind,
    pub id: String,
}

/// Enumerates screens and audio inputs and caches the last result.
///
/// The cache lives only as long as the registry; ids are not stable
/// across runs of the capture tool's host.
pub struct DeviceRegistry {
    program: String,
    platform: Platform,
    list_timeout: StdDuration,
    display: Option<String>,
    cache: Mutex<Option<DeviceList>>,
}

impl DeviceRegistry {
    pub fn new(program: impl Into<String>, platform: Platform) -> Self {
        Self {
            program: program.into(),
            platform,
            list_timeout: LIST_TIMEOUT,
            display: std::env::var("DISPLAY").ok().filter(|d| !d.is_empty()),
            cache: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, list_timeout: StdDuration) -> Self {
        self.list_timeout = list_timeout;
        self
    }

    /// Override the X display offered as the Linux screen
    pub fn with_display(mut self, display: Option<String>) -> Self {
        self.display = display;
        self
    }

    /// Enumerate once; later calls return the cached list
    pub async fn initialize(&self) -> DeviceList {
        let mut cache = self.cache.lock().await;
        if let Some(list) = cache.as_ref() {
            return list.clone();
        }
        let list = self.enumerate().await;
        *cache = Some(list.clone());
        list
    }

    /// Enumerate from scratch and replace the cache
    pub async fn refresh(&self) -> DeviceList {
        let list = self.enumerate().await;
        *self.cache.lock().await = Some(list.clone());
        list
    }

    /// Cached list, enumerating first if needed
    pub async fn list_devices(&self) -> DeviceList {
        self.initialize().await
    }

    /// Never fails: spawn errors and timeouts yield the fallback list
    async fn enumerate(&self) -> DeviceList {
        let listing_args = args::list_devices(self.platform);
        debug!(program = %self.program, args = ?listing_args, "Listing capture devices");

        let output = Command::new(&self.program)
            .args(&listing_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let text = match timeout(self.list_timeout, output).await {
            Ok(Ok(output)) => {
                // Listing modes exit non-zero by design; the text is what matters
                let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
                text.push('\n');
                text.push_str(&String::from_utf8_lossy(&output.stdout));
                text
            }
            Ok(Err(e)) => {
                warn!(program = %self.program, error = %e, "Device listing failed, using fallback devices");
                return fallback_devices(self.platform, self.display.as_deref());
            }
            Err(_) => {
                warn!(
                    program = %self.program,
                    timeout_ms = self.list_timeout.as_millis() as u64,
                    "Device listing timed out, using fallback devices"
                );
                return fallback_devices(self.platform, self.display.as_deref());
            }
        };

        let list = parse_listing(self.platform, &text, self.display.as_deref());
        info!(
            screens = list.screens.len(),
            audio_inputs = list.audio_inputs.len(),
            screens_fallback = list.screens_fallback,
            audio_inputs_fallback = list.audio_inputs_fallback,
            "Enumerated capture devices"
        );
        list
    }
}

/// Parse listing output for `platform`; empty kinds get a fallback entry
pub fn parse_listing(platform: Platform, text: &str, display: Option<&str>) -> DeviceList {
    let (screens, audio_inputs) = match platform {
        Platform::MacOs => parse_avfoundation(text),
        Platform::Windows => (
            vec![DeviceDescriptor::screen("desktop", "Desktop")],
            parse_dshow(text),
        ),
        Platform::Linux => (vec![x11_screen(display)], parse_pulse(text)),
    };

    let fallback = fallback_devices(platform, display);
    let mut list = DeviceList {
        screens,
        audio_inputs,
        ..DeviceList::default()
    };
    if list.screens.is_empty() {
        list.screens = fallback.screens;
        list.screens_fallback = true;
    }
    if list.audio_inputs.is_empty() {
        list.audio_inputs = fallback.audio_inputs;
        list.audio_inputs_fallback = true;
    }
    list
}

/// Single screen and audio input that the capture tool accepts by default
pub fn fallback_devices(platform: Platform, display: Option<&str>) -> DeviceList {
    let (screen, audio) = match platform {
        Platform::MacOs => (
            DeviceDescriptor::screen("1", "Capture screen 0"),
            DeviceDescriptor::audio_input("0", "Default audio input"),
        ),
        Platform::Windows => (
            DeviceDescriptor::screen("desktop", "Desktop"),
            DeviceDescriptor::audio_input("default", "Default audio input"),
        ),
        Platform::Linux => (
            x11_screen(display),
            DeviceDescriptor::audio_input("default", "Default audio input"),
        ),
    };
    DeviceList {
        screens: vec![screen],
        audio_inputs: vec![audio],
        screens_fallback: true,
        audio_inputs_fallback: true,
    }
}

fn x11_screen(display: Option<&str>) -> DeviceDescriptor {
    let display = display.unwrap_or(DEFAULT_X_DISPLAY);
    let id = if display.contains('.') {
        display.to_string()
    } else {
        format!("{}.0", display)
    };
    let name = format!("X11 display {}", id);
    DeviceDescriptor::screen(id, name)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Video,
    Audio,
}

fn section_header(line: &str) -> Option<Section> {
    let lowered = line.to_lowercase();
    if lowered.contains("video devices") {
        Some(Section::Video)
    } else if lowered.contains("audio devices") {
        Some(Section::Audio)
    } else {
        None
    }
}

/// `[AVFoundation indev @ 0x1] [3] Capture screen 0` -> `("3", "Capture screen 0")`
fn parse_indexed_entry(line: &str) -> Option<(String, String)> {
    let mut rest = line;
    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let close = after.find(']')?;
        let inner = &after[..close];
        let tail = &after[close + 1..];
        if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
            let name = tail.trim();
            if name.is_empty() {
                return None;
            }
            return Some((inner.to_string(), name.to_string()));
        }
        rest = tail;
    }
    None
}

/// avfoundation listing. Video entries count as screens only when their
/// name mentions "screen"; cameras are ignored.
pub fn parse_avfoundation(text: &str) -> (Vec<DeviceDescriptor>, Vec<DeviceDescriptor>) {
    let mut screens = Vec::new();
    let mut audio = Vec::new();
    let mut section = Section::None;

    for line in text.lines() {
        if let Some(next) = section_header(line) {
            section = next;
            continue;
        }
        let Some((index, name)) = parse_indexed_entry(line) else {
            continue;
        };
        match section {
            Section::Video if name.to_lowercase().contains("screen") => {
                screens.push(DeviceDescriptor::screen(index, name));
            }
            Section::Audio => audio.push(DeviceDescriptor::audio_input(index, name)),
            _ => {}
        }
    }

    (screens, audio)
}

fn first_quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let len = line[start..].find('"')?;
    let value = &line[start..start + len];
    (!value.is_empty()).then_some(value)
}

/// DirectShow listing, both the `"Name" (audio)` form and the older
/// sectioned form. Device names double as ids.
pub fn parse_dshow(text: &str) -> Vec<DeviceDescriptor> {
    let mut audio = Vec::new();
    let mut section = Section::None;

    for line in text.lines() {
        if line.contains("Alternative name") {
            continue;
        }
        if let Some(next) = section_header(line) {
            section = next;
            continue;
        }
        let Some(name) = first_quoted(line) else {
            continue;
        };
        let trimmed = line.trim_end();
        let is_audio = if trimmed.ends_with("(audio)") {
            true
        } else if trimmed.ends_with("(video)") || trimmed.ends_with("(audio, video)") {
            false
        } else {
            section == Section::Audio
        };
        if is_audio && !audio.iter().any(|d: &DeviceDescriptor| d.id == name) {
            audio.push(DeviceDescriptor::audio_input(name, name));
        }
    }

    audio
}

/// PulseAudio `-sources pulse` listing. Monitor sources are skipped and
/// the default source (marked `*`) is listed first.
pub fn parse_pulse(text: &str) -> Vec<DeviceDescriptor> {
    let mut default = Vec::new();
    let mut others = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        let (is_default, entry) = match trimmed.strip_prefix('*') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let Some(open) = entry.find(" [") else {
            continue;
        };
        let id = entry[..open].trim();
        let name = entry[open + 2..].trim_end_matches(']').trim();
        if id.is_empty() || id.contains(char::is_whitespace) || id.ends_with(".monitor") {
            continue;
        }
        let descriptor = DeviceDescriptor::audio_input(id, if name.is_empty() { id } else { name });
        if is_default {
            default.push(descriptor);
        } else {
            others.push(descriptor);
        }
    }

    default.extend(others);
    default
}

/// Map a request onto concrete ids. Unset ids take the first device.
///
/// Ids are only checked against a real enumeration of their kind; against
/// synthesized defaults they pass through and the capture tool decides.
pub fn resolve(list: &DeviceList, request: &CaptureRequest) -> Result<ResolvedDevices, UnknownDevice> {
    let screen_id = match request.target_screen_id.as_deref() {
        Some(id) if list.is_fallback_for(DeviceKind::Screen) || list.find_screen(id).is_some() => {
            id.to_string()
        }
        Some(id) => {
            return Err(UnknownDevice {
                kind: DeviceKind::Screen,
                id: id.to_string(),
            })
        }
        None => list
            .default_screen()
            .map(|d| d.id.clone())
            .ok_or_else(|| UnknownDevice {
                kind: DeviceKind::Screen,
                id: String::new(),
            })?,
    };

    let audio_input_id = if !request.include_microphone {
        None
    } else {
        match request.audio_input_id.as_deref() {
            Some(id)
                if list.is_fallback_for(DeviceKind::AudioInput)
                    || list.find_audio_input(id).is_some() =>
            {
                Some(id.to_string())
            }
            Some(id) => {
                return Err(UnknownDevice {
                    kind: DeviceKind::AudioInput,
                    id: id.to_string(),
                })
            }
            None => Some(
                list.default_audio_input()
                    .map(|d| d.id.clone())
                    .ok_or_else(|| UnknownDevice {
                        kind: DeviceKind::AudioInput,
                        id: String::new(),
                    })?,
            ),
        }
    };

    Ok(ResolvedDevices {
        screen_id,
        audio_input_id,
    })
}
