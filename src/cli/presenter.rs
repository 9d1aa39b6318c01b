//! CLI presenter for output formatting

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::application::BackendInfo;
use crate::domain::capture::{DeviceDescriptor, DeviceList};

/// Presenter for CLI output formatting.
///
/// Human-readable status goes to stderr; stdout carries only results
/// (paths, listings, JSON).
pub struct Presenter {
    spinner: Option<ProgressBar>,
    is_spinner_active: Arc<AtomicBool>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self {
            spinner: None,
            is_spinner_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
        self.is_spinner_active.store(true, Ordering::SeqCst);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    pub fn is_spinner_active(&self) -> bool {
        self.is_spinner_active.load(Ordering::SeqCst)
    }

    /// Replace the spinner with a success line.
    /// The line is printed directly so it survives a non-terminal stderr,
    /// where indicatif draws nothing.
    pub fn spinner_success(&mut self, message: &str) {
        self.stop_spinner();
        self.success(message);
    }

    /// Replace the spinner with a failure line
    pub fn spinner_fail(&mut self, message: &str) {
        self.stop_spinner();
        self.error(message);
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
        self.is_spinner_active.store(false, Ordering::SeqCst);
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// One compact JSON document per line on stdout
    pub fn json_line<T: Serialize>(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(line) => println!("{}", line),
            Err(e) => self.error(&format!("Failed to serialize output: {}", e)),
        }
    }

    /// Pretty JSON on stdout
    pub fn json_pretty<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => self.error(&format!("Failed to serialize output: {}", e)),
        }
    }

    /// `mm:ss`, or `h:mm:ss` past an hour
    pub fn format_elapsed(&self, elapsed_ms: u64) -> String {
        let total = elapsed_ms / 1000;
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{:02}:{:02}", minutes, seconds)
        }
    }

    /// Elapsed time with a bar when the total is known
    pub fn format_progress(&self, elapsed_ms: u64, total_ms: Option<u64>) -> String {
        let Some(total_ms) = total_ms.filter(|t| *t > 0) else {
            return format!("{} {}", "●".red(), self.format_elapsed(elapsed_ms));
        };

        let percent = (elapsed_ms as f64 / total_ms as f64 * 100.0).min(100.0);
        let bar_width = 20;
        let filled = ((percent / 100.0) * bar_width as f64) as usize;
        let empty = bar_width - filled;

        format!(
            "[{}{}] {} / {}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            self.format_elapsed(elapsed_ms),
            self.format_elapsed(total_ms)
        )
    }

    /// Update recording progress
    pub fn update_recording_progress(&self, elapsed_ms: u64, total_ms: Option<u64>) {
        let progress = self.format_progress(elapsed_ms, total_ms);
        self.update_spinner(&format!("Recording {}", progress));
    }

    /// Human-readable device listing on stdout
    pub fn device_list(&self, devices: &DeviceList) {
        println!("{}", "Screens:".bold());
        self.device_rows(&devices.screens);
        println!("{}", "Audio inputs:".bold());
        self.device_rows(&devices.audio_inputs);
        if devices.screens_fallback {
            self.warn("No screens enumerated; showing the default screen");
        }
        if devices.audio_inputs_fallback {
            self.warn("No audio inputs enumerated; showing the default input");
        }
    }

    fn device_rows(&self, devices: &[DeviceDescriptor]) {
        if devices.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for (i, device) in devices.iter().enumerate() {
            let marker = if i == 0 { "*" } else { " " };
            println!("{} {:>12}  {}", marker, device.id.cyan(), device.display_name);
        }
    }

    /// One line per registered backend on stdout
    pub fn backend_list(&self, backends: &[BackendInfo], selected: Option<&str>) {
        for backend in backends {
            let mark = if Some(backend.name.as_str()) == selected {
                "→".green().to_string()
            } else {
                " ".to_string()
            };
            let priority = if backend.fallback {
                "fallback".to_string()
            } else {
                format!("priority {}", backend.priority)
            };
            let platforms = if backend.platforms.is_empty() {
                "any".to_string()
            } else {
                backend
                    .platforms
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            };
            let mut line = format!(
                "{} {}  {}  platforms={}",
                mark,
                backend.name.cyan(),
                priority,
                platforms
            );
            if let Some(version) = backend.min_version {
                line.push_str(&format!(" min_version={}", version));
            }
            line.push_str(&format!(
                " pause={} system_audio={}",
                backend.capabilities.pause, backend.capabilities.system_audio
            ));
            if let Some(ref reason) = backend.reason {
                line.push_str(&format!("  ({})", reason).dimmed().to_string());
            }
            println!("{}", line);
        }
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}
