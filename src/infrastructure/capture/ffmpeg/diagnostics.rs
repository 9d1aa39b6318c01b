//! Reads the capture tool's diagnostic stream
//!
//! ffmpeg redraws its status line with `\r`, so lines are split on both
//! carriage returns and newlines.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::diagnostics::{Diagnosis, ErrorClassifier, FrameValidator, ProgressLine};

/// Diagnostic lines kept for failure reports
pub const TAIL_LINES: usize = 20;

const READ_CHUNK: usize = 4096;

/// Splits a byte stream into lines at `\r` or `\n`
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns the complete, non-empty lines they finish
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\r' || byte == b'\n' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Whatever is left at end of stream
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            Some(line)
        }
    }
}

/// What the readers have learned about the running process
#[derive(Debug)]
pub struct DiagnosticState {
    validator: FrameValidator,
    last_error: Option<Diagnosis>,
    latest_progress: Option<ProgressLine>,
    tail: VecDeque<String>,
}

impl DiagnosticState {
    pub fn new(threshold: u64) -> Self {
        Self {
            validator: FrameValidator::new(threshold),
            last_error: None,
            latest_progress: None,
            tail: VecDeque::with_capacity(TAIL_LINES),
        }
    }

    /// Process one line. Returns true on the line that validates output.
    pub fn observe(&mut self, line: &str, classifier: &ErrorClassifier) -> bool {
        if let Some(diagnosis) = classifier.classify_line(line) {
            let replace = self
                .last_error
                .as_ref()
                .map_or(true, |current| diagnosis.is_more_specific_than(current));
            if replace {
                debug!(category = %diagnosis.category, line, "Classified diagnostic line");
                self.last_error = Some(diagnosis);
            }
        }

        match ProgressLine::parse(line) {
            Some(progress) => self.latest_progress = Some(progress),
            None => {
                if self.tail.len() == TAIL_LINES {
                    self.tail.pop_front();
                }
                self.tail.push_back(line.to_string());
            }
        }

        self.validator.observe(line)
    }

    pub fn frames(&self) -> u64 {
        self.validator.frames()
    }

    pub fn is_validated(&self) -> bool {
        self.validator.is_validated()
    }

    /// Most specific classified error seen so far
    pub fn last_error(&self) -> Option<&Diagnosis> {
        self.last_error.as_ref()
    }

    pub fn latest_progress(&self) -> Option<&ProgressLine> {
        self.latest_progress.as_ref()
    }

    /// Recent non-progress lines, oldest first
    pub fn tail(&self) -> Vec<String> {
        self.tail.iter().cloned().collect()
    }
}

pub type SharedDiagnostics = Arc<Mutex<DiagnosticState>>;

/// Read `stream` to its end, feeding every line into `state`.
/// `validated` is notified once, when the frame threshold is reached.
pub fn spawn_reader<R>(
    mut stream: R,
    state: SharedDiagnostics,
    classifier: Arc<ErrorClassifier>,
    validated: Arc<Notify>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut splitter = LineSplitter::new();
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    debug!(error = %e, "Diagnostic stream read failed");
                    break;
                }
            };
            let lines = splitter.push(&buf[..n]);
            if !lines.is_empty() {
                feed(&state, &classifier, &validated, lines).await;
            }
        }

        if let Some(line) = splitter.finish() {
            feed(&state, &classifier, &validated, vec![line]).await;
        }
    })
}

async fn feed(
    state: &SharedDiagnostics,
    classifier: &ErrorClassifier,
    validated: &Notify,
    lines: Vec<String>,
) {
    let mut state = state.lock().await;
    for line in lines {
        trace!(line = %line, "capture tool");
        if state.observe(&line, classifier) {
            debug!(frames = state.frames(), "Frame production confirmed");
            validated.notify_one();
        }
    }
}
