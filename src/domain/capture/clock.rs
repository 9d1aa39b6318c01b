//! Pause-aware recording clock

use std::time::{Duration, Instant};

/// Measures recorded time, excluding the intervals spent paused.
///
/// All methods take `now` explicitly so the arithmetic can be exercised
/// without sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingClock {
    started_at: Option<Instant>,
    paused_since: Option<Instant>,
    paused_total: Duration,
    stopped_at: Option<Instant>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        *self = Self {
            started_at: Some(now),
            ..Self::default()
        };
    }

    pub fn pause(&mut self, now: Instant) {
        if self.started_at.is_some() && self.paused_since.is_none() && self.stopped_at.is_none() {
            self.paused_since = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(since) = self.paused_since.take() {
            self.paused_total += now.saturating_duration_since(since);
        }
    }

    /// Freeze the clock; a pending pause interval is closed first
    pub fn stop(&mut self, now: Instant) {
        self.resume(now);
        if self.started_at.is_some() && self.stopped_at.is_none() {
            self.stopped_at = Some(now);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Recorded time at `now`
    pub fn elapsed(&self, now: Instant) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        // While paused or after stop, time is frozen at that instant
        let end = self.paused_since.or(self.stopped_at).unwrap_or(now);
        end.saturating_duration_since(started)
            .saturating_sub(self.paused_total)
    }
}
