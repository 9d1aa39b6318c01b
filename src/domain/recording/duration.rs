//! Duration value object

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default start-validation timeout (15 seconds)
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 15;

/// Default graceful-stop timeout (10 seconds)
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

/// Value object representing a time duration.
/// Immutable and validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    /// Create a Duration from milliseconds
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    /// Create a Duration from seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    /// How long a start may wait for frame validation
    pub const fn default_startup_timeout() -> Self {
        Self::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS)
    }

    /// How long a stop waits for the capture tool to exit on its own
    pub const fn default_stop_timeout() -> Self {
        Self::from_secs(DEFAULT_STOP_TIMEOUT_SECS)
    }

    /// Get duration in seconds
    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    /// Get duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    /// Convert to std::time::Duration
    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Parse strings such as "30s", "2m30s", "1h" or "1h15m".
    /// Units must appear in descending order and at most once each.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_lowercase();

        let mut total_secs: u64 = 0;
        let mut digits = String::new();
        // Rank of the last unit seen: h=3, m=2, s=1
        let mut last_rank = u8::MAX;

        for ch in input.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }

            let (rank, factor) = match ch {
                'h' => (3, 3600),
                'm' => (2, 60),
                's' => (1, 1),
                _ => return Err(invalid()),
            };
            if digits.is_empty() || rank >= last_rank {
                return Err(invalid());
            }

            let value: u64 = digits.parse().map_err(|_| invalid())?;
            total_secs = value
                .checked_mul(factor)
                .and_then(|v| total_secs.checked_add(v))
                .ok_or_else(invalid)?;
            digits.clear();
            last_rank = rank;
        }

        if !digits.is_empty() || last_rank == u8::MAX || total_secs == 0 {
            return Err(invalid());
        }

        Ok(Self::from_secs(total_secs))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            write!(f, "{}h", hours)?;
        }
        if minutes > 0 {
            write!(f, "{}m", minutes)?;
        }
        if seconds > 0 || total_secs == 0 {
            write!(f, "{}s", seconds)?;
        }
        Ok(())
    }
}

impl From<Duration> for StdDuration {
    fn from(d: Duration) -> Self {
        d.as_std()
    }
}
