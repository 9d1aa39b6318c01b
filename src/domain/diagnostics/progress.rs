//! Progress-line parsing and frame validation

/// Frames the capture tool must report before a recording counts as started
pub const VALIDATION_THRESHOLD: u64 = 5;

/// Fields of an ffmpeg status line such as
/// `frame=  123 fps= 30 q=-1.0 size=  1024kB time=00:00:04.10 bitrate=...`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressLine {
    pub frame: Option<u64>,
    pub fps: Option<f64>,
    pub time_ms: Option<u64>,
    pub dup: Option<u64>,
    pub drop: Option<u64>,
}

impl ProgressLine {
    /// None when the line carries neither a frame counter nor a timestamp
    pub fn parse(line: &str) -> Option<Self> {
        let parsed = Self {
            frame: extract_value(line, "frame=").and_then(|v| v.parse().ok()),
            fps: extract_value(line, "fps=").and_then(|v| v.parse().ok()),
            time_ms: extract_value(line, "time=").and_then(|v| parse_timestamp_ms(&v)),
            dup: extract_value(line, "dup=").and_then(|v| v.parse().ok()),
            drop: extract_value(line, "drop=").and_then(|v| v.parse().ok()),
        };

        if parsed.frame.is_none() && parsed.time_ms.is_none() {
            None
        } else {
            Some(parsed)
        }
    }
}

/// Value following `key`, skipping padding spaces (`frame=   12` -> `12`)
pub fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)?;
    let after_key = line[start + key.len()..].trim_start();
    let end = after_key
        .find(char::is_whitespace)
        .unwrap_or(after_key.len());
    let value = &after_key[..end];
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Running frame counter from a `frame=<N>` token
pub fn parse_frame_count(line: &str) -> Option<u64> {
    extract_value(line, "frame=")?.parse().ok()
}

/// `HH:MM:SS.cc` to milliseconds; `N/A` and malformed values yield None
pub fn parse_timestamp_ms(value: &str) -> Option<u64> {
    let mut parts = value.trim_start_matches('-').split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    // Garbled counters must not overflow; `as` saturates the seconds part
    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add((seconds * 1000.0).round() as u64)
}

/// Watches diagnostic lines until the frame counter proves that frames
/// are being produced.
#[derive(Debug, Clone)]
pub struct FrameValidator {
    threshold: u64,
    frames: u64,
    validated: bool,
}

impl FrameValidator {
    /// Thresholds below [`VALIDATION_THRESHOLD`] are raised to it
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold: threshold.max(VALIDATION_THRESHOLD),
            frames: 0,
            validated: false,
        }
    }

    /// Feed one line. Returns true exactly once: on the line that makes the
    /// counter reach the threshold.
    pub fn observe(&mut self, line: &str) -> bool {
        let Some(frames) = parse_frame_count(line) else {
            return false;
        };
        // The counter only grows; a smaller value is a stray token
        self.frames = self.frames.max(frames);

        if !self.validated && self.frames > 0 && self.frames >= self.threshold {
            self.validated = true;
            return true;
        }
        false
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }
}

impl Default for FrameValidator {
    fn default() -> Self {
        Self::new(VALIDATION_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str =
        "frame=  123 fps= 30 q=-1.0 size=    1024kB time=00:00:04.10 bitrate=2046.0kbits/s dup=2 drop=1 speed=1.0x";

    #[test]
    fn extract_value_skips_padding() {
        assert_eq!(extract_value(STATUS, "frame="), Some("123".to_string()));
        assert_eq!(extract_value(STATUS, "fps="), Some("30".to_string()));
        assert_eq!(extract_value(STATUS, "time="), Some("00:00:04.10".to_string()));
        assert_eq!(extract_value(STATUS, "missing="), None);
        assert_eq!(extract_value("frame=", "frame="), None);
    }

    #[test]
    fn parses_status_line() {
        let p = ProgressLine::parse(STATUS).unwrap();
        assert_eq!(p.frame, Some(123));
        assert_eq!(p.fps, Some(30.0));
        assert_eq!(p.time_ms, Some(4100));
        assert_eq!(p.dup, Some(2));
        assert_eq!(p.drop, Some(1));
    }

    #[test]
    fn audio_only_line_has_time_but_no_frame() {
        let p = ProgressLine::parse("size=     512kB time=00:00:30.00 bitrate= 128.0kbits/s").unwrap();
        assert_eq!(p.frame, None);
        assert_eq!(p.time_ms, Some(30_000));
        assert!(ProgressLine::parse("Input #0, avfoundation, from '1:0':").is_none());
    }

    #[test]
    fn timestamp_parsing() {
        assert_eq!(parse_timestamp_ms("01:02:03.50"), Some(3_723_500));
        assert_eq!(parse_timestamp_ms("N/A"), None);
        assert_eq!(parse_timestamp_ms("00:00"), None);
    }

    #[test]
    fn oversized_timestamp_is_rejected() {
        assert_eq!(parse_timestamp_ms("99999999999999:00:00.00"), None);
        assert_eq!(parse_timestamp_ms("00:99999999999999999:00.00"), None);

        let p = ProgressLine::parse("frame=    1 time=99999999999999:00:00.00").unwrap();
        assert_eq!(p.frame, Some(1));
        assert_eq!(p.time_ms, None);
    }

    #[test]
    fn validator_fires_once_at_threshold() {
        let mut v = FrameValidator::default();
        assert!(!v.observe("frame=    1 fps=0.0"));
        assert!(!v.observe("frame=    4 fps=0.0"));
        assert!(v.observe("frame=    5 fps=30"));
        assert!(!v.observe("frame=    6 fps=30"));
        assert!(v.is_validated());
        assert_eq!(v.frames(), 6);
    }

    #[test]
    fn validator_ignores_zero_and_unrelated_lines() {
        let mut v = FrameValidator::default();
        assert!(!v.observe("frame=    0 fps=0.0 q=0.0 size=0kB"));
        assert!(!v.observe("Stream mapping:"));
        assert!(!v.is_validated());
        assert_eq!(v.frames(), 0);
    }

    #[test]
    fn validator_can_jump_past_threshold() {
        let mut v = FrameValidator::default();
        assert!(v.observe("frame=   42 fps=30"));
    }

    #[test]
    fn validator_threshold_has_floor() {
        let v = FrameValidator::new(1);
        assert_eq!(v.threshold(), VALIDATION_THRESHOLD);
        assert_eq!(FrameValidator::new(30).threshold(), 30);
    }

    #[test]
    fn counter_never_decreases() {
        let mut v = FrameValidator::default();
        v.observe("frame=    3");
        v.observe("frame=    1");
        assert_eq!(v.frames(), 3);
    }
}
