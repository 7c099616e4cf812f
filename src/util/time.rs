//! Monotonic timing utilities
//!
//! Benchmark intervals are measured with `std::time::Instant`, which is
//! monotonic and unaffected by wall-clock adjustments.

use std::time::{Duration, Instant};

/// Monotonic timestamp for interval measurement
///
/// This is a thin wrapper around `std::time::Instant` that provides
/// convenience methods for benchmark timing.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: Instant,
}

impl Timestamp {
    /// Create a new timestamp representing the current time
    #[inline]
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
        }
    }

    /// Get the elapsed time since this timestamp
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }
}

/// Duration as fractional milliseconds
#[inline]
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Milliseconds with two decimals, as used in the run summary
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use syncbench::util::time::format_millis;
///
/// assert_eq!(format_millis(Duration::from_micros(501_234)), "501.23 ms");
/// ```
pub fn format_millis(duration: Duration) -> String {
    format!("{:.2} ms", duration_ms(duration))
}

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use syncbench::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Ratio of two elapsed times (`baseline / candidate`)
///
/// Greater than 1.0 means the candidate was faster. Returns `None` when the
/// candidate took no measurable time.
pub fn speedup(baseline: Duration, candidate: Duration) -> Option<f64> {
    let candidate = candidate.as_secs_f64();
    if candidate > 0.0 {
        Some(baseline.as_secs_f64() / candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_timestamp_elapsed() {
        let start = Timestamp::now();
        thread::sleep(Duration::from_millis(10));
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(10));
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(Duration::ZERO), "0.00 ms");
        assert_eq!(format_millis(Duration::from_millis(500)), "500.00 ms");
        assert_eq!(format_millis(Duration::from_nanos(1_234_567)), "1.23 ms");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
    }

    #[test]
    fn test_speedup() {
        assert_eq!(speedup(Duration::from_millis(200), Duration::from_millis(100)), Some(2.0));
        assert_eq!(speedup(Duration::from_millis(200), Duration::ZERO), None);
    }
}
