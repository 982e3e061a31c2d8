//! Throughput sampling.

use std::time::{Duration, Instant};

/// First sampling delay; each later delay is twice the previous one.
pub const INITIAL_INTERVAL: Duration = Duration::from_secs(5);

/// One progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Trials across all workers
    pub trials: u64,
    /// Time since the search started
    pub elapsed: Duration,
    /// Trials per second since the start
    pub rate: f64,
}

/// Samples aggregate progress on a geometrically growing schedule.
#[derive(Debug, Clone)]
pub struct Telemetry {
    start: Instant,
    next_due: Instant,
    interval: Duration,
}

impl Telemetry {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            next_due: start + INITIAL_INTERVAL,
            interval: INITIAL_INTERVAL,
        }
    }

    /// Time left until the next sample is due.
    pub fn until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    /// Takes a sample if one is due and schedules the next.
    ///
    /// Returns `None` when not yet due, or while no trial has completed
    /// (the first key generation can take longer than the first interval).
    pub fn sample(&mut self, now: Instant, trials: u64) -> Option<Sample> {
        if now < self.next_due {
            return None;
        }

        self.interval *= 2;
        self.next_due = now + self.interval;

        if trials == 0 {
            return None;
        }

        let elapsed = now.duration_since(self.start);
        let secs = elapsed.as_secs_f64();
        let rate = if secs > 0.0 { trials as f64 / secs } else { 0.0 };

        Some(Sample {
            trials,
            elapsed,
            rate,
        })
    }
}

/// Formats a count with a K/M/B suffix.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_doubles() {
        let start = Instant::now();
        let mut t = Telemetry::new(start);
        assert_eq!(t.until_due(start), Duration::from_secs(5));
        assert!(t.sample(start + Duration::from_secs(4), 10).is_none());

        let at = start + Duration::from_secs(5);
        let s = t.sample(at, 100).unwrap();
        assert_eq!(s.trials, 100);
        assert_eq!(s.rate, 20.0);
        assert_eq!(t.until_due(at), Duration::from_secs(10));

        let at = at + Duration::from_secs(10);
        assert!(t.sample(at, 300).is_some());
        assert_eq!(t.until_due(at), Duration::from_secs(20));
    }

    #[test]
    fn test_zero_trials_skipped_but_rescheduled() {
        let start = Instant::now();
        let mut t = Telemetry::new(start);
        let at = start + Duration::from_secs(5);
        assert!(t.sample(at, 0).is_none());
        assert_eq!(t.until_due(at), Duration::from_secs(10));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.50K");
        assert_eq!(format_number(2_000_000), "2.00M");
        assert_eq!(format_number(3_250_000_000), "3.25B");
    }
}
