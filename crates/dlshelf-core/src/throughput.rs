//! Smoothed transfer rate from irregular byte-count samples.
//!
//! Each sample folds into a decaying weighted average:
//!
//! ```text
//! rate   = (rate * window + Δbytes) / (window + Δt)
//! window = min(window + Δt, cap)
//! ```
//!
//! The cap bounds how much history the average remembers, so the rate
//! follows recent behaviour within a few seconds instead of averaging since
//! the download started. No sample history is stored.

use std::time::{Duration, Instant};

/// Default bound on the smoothing window.
pub const DEFAULT_WINDOW_CAP: Duration = Duration::from_millis(5000);

/// Per-record rate estimator.
#[derive(Debug, Clone)]
pub struct ThroughputEstimator {
    cap: Duration,
    /// Bytes per second.
    rate: f64,
    window: Duration,
    last: Option<(u64, Instant)>,
}

impl ThroughputEstimator {
    /// Create an unarmed estimator with the given window cap.
    #[must_use]
    pub const fn new(cap: Duration) -> Self {
        Self {
            cap,
            rate: 0.0,
            window: Duration::ZERO,
            last: None,
        }
    }

    /// Feed a sample. Returns the new rate when the sample updated it.
    ///
    /// The first sample after (re)arming only seeds the reference point.
    /// Samples with no new bytes are ignored entirely so no-progress polls
    /// do not dilute the average.
    pub fn observe(&mut self, now: Instant, bytes_received: u64) -> Option<f64> {
        let Some((last_bytes, last_time)) = self.last else {
            self.last = Some((bytes_received, now));
            return None;
        };

        if bytes_received == last_bytes {
            return None;
        }
        if bytes_received < last_bytes {
            // Host restarted the transfer from scratch.
            self.reset();
            self.last = Some((bytes_received, now));
            return None;
        }

        let elapsed = now.saturating_duration_since(last_time);
        let denominator = (self.window + elapsed).as_secs_f64();
        if denominator <= 0.0 {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let delta_bytes = (bytes_received - last_bytes) as f64;
        self.rate = self.rate.mul_add(self.window.as_secs_f64(), delta_bytes) / denominator;
        self.window = (self.window + elapsed).min(self.cap);
        self.last = Some((bytes_received, now));
        Some(self.rate)
    }

    /// Drop all state; the next sample seeds again.
    pub const fn reset(&mut self) {
        self.rate = 0.0;
        self.window = Duration::ZERO;
        self.last = None;
    }

    /// Current rate in bytes per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Accumulated smoothing window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Whether a reference sample has been seen since the last reset.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.last.is_some()
    }
}

impl Default for ThroughputEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_sample_only_seeds() {
        let mut estimator = ThroughputEstimator::default();
        assert_eq!(estimator.observe(Instant::now(), 1000), None);
        assert!(estimator.is_armed());
        assert!(estimator.rate().abs() < f64::EPSILON);
        assert_eq!(estimator.window(), Duration::ZERO);
    }

    #[test]
    fn test_single_interval_rate() {
        let t0 = Instant::now();
        let mut estimator = ThroughputEstimator::default();
        estimator.observe(t0, 1000);

        let rate = estimator.observe(t0 + ms(100), 1100).unwrap();
        assert!((rate - 1000.0).abs() < 1e-6, "rate was {rate}");
        assert_eq!(estimator.window(), ms(100));
    }

    #[test]
    fn test_stalled_samples_do_not_change_rate() {
        let t0 = Instant::now();
        let mut estimator = ThroughputEstimator::default();
        estimator.observe(t0, 0);
        estimator.observe(t0 + ms(100), 500);
        let rate = estimator.rate();
        let window = estimator.window();

        for step in 2..10 {
            assert_eq!(estimator.observe(t0 + ms(100 * step), 500), None);
        }
        assert!((estimator.rate() - rate).abs() < f64::EPSILON);
        assert_eq!(estimator.window(), window);

        // The stall interval counts once bytes move again.
        let rate = estimator.observe(t0 + ms(1100), 600).unwrap();
        assert!(rate < 5000.0);
    }

    #[test]
    fn test_window_is_capped() {
        let t0 = Instant::now();
        let mut estimator = ThroughputEstimator::new(ms(5000));
        estimator.observe(t0, 0);
        for step in 1..=100u64 {
            estimator.observe(t0 + ms(100 * step), step * 100);
        }
        assert_eq!(estimator.window(), ms(5000));
        assert!((estimator.rate() - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_rate_follows_recent_behaviour() {
        let t0 = Instant::now();
        let mut estimator = ThroughputEstimator::default();
        estimator.observe(t0, 0);
        let mut bytes = 0;
        for step in 1..=100u64 {
            bytes += 100;
            estimator.observe(t0 + ms(100 * step), bytes);
        }
        // Speed up tenfold for twenty seconds; the cap forgets the old pace.
        for step in 101..=300u64 {
            bytes += 1000;
            estimator.observe(t0 + ms(100 * step), bytes);
        }
        assert!(estimator.rate() > 9000.0, "rate was {}", estimator.rate());
    }

    #[test]
    fn test_reset_zeroes_and_rearms() {
        let t0 = Instant::now();
        let mut estimator = ThroughputEstimator::default();
        estimator.observe(t0, 0);
        estimator.observe(t0 + ms(100), 1000);
        assert!(estimator.rate() > 0.0);

        estimator.reset();
        assert!(estimator.rate().abs() < f64::EPSILON);
        assert_eq!(estimator.window(), Duration::ZERO);
        assert!(!estimator.is_armed());
        assert_eq!(estimator.observe(t0 + ms(5000), 2000), None);
    }

    #[test]
    fn test_backwards_bytes_reseed() {
        let t0 = Instant::now();
        let mut estimator = ThroughputEstimator::default();
        estimator.observe(t0, 5000);
        estimator.observe(t0 + ms(100), 6000);
        assert_eq!(estimator.observe(t0 + ms(200), 10), None);
        assert!(estimator.rate().abs() < f64::EPSILON);
        let rate = estimator.observe(t0 + ms(300), 110).unwrap();
        assert!((rate - 1000.0).abs() < 1e-6);
    }
}
