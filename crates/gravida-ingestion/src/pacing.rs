//! Politeness delays between medications, sources and language lookups.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Uniform random delay within `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleep for a sampled delay; returns what was slept.
    pub async fn wait(&self, reason: &str) -> Duration {
        let delay = self.sample();
        if !delay.is_zero() {
            debug!(reason, delay_secs = delay.as_secs_f64(), "Politeness delay");
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingPolicy {
    pub between_medications: DelayRange,
    pub between_sources: DelayRange,
    pub between_languages: DelayRange,
    pub catalog_item_delay: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            between_medications: DelayRange::from_secs(8, 18),
            between_sources: DelayRange::from_secs(2, 5),
            between_languages: DelayRange::from_secs(3, 6),
            catalog_item_delay: Duration::from_millis(300),
        }
    }
}

impl PacingPolicy {
    /// No waiting at all (tests, replays).
    pub fn none() -> Self {
        Self {
            between_medications: DelayRange::ZERO,
            between_sources: DelayRange::ZERO,
            between_languages: DelayRange::ZERO,
            catalog_item_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_within_bounds() {
        let range = DelayRange::from_secs(8, 18);
        for _ in 0..100 {
            let d = range.sample();
            assert!(d >= Duration::from_secs(8) && d <= Duration::from_secs(18));
        }
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let range = DelayRange::from_secs(5, 2);
        assert_eq!(range.min, Duration::from_secs(2));
        assert_eq!(range.max, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_sampled_delay() {
        let start = tokio::time::Instant::now();
        let slept = DelayRange::from_secs(3, 3).wait("test").await;
        assert_eq!(slept, Duration::from_secs(3));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }
}
