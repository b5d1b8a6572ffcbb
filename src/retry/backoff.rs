//! Exponential backoff between retry attempts.

use std::time::Duration;

/// Hard ceiling on any single backoff delay.
pub const MAX_BACKOFF_MS: u64 = 10_000;

/// Delay before retry number `attempt_index` (zero-based).
///
/// `min(base_delay_ms * 2^attempt_index, 10_000)`.
pub fn delay_ms(attempt_index: u32, base_delay_ms: u64) -> u64 {
    let factor = 2u64.saturating_pow(attempt_index);
    base_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

/// Backoff policy used by the request executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Seed delay for the first retry.
    pub base_delay: Duration,
    /// Add up to 25% random spread on top of the computed delay.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            jitter: false,
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Compute the delay before retry number `attempt_index`.
    ///
    /// Jitter never pushes the result past [`MAX_BACKOFF_MS`].
    pub fn delay(&self, attempt_index: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let millis = delay_ms(attempt_index, base_ms);
        if !self.jitter || millis == 0 {
            return Duration::from_millis(millis);
        }
        let spread = rand::random::<u64>() % (millis / 4 + 1);
        Duration::from_millis(millis.saturating_add(spread).min(MAX_BACKOFF_MS))
    }

    /// Total wait across `retries` consecutive retries, ignoring jitter.
    pub fn total_wait(&self, retries: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let total = (0..retries).fold(0u64, |acc, idx| acc.saturating_add(delay_ms(idx, base_ms)));
        Duration::from_millis(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_uses_base_delay() {
        assert_eq!(delay_ms(0, 1000), 1000);
        assert_eq!(delay_ms(1, 1000), 2000);
        assert_eq!(delay_ms(2, 1000), 4000);
    }

    #[test]
    fn delay_is_capped_at_ten_seconds() {
        assert_eq!(delay_ms(4, 1000), 10_000);
        assert_eq!(delay_ms(63, 1000), 10_000);
        assert_eq!(delay_ms(200, 1), 10_000);
        assert_eq!(delay_ms(0, 50_000), 10_000);
    }

    #[test]
    fn total_wait_sums_capped_delays() {
        let policy = BackoffPolicy::new(Duration::from_millis(1000));
        assert_eq!(policy.total_wait(2), Duration::from_millis(3000));
        assert_eq!(policy.total_wait(5), Duration::from_millis(1000 + 2000 + 4000 + 8000 + 10_000));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = BackoffPolicy::new(Duration::from_millis(1000)).with_jitter(true);
        for _ in 0..64 {
            let d = policy.delay(1).as_millis() as u64;
            assert!((2000..=2500).contains(&d), "got {d}");
            assert!(policy.delay(10).as_millis() as u64 <= MAX_BACKOFF_MS);
        }
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn delay_matches_capped_exponential(attempt in 0u32..80, base in 1u64..20_000) {
                let expected = if attempt >= 64 {
                    MAX_BACKOFF_MS
                } else {
                    (base as u128 * (1u128 << attempt)).min(MAX_BACKOFF_MS as u128) as u64
                };
                prop_assert_eq!(delay_ms(attempt, base), expected);
            }
        }
    }
}
