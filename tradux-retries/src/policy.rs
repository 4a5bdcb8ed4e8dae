//! Retry policy configuration.

use crate::classify::Classifier;
use rand::Rng;
use std::time::Duration;

/// Immutable configuration for one retry sequence.
///
/// The delay before the i-th retry (0-indexed) is
/// `base_delay * 2^i + jitter`, where the jitter addend is drawn uniformly
/// from `[0, jitter)` and re-sampled independently for every wait. The
/// defaults (`max_retries = 5`, `base_delay = 1s`, `jitter = 1s`) give the
/// classic 1, 2, 4, 8, 16 second ladder with up to a second of spread.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Unit delay for the backoff ladder.
    pub base_delay: Duration,
    /// Span of the uniform jitter addend. Zero disables jitter.
    pub jitter: Duration,
    /// Cap applied to the computed delay, if set.
    pub max_delay: Option<Duration>,
    /// Raise the computed delay to the server's Retry-After hint when the
    /// failure carries one.
    pub honor_retry_after: bool,
    /// Decides which failures are transient.
    pub classify: Classifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            jitter: Duration::from_secs(1),
            max_delay: None,
            honor_retry_after: false,
            classify: Classifier::default(),
        }
    }
}

impl RetryPolicy {
    /// Create a new default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry budget.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the unit delay.
    pub fn base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }

    /// Set the jitter span.
    pub fn jitter(mut self, d: Duration) -> Self {
        self.jitter = d;
        self
    }

    /// Cap the computed delay.
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    /// Honor the server's Retry-After hint when it exceeds the computed
    /// delay.
    pub fn honor_retry_after(mut self, yes: bool) -> Self {
        self.honor_retry_after = yes;
        self
    }

    /// Set the failure classifier.
    pub fn classify(mut self, classify: Classifier) -> Self {
        self.classify = classify;
        self
    }

    /// Policy for general API calls: retries server errors and transport
    /// failures as well as rate limits, with a one minute delay cap.
    pub fn for_api() -> Self {
        Self::new()
            .classify(Classifier::transient())
            .max_delay(Duration::from_secs(60))
            .honor_retry_after(true)
    }

    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self::new().max_retries(0)
    }

    /// Compute the delay before the given retry (0-indexed), sampling a
    /// fresh jitter addend. Deep into an uncapped ladder the doubling
    /// outgrows what a `Duration` can hold; the delay saturates at
    /// [`Duration::MAX`] rather than panicking.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let base = self.base_delay.as_secs_f64() * 2f64.powi(retry as i32);
        let jitter = self.jitter.as_secs_f64();
        let mut delay = base;
        if jitter > 0.0 {
            delay += rand::thread_rng().gen_range(0.0..jitter);
        }
        if let Some(cap) = self.max_delay {
            delay = delay.min(cap.as_secs_f64());
        }
        Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.jitter, Duration::from_secs(1));
        assert_eq!(policy.max_delay, None);
        assert!(!policy.honor_retry_after);
    }

    #[test]
    fn test_builder() {
        let policy = RetryPolicy::new()
            .max_retries(3)
            .base_delay(Duration::from_millis(250))
            .jitter(Duration::ZERO)
            .max_delay(Duration::from_secs(10));

        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.jitter, Duration::ZERO);
        assert_eq!(policy.max_delay, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_delay_doubles_without_jitter() {
        let policy = RetryPolicy::new().jitter(Duration::ZERO);

        assert_eq!(policy.delay_before_retry(0), Duration::from_secs(1));
        assert_eq!(policy.delay_before_retry(1), Duration::from_secs(2));
        assert_eq!(policy.delay_before_retry(2), Duration::from_secs(4));
        assert_eq!(policy.delay_before_retry(3), Duration::from_secs(8));
    }

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 2.0)]
    #[case(2, 4.0)]
    #[case(4, 16.0)]
    fn test_delay_bounds_with_jitter(#[case] retry: u32, #[case] base_secs: f64) {
        let policy = RetryPolicy::new();

        // Jitter is random; sample a few draws and check each lands in
        // [base, base + 1).
        for _ in 0..32 {
            let delay = policy.delay_before_retry(retry).as_secs_f64();
            assert!(delay >= base_secs, "delay {delay} below base {base_secs}");
            assert!(delay < base_secs + 1.0, "delay {delay} past jitter span");
        }
    }

    #[test]
    fn test_jitter_is_resampled() {
        let policy = RetryPolicy::new();
        let first = policy.delay_before_retry(0);
        let distinct = (0..64).any(|_| policy.delay_before_retry(0) != first);
        assert!(distinct, "64 identical jitter draws");
    }

    #[test]
    fn test_max_delay_caps_the_ladder() {
        let policy = RetryPolicy::new()
            .jitter(Duration::ZERO)
            .max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_before_retry(1), Duration::from_secs(2));
        assert_eq!(policy.delay_before_retry(4), Duration::from_secs(5));
    }

    #[test]
    fn test_deep_uncapped_ladder_saturates() {
        let policy = RetryPolicy::new().jitter(Duration::ZERO);

        // 2^64 seconds no longer fits a Duration, and 2^1074 is not even
        // finite in f64. A large budget is valid input, so neither draw
        // may panic.
        assert_eq!(policy.delay_before_retry(64), Duration::MAX);
        assert_eq!(policy.delay_before_retry(1074), Duration::MAX);

        // With jitter back on the same indexes still saturate cleanly.
        let policy = RetryPolicy::new();
        assert_eq!(policy.delay_before_retry(1074), Duration::MAX);
    }

    #[test]
    fn test_cap_tames_the_deep_ladder() {
        let policy = RetryPolicy::new()
            .jitter(Duration::ZERO)
            .max_delay(Duration::from_secs(60));

        assert_eq!(policy.delay_before_retry(100), Duration::from_secs(60));
    }

    #[test]
    fn test_no_retry_preset() {
        assert_eq!(RetryPolicy::no_retry().max_retries, 0);
    }
}
