//! Retry and backoff policies
//!
//! A [`RetryPolicy`] decides whether a failed attempt is worth repeating and
//! when the retry budget is spent. A [`BackoffPolicy`] decides how long to
//! wait between attempts (exponential growth with jitter). Both are stateful;
//! the retry decorator keeps one prototype of each and clones a fresh copy
//! for every logical operation, so concurrent calls never share state.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::status::Status;

/// Whether a failed attempt may succeed if repeated.
///
/// Timeouts (408), throttling (429), server errors and transport failures
/// (>= 500) are transient; every other failure is permanent.
pub fn is_transient_failure(status: &Status) -> bool {
    matches!(status.code(), 408 | 429) || status.code() >= 500
}

/// Decides whether to retry after a failure.
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// A copy of this policy with its budget reset.
    fn clone_box(&self) -> Box<dyn RetryPolicy>;

    /// Record a failure; returns `true` if the operation should be retried.
    fn on_failure(&mut self, status: &Status) -> bool;

    /// Whether no further attempts are allowed.
    fn is_exhausted(&self) -> bool;
}

/// Computes the wait before the next attempt.
pub trait BackoffPolicy: Send + Sync + fmt::Debug {
    /// A copy of this policy restarted at its initial delay.
    fn clone_box(&self) -> Box<dyn BackoffPolicy>;

    fn next_delay(&mut self) -> Duration;
}

/// Retry transient failures until more than `maximum_failures` have been
/// seen. `LimitedErrorCountRetryPolicy::new(2)` allows three attempts.
#[derive(Debug, Clone)]
pub struct LimitedErrorCountRetryPolicy {
    maximum_failures: u32,
    failure_count: u32,
}

impl LimitedErrorCountRetryPolicy {
    pub fn new(maximum_failures: u32) -> Self {
        Self {
            maximum_failures,
            failure_count: 0,
        }
    }

    pub fn maximum_failures(&self) -> u32 {
        self.maximum_failures
    }
}

impl RetryPolicy for LimitedErrorCountRetryPolicy {
    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(Self::new(self.maximum_failures))
    }

    fn on_failure(&mut self, status: &Status) -> bool {
        if !is_transient_failure(status) {
            return false;
        }
        self.failure_count += 1;
        self.failure_count <= self.maximum_failures
    }

    fn is_exhausted(&self) -> bool {
        self.failure_count > self.maximum_failures
    }
}

/// Retry transient failures until `maximum_duration` has elapsed since the
/// policy was cloned for the operation.
#[derive(Debug, Clone)]
pub struct LimitedTimeRetryPolicy {
    maximum_duration: Duration,
    deadline: Instant,
}

impl LimitedTimeRetryPolicy {
    pub fn new(maximum_duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            maximum_duration,
            deadline: now
                .checked_add(maximum_duration)
                .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 3600)),
        }
    }

    pub fn maximum_duration(&self) -> Duration {
        self.maximum_duration
    }
}

impl RetryPolicy for LimitedTimeRetryPolicy {
    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(Self::new(self.maximum_duration))
    }

    fn on_failure(&mut self, status: &Status) -> bool {
        is_transient_failure(status) && !self.is_exhausted()
    }

    fn is_exhausted(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Exponential backoff with jitter.
///
/// Each delay is drawn uniformly from `[current / 2, current]`, after which
/// `current` grows by `scaling` up to `maximum_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    initial_delay: Duration,
    maximum_delay: Duration,
    scaling: f64,
    current_delay: Duration,
}

impl ExponentialBackoffPolicy {
    /// Scaling factors below 1.0 are treated as 1.0.
    pub fn new(initial_delay: Duration, maximum_delay: Duration, scaling: f64) -> Self {
        let scaling = if scaling.is_finite() && scaling >= 1.0 {
            scaling
        } else {
            1.0
        };
        Self {
            initial_delay,
            maximum_delay,
            scaling,
            current_delay: initial_delay.min(maximum_delay),
        }
    }
}

impl BackoffPolicy for ExponentialBackoffPolicy {
    fn clone_box(&self) -> Box<dyn BackoffPolicy> {
        Box::new(Self::new(self.initial_delay, self.maximum_delay, self.scaling))
    }

    fn next_delay(&mut self) -> Duration {
        let upper = u64::try_from(self.current_delay.as_nanos()).unwrap_or(u64::MAX);
        let delay = Duration::from_nanos(rand::rng().random_range(upper / 2..=upper));
        self.current_delay =
            Duration::try_from_secs_f64(self.current_delay.as_secs_f64() * self.scaling)
                .unwrap_or(self.maximum_delay)
                .min(self.maximum_delay);
        delay
    }
}

/// Default budget: retry transient failures for up to five minutes.
pub fn default_retry_policy() -> Box<dyn RetryPolicy> {
    Box::new(LimitedTimeRetryPolicy::new(Duration::from_secs(5 * 60)))
}

/// Default backoff: start at one second, double, cap at five minutes.
pub fn default_backoff_policy() -> Box<dyn BackoffPolicy> {
    Box::new(ExponentialBackoffPolicy::new(
        Duration::from_secs(1),
        Duration::from_secs(5 * 60),
        2.0,
    ))
}

/// Retry settings as stored in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry at most this many failures. Takes precedence over
    /// `maximum_duration_secs` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_failures: Option<u32>,
    pub maximum_duration_secs: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_scaling: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            maximum_failures: None,
            maximum_duration_secs: 5 * 60,
            initial_backoff_ms: 1000,
            max_backoff_ms: 5 * 60 * 1000,
            backoff_scaling: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn retry_policy(&self) -> Box<dyn RetryPolicy> {
        match self.maximum_failures {
            Some(n) => Box::new(LimitedErrorCountRetryPolicy::new(n)),
            None => Box::new(LimitedTimeRetryPolicy::new(Duration::from_secs(
                self.maximum_duration_secs,
            ))),
        }
    }

    pub fn backoff_policy(&self) -> Box<dyn BackoffPolicy> {
        Box::new(ExponentialBackoffPolicy::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.backoff_scaling,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_failure() {
        assert!(is_transient_failure(&Status::new(408, "timeout")));
        assert!(is_transient_failure(&Status::new(429, "slow down")));
        assert!(is_transient_failure(&Status::new(500, "internal")));
        assert!(is_transient_failure(&Status::new(503, "unavailable")));
        assert!(is_transient_failure(&Status::transport_failure("reset")));

        assert!(!is_transient_failure(&Status::new(400, "bad request")));
        assert!(!is_transient_failure(&Status::new(401, "unauthorized")));
        assert!(!is_transient_failure(&Status::new(404, "not found")));
        assert!(!is_transient_failure(&Status::new(412, "precondition")));
        assert!(!is_transient_failure(&Status::cancelled("stop")));
    }

    #[test]
    fn test_limited_error_count() {
        let transient = Status::new(503, "unavailable");
        let mut policy = LimitedErrorCountRetryPolicy::new(2);

        assert!(!policy.is_exhausted());
        assert!(policy.on_failure(&transient));
        assert!(policy.on_failure(&transient));
        assert!(!policy.is_exhausted());
        assert!(!policy.on_failure(&transient));
        assert!(policy.is_exhausted());

        let fresh = policy.clone_box();
        assert!(!fresh.is_exhausted());
    }

    #[test]
    fn test_limited_error_count_permanent() {
        let mut policy = LimitedErrorCountRetryPolicy::new(5);
        assert!(!policy.on_failure(&Status::new(403, "forbidden")));
        assert!(!policy.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_limited_time() {
        let transient = Status::new(500, "internal");
        let mut policy = LimitedTimeRetryPolicy::new(Duration::from_secs(10));

        assert!(policy.on_failure(&transient));
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(policy.is_exhausted());
        assert!(!policy.on_failure(&transient));

        let fresh = policy.clone_box();
        assert!(!fresh.is_exhausted());
    }

    #[test]
    fn test_exponential_backoff_range() {
        let mut backoff = ExponentialBackoffPolicy::new(
            Duration::from_millis(100),
            Duration::from_millis(1000),
            2.0,
        );

        let d1 = backoff.next_delay();
        assert!(d1 >= Duration::from_millis(50) && d1 <= Duration::from_millis(100));

        let d2 = backoff.next_delay();
        assert!(d2 >= Duration::from_millis(100) && d2 <= Duration::from_millis(200));

        let d3 = backoff.next_delay();
        assert!(d3 >= Duration::from_millis(200) && d3 <= Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_cap() {
        let mut backoff = ExponentialBackoffPolicy::new(
            Duration::from_millis(1000),
            Duration::from_millis(5000),
            4.0,
        );
        for _ in 0..10 {
            assert!(backoff.next_delay() <= Duration::from_millis(5000));
        }

        // A fresh clone starts over at the initial delay.
        let mut fresh = backoff.clone_box();
        assert!(fresh.next_delay() <= Duration::from_millis(1000));
    }

    #[test]
    fn test_invalid_scaling_is_clamped() {
        let mut backoff = ExponentialBackoffPolicy::new(
            Duration::from_millis(10),
            Duration::from_millis(100),
            0.5,
        );
        for _ in 0..5 {
            let delay = backoff.next_delay();
            assert!(delay >= Duration::from_millis(5) && delay <= Duration::from_millis(10));
        }
    }

    #[test]
    fn test_retry_config_policies() {
        let config = RetryConfig {
            maximum_failures: Some(1),
            ..Default::default()
        };
        let mut policy = config.retry_policy();
        assert!(policy.on_failure(&Status::new(503, "")));
        assert!(!policy.on_failure(&Status::new(503, "")));

        let config: RetryConfig =
            toml::from_str("initial_backoff_ms = 10\nmax_backoff_ms = 20").unwrap();
        assert_eq!(config.maximum_duration_secs, 300);
        let mut backoff = config.backoff_policy();
        assert!(backoff.next_delay() <= Duration::from_millis(10));
    }
}
