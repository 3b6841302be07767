//! Retry policy with capped exponential backoff
//!
//! The policy is pure configuration: it never sleeps on its own. Callers ask
//! for the delay of a given (0-indexed) attempt and decide what to do with it,
//! which keeps the retry loop itself in the component that knows how to
//! classify failures.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound (exclusive) of the random amount added when jitter is enabled.
pub const JITTER_SPAN: Duration = Duration::from_millis(1000);

/// Bounded retry configuration.
///
/// The delay for attempt `a` is `min(base_delay * 2^a, max_delay)`, plus a
/// uniformly random amount in `[0, 1000)` ms when `jitter` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Delay before the second attempt
    #[serde(with = "duration_ms", rename = "base_delay_ms")]
    pub base_delay: Duration,

    /// Ceiling for the exponential part of the delay
    #[serde(with = "duration_ms", rename = "max_delay_ms")]
    pub max_delay: Duration,

    /// Whether to add random jitter on top of the capped delay
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a policy with the given max attempts and default delays
    ///
    /// # Example
    ///
    /// ```rust
    /// use tooling::async_utils::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(4);
    /// assert_eq!(policy.max_attempts, 4);
    /// assert!(policy.jitter);
    /// ```
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
            jitter: true,
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Deterministic part of the delay: `min(base_delay * 2^attempt, max_delay)`.
    pub fn capped_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay)
    }

    /// Delay to wait after a failed attempt, jitter included when enabled.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let capped = self.capped_delay(attempt);
        if !self.jitter {
            return capped;
        }

        let jitter_ms = rand::thread_rng().gen_range(0..JITTER_SPAN.as_millis() as u64);
        capped + Duration::from_millis(jitter_ms)
    }

    /// Number of attempts to make. A zero `max_attempts` still makes one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether `attempt` (0-indexed) is the final one the policy allows.
    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt + 1 >= self.attempts()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Parse a `Retry-After` header value expressed in delta-seconds.
///
/// HTTP-date values and anything else that is not a non-negative integer are
/// ignored so the caller falls back to its computed backoff.
///
/// ```rust
/// use tooling::async_utils::retry::parse_retry_after;
/// use std::time::Duration;
///
/// assert_eq!(parse_retry_after("2"), Some(Duration::from_millis(2000)));
/// assert_eq!(parse_retry_after(" 30 "), Some(Duration::from_secs(30)));
/// assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
/// ```
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Serde adapter storing a `Duration` as integer milliseconds.
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
