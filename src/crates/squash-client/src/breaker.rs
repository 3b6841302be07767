//! Consecutive-failure circuit breaker.
//!
//! Two states only. Open means `failures >= threshold` and the last failure
//! is younger than the cooldown. The first evaluation after the cooldown
//! resets the counter to zero, so the next call goes out live. There is no
//! half-open trial request: a failure right after the reset counts as failure #1, and
//! the breaker reopens once the threshold is reached again.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tooling::async_utils::retry::duration_ms;
use tracing::{info, warn};

/// Breaker tuning, fixed for the lifetime of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub threshold: u32,
    #[serde(with = "duration_ms", rename = "cooldown_ms")]
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    last_failure: Option<Instant>,
}

/// Diagnostic view of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStatus {
    pub is_open: bool,
    pub failures: u32,
    pub threshold: u32,
    #[serde(with = "duration_ms", rename = "cooldownRemainingMs")]
    pub cooldown_remaining: Duration,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: parking_lot::Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: parking_lot::Mutex::new(BreakerState::default()),
        }
    }

    pub fn config(&self) -> BreakerConfig {
        self.config
    }

    /// Evaluate the breaker, closing it lazily once the cooldown has elapsed.
    pub fn is_open(&self) -> bool {
        let mut state = self.state.lock();
        self.evaluate(&mut state)
    }

    /// Time left before an open breaker lets traffic through. Zero when closed.
    pub fn remaining_cooldown(&self) -> Duration {
        let mut state = self.state.lock();
        if self.evaluate(&mut state) {
            self.remaining(&state)
        } else {
            Duration::ZERO
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.failures > 0 {
            info!(previous_failures = state.failures, "Circuit breaker failure count reset");
        }
        state.failures = 0;
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failures = state.failures.saturating_add(1);
        state.last_failure = Some(Instant::now());

        if state.failures == self.config.threshold {
            warn!(
                failures = state.failures,
                cooldown_ms = self.config.cooldown.as_millis() as u64,
                "Circuit breaker opened"
            );
        }
    }

    pub fn status(&self) -> CircuitStatus {
        let mut state = self.state.lock();
        let is_open = self.evaluate(&mut state);
        CircuitStatus {
            is_open,
            failures: state.failures,
            threshold: self.config.threshold,
            cooldown_remaining: if is_open {
                self.remaining(&state)
            } else {
                Duration::ZERO
            },
        }
    }

    fn evaluate(&self, state: &mut BreakerState) -> bool {
        if state.failures < self.config.threshold {
            return false;
        }

        let elapsed = state
            .last_failure
            .map(|at| at.elapsed())
            .unwrap_or(Duration::MAX);

        if elapsed < self.config.cooldown {
            return true;
        }

        info!(failures = state.failures, "Circuit breaker cooldown elapsed, closing");
        state.failures = 0;
        false
    }

    fn remaining(&self, state: &BreakerState) -> Duration {
        state
            .last_failure
            .map(|at| self.config.cooldown.saturating_sub(at.elapsed()))
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
