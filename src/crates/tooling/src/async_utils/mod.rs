//! Async utilities shared by network-facing crates
//!
//! - `retry` - bounded retry policy with capped exponential backoff and jitter
//! - `timeout` - per-operation timeout wrapper
//!
//! # Example
//!
//! ```rust,ignore
//! use tooling::async_utils::retry::RetryPolicy;
//! use tooling::async_utils::timeout::with_timeout;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3).with_jitter(false);
//! for attempt in 0..policy.attempts() {
//!     match with_timeout(Duration::from_secs(10), call_remote()).await {
//!         Ok(value) => return Ok(value),
//!         Err(_) if !policy.is_last_attempt(attempt) => {
//!             tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
//!         }
//!         Err(e) => return Err(e),
//!     }
//! }
//! ```

pub mod retry;
pub mod timeout;
