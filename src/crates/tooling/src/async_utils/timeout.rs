//! Per-operation timeout wrapper
//!
//! The timeout applies to the single future it wraps. Dropping that future on
//! expiry cancels only that operation; any enclosing retry loop keeps its own
//! budget.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;

/// Execute an async operation with a timeout
///
/// # Example
///
/// ```rust,ignore
/// use tooling::async_utils::timeout::{with_timeout, TimeoutError};
/// use std::time::Duration;
///
/// let result = with_timeout(Duration::from_secs(1), async {
///     tokio::time::sleep(Duration::from_secs(10)).await;
///     Ok::<_, String>("done")
/// })
/// .await;
///
/// assert!(matches!(result, Err(TimeoutError::Elapsed(_))));
/// ```
pub async fn with_timeout<F, T, E>(
    duration: Duration,
    operation: F,
) -> std::result::Result<T, TimeoutError<E>>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio_timeout(duration, operation).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(error)) => Err(TimeoutError::Failed(error)),
        Err(_elapsed) => Err(TimeoutError::Elapsed(duration)),
    }
}

/// Outcome of a timed operation that did not produce a value
#[derive(Debug, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// Operation completed in time but failed
    Failed(E),
    /// Operation was abandoned after the given duration
    Elapsed(Duration),
}

impl<E> TimeoutError<E> {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeoutError::Elapsed(_))
    }
}

impl<E: std::fmt::Display> std::fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutError::Failed(e) => write!(f, "{}", e),
            TimeoutError::Elapsed(d) => write!(f, "timed out after {}ms", d.as_millis()),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimeoutError::Failed(e) => Some(e),
            TimeoutError::Elapsed(_) => None,
        }
    }
}
