//! Error types for the SquashTM access layer.

use std::time::Duration;
use thiserror::Error;

/// Result type for access-layer operations.
pub type Result<T> = std::result::Result<T, SquashError>;

/// Errors that can cross the access-layer boundary.
///
/// Retryable conditions (rate limiting, 502/503/504, transport failures) are
/// absorbed by the retry loop and only surface here once the retry budget is
/// exhausted.
#[derive(Debug, Error)]
pub enum SquashError {
    /// The circuit breaker is withholding traffic.
    #[error("Circuit breaker is open; service temporarily unavailable (retry in {}ms)", .remaining.as_millis())]
    CircuitOpen { remaining: Duration },

    /// The active bearer token is expired or cannot be decoded.
    #[error("Authentication token has expired; replace the token and retry")]
    TokenExpired,

    /// The server refused the credentials (401/403). Never retried.
    #[error("Authentication failed: {status} {body}")]
    AuthRejected { status: u16, body: String },

    /// Still rate limited (429) after every attempt.
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// 502/503/504 on the final attempt.
    #[error("Service unavailable: HTTP {status} after {attempts} attempts")]
    ServerUnavailable { status: u16, attempts: u32 },

    /// Transport failure (connection refused, reset, DNS, ...) on the final attempt.
    #[error("Network error: {0}")]
    Network(String),

    /// The final attempt did not complete within its timeout.
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Body does not match the expected payload shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Any other non-2xx status. Terminal.
    #[error("API error: HTTP {status} {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request could not be built (bad endpoint, bad URL).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Tree operation referenced a node the loader does not hold.
    #[error("Tree node not found: {0}")]
    NodeNotFound(String),
}

impl SquashError {
    /// The channel is currently unusable for reasons that may clear up on
    /// their own: retries exhausted on a transient condition, or the breaker
    /// is open because of earlier exhaustion.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SquashError::CircuitOpen { .. }
                | SquashError::RateLimited { .. }
                | SquashError::ServerUnavailable { .. }
                | SquashError::Network(_)
                | SquashError::Timeout(_)
        )
    }

    /// Credential problem: local expiry or remote rejection.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            SquashError::TokenExpired | SquashError::AuthRejected { .. }
        )
    }

    /// HTTP status carried by the error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SquashError::AuthRejected { status, .. }
            | SquashError::ServerUnavailable { status, .. }
            | SquashError::UnexpectedStatus { status, .. } => Some(*status),
            SquashError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SquashError {
    fn from(err: serde_json::Error) -> Self {
        SquashError::MalformedResponse(err.to_string())
    }
}

impl From<tooling::ToolingError> for SquashError {
    fn from(err: tooling::ToolingError) -> Self {
        SquashError::Config(err.to_string())
    }
}
