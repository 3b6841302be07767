//! Resilient GET pipeline.
//!
//! One logical read = breaker gate, token gate, then a strictly sequential
//! attempt loop. Each attempt is bounded by its own timeout. Retryable
//! outcomes (429, 502/503/504, transport failure, timeout) are absorbed until
//! the attempt budget runs out; everything else is terminal. Every terminal
//! outcome is reported to the circuit breaker.
//!
//! # Example
//!
//! ```rust,ignore
//! use squash_client::client::{RequestOptions, ResilientHttpClient};
//! use squash_client::models::HalCollection;
//!
//! let client = ResilientHttpClient::new(base_url, tokens, transport)
//!     .with_retry_policy(RetryPolicy::new(4));
//! let page: HalCollection = client
//!     .get("/projects", &RequestOptions::new().with_page(0).with_size(20))
//!     .await?;
//! ```

use crate::breaker::{CircuitBreaker, CircuitStatus};
use crate::error::{Result, SquashError};
use crate::token::{Token, TokenLifecycle, TokenStatus};
use crate::transport::{HttpRequest, Transport, TransportError};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tooling::async_utils::retry::{parse_retry_after, RetryPolicy};
use tooling::async_utils::timeout::{with_timeout, TimeoutError};
use tooling::logging::redact_secrets;
use tracing::{debug, error, warn};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const BODY_EXCERPT_LEN: usize = 512;

/// Per-call options. Query parameters are only sent when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub fields: Option<String>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Retryable outcome of a single attempt.
enum AttemptFailure {
    Status(u16),
    Network(TransportError),
    Timeout(Duration),
}

impl AttemptFailure {
    fn into_error(self, attempts: u32) -> SquashError {
        match self {
            AttemptFailure::Status(status) => SquashError::ServerUnavailable { status, attempts },
            AttemptFailure::Network(err) => SquashError::Network(err.to_string()),
            AttemptFailure::Timeout(after) => SquashError::Timeout(after),
        }
    }

    fn describe(&self) -> String {
        match self {
            AttemptFailure::Status(status) => format!("HTTP {}", status),
            AttemptFailure::Network(err) => err.to_string(),
            AttemptFailure::Timeout(after) => format!("timed out after {}ms", after.as_millis()),
        }
    }
}

pub struct ResilientHttpClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenLifecycle>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl ResilientHttpClient {
    /// Client with default retry policy, breaker and timeouts.
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<TokenLifecycle>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            tokens,
            breaker: Arc::new(CircuitBreaker::default()),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Share a breaker between clients talking to the same service.
    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn tokens(&self) -> &Arc<TokenLifecycle> {
        &self.tokens
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Execute one logical GET and deserialize the 2xx body as `T`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<T> {
        self.get_with::<T, T, _>(endpoint, options, Ok).await
    }

    /// Like [`get`](Self::get), then `decode` the body further before the
    /// outcome is reported to the breaker. A `decode` error is a malformed
    /// response and counts as a failure.
    pub async fn get_with<T, U, F>(&self, endpoint: &str, options: &RequestOptions, decode: F) -> Result<U>
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> std::result::Result<U, serde_json::Error>,
    {
        let circuit = self.breaker.status();
        if circuit.is_open {
            debug!(endpoint, "Circuit open, failing fast");
            return Err(SquashError::CircuitOpen {
                remaining: circuit.cooldown_remaining,
            });
        }

        // snapshot once; a concurrent replace() only affects later calls
        let token = self.tokens.current_token();
        if token.is_expired() {
            warn!(endpoint, "Refusing request: bearer token expired");
            return Err(SquashError::TokenExpired);
        }

        let request = self.build_request(endpoint, options, &token)?;
        let timeout = options.timeout.unwrap_or(self.request_timeout);
        let max_attempts = self.retry.attempts();

        for attempt in 0..max_attempts {
            let last = self.retry.is_last_attempt(attempt);
            debug!(endpoint, attempt = attempt + 1, "Sending request");

            let failure = match with_timeout(timeout, self.transport.send(request.clone())).await {
                Ok(response) => match response.status {
                    429 => {
                        if last {
                            break;
                        }
                        let delay = response
                            .header("Retry-After")
                            .and_then(parse_retry_after)
                            .unwrap_or_else(|| self.retry.delay_for_attempt(attempt));
                        warn!(
                            endpoint,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "Rate limited, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    401 | 403 => {
                        self.breaker.record_failure();
                        error!(endpoint, status = response.status, "Authentication rejected");
                        return Err(SquashError::AuthRejected {
                            status: response.status,
                            body: excerpt(&response.body),
                        });
                    }
                    502..=504 => AttemptFailure::Status(response.status),
                    status if !response.is_success() => {
                        self.breaker.record_failure();
                        error!(endpoint, status, "Request failed");
                        return Err(SquashError::UnexpectedStatus {
                            status,
                            body: excerpt(&response.body),
                        });
                    }
                    _ => return self.parse(endpoint, &response.body, decode),
                },
                Err(TimeoutError::Failed(err)) if !err.is_retryable() => {
                    return Err(SquashError::InvalidRequest(err.to_string()));
                }
                Err(TimeoutError::Failed(err)) => AttemptFailure::Network(err),
                Err(TimeoutError::Elapsed(after)) => AttemptFailure::Timeout(after),
            };

            if last {
                self.breaker.record_failure();
                let err = failure.into_error(attempt + 1);
                error!(endpoint, attempts = attempt + 1, error = %err, "Request failed after retries");
                return Err(err);
            }

            let delay = self.retry.delay_for_attempt(attempt);
            warn!(
                endpoint,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %failure.describe(),
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }

        self.breaker.record_failure();
        error!(endpoint, attempts = max_attempts, "Still rate limited after retries");
        Err(SquashError::RateLimited {
            attempts: max_attempts,
        })
    }

    /// Minimal authenticated request with a short timeout. Never errors.
    pub async fn health_check(&self) -> bool {
        let options = RequestOptions::new()
            .with_page(0)
            .with_size(1)
            .with_timeout(self.health_timeout);

        match self.get::<serde_json::Value>("/projects", &options).await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "Health check failed");
                false
            }
        }
    }

    pub fn circuit_status(&self) -> CircuitStatus {
        self.breaker.status()
    }

    pub fn token_status(&self) -> Option<TokenStatus> {
        self.tokens.describe()
    }

    pub fn replace_token(&self, token: impl Into<Token>) {
        self.tokens.replace(token);
    }

    fn build_request(&self, endpoint: &str, options: &RequestOptions, token: &Token) -> Result<HttpRequest> {
        if endpoint.is_empty() || endpoint.contains("://") {
            return Err(SquashError::InvalidRequest(format!(
                "endpoint must be a path relative to the base URL, got {:?}",
                endpoint
            )));
        }

        let path = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };

        let mut request = HttpRequest::get(format!("{}{}", self.base_url, path))
            .with_header("Authorization", token.bearer())
            .with_header("Accept", "application/json");

        if let Some(page) = options.page {
            request = request.with_query("page", page);
        }
        if let Some(size) = options.size {
            request = request.with_query("size", size);
        }
        if let Some(fields) = &options.fields {
            request = request.with_query("fields", fields);
        }

        Ok(request)
    }

    fn parse<T, U, F>(&self, endpoint: &str, body: &str, decode: F) -> Result<U>
    where
        T: DeserializeOwned,
        F: FnOnce(T) -> std::result::Result<U, serde_json::Error>,
    {
        match serde_json::from_str::<T>(body).and_then(decode) {
            Ok(value) => {
                self.breaker.record_success();
                Ok(value)
            }
            Err(err) => {
                self.breaker.record_failure();
                error!(endpoint, error = %err, "Response body did not match expected shape");
                Err(SquashError::MalformedResponse(err.to_string()))
            }
        }
    }
}

fn excerpt(body: &str) -> String {
    let trimmed: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    redact_secrets(trimmed.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::BreakerConfig;
    use crate::token::test_tokens;
    use crate::transport::scripted::{ScriptedTransport, Step};
    use crate::transport::HttpResponse;
    use serde_json::json;
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_base_delay(Duration::from_millis(1000))
            .with_max_delay(Duration::from_millis(8000))
            .with_jitter(false)
    }

    fn client(transport: Arc<ScriptedTransport>, max_attempts: u32) -> ResilientHttpClient {
        ResilientHttpClient::new(
            "http://squash.test/api/rest/latest/",
            Arc::new(TokenLifecycle::new(test_tokens::valid())),
            transport,
        )
        .with_retry_policy(policy(max_attempts))
    }

    fn ok_body() -> Step {
        ScriptedTransport::json(json!({"ok": true}))
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_503_then_success_with_four_attempts() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTransport::status(503),
            ScriptedTransport::status(503),
            ScriptedTransport::status(503),
            ok_body(),
        ]));
        let client = client(transport.clone(), 4);

        let start = Instant::now();
        let body: serde_json::Value = client.get("/projects", &RequestOptions::new()).await.unwrap();

        assert_eq!(body["ok"], true);
        assert_eq!(transport.call_count(), 4);
        // 1000 + 2000 + 4000
        assert_eq!(start.elapsed(), Duration::from_millis(7000));
        assert_eq!(client.circuit_status().failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_503_exhaust_three_attempts() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTransport::status(503),
            ScriptedTransport::status(503),
            ScriptedTransport::status(503),
            ok_body(),
        ]));
        let client = client(transport.clone(), 3);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SquashError::ServerUnavailable { status: 503, attempts: 3 }
        ));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(client.circuit_status().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_overrides_backoff() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Respond(HttpResponse::new(429, "").with_header("Retry-After", "2")),
            ok_body(),
        ]));
        let client = client(transport.clone(), 3).with_retry_policy(
            RetryPolicy::new(3)
                .with_base_delay(Duration::from_millis(7000))
                .with_jitter(true),
        );

        let start = Instant::now();
        client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(2000));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_header_uses_backoff() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTransport::status(429),
            ScriptedTransport::status(429),
            ok_body(),
        ]));
        let client = client(transport.clone(), 3);

        let start = Instant::now();
        client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhausted() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTransport::status(429),
            ScriptedTransport::status(429),
            ScriptedTransport::status(429),
        ]));
        let client = client(transport.clone(), 3);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SquashError::RateLimited { attempts: 3 }));
        assert_eq!(transport.call_count(), 3);
        assert_eq!(client.circuit_status().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_rejection_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Respond(HttpResponse::new(401, "Bearer eyJhbGciOiJIUzUxMiJ9.abc.def rejected")),
            ok_body(),
        ]));
        let client = client(transport.clone(), 3);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();

        match err {
            SquashError::AuthRejected { status, body } => {
                assert_eq!(status, 401);
                assert!(!body.contains("eyJhbGciOiJIUzUxMiJ9.abc.def"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transport.call_count(), 1);
        assert_eq!(client.circuit_status().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_status_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new([Step::Respond(HttpResponse::new(
            404,
            "no such test case",
        ))]));
        let client = client(transport.clone(), 3);

        let err = client
            .get::<serde_json::Value>("/test-cases/9", &RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SquashError::UnexpectedStatus { status: 404, ref body } if body == "no such test case"
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_is_retried() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Fail(TransportError::Connect("refused".into())),
            ok_body(),
        ]));
        let client = client(transport.clone(), 3);

        client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_failure_exhausted() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Fail(TransportError::Connect("refused".into())),
            Step::Fail(TransportError::Io("reset".into())),
        ]));
        let client = client(transport.clone(), 2);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SquashError::Network(ref msg) if msg.contains("reset")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_per_attempt() {
        let transport = Arc::new(ScriptedTransport::new([Step::Hang, Step::Hang]));
        let client = client(transport.clone(), 2);

        let start = Instant::now();
        let err = client
            .get::<serde_json::Value>(
                "/projects",
                &RequestOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SquashError::Timeout(d) if d == Duration::from_millis(100)));
        // 100 (attempt 1) + 1000 backoff + 100 (attempt 2)
        assert_eq!(start.elapsed(), Duration::from_millis(1200));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body() {
        let transport = Arc::new(ScriptedTransport::new([Step::Respond(HttpResponse::new(
            200,
            "<html>login</html>",
        ))]));
        let client = client(transport.clone(), 3);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SquashError::MalformedResponse(_)));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_counts_against_breaker() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTransport::status(500),
            ScriptedTransport::json(json!({"items": [{"name": "no id"}]})),
        ]));
        let client = client(transport.clone(), 1);

        let _ = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await;
        assert_eq!(client.circuit_status().failures, 1);

        let err = client
            .get_with("/projects", &RequestOptions::new(), |body: serde_json::Value| {
                serde_json::from_value::<Vec<crate::models::Project>>(body["items"].clone())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SquashError::MalformedResponse(ref msg) if msg.contains("id")));
        // no success recorded in between, so the streak continues
        assert_eq!(client.circuit_status().failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_attempts_still_sends_once() {
        let transport = Arc::new(ScriptedTransport::new([ScriptedTransport::status(503)]));
        let client = client(transport.clone(), 0);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SquashError::ServerUnavailable { status: 503, attempts: 1 }
        ));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_skips_network() {
        let transport = Arc::new(ScriptedTransport::new([ok_body()]));
        let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
            threshold: 1,
            cooldown: Duration::from_secs(60),
        }));
        breaker.record_failure();
        let client = client(transport.clone(), 3).with_breaker(breaker);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SquashError::CircuitOpen { remaining } if remaining == Duration::from_secs(60)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_token_skips_network() {
        let transport = Arc::new(ScriptedTransport::new([ok_body()]));
        let client = client(transport.clone(), 3);
        client.replace_token(test_tokens::expired());

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SquashError::TokenExpired));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_shape() {
        let transport = Arc::new(ScriptedTransport::new([ok_body(), ok_body()]));
        let client = client(transport.clone(), 3);
        let token = client.tokens().current_token();

        client
            .get::<serde_json::Value>(
                "test-case-folders/101/test-cases",
                &RequestOptions::new().with_page(2).with_fields("name,status"),
            )
            .await
            .unwrap();
        client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap();

        let requests = transport.requests.lock();
        let first = &requests[0];
        assert_eq!(
            first.url,
            "http://squash.test/api/rest/latest/test-case-folders/101/test-cases"
        );
        assert_eq!(first.query_param("page"), Some("2"));
        assert_eq!(first.query_param("size"), None);
        assert_eq!(first.query_param("fields"), Some("name,status"));
        assert_eq!(first.header("authorization"), Some(token.bearer().as_str()));
        assert_eq!(first.header("accept"), Some("application/json"));
        assert!(requests[1].query.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaced_token_used_by_next_call() {
        let transport = Arc::new(ScriptedTransport::new([ok_body()]));
        let client = client(transport.clone(), 3);
        let fresh = test_tokens::expiring_at(chrono::Utc::now().timestamp() + 7200);
        client.replace_token(fresh.clone());

        client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap();

        let requests = transport.requests.lock();
        assert_eq!(requests[0].header("Authorization"), Some(fresh.bearer().as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absolute_endpoint_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new([]));
        let client = client(transport.clone(), 3);
        let err = client
            .get::<serde_json::Value>("https://evil.test/projects", &RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SquashError::InvalidRequest(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_check() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTransport::json(json!({"_embedded": {"projects": []}})),
            ScriptedTransport::status(500),
        ]));
        let client = client(transport.clone(), 1);

        assert!(client.health_check().await);
        assert!(!client.health_check().await);

        let requests = transport.requests.lock();
        assert_eq!(requests[0].query_param("page"), Some("0"));
        assert_eq!(requests[0].query_param("size"), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_trips_after_repeated_terminal_failures() {
        let transport = Arc::new(ScriptedTransport::new(
            (0..5).map(|_| ScriptedTransport::status(500)),
        ));
        let breaker = Arc::new(CircuitBreaker::new(BreakerConfig {
            threshold: 5,
            cooldown: Duration::from_secs(60),
        }));
        let client = client(transport.clone(), 3).with_breaker(breaker);

        for _ in 0..5 {
            let _ = client
                .get::<serde_json::Value>("/projects", &RequestOptions::new())
                .await;
        }
        assert!(client.circuit_status().is_open);

        let err = client
            .get::<serde_json::Value>("/projects", &RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SquashError::CircuitOpen { .. }));
        assert_eq!(transport.call_count(), 5);
    }
}
