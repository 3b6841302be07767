//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use squash_client::{RetryPolicy, SquashConfig, Token};
use std::time::Duration;

/// Unsigned compact token expiring `offset_secs` from now.
pub fn token_expiring_in(offset_secs: i64) -> Token {
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({"sub": "2", "permissions": "READ_WRITE", "iat": exp - 3600, "exp": exp})
            .to_string(),
    );
    Token::new(format!("{}.{}.c2lnbmF0dXJl", header, payload))
}

pub fn valid_token() -> Token {
    token_expiring_in(86_400)
}

/// Config pointed at a mock server, with short delays so retries stay fast.
pub fn config(base_url: &str, max_attempts: u32) -> SquashConfig {
    SquashConfig {
        base_url: base_url.to_string(),
        token: Some(valid_token()),
        request_timeout: Duration::from_millis(500),
        retry: RetryPolicy::new(max_attempts)
            .with_base_delay(Duration::from_millis(10))
            .with_max_delay(Duration::from_millis(40))
            .with_jitter(false),
        ..SquashConfig::default()
    }
}
