//! Bearer token inspection and the process-wide active token.
//!
//! The access layer never verifies a token's signature and never refreshes
//! it. It only reads the `exp` claim so that requests with a dead credential
//! fail locally instead of burning retries against the server.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Opaque signed bearer credential.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Decode the payload segment. `None` if the token is not a three-part
    /// compact token or the payload is not the expected JSON.
    pub fn claims(&self) -> Option<TokenClaims> {
        let mut parts = self.0.split('.');
        let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let payload = payload.trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .or_else(|_| STANDARD_NO_PAD.decode(payload))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Expired relative to `now`. Undecodable tokens are expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.claims() {
            Some(claims) => claims.exp < now.timestamp(),
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token::new(raw)
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Token::new(raw)
    }
}

/// Claims read from the token payload (epoch seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub permissions: Option<String>,
    #[serde(default, deserialize_with = "numeric_date::optional")]
    pub iat: Option<i64>,
    #[serde(deserialize_with = "numeric_date::required")]
    pub exp: i64,
}

/// JWT NumericDate: integer or fractional epoch seconds, floored to whole
/// seconds.
mod numeric_date {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    fn floor<E: Error>(value: f64) -> Result<i64, E> {
        if !value.is_finite() {
            return Err(E::custom("NumericDate must be a finite number"));
        }
        Ok(value.floor() as i64)
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        floor(f64::deserialize(deserializer)?)
    }

    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Option::<f64>::deserialize(deserializer)?.map(floor).transpose()
    }
}

/// Diagnostic snapshot of the active token. Never used for access decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub subject: Option<String>,
    pub permissions: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub is_expired: bool,
}

/// Holder of the single active token, shared by every client built on it.
///
/// Replacement is atomic; requests already in flight keep the token they
/// attached when they started.
#[derive(Debug)]
pub struct TokenLifecycle {
    current: RwLock<Token>,
}

impl TokenLifecycle {
    pub fn new(initial: impl Into<Token>) -> Self {
        Self {
            current: RwLock::new(initial.into()),
        }
    }

    pub fn current_token(&self) -> Token {
        self.current.read().clone()
    }

    pub fn replace(&self, new_token: impl Into<Token>) {
        let new_token = new_token.into();
        let expired = new_token.is_expired();
        *self.current.write() = new_token;

        if expired {
            warn!("Bearer token replaced with an expired or undecodable token");
        } else {
            info!("Bearer token replaced");
        }
    }

    pub fn is_expired(&self) -> bool {
        self.current.read().is_expired()
    }

    /// `None` when the active token cannot be decoded.
    pub fn describe(&self) -> Option<TokenStatus> {
        self.describe_at(Utc::now())
    }

    pub fn describe_at(&self, now: DateTime<Utc>) -> Option<TokenStatus> {
        let token = self.current_token();
        let claims = token.claims()?;
        Some(TokenStatus {
            subject: claims.sub,
            permissions: claims.permissions,
            issued_at: claims.iat.and_then(|iat| Utc.timestamp_opt(iat, 0).single()),
            expires_at: Utc.timestamp_opt(claims.exp, 0).single()?,
            is_expired: token.is_expired_at(now),
        })
    }
}
