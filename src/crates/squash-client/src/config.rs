//! Access-layer configuration.
//!
//! Layering: built-in defaults, then an optional TOML/YAML/JSON file, then
//! `SQUASH_*` environment variables. The API token has no built-in value.

use crate::api::PageSizes;
use crate::breaker::BreakerConfig;
use crate::error::{Result, SquashError};
use crate::token::Token;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tooling::async_utils::retry::{duration_ms, RetryPolicy};
use tooling::config::{load_config_file, EnvPrefix};

pub const DEFAULT_BASE_URL: &str = "https://demo.squashtest.org/squash/api/rest/latest";
pub const ENV_PREFIX: &str = "SQUASH_";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquashConfig {
    pub base_url: String,

    #[serde(skip_serializing)]
    pub token: Option<Token>,

    #[serde(with = "duration_ms", rename = "request_timeout_ms")]
    pub request_timeout: Duration,

    #[serde(with = "duration_ms", rename = "health_timeout_ms")]
    pub health_timeout: Duration,

    pub retry: RetryPolicy,
    pub breaker: BreakerConfig,
    pub fallback_enabled: bool,
    pub page_sizes: PageSizes,
}

impl Default for SquashConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            request_timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            breaker: BreakerConfig::default(),
            fallback_enabled: false,
            page_sizes: PageSizes::default(),
        }
    }
}

impl fmt::Debug for SquashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquashConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("health_timeout", &self.health_timeout)
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .field("fallback_enabled", &self.fallback_enabled)
            .field("page_sizes", &self.page_sizes)
            .finish()
    }
}

impl SquashConfig {
    /// Load from `path` (or `SQUASH_CONFIG`), apply env overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = EnvPrefix::new(ENV_PREFIX);
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => env.string("CONFIG")?.map(PathBuf::from),
        };

        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading configuration file");
                load_config_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay every variable present under `env`'s prefix.
    pub fn apply_env(&mut self, env: &EnvPrefix) -> Result<()> {
        if let Some(url) = env.string("BASE_URL")? {
            self.base_url = url;
        }
        if let Some(token) = env.string("API_TOKEN")? {
            self.token = Some(Token::new(token));
        }
        if let Some(timeout) = env.millis("REQUEST_TIMEOUT_MS")? {
            self.request_timeout = timeout;
        }
        if let Some(timeout) = env.millis("HEALTH_TIMEOUT_MS")? {
            self.health_timeout = timeout;
        }
        if let Some(attempts) = env.parse::<u32>("MAX_ATTEMPTS")? {
            self.retry.max_attempts = attempts;
        }
        if let Some(delay) = env.millis("BASE_DELAY_MS")? {
            self.retry.base_delay = delay;
        }
        if let Some(delay) = env.millis("MAX_DELAY_MS")? {
            self.retry.max_delay = delay;
        }
        if let Some(jitter) = env.flag("JITTER")? {
            self.retry.jitter = jitter;
        }
        if let Some(threshold) = env.parse::<u32>("BREAKER_THRESHOLD")? {
            self.breaker.threshold = threshold;
        }
        if let Some(cooldown) = env.millis("BREAKER_COOLDOWN_MS")? {
            self.breaker.cooldown = cooldown;
        }
        if let Some(fallback) = env.flag("FALLBACK")? {
            self.fallback_enabled = fallback;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(SquashError::Config("base_url must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SquashError::Config(format!(
                "base_url must use http or https, got {:?}",
                url
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(SquashError::Config("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(SquashError::Config(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".into(),
            ));
        }
        if self.breaker.threshold == 0 {
            return Err(SquashError::Config("breaker.threshold must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(SquashError::Config("request_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// The configured token, or an error naming where to put one.
    pub fn require_token(&self) -> Result<Token> {
        self.token.clone().ok_or_else(|| {
            SquashError::Config(format!(
                "no API token configured; set {}API_TOKEN or `token` in the config file",
                ENV_PREFIX
            ))
        })
    }
}
