//! Prefixed environment variable loading
//!
//! Every getter returns `Ok(None)` when the variable is absent so callers can
//! layer environment overrides on top of file or default values.

use crate::{Result, ToolingError};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Reads variables sharing a common prefix, e.g. `SQUASH_` + `BASE_URL`.
#[derive(Debug, Clone)]
pub struct EnvPrefix {
    prefix: String,
}

impl EnvPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Full variable name for `name` (uppercased).
    ///
    /// ```rust
    /// use tooling::config::EnvPrefix;
    ///
    /// assert_eq!(EnvPrefix::new("SQUASH_").key("base_url"), "SQUASH_BASE_URL");
    /// ```
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name.to_uppercase())
    }

    /// Raw string value. Blank values count as absent.
    pub fn string(&self, name: &str) -> Result<Option<String>> {
        let key = self.key(name);
        match env::var(&key) {
            Ok(val) if val.trim().is_empty() => Ok(None),
            Ok(val) => Ok(Some(val.trim().to_string())),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(ToolingError::Env {
                key,
                reason: "contains invalid UTF-8".to_string(),
            }),
        }
    }

    /// Value parsed with `FromStr`.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(name)? {
            Some(val) => val.parse::<T>().map(Some).map_err(|e| ToolingError::Env {
                key: self.key(name),
                reason: format!("cannot parse {:?}: {}", val, e),
            }),
            None => Ok(None),
        }
    }

    /// Boolean flag: `true/1/yes/on` or `false/0/no/off`, case-insensitive.
    pub fn flag(&self, name: &str) -> Result<Option<bool>> {
        match self.string(name)? {
            Some(val) => match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Some(true)),
                "false" | "0" | "no" | "off" => Ok(Some(false)),
                _ => Err(ToolingError::Env {
                    key: self.key(name),
                    reason: format!("invalid boolean {:?}", val),
                }),
            },
            None => Ok(None),
        }
    }

    /// Duration given as integer milliseconds.
    pub fn millis(&self, name: &str) -> Result<Option<Duration>> {
        Ok(self.parse::<u64>(name)?.map(Duration::from_millis))
    }
}
