//! Tooling utilities shared across the squash workspace
//!
//! # Modules
//!
//! - `async_utils` - Retry policy with capped exponential backoff, per-operation timeouts
//! - `config` - Prefixed environment overrides and config file loading
//! - `logging` - Subscriber setup, secret redaction and timing helpers

pub mod async_utils;
pub mod config;
pub mod logging;

use thiserror::Error;

/// Errors that can occur in the tooling crate
#[derive(Debug, Error)]
pub enum ToolingError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment variable present but unusable
    #[error("Environment variable {key}: {reason}")]
    Env { key: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tooling operations
pub type Result<T> = std::result::Result<T, ToolingError>;
