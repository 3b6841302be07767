//! Resilient access layer for the SquashTM test-management REST API.
//!
//! The crate turns an unreliable, paginated, HAL-style API into something a
//! UI or a CLI can lean on: bounded retries with exponential backoff, a
//! circuit breaker, local token-expiry checks, and a project → folder →
//! test-case tree that loads lazily.
//!
//! # Modules
//!
//! ## Token (`token`)
//!
//! Reads the `exp` claim of the active bearer token. Undecodable tokens count
//! as expired. The token is never verified or refreshed here.
//!
//! ## Breaker (`breaker`)
//!
//! Consecutive-failure breaker with a cooldown and a lazy reset.
//!
//! ## Client (`client`)
//!
//! One logical GET through breaker gate, token gate and retry loop:
//!
//! ```rust,ignore
//! use squash_client::{RequestOptions, ResilientHttpClient, ReqwestTransport, TokenLifecycle};
//! use std::sync::Arc;
//!
//! let tokens = Arc::new(TokenLifecycle::new(std::env::var("SQUASH_API_TOKEN")?));
//! let client = ResilientHttpClient::new(base_url, tokens, Arc::new(ReqwestTransport::new()?));
//! let body: serde_json::Value = client
//!     .get("/projects", &RequestOptions::new().with_page(0).with_size(20))
//!     .await?;
//! ```
//!
//! ## Api (`api`) and Fallback (`fallback`)
//!
//! Typed endpoints. With fallback enabled, a call that ends in a transient
//! failure is answered from a static dataset; the next call goes live again.
//!
//! ## Tree (`tree`)
//!
//! Lazily expanded hierarchy with structural sharing:
//!
//! ```rust,ignore
//! use squash_client::{NodeId, SquashConfig, SquashService};
//!
//! let service = SquashService::from_config(&SquashConfig::load(None)?)?;
//! service.load_roots().await?;
//! let project = service.expand(&NodeId::project(1)).await?;
//! ```
//!
//! ## Service (`service`)
//!
//! Facade exposing `load_roots`, `expand`, `get`, `health_check`,
//! `circuit_status`, `token_status` and `replace_token`.

pub mod api;
pub mod breaker;
pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod models;
pub mod service;
pub mod token;
pub mod transport;
pub mod tree;

// Re-export commonly used types
pub use api::{PageSizes, SquashApi, LISTING_FIELDS};
pub use breaker::{BreakerConfig, CircuitBreaker, CircuitStatus};
pub use client::{RequestOptions, ResilientHttpClient};
pub use config::SquashConfig;
pub use error::{Result, SquashError};
pub use fallback::FallbackDataSource;
pub use models::{Folder, Page, PageRequest, Project, TestCase};
pub use service::{ConnectionStatus, SquashService};
pub use token::{Token, TokenLifecycle, TokenStatus};
pub use tooling::async_utils::retry::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use tree::{HierarchicalTreeLoader, NodeId, NodeKind, TreeNode};
