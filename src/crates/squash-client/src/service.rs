//! Facade wiring the access layer together.
//!
//! One token holder, one breaker and one HTTP client per service, shared by
//! the typed API and the tree loader.

use crate::api::SquashApi;
use crate::breaker::{CircuitBreaker, CircuitStatus};
use crate::client::{RequestOptions, ResilientHttpClient};
use crate::config::SquashConfig;
use crate::error::{Result, SquashError};
use crate::fallback::FallbackDataSource;
use crate::token::{Token, TokenLifecycle, TokenStatus};
use crate::transport::{ReqwestTransport, Transport};
use crate::tree::{Forest, HierarchicalTreeLoader, NodeId, TreeNode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Coarse connectivity for status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    TokenExpired,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::TokenExpired => "token expired",
        };
        f.write_str(text)
    }
}

pub struct SquashService {
    client: Arc<ResilientHttpClient>,
    api: Arc<SquashApi>,
    tree: HierarchicalTreeLoader,
}

impl SquashService {
    /// Service over the real network.
    pub fn from_config(config: &SquashConfig) -> Result<Self> {
        let transport = ReqwestTransport::new().map_err(|e| SquashError::Config(e.to_string()))?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: &SquashConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let tokens = Arc::new(TokenLifecycle::new(config.require_token()?));
        let breaker = Arc::new(CircuitBreaker::new(config.breaker));

        let client = ResilientHttpClient::new(config.base_url.trim(), tokens, transport)
            .with_retry_policy(config.retry)
            .with_breaker(breaker)
            .with_request_timeout(config.request_timeout)
            .with_health_timeout(config.health_timeout);

        let mut api = SquashApi::new(Arc::new(client)).with_page_sizes(config.page_sizes);
        if config.fallback_enabled {
            api = api.with_fallback(FallbackDataSource::sample());
        }

        info!(
            base_url = %config.base_url,
            fallback = config.fallback_enabled,
            "SquashTM service configured"
        );
        Ok(Self::new(Arc::new(api)))
    }

    pub fn new(api: Arc<SquashApi>) -> Self {
        Self {
            client: api.client().clone(),
            tree: HierarchicalTreeLoader::new(api.clone()),
            api,
        }
    }

    pub fn api(&self) -> &SquashApi {
        &self.api
    }

    pub fn tree(&self) -> &HierarchicalTreeLoader {
        &self.tree
    }

    pub async fn load_roots(&self) -> Result<Forest> {
        self.tree.load_roots().await
    }

    pub async fn expand(&self, id: &NodeId) -> Result<Arc<TreeNode>> {
        self.tree.expand(id).await
    }

    pub fn collapse(&self, id: &NodeId) -> Result<Arc<TreeNode>> {
        self.tree.collapse(id)
    }

    pub fn snapshot(&self) -> Forest {
        self.tree.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Forest> {
        self.tree.subscribe()
    }

    /// Raw GET through the resilient client, with fallback when enabled.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<T> {
        self.api.fetch(endpoint, options).await
    }

    pub async fn health_check(&self) -> bool {
        self.client.health_check().await
    }

    pub fn circuit_status(&self) -> CircuitStatus {
        self.client.circuit_status()
    }

    pub fn token_status(&self) -> Option<TokenStatus> {
        self.client.token_status()
    }

    pub fn replace_token(&self, token: impl Into<Token>) {
        self.client.replace_token(token);
    }

    /// Token expiry is checked locally first; the network is only contacted
    /// when the token is still usable.
    pub async fn connection_status(&self) -> ConnectionStatus {
        if self.client.tokens().is_expired() {
            return ConnectionStatus::TokenExpired;
        }
        if self.health_check().await {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}
