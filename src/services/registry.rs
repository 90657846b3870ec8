//! Plugin registry client.
//!
//! Only the public search endpoint is consumed:
//! `GET {base}/api/plugins/search?q=<query>` -> `{ "plugins": [...] }`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::core::types::ExternalPlugin;
use crate::error::{TensorifyError, TensorifyResult};

/// Anything that can answer a plugin search.
#[async_trait]
pub trait PluginRegistry: Send + Sync {
    async fn search(&self, query: &str) -> TensorifyResult<Vec<ExternalPlugin>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    plugins: Vec<ExternalPlugin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

/// HTTP client for the registry.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> TensorifyResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> TensorifyResult<Self> {
        Self::new(config.registry.base_url(), config.search.request_timeout())
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/api/plugins/search?q={}",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl PluginRegistry for HttpRegistry {
    async fn search(&self, query: &str) -> TensorifyResult<Vec<ExternalPlugin>> {
        let url = self.search_url(query);
        tracing::debug!(%url, "Searching registry");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            return Err(TensorifyError::Registry {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        tracing::debug!(count = body.plugins.len(), "Registry search returned");
        Ok(body.plugins)
    }
}
