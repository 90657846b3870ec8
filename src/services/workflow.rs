//! Workflow backend client: installed plugins for a workflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::registry::ErrorBody;
use crate::config::Config;
use crate::core::types::InstalledPlugin;
use crate::error::{TensorifyError, TensorifyResult};

/// Plugin endpoints of the workflow backend.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    async fn list_plugins(&self, workflow_id: &str) -> TensorifyResult<Vec<InstalledPlugin>>;

    async fn install_plugin(&self, workflow_id: &str, slug: &str) -> TensorifyResult<()>;

    /// `slug` is the versioned form `@author/name:version`.
    async fn update_plugin(
        &self,
        workflow_id: &str,
        plugin_id: &str,
        slug: &str,
    ) -> TensorifyResult<()>;
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<InstalledPlugin>,
}

#[derive(Debug, Serialize)]
struct SlugBody<'a> {
    slug: &'a str,
}

/// HTTP implementation against the workflow API.
#[derive(Debug, Clone)]
pub struct HttpWorkflowBackend {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpWorkflowBackend {
    pub fn new(base_url: &str, token: Option<String>) -> TensorifyResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> TensorifyResult<Self> {
        Self::new(&config.backend.url, config.backend.token.clone())
    }

    pub fn plugins_url(&self, workflow_id: &str) -> String {
        format!(
            "{}/workflows/{}/plugins",
            self.base_url,
            urlencoding::encode(workflow_id)
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> TensorifyResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.to_string());
        Err(TensorifyError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl WorkflowBackend for HttpWorkflowBackend {
    async fn list_plugins(&self, workflow_id: &str) -> TensorifyResult<Vec<InstalledPlugin>> {
        let url = self.plugins_url(workflow_id);
        tracing::debug!(%url, "Listing installed plugins");

        let response = self.authorized(self.client.get(&url)).send().await?;
        let body: ListResponse = Self::check(response).await?.json().await?;
        Ok(body.data)
    }

    async fn install_plugin(&self, workflow_id: &str, slug: &str) -> TensorifyResult<()> {
        let url = self.plugins_url(workflow_id);
        tracing::debug!(%url, slug, "Installing plugin");

        let response = self
            .authorized(self.client.post(&url).json(&SlugBody { slug }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_plugin(
        &self,
        workflow_id: &str,
        plugin_id: &str,
        slug: &str,
    ) -> TensorifyResult<()> {
        let url = format!(
            "{}/{}",
            self.plugins_url(workflow_id),
            urlencoding::encode(plugin_id)
        );
        tracing::debug!(%url, slug, "Updating plugin");

        let response = self
            .authorized(self.client.put(&url).json(&SlugBody { slug }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugins_url() {
        let backend = HttpWorkflowBackend::new("https://api.example.com/v1/", None).unwrap();
        assert_eq!(
            backend.plugins_url("wf 1"),
            "https://api.example.com/v1/workflows/wf%201/plugins"
        );
    }

    #[test]
    fn test_list_response_parses() {
        let body = r#"{"data":[{"id":"i1","slug":"@a/b:1.0.0","createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-02T10:00:00Z"}]}"#;
        let parsed: ListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].slug, "@a/b:1.0.0");
    }

    #[test]
    fn test_slug_body_serializes() {
        let json = serde_json::to_string(&SlugBody { slug: "@a/b:2.0.0" }).unwrap();
        assert_eq!(json, r#"{"slug":"@a/b:2.0.0"}"#);
    }
}
