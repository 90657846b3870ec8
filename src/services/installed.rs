//! Installed plugins for a workflow, enriched with registry details.
//!
//! The backend only knows ids and slugs. Each plugin is looked up in the
//! registry to recover its description and category; lookups run
//! concurrently and each one falls back to slug-derived defaults on its
//! own, so one failing lookup never hides the rest of the list.

use futures::future::join_all;
use std::sync::Arc;

use super::registry::PluginRegistry;
use super::workflow::WorkflowBackend;
use crate::core::slug::{base_slug, Slug};
use crate::core::types::{InstalledPlugin, PluginWithDetails, DEFAULT_PLUGIN_TYPE};
use crate::error::TensorifyResult;

/// Details recoverable from the slug alone.
fn fallback_details(plugin: InstalledPlugin) -> PluginWithDetails {
    let parsed = Slug::parse(&plugin.slug).ok();
    let (name, author_name, version) = match parsed {
        Some(slug) => (slug.name, slug.author, slug.version.unwrap_or_default()),
        None => (plugin.slug.clone(), String::new(), String::new()),
    };

    PluginWithDetails {
        id: plugin.id,
        slug: plugin.slug,
        created_at: plugin.created_at,
        updated_at: plugin.updated_at,
        name,
        description: None,
        author_name,
        version,
        plugin_type: DEFAULT_PLUGIN_TYPE.to_string(),
    }
}

/// Enrich one installed plugin, never failing.
pub async fn enrich(registry: &dyn PluginRegistry, plugin: InstalledPlugin) -> PluginWithDetails {
    let wanted = base_slug(&plugin.slug);
    let mut details = fallback_details(plugin);

    let hits = match registry.search(&details.name).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!(slug = %details.slug, "Plugin lookup failed, using defaults: {}", e);
            return details;
        }
    };

    let Some(hit) = hits.into_iter().find(|h| base_slug(&h.slug) == wanted) else {
        tracing::debug!(slug = %details.slug, "Plugin not found in registry");
        return details;
    };

    details.name = hit.name;
    details.description = Some(hit.description).filter(|d| !d.is_empty());
    if !hit.author_name.is_empty() {
        details.author_name = hit.author_name;
    }
    // The slug pins the installed version; the registry only knows the latest
    if details.version.is_empty() {
        details.version = hit.version;
    }
    details.plugin_type = hit.plugin_type;
    details
}

/// Enrich all plugins concurrently.
pub async fn enrich_all(
    registry: &dyn PluginRegistry,
    plugins: Vec<InstalledPlugin>,
) -> Vec<PluginWithDetails> {
    join_all(plugins.into_iter().map(|p| enrich(registry, p))).await
}

/// Cached enriched list for one workflow.
#[derive(Debug, Default)]
pub struct InstalledCache {
    workflow_id: Option<String>,
    entries: Option<Vec<PluginWithDetails>>,
}

impl InstalledCache {
    pub fn get(&self, workflow_id: &str) -> Option<&[PluginWithDetails]> {
        if self.workflow_id.as_deref() != Some(workflow_id) {
            return None;
        }
        self.entries.as_deref()
    }

    pub fn store(&mut self, workflow_id: &str, entries: Vec<PluginWithDetails>) {
        self.workflow_id = Some(workflow_id.to_string());
        self.entries = Some(entries);
    }

    /// Force the next read to refetch.
    pub fn invalidate(&mut self) {
        self.entries = None;
    }
}

/// Fetches, enriches and caches installed plugins.
pub struct InstalledPlugins {
    backend: Arc<dyn WorkflowBackend>,
    registry: Arc<dyn PluginRegistry>,
    cache: InstalledCache,
}

impl InstalledPlugins {
    pub fn new(backend: Arc<dyn WorkflowBackend>, registry: Arc<dyn PluginRegistry>) -> Self {
        Self {
            backend,
            registry,
            cache: InstalledCache::default(),
        }
    }

    /// Cached list for the workflow, fetching it first if needed.
    pub async fn list(&mut self, workflow_id: &str) -> TensorifyResult<Vec<PluginWithDetails>> {
        if let Some(entries) = self.cache.get(workflow_id) {
            return Ok(entries.to_vec());
        }
        self.refresh(workflow_id).await
    }

    /// Refetch from the backend regardless of the cache.
    pub async fn refresh(&mut self, workflow_id: &str) -> TensorifyResult<Vec<PluginWithDetails>> {
        let plugins = self.backend.list_plugins(workflow_id).await?;
        let enriched = enrich_all(self.registry.as_ref(), plugins).await;
        tracing::debug!(workflow_id, count = enriched.len(), "Installed plugins loaded");
        self.cache.store(workflow_id, enriched.clone());
        Ok(enriched)
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{external, installed, FakeBackend, FakeRegistry};

    #[tokio::test]
    async fn test_enrich_from_registry() {
        let registry = FakeRegistry::with_results(vec![external(
            "Attention",
            "@tensorify/attention",
            "2.1.0",
        )]);
        let details = enrich(&registry, installed("i1", "@tensorify/attention:2.0.0")).await;

        assert_eq!(details.name, "Attention");
        assert_eq!(details.description.as_deref(), Some("Attention plugin"));
        assert_eq!(details.plugin_type, "model_layer");
        // Installed version comes from the slug, not the registry
        assert_eq!(details.version, "2.0.0");
    }

    #[tokio::test]
    async fn test_enrich_failure_falls_back() {
        let registry = FakeRegistry::failing("registry down");
        let details = enrich(&registry, installed("i1", "@alice/conv-block:1.2.0")).await;

        assert_eq!(details.name, "conv-block");
        assert_eq!(details.author_name, "alice");
        assert_eq!(details.version, "1.2.0");
        assert_eq!(details.description, None);
        assert_eq!(details.plugin_type, DEFAULT_PLUGIN_TYPE);
    }

    #[tokio::test]
    async fn test_enrich_all_fails_independently() {
        let registry = FakeRegistry::with_results(vec![external(
            "Attention",
            "@tensorify/attention",
            "2.1.0",
        )])
        .fail_on("broken");

        let enriched = enrich_all(
            &registry,
            vec![
                installed("i1", "@tensorify/attention:2.0.0"),
                installed("i2", "@bob/broken:0.1.0"),
            ],
        )
        .await;

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].plugin_type, "model_layer");
        assert_eq!(enriched[1].plugin_type, DEFAULT_PLUGIN_TYPE);
        assert_eq!(enriched[1].name, "broken");
    }

    #[tokio::test]
    async fn test_list_is_cached_until_invalidated() {
        let backend = Arc::new(FakeBackend::with_installed(vec![installed(
            "i1",
            "@tensorify/attention:2.0.0",
        )]));
        let registry = Arc::new(FakeRegistry::default());
        let mut plugins = InstalledPlugins::new(backend.clone(), registry);

        plugins.list("wf").await.unwrap();
        plugins.list("wf").await.unwrap();
        assert_eq!(backend.list_calls(), 1);

        plugins.invalidate();
        plugins.list("wf").await.unwrap();
        assert_eq!(backend.list_calls(), 2);

        // Another workflow is a cache miss
        plugins.list("other").await.unwrap();
        assert_eq!(backend.list_calls(), 3);
    }
}
