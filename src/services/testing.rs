//! In-memory registry and backend fakes for service tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::registry::PluginRegistry;
use super::workflow::WorkflowBackend;
use crate::core::slug::Slug;
use crate::core::types::{ExternalPlugin, InstalledPlugin};
use crate::error::{TensorifyError, TensorifyResult};

pub fn external(name: &str, slug: &str, version: &str) -> ExternalPlugin {
    let author = Slug::parse(slug).map(|s| s.author).unwrap_or_default();
    ExternalPlugin {
        id: format!("reg-{}", slug),
        name: name.to_string(),
        description: format!("{} plugin", name),
        slug: slug.to_string(),
        author_name: author,
        tags: Vec::new(),
        plugin_type: "model_layer".to_string(),
        version: version.to_string(),
    }
}

pub fn installed(id: &str, slug: &str) -> InstalledPlugin {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    InstalledPlugin {
        id: id.to_string(),
        slug: slug.to_string(),
        created_at: at,
        updated_at: at,
    }
}

#[derive(Default)]
pub struct FakeRegistry {
    results: Vec<ExternalPlugin>,
    /// Answer every query with a single plugin named after it
    echo: bool,
    fail_all: Option<String>,
    fail_on: Option<String>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeRegistry {
    pub fn with_results(results: Vec<ExternalPlugin>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Fail queries containing `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginRegistry for FakeRegistry {
    async fn search(&self, query: &str) -> TensorifyResult<Vec<ExternalPlugin>> {
        self.calls.lock().unwrap().push(query.to_string());

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }

        let failure = self.fail_all.clone().or_else(|| {
            self.fail_on
                .as_ref()
                .filter(|needle| query.contains(needle.as_str()))
                .map(|_| format!("lookup for '{}' failed", query))
        });
        if let Some(message) = failure {
            return Err(TensorifyError::Registry {
                status: 500,
                message,
            });
        }

        if self.echo {
            return Ok(vec![external(query, &format!("@echo/{}", query), "1.0.0")]);
        }
        Ok(self.results.clone())
    }
}

#[derive(Default)]
pub struct FakeBackend {
    installed: Mutex<Vec<InstalledPlugin>>,
    install_error: Option<String>,
    delay: Option<Duration>,
    list_calls: AtomicUsize,
    mutations: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn with_installed(installed: Vec<InstalledPlugin>) -> Self {
        Self {
            installed: Mutex::new(installed),
            ..Self::default()
        }
    }

    pub fn failing_installs(mut self, message: &str) -> Self {
        self.install_error = Some(message.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// `install <slug>` / `update <id> <slug>` in call order.
    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    async fn mutate(&self, record: String) -> TensorifyResult<()> {
        self.mutations.lock().unwrap().push(record);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.install_error {
            Some(message) => Err(TensorifyError::Backend {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkflowBackend for FakeBackend {
    async fn list_plugins(&self, _workflow_id: &str) -> TensorifyResult<Vec<InstalledPlugin>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.installed.lock().unwrap().clone())
    }

    async fn install_plugin(&self, _workflow_id: &str, slug: &str) -> TensorifyResult<()> {
        self.mutate(format!("install {}", slug)).await?;
        let id = format!("i{}", self.installed.lock().unwrap().len() + 1);
        self.installed.lock().unwrap().push(installed(&id, slug));
        Ok(())
    }

    async fn update_plugin(
        &self,
        _workflow_id: &str,
        plugin_id: &str,
        slug: &str,
    ) -> TensorifyResult<()> {
        self.mutate(format!("update {} {}", plugin_id, slug)).await?;
        for plugin in self.installed.lock().unwrap().iter_mut() {
            if plugin.id == plugin_id {
                plugin.slug = slug.to_string();
            }
        }
        Ok(())
    }
}
