//! Plugin state for the workflow open on the canvas.

use std::sync::Arc;

use super::installed::InstalledPlugins;
use super::installer::{Notice, PluginInstaller};
use super::registry::PluginRegistry;
use super::workflow::WorkflowBackend;
use crate::core::reconcile::PluginAction;
use crate::core::types::PluginWithDetails;

/// Installed plugins plus install/update actions for one workflow.
///
/// A successful mutation invalidates the installed list and refetches it,
/// so the next reconciliation sees the new versions.
pub struct PluginSession {
    workflow_id: String,
    installed: InstalledPlugins,
    installer: PluginInstaller,
}

impl PluginSession {
    pub fn new(
        workflow_id: &str,
        backend: Arc<dyn WorkflowBackend>,
        registry: Arc<dyn PluginRegistry>,
    ) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            installed: InstalledPlugins::new(backend.clone(), registry),
            installer: PluginInstaller::new(backend),
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn installer(&self) -> &PluginInstaller {
        &self.installer
    }

    /// Point the session at another workflow; its list is fetched on next read.
    pub fn switch_workflow(&mut self, workflow_id: &str) {
        if self.workflow_id != workflow_id {
            tracing::debug!(from = %self.workflow_id, to = workflow_id, "Switching workflow");
            self.workflow_id = workflow_id.to_string();
            self.installed.invalidate();
        }
    }

    /// Installed plugins, or an empty list if the backend is unreachable.
    pub async fn installed(&mut self) -> Vec<PluginWithDetails> {
        match self.installed.list(&self.workflow_id).await {
            Ok(plugins) => plugins,
            Err(e) => {
                tracing::warn!(workflow_id = %self.workflow_id, "Failed to load installed plugins: {}", e);
                Vec::new()
            }
        }
    }

    /// Carry out a reconciled action. `Installed` is a no-op.
    pub async fn apply(&mut self, action: &PluginAction) -> Option<Notice> {
        let notice = match action {
            PluginAction::Install { slug } => self.installer.install(&self.workflow_id, slug).await,
            PluginAction::Update {
                plugin_id, slug, ..
            } => {
                self.installer
                    .update(&self.workflow_id, plugin_id, slug)
                    .await
            }
            PluginAction::Installed => return None,
        };

        if notice.is_success() {
            self.installed.invalidate();
            if let Err(e) = self.installed.refresh(&self.workflow_id).await {
                tracing::warn!(workflow_id = %self.workflow_id, "Refetch after mutation failed: {}", e);
            }
        }
        Some(notice)
    }
}
