//! Install and update orchestration.
//!
//! Every mutation holds an [`InFlightGuard`] for its plugin, so the busy
//! flag clears on success, failure or cancellation alike. A second request
//! for a plugin that is already busy is refused rather than sent twice.
//! Errors never escape: callers get a [`Notice`] to show the user.

use std::fmt;
use std::sync::Arc;

use super::workflow::WorkflowBackend;
use crate::core::slug::base_slug;
use crate::core::state::{InFlight, MutationKind, MutationStatus};
use crate::error::TensorifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A user-facing toast message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.level == NoticeLevel::Success
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Runs install/update calls against the workflow backend.
///
/// In-flight tracking is keyed by base slug, so an install and an update
/// of the same plugin also exclude each other.
#[derive(Clone)]
pub struct PluginInstaller {
    backend: Arc<dyn WorkflowBackend>,
    in_flight: InFlight,
}

impl PluginInstaller {
    pub fn new(backend: Arc<dyn WorkflowBackend>) -> Self {
        Self {
            backend,
            in_flight: InFlight::new(),
        }
    }

    pub fn status(&self, slug: &str) -> MutationStatus {
        self.in_flight.status(&base_slug(slug))
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub async fn install(&self, workflow_id: &str, slug: &str) -> Notice {
        let key = base_slug(slug);
        let Some(_guard) = self.in_flight.begin(&key, MutationKind::Install) else {
            return busy_notice(&key);
        };

        match self.backend.install_plugin(workflow_id, slug).await {
            Ok(()) => {
                tracing::info!(workflow_id, slug, "Plugin installed");
                Notice::success(format!("Installed {}", slug))
            }
            Err(e) => {
                tracing::warn!(workflow_id, slug, "Install failed: {}", e);
                Notice::error(format!("Failed to install {}: {}", slug, failure_reason(&e)))
            }
        }
    }

    /// `slug` is the versioned target, `@author/name:version`.
    pub async fn update(&self, workflow_id: &str, plugin_id: &str, slug: &str) -> Notice {
        let key = base_slug(slug);
        let Some(_guard) = self.in_flight.begin(&key, MutationKind::Update) else {
            return busy_notice(&key);
        };

        match self.backend.update_plugin(workflow_id, plugin_id, slug).await {
            Ok(()) => {
                tracing::info!(workflow_id, plugin_id, slug, "Plugin updated");
                Notice::success(format!("Updated to {}", slug))
            }
            Err(e) => {
                tracing::warn!(workflow_id, plugin_id, slug, "Update failed: {}", e);
                Notice::error(format!("Failed to update {}: {}", key, failure_reason(&e)))
            }
        }
    }
}

fn busy_notice(key: &str) -> Notice {
    Notice::warning(TensorifyError::AlreadyInFlight(key.to_string()).to_string())
}

/// Prefer the backend's own message over the wrapped error text.
fn failure_reason(error: &TensorifyError) -> String {
    match error {
        TensorifyError::Backend { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
