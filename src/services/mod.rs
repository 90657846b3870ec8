//! Services around the core engine: registry and backend clients,
//! installed-plugin enrichment, installs, the debounced search driver and
//! the built-in node catalog.

pub mod catalog;
pub mod controller;
pub mod installed;
pub mod installer;
pub mod registry;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::SearchController;
pub use installer::{Notice, NoticeLevel, PluginInstaller};
pub use registry::{HttpRegistry, PluginRegistry};
pub use session::PluginSession;
pub use workflow::{HttpWorkflowBackend, WorkflowBackend};
