//! Install/update reconciliation between registry hits and installed plugins.

use std::fmt;

use semver::Version;

use super::slug::{base_slug, Slug};
use super::types::{ExternalPlugin, PluginWithDetails};

/// What the UI should offer for a registry hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginAction {
    /// Not installed on this workflow
    Install { slug: String },
    /// Installed, but the registry has a strictly newer version
    Update {
        plugin_id: String,
        /// Versioned slug passed to the update API
        slug: String,
        version: String,
    },
    /// Installed and current; shown as a disabled badge
    Installed,
}

impl PluginAction {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, PluginAction::Installed)
    }
}

impl fmt::Display for PluginAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginAction::Install { .. } => write!(f, "Install"),
            PluginAction::Update { version, .. } => write!(f, "Update to v{}", version),
            PluginAction::Installed => write!(f, "Installed"),
        }
    }
}

/// Strict semver comparison: both versions must parse, and remote must be newer.
///
/// A leading `v` or `=` is accepted, so `v2.0.0` reads as `2.0.0`.
pub fn should_offer_update(remote_version: &str, installed_version: &str) -> bool {
    match (parse_version(remote_version), parse_version(installed_version)) {
        (Some(remote), Some(installed)) => remote > installed,
        _ => false,
    }
}

fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix('=')
        .or_else(|| trimmed.strip_prefix('v'))
        .unwrap_or(trimmed);
    Version::parse(bare.trim_start()).ok()
}

/// Find the installed counterpart of a registry hit.
///
/// Matching is by plugin name only, so two authors publishing the same
/// name will cross-match.
pub fn find_installed<'a>(
    plugin: &ExternalPlugin,
    installed: &'a [PluginWithDetails],
) -> Option<&'a PluginWithDetails> {
    installed.iter().find(|p| p.name == plugin.name)
}

/// `@author/name:version` for the update API, replacing any version already
/// present. Unparseable slugs are passed through with the version appended.
fn versioned_slug(slug: &str, version: &str) -> String {
    match Slug::parse(slug) {
        Ok(parsed) => parsed.with_version(version),
        Err(_) => format!("{}:{}", base_slug(slug), version),
    }
}

/// Decide the action for one registry hit.
pub fn reconcile(plugin: &ExternalPlugin, installed: &[PluginWithDetails]) -> PluginAction {
    let Some(existing) = find_installed(plugin, installed) else {
        return PluginAction::Install {
            slug: plugin.slug.clone(),
        };
    };

    if should_offer_update(&plugin.version, &existing.version) {
        PluginAction::Update {
            plugin_id: existing.id.clone(),
            slug: versioned_slug(&plugin.slug, &plugin.version),
            version: plugin.version.clone(),
        }
    } else {
        PluginAction::Installed
    }
}
