//! Data model shared by the search engine and the plugin services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate entry in the local category tree.
///
/// Categories carry a non-empty `children` list; leaves are concrete
/// built-in nodes or installed plugins. Nesting is one level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub draggable: bool,
    #[serde(default)]
    pub children: Vec<NodeItem>,
}

impl NodeItem {
    /// Create a draggable leaf node.
    pub fn leaf(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            version: None,
            draggable: true,
            children: Vec::new(),
        }
    }

    /// Create a category holding the given leaves.
    pub fn category(id: &str, title: &str, description: &str, children: Vec<NodeItem>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            version: None,
            draggable: false,
            children,
        }
    }

    pub fn is_category(&self) -> bool {
        !self.children.is_empty()
    }

    /// Copy of this item without its children.
    pub fn shallow(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

/// A node annotated with its relevance for the current query.
///
/// A score of 0 means the node was excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredNodeItem {
    #[serde(flatten)]
    pub item: NodeItem,
    pub score: f64,
    /// Up to three human-readable reasons for the match
    pub match_details: Vec<String>,
}

impl ScoredNodeItem {
    pub fn unscored(item: NodeItem) -> Self {
        Self {
            item,
            score: 0.0,
            match_details: Vec::new(),
        }
    }
}

/// A plugin returned by the registry search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPlugin {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `@author/name`, globally unique
    pub slug: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Category id on the canvas
    #[serde(default = "default_plugin_type")]
    pub plugin_type: String,
    pub version: String,
}

/// A plugin installed on a workflow, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPlugin {
    pub id: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An installed plugin enriched with registry details.
///
/// Enrichment is best-effort; see [`crate::services::installed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginWithDetails {
    pub id: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub author_name: String,
    pub version: String,
    pub plugin_type: String,
}

pub const DEFAULT_PLUGIN_TYPE: &str = "miscellaneous";

pub(crate) fn default_plugin_type() -> String {
    DEFAULT_PLUGIN_TYPE.to_string()
}
