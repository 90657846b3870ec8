//! Built-in node catalog and the local tree shown on the canvas.
//!
//! Extra categories can be supplied in a TOML file:
//!
//! ```toml
//! [[categories]]
//! id = "custom"
//! title = "Custom Nodes"
//!
//! [[categories.children]]
//! id = "my_block"
//! title = "My Block"
//! description = "Team specific building block"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::core::types::{NodeItem, PluginWithDetails, DEFAULT_PLUGIN_TYPE};
use crate::error::TensorifyResult;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: Vec<NodeItem>,
}

/// Categories and nodes that ship with the canvas.
pub fn builtin_categories() -> Vec<NodeItem> {
    vec![
        NodeItem::category(
            "model_layer",
            "Model Layers",
            "Trainable building blocks for network architectures",
            vec![
                NodeItem::leaf("linear", "Linear Layer", "Fully connected projection with in_features and out_features"),
                NodeItem::leaf("conv2d", "Conv2d", "Two dimensional convolution over image channels"),
                NodeItem::leaf("conv1d", "Conv1d", "One dimensional convolution over sequences"),
                NodeItem::leaf("lstm", "LSTM", "Long short-term memory recurrent block"),
                NodeItem::leaf("embedding", "Embedding", "Lookup table mapping token ids to dense vectors"),
                NodeItem::leaf("batchnorm", "Batch Normalization", "Normalizes activations across the batch"),
                NodeItem::leaf("dropout", "Dropout", "Randomly zeroes elements for regularization"),
                NodeItem::leaf("maxpool2d", "MaxPool2d", "Spatial max pooling"),
            ],
        ),
        NodeItem::category(
            "activation",
            "Activations",
            "Element-wise non-linearities",
            vec![
                NodeItem::leaf("relu", "ReLU", "Rectified linear unit"),
                NodeItem::leaf("gelu", "GELU", "Gaussian error linear unit"),
                NodeItem::leaf("sigmoid", "Sigmoid", "Squashes values into zero to one"),
                NodeItem::leaf("softmax", "Softmax", "Normalizes logits into probabilities"),
            ],
        ),
        NodeItem::category(
            "dataset",
            "Datasets",
            "Sources of training and evaluation samples",
            vec![
                NodeItem::leaf("mnist", "MNIST", "Handwritten digit images"),
                NodeItem::leaf("cifar10", "CIFAR-10", "Small labelled color images in ten classes"),
                NodeItem::leaf("csv_dataset", "CSV Dataset", "Tabular samples loaded from a CSV file"),
            ],
        ),
        NodeItem::category(
            "dataloader",
            "Dataloaders",
            "Batching, shuffling and parallel loading",
            vec![NodeItem::leaf("dataloader", "DataLoader", "Batches and shuffles a dataset")],
        ),
        NodeItem::category(
            "optimizer",
            "Optimizers",
            "Parameter update rules",
            vec![
                NodeItem::leaf("adam", "Adam", "Adaptive moment estimation optimizer"),
                NodeItem::leaf("sgd", "SGD", "Stochastic gradient descent with momentum"),
                NodeItem::leaf("adamw", "AdamW", "Adam with decoupled weight decay"),
            ],
        ),
        NodeItem::category(
            "loss_function",
            "Loss Functions",
            "Training objectives",
            vec![
                NodeItem::leaf("cross_entropy", "Cross Entropy Loss", "Classification loss over logits"),
                NodeItem::leaf("mse", "MSE Loss", "Mean squared error for regression"),
            ],
        ),
        NodeItem::category(
            "trainer",
            "Trainers",
            "Training and evaluation loops",
            vec![NodeItem::leaf("trainer", "Trainer", "Runs epochs of training with validation")],
        ),
        NodeItem::category(
            DEFAULT_PLUGIN_TYPE,
            "Miscellaneous",
            "Everything else",
            vec![NodeItem::leaf("custom_code", "Custom Code", "Inline Python snippet")],
        ),
    ]
}

/// Read extra categories from a TOML file.
pub fn load_catalog_file(path: &Path) -> TensorifyResult<Vec<NodeItem>> {
    let content = fs::read_to_string(path)?;
    let file: CatalogFile = toml::from_str(&content)?;
    Ok(file.categories)
}

/// Built-ins, plus extras from `path` when given.
///
/// Extra categories with an existing id extend that category.
pub fn load_categories(path: Option<&Path>) -> Vec<NodeItem> {
    let mut categories = builtin_categories();
    let Some(path) = path else {
        return categories;
    };

    match load_catalog_file(path) {
        Ok(extra) => {
            for category in extra {
                merge_category(&mut categories, category);
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring catalog file: {}", e);
        }
    }
    categories
}

fn merge_category(categories: &mut Vec<NodeItem>, category: NodeItem) {
    match categories.iter_mut().find(|c| c.id == category.id) {
        Some(existing) => existing.children.extend(category.children),
        None => categories.push(category),
    }
}

/// Leaf representing an installed plugin.
fn plugin_leaf(plugin: &PluginWithDetails) -> NodeItem {
    NodeItem {
        id: plugin.slug.clone(),
        title: plugin.name.clone(),
        description: plugin.description.clone().unwrap_or_default(),
        version: Some(plugin.version.clone()).filter(|v| !v.is_empty()),
        draggable: true,
        children: Vec::new(),
    }
}

/// The searchable tree: built-in categories with installed plugins placed
/// under the category named by their plugin type.
pub fn build_local_tree(
    builtins: &[NodeItem],
    installed: &[PluginWithDetails],
) -> Vec<NodeItem> {
    let mut tree = builtins.to_vec();

    for plugin in installed {
        let leaf = plugin_leaf(plugin);
        let target = if tree.iter().any(|c| c.id == plugin.plugin_type) {
            plugin.plugin_type.as_str()
        } else {
            DEFAULT_PLUGIN_TYPE
        };

        match tree.iter_mut().find(|c| c.id == target) {
            Some(category) => category.children.push(leaf),
            None => tree.push(NodeItem::category(
                DEFAULT_PLUGIN_TYPE,
                "Miscellaneous",
                "",
                vec![leaf],
            )),
        }
    }

    // Categories without children are not categories
    tree.retain(|c| c.is_category());
    tree
}
