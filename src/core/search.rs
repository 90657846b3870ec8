//! Result aggregation over the local category tree and registry hits.
//!
//! Local search scores every category and every leaf, keeps AND-gate
//! survivors, prunes weak matches relative to the best one and regroups
//! leaves under their parent category. Registry hits are deduplicated,
//! ranked with the same scorer and annotated with an install/update action.

use std::collections::HashSet;

use super::reconcile::{reconcile, PluginAction};
use super::scoring::{score, MatchOutcome};
use super::slug::base_slug;
use super::terms::split_terms;
use super::types::{ExternalPlugin, NodeItem, PluginWithDetails, ScoredNodeItem};

/// Best score at or above which weak matches get pruned.
pub const HIGH_QUALITY_THRESHOLD: f64 = 80.0;

/// Matches below this share of the best score are pruned.
pub const RELATIVE_CUTOFF: f64 = 0.6;

/// Default cap on category matches.
pub const MAX_PARENT_MATCHES: usize = 10;

/// Leaves grouped under the category they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    /// The parent category, without its children
    pub category: NodeItem,
    pub children: Vec<ScoredNodeItem>,
}

/// Output of a local search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalMatches {
    pub children_matches: Vec<CategoryMatch>,
    pub parent_matches: Vec<ScoredNodeItem>,
}

impl LocalMatches {
    pub fn is_empty(&self) -> bool {
        self.children_matches.is_empty() && self.parent_matches.is_empty()
    }

    /// Number of leaf matches across all categories.
    pub fn leaf_count(&self) -> usize {
        self.children_matches.iter().map(|c| c.children.len()).sum()
    }
}

/// A registry hit with its relevance and the action offered for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledPlugin {
    pub plugin: ExternalPlugin,
    pub score: f64,
    pub match_details: Vec<String>,
    pub action: PluginAction,
}

/// Everything the canvas renders for a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedResults {
    pub local: LocalMatches,
    pub external: Vec<ReconciledPlugin>,
}

/// A scored candidate before regrouping.
#[derive(Debug, Clone)]
enum Candidate {
    Parent(ScoredNodeItem),
    Child {
        parent_index: usize,
        item: ScoredNodeItem,
    },
}

impl Candidate {
    fn score(&self) -> f64 {
        match self {
            Candidate::Parent(item) => item.score,
            Candidate::Child { item, .. } => item.score,
        }
    }
}

fn scored(item: &NodeItem, outcome: MatchOutcome) -> ScoredNodeItem {
    ScoredNodeItem {
        item: item.shallow(),
        score: outcome.score,
        match_details: outcome.match_details,
    }
}

/// Prune items far below the best one.
///
/// Only applies when the best score clears [`HIGH_QUALITY_THRESHOLD`] and
/// there is more than one item; otherwise everything is kept.
pub fn smart_filter<T>(items: Vec<T>, score_of: impl Fn(&T) -> f64) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }
    let max_score = items.iter().map(&score_of).fold(0.0, f64::max);
    if max_score < HIGH_QUALITY_THRESHOLD {
        return items;
    }
    let cutoff = max_score * RELATIVE_CUTOFF;
    items.into_iter().filter(|i| score_of(i) >= cutoff).collect()
}

/// Search the local tree with the default category cap.
pub fn search_local(query: &str, tree: &[NodeItem]) -> LocalMatches {
    search_local_with_limit(query, tree, MAX_PARENT_MATCHES)
}

/// Search the local tree, keeping at most `max_parents` category matches.
pub fn search_local_with_limit(query: &str, tree: &[NodeItem], max_parents: usize) -> LocalMatches {
    if query.trim().is_empty() {
        return LocalMatches {
            children_matches: Vec::new(),
            parent_matches: tree.iter().cloned().map(ScoredNodeItem::unscored).collect(),
        };
    }

    let terms = split_terms(query);
    let mut candidates = Vec::new();

    for (parent_index, category) in tree.iter().enumerate() {
        let outcome = score(&category.title, &category.description, query, &terms);
        if outcome.is_match() {
            candidates.push(Candidate::Parent(scored(category, outcome)));
        }

        for child in &category.children {
            let outcome = score(&child.title, &child.description, query, &terms);
            if outcome.is_match() {
                candidates.push(Candidate::Child {
                    parent_index,
                    item: scored(child, outcome),
                });
            }
        }
    }

    let mut candidates = smart_filter(candidates, Candidate::score);
    // Stable: ties keep tree order
    candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));

    let mut parent_matches = Vec::new();
    let mut children_matches: Vec<CategoryMatch> = Vec::new();
    let mut group_of_parent: Vec<Option<usize>> = vec![None; tree.len()];

    for candidate in candidates {
        match candidate {
            Candidate::Parent(item) => parent_matches.push(item),
            Candidate::Child { parent_index, item } => match group_of_parent[parent_index] {
                Some(group) => children_matches[group].children.push(item),
                None => {
                    group_of_parent[parent_index] = Some(children_matches.len());
                    children_matches.push(CategoryMatch {
                        category: tree[parent_index].shallow(),
                        children: vec![item],
                    });
                }
            },
        }
    }

    parent_matches.truncate(max_parents);

    LocalMatches {
        children_matches,
        parent_matches,
    }
}

/// Rank, deduplicate and annotate registry hits.
///
/// Hits are deduplicated by base slug (first one wins) and ordered by
/// lexical score. Hits that fail the AND-gate are kept after the ones that
/// pass, since the registry may have matched on fields not searched here.
pub fn rank_external(
    query: &str,
    plugins: &[ExternalPlugin],
    installed: &[PluginWithDetails],
) -> Vec<ReconciledPlugin> {
    let terms = split_terms(query);
    let mut seen = HashSet::new();

    let mut ranked: Vec<ReconciledPlugin> = plugins
        .iter()
        .filter(|p| seen.insert(base_slug(&p.slug)))
        .map(|plugin| {
            let searchable = format!(
                "{} {} {}",
                plugin.description,
                plugin.tags.join(" "),
                plugin.author_name
            );
            let outcome = score(&plugin.name, &searchable, query, &terms);
            ReconciledPlugin {
                plugin: plugin.clone(),
                score: outcome.score,
                match_details: outcome.match_details,
                action: reconcile(plugin, installed),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Combine local matches with ranked registry hits.
///
/// Registry hits come back in the order of [`rank_external`], not in the
/// order the registry returned them.
pub fn merge_results(
    query: &str,
    local: LocalMatches,
    external: &[ExternalPlugin],
    installed: &[PluginWithDetails],
) -> MergedResults {
    MergedResults {
        local,
        external: rank_external(query, external, installed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tree() -> Vec<NodeItem> {
        vec![
            NodeItem::category(
                "model_layer",
                "Model Layers",
                "Building blocks for architectures",
                vec![
                    NodeItem::leaf("linear", "Linear Layer", "in_features out_features"),
                    NodeItem::leaf("conv2d", "Conv2d", "Two dimensional convolution"),
                    NodeItem::leaf("dropout", "Dropout", "Randomly zeroes activations"),
                ],
            ),
            NodeItem::category(
                "optimizer",
                "Optimizers",
                "Parameter update rules",
                vec![
                    NodeItem::leaf("adam", "Adam", "Adaptive moment estimation optimizer"),
                    NodeItem::leaf("sgd", "SGD", "Stochastic gradient descent with momentum"),
                ],
            ),
        ]
    }

    fn plugin(name: &str, slug: &str, description: &str, version: &str) -> ExternalPlugin {
        ExternalPlugin {
            id: slug.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            slug: slug.to_string(),
            author_name: "tensorify".to_string(),
            tags: Vec::new(),
            plugin_type: "model_layer".to_string(),
            version: version.to_string(),
        }
    }

    #[test]
    fn test_empty_query_returns_tree_unchanged() {
        let tree = tree();
        let result = search_local("  ", &tree);
        assert!(result.children_matches.is_empty());
        assert_eq!(result.parent_matches.len(), 2);
        assert_eq!(result.parent_matches[0].item, tree[0]);
        assert_eq!(result.parent_matches[0].score, 0.0);
    }

    #[test]
    fn test_leaf_match_grouped_under_parent() {
        let result = search_local("linear", &tree());
        assert_eq!(result.children_matches.len(), 1);
        let group = &result.children_matches[0];
        assert_eq!(group.category.id, "model_layer");
        assert!(group.category.children.is_empty());
        assert_eq!(group.children[0].item.id, "linear");
        assert!(group.children[0].score >= 20.0);
    }

    #[test]
    fn test_and_gate_excludes_partial_matches() {
        let result = search_local("linear convolution", &tree());
        assert_eq!(result.leaf_count(), 0);
    }

    #[test]
    fn test_category_matches() {
        let result = search_local("optimizers", &tree());
        assert_eq!(result.parent_matches.len(), 1);
        assert_eq!(result.parent_matches[0].item.id, "optimizer");
    }

    #[test]
    fn test_parent_matches_truncated() {
        let categories: Vec<NodeItem> = (0..15)
            .map(|i| {
                NodeItem::category(
                    &format!("cat{}", i),
                    &format!("Pooling {}", i),
                    "",
                    vec![NodeItem::leaf(&format!("leaf{}", i), "Other", "")],
                )
            })
            .collect();
        let result = search_local("pooling", &categories);
        assert_eq!(result.parent_matches.len(), MAX_PARENT_MATCHES);

        let result = search_local_with_limit("pooling", &categories, 3);
        assert_eq!(result.parent_matches.len(), 3);
    }

    #[test]
    fn test_smart_filter_prunes_relative_to_best() {
        let kept = smart_filter(vec![100.0, 90.0, 50.0, 10.0], |s| *s);
        assert_eq!(kept, vec![100.0, 90.0]);
    }

    #[test]
    fn test_smart_filter_keeps_all_below_threshold() {
        let kept = smart_filter(vec![79.0, 20.0, 5.0], |s| *s);
        assert_eq!(kept, vec![79.0, 20.0, 5.0]);
    }

    #[test]
    fn test_smart_filter_single_item() {
        assert_eq!(smart_filter(vec![120.0], |s| *s), vec![120.0]);
    }

    #[test]
    fn test_results_sorted_by_score() {
        let tree = vec![NodeItem::category(
            "activation",
            "Activations",
            "",
            vec![
                NodeItem::leaf("gelu", "GELU", "Smooth relu variant"),
                NodeItem::leaf("relu", "ReLU", "Rectified linear unit"),
            ],
        )];
        let result = search_local("relu", &tree);
        let ids: Vec<_> = result.children_matches[0]
            .children
            .iter()
            .map(|c| c.item.id.as_str())
            .collect();
        assert_eq!(ids, vec!["relu", "gelu"]);
    }

    #[test]
    fn test_rank_external_dedupes_by_base_slug() {
        let hits = vec![
            plugin("Attention", "@tensorify/attention", "attention block", "2.1.0"),
            plugin("Attention", "@tensorify/attention:2.0.0", "attention block", "2.0.0"),
            plugin("Cross Attention", "@bob/cross-attention", "cross attention", "1.0.0"),
        ];
        let ranked = rank_external("attention", &hits, &[]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].plugin.slug, "@tensorify/attention");
    }

    #[test]
    fn test_rank_external_keeps_gate_failures_last() {
        let hits = vec![
            plugin("Tagged Only", "@a/tagged", "nothing relevant", "1.0.0"),
            plugin("Attention", "@a/attention", "", "1.0.0"),
        ];
        let ranked = rank_external("attention", &hits, &[]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].plugin.name, "Attention");
        assert_eq!(ranked[1].score, 0.0);
    }

    #[test]
    fn test_merge_reorders_registry_hits_by_relevance() {
        let hits = vec![
            plugin("Pooling", "@a/pooling", "attention pooling", "1.0.0"),
            plugin("Attention", "@a/attention", "", "1.0.0"),
        ];
        let merged = merge_results("attention", LocalMatches::default(), &hits, &[]);
        let names: Vec<_> = merged.external.iter().map(|h| h.plugin.name.as_str()).collect();
        assert_eq!(names, vec!["Attention", "Pooling"]);
    }

    #[test]
    fn test_merge_annotates_actions() {
        let now = Utc::now();
        let installed = vec![PluginWithDetails {
            id: "wf-1".into(),
            slug: "@tensorify/attention:2.0.0".into(),
            created_at: now,
            updated_at: now,
            name: "Attention".into(),
            description: None,
            author_name: "tensorify".into(),
            version: "2.0.0".into(),
            plugin_type: "model_layer".into(),
        }];
        let hits = vec![plugin("Attention", "@tensorify/attention", "", "2.1.0")];
        let local = search_local("attention", &tree());
        let merged = merge_results("attention", local, &hits, &installed);
        assert_eq!(merged.external[0].action.to_string(), "Update to v2.1.0");
    }
}
