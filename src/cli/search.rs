//! `tensorify search` and `tensorify interactive`.

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Context;
use crate::core::search::{
    merge_results, rank_external, search_local_with_limit, LocalMatches, ReconciledPlugin,
};
use crate::core::state::SearchState;
use crate::core::types::{ExternalPlugin, NodeItem, PluginWithDetails};
use crate::services::catalog::build_local_tree;
use crate::services::{PluginRegistry, SearchController};

/// Installed plugins and the tree they produce, for an optional workflow.
async fn load_tree(ctx: &Context, workflow: Option<&str>) -> (Vec<PluginWithDetails>, Vec<NodeItem>) {
    let installed = match workflow {
        Some(id) => ctx.session(id).installed().await,
        None => Vec::new(),
    };
    let tree = build_local_tree(&ctx.categories, &installed);
    (installed, tree)
}

/// One-shot search: local tree plus a single registry request.
pub async fn run_search(
    ctx: &Context,
    query: &str,
    workflow: Option<&str>,
    local_only: bool,
) -> Result<()> {
    let settings = &ctx.config.search;
    let (installed, tree) = load_tree(ctx, workflow).await;
    let local = search_local_with_limit(query, &tree, settings.max_parent_matches);

    let query = query.trim();
    let external = if local_only || query.chars().count() < settings.min_query_length {
        Vec::new()
    } else {
        fetch_external(ctx, query).await
    };

    let merged = merge_results(query, local, &external, &installed);
    print_local(&merged.local);
    print_external(&merged.external);
    Ok(())
}

async fn fetch_external(ctx: &Context, query: &str) -> Vec<ExternalPlugin> {
    let settings = &ctx.config.search;
    match tokio::time::timeout(settings.request_timeout(), ctx.registry.search(query)).await {
        Ok(Ok(mut hits)) => {
            hits.truncate(settings.max_external_results);
            hits
        }
        Ok(Err(e)) => {
            print_registry_error(&e.to_string());
            Vec::new()
        }
        Err(_) => {
            print_registry_error(&format!(
                "Request timed out after {}s",
                settings.request_timeout_secs
            ));
            Vec::new()
        }
    }
}

/// Each stdin line replaces the query, like a keystroke in the search box.
pub async fn run_interactive(ctx: &Context, workflow: Option<&str>) -> Result<()> {
    let (installed, tree) = load_tree(ctx, workflow).await;
    let mut controller = SearchController::new(ctx.registry.clone(), ctx.config.search.clone());
    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_printed: Option<(u64, bool)> = None;

    println!(
        "{}",
        style("Type a query and press enter. Ctrl-D to quit.").dim()
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                print_local(&search_local_with_limit(&line, &tree, ctx.config.search.max_parent_matches));
                controller.on_input(&line);
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                let key = (state.generation, state.has_searched);
                if last_printed != Some(key) || state.is_searching_external {
                    print_state(&state, &installed);
                    last_printed = Some(key);
                }
            }
        }
    }

    controller.clear();
    Ok(())
}

fn print_state(state: &SearchState, installed: &[PluginWithDetails]) {
    if state.is_searching_external {
        println!("{}", style("Searching registry...").dim());
        return;
    }
    if !state.has_searched {
        return;
    }
    match &state.error {
        Some(error) => print_registry_error(error),
        None => print_external(&rank_external(&state.query, &state.results, installed)),
    }
}

fn print_registry_error(error: &str) {
    println!(
        "{} {} {}",
        style("!").yellow().bold(),
        style(format!("Registry search failed: {}", error)).yellow(),
        style("(search again to retry)").dim()
    );
}

pub fn print_local(local: &LocalMatches) {
    if local.is_empty() {
        println!("{}", style("No local matches").dim());
        return;
    }

    for group in &local.children_matches {
        println!("{}", style(&group.category.title).cyan().bold());
        for child in &group.children {
            println!(
                "  {} {} {}",
                style(&child.item.title).bold(),
                style(format!("{:.0}", child.score)).dim(),
                style(child.match_details.join("; ")).dim()
            );
        }
    }

    if !local.parent_matches.is_empty() {
        println!("{}", style("Categories").cyan().bold());
        for parent in &local.parent_matches {
            println!("  {}", parent.item.title);
        }
    }
}

pub fn print_external(external: &[ReconciledPlugin]) {
    if external.is_empty() {
        return;
    }

    println!("{}", style("Registry").cyan().bold());
    for hit in external {
        let action = if hit.action.is_actionable() {
            style(hit.action.to_string()).green()
        } else {
            style(hit.action.to_string()).dim()
        };
        println!(
            "  {} {} {} [{}]",
            style(&hit.plugin.name).bold(),
            style(format!("v{}", hit.plugin.version)).dim(),
            style(&hit.plugin.slug).dim(),
            action
        );
        if !hit.plugin.description.is_empty() {
            println!("    {}", hit.plugin.description);
        }
    }
}
