//! `tensorify plugins` subcommands.

use anyhow::{bail, Context as _, Result};
use console::style;

use super::Context;
use crate::core::reconcile::{reconcile, PluginAction};
use crate::services::{Notice, NoticeLevel, PluginRegistry};

fn print_notice(notice: &Notice) {
    let marker = match notice.level {
        NoticeLevel::Success => style("✓").green().bold(),
        NoticeLevel::Warning => style("!").yellow().bold(),
        NoticeLevel::Error => style("✗").red().bold(),
    };
    println!("{} {}", marker, notice);
}

pub async fn list(ctx: &Context, workflow: &str) -> Result<()> {
    let installed = ctx.session(workflow).installed().await;

    if installed.is_empty() {
        println!("{}", style("No plugins installed").dim());
        return Ok(());
    }

    for plugin in &installed {
        println!(
            "{} {} {} {}",
            style(&plugin.name).bold(),
            style(format!("v{}", plugin.version)).dim(),
            style(&plugin.plugin_type).cyan(),
            style(&plugin.slug).dim()
        );
        if let Some(description) = &plugin.description {
            println!("  {}", description);
        }
    }
    Ok(())
}

pub async fn install(ctx: &Context, workflow: &str, slug: &str) -> Result<()> {
    let mut session = ctx.session(workflow);
    let action = PluginAction::Install {
        slug: slug.to_string(),
    };

    if let Some(notice) = session.apply(&action).await {
        print_notice(&notice);
        if !notice.is_success() {
            bail!("Install failed");
        }
    }
    Ok(())
}

pub async fn update(ctx: &Context, workflow: &str, name: &str) -> Result<()> {
    let mut session = ctx.session(workflow);
    let installed = session.installed().await;

    let hits = ctx
        .registry
        .search(name)
        .await
        .context("Failed to search registry")?;
    let Some(remote) = hits.iter().find(|p| p.name == name) else {
        bail!("No plugin named '{}' in the registry", name);
    };

    let action = reconcile(remote, &installed);
    match &action {
        PluginAction::Install { .. } => {
            bail!("'{}' is not installed on workflow {}", name, workflow)
        }
        PluginAction::Installed => {
            println!(
                "{} {} is up to date (v{})",
                style("✓").green().bold(),
                name,
                remote.version
            );
            Ok(())
        }
        PluginAction::Update { .. } => {
            println!("{} {}...", style("→").cyan(), action);
            if let Some(notice) = session.apply(&action).await {
                print_notice(&notice);
                if !notice.is_success() {
                    bail!("Update failed");
                }
            }
            Ok(())
        }
    }
}
