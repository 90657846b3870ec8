//! CLI commands for Tensorify.
//!
//! Drives the search engine and the plugin services from a terminal:
//! one-shot and interactive search, and per-workflow plugin management.

pub mod plugins;
pub mod search;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::Config;
use crate::core::types::NodeItem;
use crate::services::catalog::load_categories;
use crate::services::{HttpRegistry, HttpWorkflowBackend, PluginSession};

#[derive(Parser)]
#[command(name = "tensorify")]
#[command(about = "Search nodes and manage plugins for Tensorify workflows", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use the local development registry
    #[arg(long, global = true)]
    pub dev: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search built-in nodes, installed plugins and the registry
    Search {
        /// Search query
        query: String,

        /// Workflow whose installed plugins are included
        #[arg(long, short)]
        workflow: Option<String>,

        /// Skip the registry
        #[arg(long)]
        local_only: bool,
    },

    /// Read queries from stdin as if typed into the canvas search box
    Interactive {
        /// Workflow whose installed plugins are included
        #[arg(long, short)]
        workflow: Option<String>,
    },

    /// Manage plugins installed on a workflow
    Plugins {
        #[command(subcommand)]
        what: PluginCommands,
    },
}

#[derive(Subcommand)]
pub enum PluginCommands {
    /// List installed plugins
    List {
        #[arg(long, short)]
        workflow: String,
    },

    /// Install a plugin by slug (@author/name)
    Install {
        #[arg(long, short)]
        workflow: String,

        slug: String,
    },

    /// Update an installed plugin to the registry's latest version
    Update {
        #[arg(long, short)]
        workflow: String,

        /// Plugin name as shown in the registry
        name: String,
    },
}

/// Shared clients and data for a CLI invocation.
pub struct Context {
    pub config: Config,
    pub registry: Arc<HttpRegistry>,
    pub backend: Arc<HttpWorkflowBackend>,
    pub categories: Vec<NodeItem>,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let registry =
            Arc::new(HttpRegistry::from_config(&config).context("Failed to create registry client")?);
        let backend = Arc::new(
            HttpWorkflowBackend::from_config(&config).context("Failed to create backend client")?,
        );
        let categories = load_categories(config.catalog_path().as_deref());

        Ok(Self {
            config,
            registry,
            backend,
            categories,
        })
    }

    pub fn session(&self, workflow_id: &str) -> PluginSession {
        PluginSession::new(workflow_id, self.backend.clone(), self.registry.clone())
    }
}

/// Run the parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load();
    if cli.dev {
        config.registry.environment = crate::config::Environment::Development;
    }
    tracing::debug!(registry = config.registry.base_url(), "Configuration loaded");

    let ctx = Context::new(config)?;

    match cli.command {
        Commands::Search {
            query,
            workflow,
            local_only,
        } => search::run_search(&ctx, &query, workflow.as_deref(), local_only).await,
        Commands::Interactive { workflow } => {
            search::run_interactive(&ctx, workflow.as_deref()).await
        }
        Commands::Plugins { what } => match what {
            PluginCommands::List { workflow } => plugins::list(&ctx, &workflow).await,
            PluginCommands::Install { workflow, slug } => {
                plugins::install(&ctx, &workflow, &slug).await
            }
            PluginCommands::Update { workflow, name } => {
                plugins::update(&ctx, &workflow, &name).await
            }
        },
    }
}
