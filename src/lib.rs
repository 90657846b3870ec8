//! Tensorify - node search and plugin reconciliation for the canvas.
//!
//! Every keystroke in the canvas search box runs a lexical ranking over the
//! local category tree (built-in nodes plus installed plugins) and, after a
//! debounce, a registry search. Registry hits are merged in and annotated
//! with an Install / Update / Installed action by semantic version.
//!
//! # Architecture
//!
//! - [`core`] - Synchronous engine: terms, scoring, aggregation, reconciliation, state
//! - [`services`] - Registry and backend clients, enrichment, installs, debounced search
//! - [`config`] - Configuration loading and environment overrides
//! - [`cli`] - Command line front end
//!
//! # Example
//!
//! ```
//! use tensorify::core::search::search_local;
//! use tensorify::services::catalog::builtin_categories;
//!
//! let tree = builtin_categories();
//! let matches = search_local("lnear", &tree);
//! assert_eq!(matches.children_matches[0].children[0].item.id, "linear");
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod services;

mod error;

pub use config::Config;
pub use error::{TensorifyError, TensorifyResult};
