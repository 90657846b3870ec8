//! Core engine - synchronous search and reconciliation logic.
//!
//! Nothing in here performs I/O:
//! - Term normalization and lexical scoring
//! - Local tree search, smart filtering and result merging
//! - Install/update reconciliation by semantic version
//! - Search and mutation state machines

pub mod reconcile;
pub mod scoring;
pub mod search;
pub mod slug;
pub mod state;
pub mod terms;
pub mod types;

pub use reconcile::{reconcile, should_offer_update, PluginAction};
pub use scoring::{score, MatchOutcome};
pub use search::{
    merge_results, search_local, smart_filter, CategoryMatch, LocalMatches, MergedResults,
    ReconciledPlugin,
};
pub use slug::Slug;
pub use state::{InFlight, InFlightGuard, MutationKind, MutationStatus, SearchEvent, SearchState};
pub use terms::split_terms;
pub use types::{ExternalPlugin, InstalledPlugin, NodeItem, PluginWithDetails, ScoredNodeItem};
