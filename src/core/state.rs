//! Reducer-style state machines for search and plugin mutations.
//!
//! `SearchState` is only ever changed through [`SearchState::apply`]. Every
//! query change bumps a generation counter; asynchronous events carry the
//! generation they were started for and are dropped when it is stale, so a
//! slow response can never overwrite the results of a newer query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::types::ExternalPlugin;

/// External search state for the canvas search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// A search is debouncing or in flight
    pub is_searching: bool,
    /// The delayed "searching registry" indicator is visible
    pub is_searching_external: bool,
    pub has_searched: bool,
    pub query: String,
    pub results: Vec<ExternalPlugin>,
    pub error: Option<String>,
    pub generation: u64,
}

/// Events that drive [`SearchState`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The user typed; `searchable` is false when the query is too short.
    QueryChanged { query: String, searchable: bool },
    /// Loading has lasted long enough to show the external indicator
    ExternalPending { generation: u64 },
    Resolved {
        generation: u64,
        results: Vec<ExternalPlugin>,
    },
    Failed { generation: u64, message: String },
    Reset,
}

impl SearchState {
    /// Apply an event. Returns whether the state changed.
    pub fn apply(&mut self, event: SearchEvent) -> bool {
        match event {
            SearchEvent::QueryChanged { query, searchable } => {
                self.generation += 1;
                self.query = query;
                self.is_searching = searchable;
                self.is_searching_external = false;
                self.error = None;
                if !searchable {
                    self.has_searched = false;
                    self.results.clear();
                }
                true
            }
            SearchEvent::ExternalPending { generation } => {
                if !self.is_current(generation) || !self.is_searching {
                    return false;
                }
                self.is_searching_external = true;
                true
            }
            SearchEvent::Resolved {
                generation,
                results,
            } => {
                if !self.is_current(generation) {
                    return false;
                }
                self.is_searching = false;
                self.is_searching_external = false;
                self.has_searched = true;
                self.results = results;
                self.error = None;
                true
            }
            SearchEvent::Failed {
                generation,
                message,
            } => {
                if !self.is_current(generation) {
                    return false;
                }
                self.is_searching = false;
                self.is_searching_external = false;
                self.has_searched = true;
                self.results.clear();
                self.error = Some(message);
                true
            }
            SearchEvent::Reset => {
                let generation = self.generation + 1;
                *self = Self {
                    generation,
                    ..Self::default()
                };
                true
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

/// Kind of mutation running for a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Install,
    Update,
}

/// Per-plugin mutation status as shown by the install/update control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Installing,
    Updating,
}

/// Set of plugin ids with an install or update in flight.
///
/// Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<Mutex<HashMap<String, MutationKind>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MutationKind>> {
        // A poisoned set is still structurally valid
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark `id` as busy. Returns `None` if it already is.
    ///
    /// The id is released when the returned guard drops, whatever the
    /// outcome of the operation.
    pub fn begin(&self, id: &str, kind: MutationKind) -> Option<InFlightGuard> {
        let mut set = self.lock();
        if set.contains_key(id) {
            return None;
        }
        set.insert(id.to_string(), kind);
        Some(InFlightGuard {
            owner: self.clone(),
            id: id.to_string(),
        })
    }

    pub fn status(&self, id: &str) -> MutationStatus {
        match self.lock().get(id) {
            None => MutationStatus::Idle,
            Some(MutationKind::Install) => MutationStatus::Installing,
            Some(MutationKind::Update) => MutationStatus::Updating,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases its plugin id from the [`InFlight`] set on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    owner: InFlight,
    id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.id);
    }
}
