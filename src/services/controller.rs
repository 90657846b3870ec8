//! Debounced, cancellable registry search driven by keystrokes.
//!
//! Each keystroke cancels whatever is pending and restarts the debounce
//! timer, so only the trailing query of a typing burst reaches the
//! registry. A slow request flips the "searching external" flag only after
//! a short delay, and every result is tagged with the generation of the
//! query that started it so late responses are dropped by the reducer.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::registry::PluginRegistry;
use crate::config::SearchConfig;
use crate::core::state::{SearchEvent, SearchState};
use crate::error::TensorifyError;

pub struct SearchController {
    registry: Arc<dyn PluginRegistry>,
    settings: SearchConfig,
    state: Arc<watch::Sender<SearchState>>,
    pending: Option<CancellationToken>,
}

impl SearchController {
    pub fn new(registry: Arc<dyn PluginRegistry>, settings: SearchConfig) -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self {
            registry,
            settings,
            state: Arc::new(tx),
            pending: None,
        }
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Handle a new value of the search box. Must run inside a Tokio runtime.
    pub fn on_input(&mut self, query: &str) {
        self.cancel_pending();

        let query = query.trim().to_string();
        let searchable = query.chars().count() >= self.settings.min_query_length;

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.apply(SearchEvent::QueryChanged {
                query: query.clone(),
                searchable,
            });
            generation = s.generation;
        });

        if !searchable {
            return;
        }

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        tokio::spawn(run_search(
            self.registry.clone(),
            self.state.clone(),
            self.settings.clone(),
            query,
            generation,
            token,
        ));
    }

    /// Abort any pending search and return to the idle state.
    pub fn clear(&mut self) {
        self.cancel_pending();
        self.state.send_modify(|s| {
            s.apply(SearchEvent::Reset);
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn run_search(
    registry: Arc<dyn PluginRegistry>,
    state: Arc<watch::Sender<SearchState>>,
    settings: SearchConfig,
    query: String,
    generation: u64,
    token: CancellationToken,
) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(settings.debounce()) => {}
    }

    tracing::debug!(%query, generation, "Starting external search");

    let fetch = tokio::time::timeout(settings.request_timeout(), registry.search(&query));
    tokio::pin!(fetch);
    let indicator = tokio::time::sleep(settings.indicator_delay());
    tokio::pin!(indicator);
    let mut indicator_shown = false;

    let outcome = loop {
        tokio::select! {
            _ = token.cancelled() => break Err(TensorifyError::Aborted),
            result = &mut fetch => {
                break result.unwrap_or(Err(TensorifyError::Timeout(settings.request_timeout_secs)));
            }
            _ = &mut indicator, if !indicator_shown => {
                indicator_shown = true;
                state.send_if_modified(|s| s.apply(SearchEvent::ExternalPending { generation }));
            }
        }
    };

    let event = match outcome {
        Ok(mut plugins) => {
            plugins.truncate(settings.max_external_results);
            SearchEvent::Resolved {
                generation,
                results: plugins,
            }
        }
        Err(TensorifyError::Aborted) => {
            tracing::debug!(%query, "External search aborted");
            SearchEvent::Failed {
                generation,
                message: TensorifyError::Aborted.to_string(),
            }
        }
        Err(e) => {
            tracing::warn!(%query, "External search failed: {}", e);
            SearchEvent::Failed {
                generation,
                message: e.to_string(),
            }
        }
    };

    state.send_if_modified(|s| s.apply(event));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{external, FakeRegistry};
    use std::time::Duration;
    use tokio::time::sleep;

    fn controller(registry: Arc<FakeRegistry>) -> SearchController {
        SearchController::new(registry, SearchConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_triggers_one_search() {
        let registry = Arc::new(FakeRegistry::echo());
        let mut search = controller(registry.clone());

        for query in ["l", "li", "lin", "line"] {
            search.on_input(query);
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_secs(1)).await;

        assert_eq!(registry.calls(), vec!["line"]);
        let state = search.state();
        assert!(state.has_searched);
        assert_eq!(state.results[0].name, "line");
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_never_searches() {
        let registry = Arc::new(FakeRegistry::echo());
        let mut search = controller(registry.clone());

        search.on_input(" a ");
        sleep(Duration::from_secs(1)).await;

        assert!(registry.calls().is_empty());
        assert!(!search.state().is_searching);
        assert!(!search.state().has_searched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_searching_flags() {
        let registry =
            Arc::new(FakeRegistry::echo().delay("attention", Duration::from_millis(800)));
        let mut search = controller(registry);

        search.on_input("attention");
        assert!(search.state().is_searching);

        // Debounce elapsed, request running but indicator still hidden
        sleep(Duration::from_millis(500)).await;
        assert!(search.state().is_searching);
        assert!(!search.state().is_searching_external);

        sleep(Duration::from_millis(200)).await;
        assert!(search.state().is_searching_external);

        sleep(Duration::from_secs(1)).await;
        let state = search.state();
        assert!(!state.is_searching);
        assert!(!state.is_searching_external);
        assert_eq!(state.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_response_never_shows_indicator() {
        let registry = Arc::new(FakeRegistry::echo().delay("relu", Duration::from_millis(50)));
        let mut search = controller(registry);
        let mut updates = search.subscribe();

        search.on_input("relu");
        let mut saw_indicator = false;
        while !updates.borrow().has_searched {
            updates.changed().await.unwrap();
            saw_indicator |= updates.borrow().is_searching_external;
        }
        assert!(!saw_indicator);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_error() {
        let registry = Arc::new(FakeRegistry::echo().delay("slow", Duration::from_secs(30)));
        let mut search = controller(registry);

        search.on_input("slow");
        sleep(Duration::from_secs(11)).await;

        let state = search.state();
        assert!(state.has_searched);
        assert!(!state.is_searching);
        assert!(state.results.is_empty());
        assert_eq!(state.error.as_deref(), Some("Request timed out after 10s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_error_becomes_error_state() {
        let registry = Arc::new(FakeRegistry::failing("boom"));
        let mut search = controller(registry);

        search.on_input("attention");
        sleep(Duration::from_secs(1)).await;

        let state = search.state();
        assert!(state.has_searched);
        assert_eq!(state.error.as_deref(), Some("Registry error (500): boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_request_never_overwrites() {
        let registry = Arc::new(FakeRegistry::echo().delay("lin", Duration::from_secs(2)));
        let mut search = controller(registry.clone());

        search.on_input("lin");
        // "lin" is now in flight
        sleep(Duration::from_millis(500)).await;
        search.on_input("line");
        sleep(Duration::from_secs(1)).await;
        assert_eq!(search.state().results[0].name, "line");

        sleep(Duration::from_secs(3)).await;
        let state = search.state();
        assert_eq!(state.query, "line");
        assert_eq!(state.results[0].name, "line");
        assert_eq!(state.error, None);
        assert_eq!(registry.calls(), vec!["lin", "line"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_truncated() {
        let hits = (0..15)
            .map(|i| external(&format!("Plugin {}", i), &format!("@a/p{}", i), "1.0.0"))
            .collect();
        let registry = Arc::new(FakeRegistry::with_results(hits));
        let mut search = controller(registry);

        search.on_input("plugin");
        sleep(Duration::from_secs(1)).await;
        assert_eq!(search.state().results.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_pending() {
        let registry = Arc::new(FakeRegistry::echo());
        let mut search = controller(registry.clone());

        search.on_input("attention");
        sleep(Duration::from_millis(100)).await;
        search.clear();
        sleep(Duration::from_secs(1)).await;

        assert!(registry.calls().is_empty());
        assert_eq!(search.state().query, "");
        assert!(!search.state().is_searching);
    }
}
