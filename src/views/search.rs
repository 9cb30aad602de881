use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    dto::SearchResults,
    search::{SearchCoordinator, SearchState},
    states::AppState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSnapshot {
    pub query: String,
    pub results: SearchResults,
    pub loading: bool,
    pub error: Option<String>,
}

/// Search box over posts and users. Typing goes through the debounced
/// coordinator; the snapshot always reflects the latest query. Only users
/// whose username starts with the query (case-insensitive) are listed.
#[derive(Clone)]
pub struct SearchScreen {
    coordinator: Arc<SearchCoordinator>,
}

impl SearchScreen {
    pub(crate) fn new(app: &AppState) -> Self {
        Self {
            coordinator: Arc::new(SearchCoordinator::new(
                Arc::clone(&app.api),
                app.config.search_debounce,
            )),
        }
    }

    pub fn set_query(&self, text: &str) {
        self.coordinator.set_query(text);
    }

    pub fn clear(&self) {
        self.coordinator.clear();
    }

    pub fn state(&self) -> SearchState {
        self.coordinator.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.coordinator.subscribe()
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.coordinator.state();
        let query = state.query().unwrap_or_default().to_string();
        let mut results = state.results().cloned().unwrap_or_default();
        let prefix = query.to_lowercase();
        results
            .users
            .retain(|user| user.username.to_lowercase().starts_with(&prefix));
        SearchSnapshot {
            query,
            results,
            loading: state.is_loading(),
            error: state.error().map(str::to_string),
        }
    }
}
