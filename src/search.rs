//! Debounced search.
//!
//! `Idle -> Pending -> Searching -> Settled | Failed`, re-entering `Pending`
//! on every input change. Each input change bumps a sequence number; a
//! timer or response that does not carry the latest number is dropped, so
//! the latest query always wins no matter how responses interleave.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{dto::SearchResults, remote::FeedService};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Pending {
        query: String,
    },
    Searching {
        query: String,
    },
    Settled {
        query: String,
        results: SearchResults,
    },
    Failed {
        query: String,
        message: String,
    },
}

impl SearchState {
    pub fn query(&self) -> Option<&str> {
        match self {
            SearchState::Idle => None,
            SearchState::Pending { query }
            | SearchState::Searching { query }
            | SearchState::Settled { query, .. }
            | SearchState::Failed { query, .. } => Some(query),
        }
    }

    pub fn results(&self) -> Option<&SearchResults> {
        match self {
            SearchState::Settled { results, .. } => Some(results),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SearchState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Pending { .. } | SearchState::Searching { .. })
    }
}

#[derive(Default)]
struct Inner {
    seq: u64,
    timer: Option<JoinHandle<()>>,
}

pub struct SearchCoordinator {
    api: Arc<dyn FeedService>,
    debounce: Duration,
    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<SearchState>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SearchCoordinator {
    pub fn new(api: Arc<dyn FeedService>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(SearchState::Idle);
        Self {
            api,
            debounce,
            inner: Arc::new(Mutex::new(Inner::default())),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Receives every state transition, for views that redraw on change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Feeds one input change. Must be called from within a tokio runtime.
    pub fn set_query(&self, text: &str) {
        let query = text.trim().to_string();
        let mut inner = lock(&self.inner);
        inner.seq += 1;
        let seq = inner.seq;

        // A timer still sleeping can simply be cancelled. Once a task has
        // moved to Searching it runs to completion and its answer is
        // discarded by the sequence check.
        if let Some(timer) = inner.timer.take() {
            if matches!(*self.state.borrow(), SearchState::Pending { .. }) {
                timer.abort();
            }
        }

        if query.is_empty() {
            self.state.send_replace(SearchState::Idle);
            return;
        }

        self.state.send_replace(SearchState::Pending {
            query: query.clone(),
        });
        inner.timer = Some(tokio::spawn(run_search(
            Arc::clone(&self.api),
            Arc::clone(&self.inner),
            Arc::clone(&self.state),
            self.debounce,
            seq,
            query,
        )));
    }

    pub fn clear(&self) {
        self.set_query("");
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.inner).timer.take() {
            timer.abort();
        }
    }
}

async fn run_search(
    api: Arc<dyn FeedService>,
    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<SearchState>>,
    debounce: Duration,
    seq: u64,
    query: String,
) {
    tokio::time::sleep(debounce).await;

    {
        let inner = lock(&inner);
        if inner.seq != seq {
            return;
        }
        state.send_replace(SearchState::Searching {
            query: query.clone(),
        });
    }

    debug!("Searching for {:?}", query);
    let outcome = api.search(&query).await;

    let inner = lock(&inner);
    if inner.seq != seq {
        debug!("Discarding stale results for {:?}", query);
        return;
    }
    let next = match outcome {
        Ok(results) => SearchState::Settled { query, results },
        Err(err) => SearchState::Failed {
            query,
            message: err.user_message(),
        },
    };
    state.send_replace(next);
}
