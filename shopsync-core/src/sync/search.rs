//! Debounced food search.
//!
//! Each keystroke restarts a quiet-period timer; only a query that survives
//! the whole period reaches the server. Results are published on a watch
//! channel, and a generation counter keeps a slow response for an older
//! query from overwriting a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::Food;
use crate::service::{RemoteError, RemoteListService};

/// Quiet period before a query is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Latest published search state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub query: String,
    pub foods: Vec<Food>,
    pub error: Option<RemoteError>,
}

pub struct FoodSearch {
    service: Arc<dyn RemoteListService>,
    quiet: Duration,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
    results: Arc<watch::Sender<SearchResults>>,
}

impl FoodSearch {
    pub fn new(service: Arc<dyn RemoteListService>) -> Self {
        Self::with_debounce(service, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(service: Arc<dyn RemoteListService>, quiet: Duration) -> Self {
        let (tx, _) = watch::channel(SearchResults::default());
        Self {
            service,
            quiet,
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
            results: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchResults> {
        self.results.subscribe()
    }

    pub fn current(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    /// Registers a keystroke. Must be called inside a tokio runtime.
    ///
    /// A blank query cancels any pending search and clears the results
    /// without a remote call.
    pub fn query(&mut self, text: &str) {
        self.cancel();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = text.trim().to_string();

        if query.is_empty() {
            self.results.send_replace(SearchResults::default());
            return;
        }

        let service = Arc::clone(&self.service);
        let current = Arc::clone(&self.generation);
        let results = Arc::clone(&self.results);
        let quiet = self.quiet;

        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            tracing::debug!(%query, "searching foods");
            let outcome = service.search_foods(&query).await;

            if current.load(Ordering::SeqCst) != generation {
                tracing::debug!(%query, "discarding stale search results");
                return;
            }
            let published = match outcome {
                Ok(foods) => SearchResults {
                    query,
                    foods,
                    error: None,
                },
                Err(error) => SearchResults {
                    query,
                    foods: Vec::new(),
                    error: Some(error),
                },
            };
            results.send_replace(published);
        }));
    }

    /// Drops the pending search, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for FoodSearch {
    fn drop(&mut self) {
        self.cancel();
    }
}
