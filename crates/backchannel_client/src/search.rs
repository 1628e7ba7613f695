//! Search screen session: cache lookup, single-flight search, visible answer.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::client::{ClientError, QueryClient};
use crate::messages::{SearchResponse, SearchResult};

/// Answer text shown when a search fails.
pub const SEARCH_FAILURE_MESSAGE: &str =
    "> ERROR: CONNECTION TERMINATED\n> REBOOT SEQUENCE INITIATED";

/// Number of recent queries kept in the history strip.
pub const HISTORY_LEN: usize = 5;

/// What a call to [`SearchScreen::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank input, nothing sent.
    Ignored,
    Cached(SearchResponse),
    Fetched(SearchResponse),
    /// The answer now shows `message`.
    Failed { message: String },
    /// A newer submission (or an explicit cancel) replaced this one. Nothing changed.
    Superseded,
}

#[derive(Debug, Default)]
struct SearchView {
    cache: ResponseCache,
    answer: String,
    results: Vec<SearchResult>,
    history: VecDeque<String>,
    deep_analysis: bool,
    loading: Option<u64>,
}

impl SearchView {
    fn show(&mut self, response: &SearchResponse) {
        self.answer = response.answer.clone();
        self.results = response.search_results.clone();
    }

    fn remember(&mut self, query: &str) {
        self.history.push_front(query.to_string());
        self.history.truncate(HISTORY_LEN);
    }
}

/// State owned by one search screen.
#[derive(Debug)]
pub struct SearchScreen {
    client: QueryClient,
    state: Mutex<SearchView>,
}

impl SearchScreen {
    pub fn new(client: QueryClient) -> Self {
        Self::with_cache(client, ResponseCache::new())
    }

    pub fn with_cache(client: QueryClient, cache: ResponseCache) -> Self {
        Self {
            client,
            state: Mutex::new(SearchView {
                cache,
                ..SearchView::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchView> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `query` from the cache or the search endpoint.
    ///
    /// The state lock is held while the request context begins and again while
    /// the result is applied, so a superseded search never touches the view.
    pub async fn submit(&self, query: &str) -> SearchOutcome {
        if query.trim().is_empty() {
            return SearchOutcome::Ignored;
        }

        let (ctx, deep_analysis) = {
            let mut state = self.lock();
            if let Some(hit) = state.cache.get(query).cloned() {
                debug!(query, "search cache hit");
                self.client.cancel_active();
                state.loading = None;
                state.show(&hit);
                return SearchOutcome::Cached(hit);
            }
            let ctx = self.client.begin();
            state.loading = Some(ctx.id());
            (ctx, state.deep_analysis)
        };

        let result = self.client.search_in(&ctx, query, deep_analysis).await;

        let mut state = self.lock();
        if ctx.is_cancelled() {
            debug!(request = ctx.id(), "search superseded");
            return SearchOutcome::Superseded;
        }
        state.loading = None;
        match result {
            Ok(response) => {
                state.show(&response);
                state.remember(query);
                state.cache.put(query, response.clone());
                SearchOutcome::Fetched(response)
            }
            Err(ClientError::Cancelled) => SearchOutcome::Superseded,
            Err(ClientError::Network(e)) => {
                warn!(query, error = %e, "search failed");
                state.answer = SEARCH_FAILURE_MESSAGE.to_string();
                state.results.clear();
                SearchOutcome::Failed {
                    message: SEARCH_FAILURE_MESSAGE.to_string(),
                }
            }
        }
    }

    /// Abandon the in-flight search, if any.
    pub fn cancel(&self) {
        let mut state = self.lock();
        self.client.cancel_active();
        state.loading = None;
    }

    pub fn set_deep_analysis(&self, enabled: bool) {
        self.lock().deep_analysis = enabled;
    }

    pub fn deep_analysis(&self) -> bool {
        self.lock().deep_analysis
    }

    pub fn answer(&self) -> String {
        self.lock().answer.clone()
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.lock().results.clone()
    }

    /// Recent successful queries, newest first.
    pub fn history(&self) -> Vec<String> {
        self.lock().history.iter().cloned().collect()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading.is_some()
    }

    pub fn cached(&self, query: &str) -> Option<SearchResponse> {
        self.lock().cache.get(query).cloned()
    }
}
