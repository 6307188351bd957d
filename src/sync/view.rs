//! Per-view controller.
//!
//! Binds the pagination/filter state machine, the URL store, the debouncer,
//! and the orchestrator into one session. Navigation serves cached data
//! immediately and revalidates in the background; the superseded key's
//! in-flight fetch is abandoned so its late response cannot land.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::entry::CacheEntry;
use crate::cache::store::SharedCache;
use crate::config::ViewConfig;
use crate::model::UserPage;
use crate::query::debounce::Debouncer;
use crate::query::key::{QueryKey, StatusFilter};
use crate::query::state::ListState;
use crate::sync::orchestrator::FetchOrchestrator;
use crate::transport::FetchError;
use crate::url::UrlStore;

pub struct ViewController {
    state: ListState,
    debounce: Debouncer,
    /// The text currently shown in the search box. Echoes keystrokes with
    /// zero latency; `state.query()` lags it by the debounce window.
    search_input: String,
    current_key: QueryKey,
    cache: SharedCache,
    orchestrator: Arc<FetchOrchestrator>,
    url: Arc<dyn UrlStore>,
    background: Vec<JoinHandle<()>>,
}

impl ViewController {
    /// Open a view session.
    ///
    /// The persisted URL representation seeds the state machine before the
    /// first fetch is issued, so there is exactly one initial fetch, for the
    /// real parameters. The first fetch is awaited; a failure stays on the
    /// cache entry as the retry affordance.
    pub async fn open(
        cache: SharedCache,
        orchestrator: Arc<FetchOrchestrator>,
        url: Arc<dyn UrlStore>,
        config: &ViewConfig,
    ) -> Self {
        let state = ListState::seed(url.as_ref(), config.default_page_size);
        let current_key = state.query_key();

        info!(%current_key, "opening view session");

        // Write back the normalized form so a reload reproduces this state.
        state.write_url(url.as_ref());
        cache.write().await.watch(&current_key);

        let controller = Self {
            search_input: state.query().to_string(),
            debounce: Debouncer::new(Duration::from_millis(config.debounce_ms)),
            state,
            current_key: current_key.clone(),
            cache,
            orchestrator,
            url,
            background: Vec::new(),
        };

        let _ = controller.orchestrator.fetch(&current_key).await;
        controller
    }

    /// The cache entry the view is currently rendering.
    pub async fn entry(&self) -> Option<CacheEntry> {
        self.cache.read().await.entry_snapshot(&self.current_key)
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn key(&self) -> &QueryKey {
        &self.current_key
    }

    /// What the search box displays right now.
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub async fn set_page(&mut self, page_index: u32) {
        if self.state.set_page(page_index) {
            self.navigate().await;
        }
    }

    pub async fn set_page_size(&mut self, page_size: u32) {
        if self.state.set_page_size(page_size) {
            self.navigate().await;
        }
    }

    pub async fn set_status(&mut self, status: StatusFilter) {
        if self.state.set_status(status) {
            self.navigate().await;
        }
    }

    /// Record a keystroke in the search box. The echo is immediate; the
    /// query commit waits for the quiet period.
    pub fn search_input_changed(&mut self, text: &str, now: Instant) {
        self.search_input = text.to_string();
        self.debounce.input(text, now);
    }

    /// When the pending search value becomes eligible to fire.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Fire the debouncer if its quiet period has elapsed. Returns whether a
    /// query commit happened.
    pub async fn fire_debounce(&mut self, now: Instant) -> bool {
        let Some(query) = self.debounce.fire(now) else {
            return false;
        };
        if self.state.set_query(&query) {
            self.navigate().await;
        }
        true
    }

    /// Await the current key's fetch directly (retry affordance).
    pub async fn refresh(&self) -> Result<UserPage, FetchError> {
        self.orchestrator.fetch(&self.current_key).await
    }

    /// Await all background revalidations spawned so far.
    pub async fn settle(&mut self) {
        for handle in self.background.drain(..) {
            let _ = handle.await;
        }
    }

    /// End the session: drop the cache subscription and drain background work.
    pub async fn close(mut self) {
        self.settle().await;
        self.cache.write().await.unwatch(&self.current_key);
    }

    /// Shared transition tail: persist the new state, move the cache
    /// subscription, abandon the superseded fetch, revalidate in background.
    async fn navigate(&mut self) {
        let new_key = self.state.query_key();
        if new_key == self.current_key {
            return;
        }

        // Synchronous external-state write: reloading now reproduces this view.
        self.state.write_url(self.url.as_ref());

        {
            let mut cache = self.cache.write().await;
            cache.unwatch(&self.current_key);
            cache.watch(&new_key);
        }

        // A response for the old key arriving from here on is superseded.
        self.orchestrator.abandon(&self.current_key).await;
        self.current_key = new_key.clone();

        // Stale-while-revalidate: the entry (if any) serves immediately,
        // the refresh fills it in.
        let orchestrator = self.orchestrator.clone();
        self.background.push(tokio::spawn(async move {
            let _ = orchestrator.fetch(&new_key).await;
        }));
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        for handle in &self.background {
            handle.abort();
        }
    }
}
