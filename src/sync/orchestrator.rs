//! Fetch orchestration.
//!
//! Drives the per-key entry state machine `idle -> fetching -> {success,
//! error}`. Concurrent requests for the same key attach to the one in-flight
//! operation instead of issuing duplicates, and every resolution is checked
//! against the request id the entry currently carries: a superseded or
//! abandoned request's result is dropped without touching the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::entry::CacheEntry;
use crate::cache::store::SharedCache;
use crate::model::UserPage;
use crate::query::key::QueryKey;
use crate::transport::{Directory, FetchError};

const RESULT_CHANNEL_CAPACITY: usize = 4;

/// Counters for orchestrator activity.
#[derive(Debug, Default)]
pub struct SyncStats {
    fetches_issued: AtomicU64,
    fetches_coalesced: AtomicU64,
    fetches_abandoned: AtomicU64,
    stale_discarded: AtomicU64,
}

/// Point-in-time copy of [`SyncStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub fetches_issued: u64,
    pub fetches_coalesced: u64,
    pub fetches_abandoned: u64,
    pub stale_discarded: u64,
}

impl SyncStats {
    fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            fetches_issued: self.fetches_issued.load(Ordering::SeqCst),
            fetches_coalesced: self.fetches_coalesced.load(Ordering::SeqCst),
            fetches_abandoned: self.fetches_abandoned.load(Ordering::SeqCst),
            stale_discarded: self.stale_discarded.load(Ordering::SeqCst),
        }
    }
}

struct InFlight {
    request_id: Uuid,
    done: broadcast::Sender<Result<UserPage, FetchError>>,
}

/// The fetch orchestrator.
pub struct FetchOrchestrator {
    cache: SharedCache,
    directory: Arc<dyn Directory>,
    // Lock order everywhere: in_flight before cache.
    in_flight: Mutex<HashMap<QueryKey, InFlight>>,
    stats: SyncStats,
}

impl FetchOrchestrator {
    pub fn new(cache: SharedCache, directory: Arc<dyn Directory>) -> Self {
        Self {
            cache,
            directory,
            in_flight: Mutex::new(HashMap::new()),
            stats: SyncStats::default(),
        }
    }

    /// Fetch the page for `key`, coalescing onto an existing in-flight
    /// request when one exists.
    ///
    /// On completion the cache entry is updated (unless the request was
    /// abandoned or superseded meanwhile) and every attached caller resolves
    /// with the same result.
    pub async fn fetch(&self, key: &QueryKey) -> Result<UserPage, FetchError> {
        let leader = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(op) = in_flight.get(key) {
                self.stats.fetches_coalesced.fetch_add(1, Ordering::SeqCst);
                debug!(%key, "coalescing onto in-flight request");
                Err(op.done.subscribe())
            } else {
                let request_id = Uuid::new_v4();
                let (done, _) = broadcast::channel(RESULT_CHANNEL_CAPACITY);
                in_flight.insert(key.clone(), InFlight { request_id, done });
                self.cache.write().await.mark_fetching(key, request_id);
                Ok(request_id)
            }
        };

        match leader {
            Ok(request_id) => self.run_fetch(key, request_id).await,
            Err(mut rx) => match rx.recv().await {
                Ok(result) => result,
                // The in-flight slot was abandoned before resolution.
                Err(_) => Err(FetchError::Transport(
                    "request abandoned before completion".to_string(),
                )),
            },
        }
    }

    /// Cached entry for a key, served immediately regardless of freshness.
    /// `status`/`stale` on the entry tell the reader how much to trust it.
    pub async fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.cache.read().await.entry_snapshot(key)
    }

    /// Detach the in-flight request for `key`, if any. Its eventual
    /// resolution will be discarded instead of committed.
    pub async fn abandon(&self, key: &QueryKey) -> bool {
        let removed = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.remove(key)
        };

        match removed {
            Some(op) => {
                self.cache.write().await.clear_in_flight(key, op.request_id);
                self.stats.fetches_abandoned.fetch_add(1, Ordering::SeqCst);
                debug!(%key, request_id = %op.request_id, "abandoned in-flight fetch");
                true
            }
            None => false,
        }
    }

    /// Abandon every in-flight fetch. Used before an optimistic write so no
    /// stale response can land on top of it.
    pub async fn abandon_all(&self) -> usize {
        let drained: Vec<(QueryKey, InFlight)> = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.drain().collect()
        };

        let count = drained.len();
        if count > 0 {
            let mut cache = self.cache.write().await;
            for (key, op) in &drained {
                cache.clear_in_flight(key, op.request_id);
            }
            self.stats
                .fetches_abandoned
                .fetch_add(count as u64, Ordering::SeqCst);
            debug!(count, "abandoned all in-flight fetches");
        }
        count
    }

    /// Re-fetch a set of keys, typically the watched keys an invalidation
    /// reported. Individual failures stay on their entries.
    pub async fn refetch_all(&self, keys: Vec<QueryKey>) {
        join_all(keys.iter().map(|key| async move {
            if let Err(error) = self.fetch(key).await {
                warn!(%key, %error, "refetch after invalidation failed");
            }
        }))
        .await;
    }

    pub async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    async fn run_fetch(&self, key: &QueryKey, request_id: Uuid) -> Result<UserPage, FetchError> {
        self.stats.fetches_issued.fetch_add(1, Ordering::SeqCst);
        debug!(%key, %request_id, "issuing directory fetch");

        let result = self.directory.fetch_page(&key.request()).await;

        let mut in_flight = self.in_flight.lock().await;
        let still_current = in_flight
            .get(key)
            .is_some_and(|op| op.request_id == request_id);

        if !still_current {
            // Superseded or abandoned while we were waiting on the network.
            // Expected consequence of the ordering policy, so no error noise.
            self.stats.stale_discarded.fetch_add(1, Ordering::SeqCst);
            debug!(%key, %request_id, "discarding stale response");
            return result;
        }

        let op = in_flight.remove(key);
        {
            let mut cache = self.cache.write().await;
            match &result {
                Ok(page) => cache.put(key, page.clone()),
                Err(error) => {
                    warn!(%key, %error, "directory fetch failed");
                    cache.mark_error(key, error.clone());
                }
            }
        }
        drop(in_flight);

        if let Some(op) = op {
            let _ = op.done.send(result.clone());
        }

        result
    }
}
