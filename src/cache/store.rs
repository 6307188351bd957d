//! The response cache store.
//!
//! Holds one [`CacheEntry`] per query key for the lifetime of the session
//! (unbounded; destroyed only by [`ResponseCache::reset`]). Every operation
//! runs under a single lock acquisition of the shared store, so readers never
//! observe a torn `put` or `patch_where`.
//!
//! Views subscribe to change notices on a broadcast channel and register
//! per-key watcher refcounts; invalidation reports which stale keys are being
//! watched so the orchestrator can re-fetch exactly those.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::cache::entry::{CacheEntry, EntryStatus};
use crate::model::{User, UserPage};
use crate::query::key::QueryKey;
use crate::transport::FetchError;

const NOTICE_CHANNEL_CAPACITY: usize = 64;

/// What changed about a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Updated,
    Invalidated,
    Errored,
}

/// Change notice broadcast to subscribed views.
#[derive(Debug, Clone)]
pub struct CacheNotice {
    pub key: QueryKey,
    pub kind: NoticeKind,
}

/// Counters for cache activity.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub puts: u64,
    pub patches: u64,
    pub invalidations: u64,
    pub rollbacks: u64,
}

/// Pre-image of every entry a `patch_where` call touched. Restoring it puts
/// each page back verbatim.
#[derive(Debug)]
pub struct PatchSnapshot {
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug)]
struct SnapshotEntry {
    key: QueryKey,
    page: UserPage,
    last_updated_at: Option<Instant>,
}

impl PatchSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The keyed response cache.
pub struct ResponseCache {
    entries: HashMap<QueryKey, CacheEntry>,
    watchers: HashMap<QueryKey, usize>,
    notices: broadcast::Sender<CacheNotice>,
    stats: CacheStats,
}

impl ResponseCache {
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            entries: HashMap::new(),
            watchers: HashMap::new(),
            notices,
            stats: CacheStats::default(),
        }
    }

    /// Look up an entry. No side effects.
    pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Owned copy of an entry, for handing across the lock boundary.
    pub fn entry_snapshot(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.get(key).cloned()
    }

    /// Replace or create the entry with fresh data.
    pub fn put(&mut self, key: &QueryKey, page: UserPage) {
        let entry = self.entry_mut(key);
        entry.data = Some(page);
        entry.status = EntryStatus::Success;
        entry.error = None;
        entry.stale = false;
        entry.last_updated_at = Some(Instant::now());
        entry.in_flight = None;
        self.stats.puts += 1;
        self.notify(key, NoticeKind::Updated);
    }

    /// Transition an entry to `Fetching`, tagging it with the request that is
    /// allowed to commit. Existing data stays in place for stale reads.
    pub fn mark_fetching(&mut self, key: &QueryKey, request_id: Uuid) {
        let entry = self.entry_mut(key);
        entry.status = EntryStatus::Fetching;
        entry.in_flight = Some(request_id);
    }

    /// Record a read failure on the entry.
    pub fn mark_error(&mut self, key: &QueryKey, error: FetchError) {
        let entry = self.entry_mut(key);
        entry.status = EntryStatus::Error;
        entry.error = Some(error);
        entry.in_flight = None;
        self.notify(key, NoticeKind::Errored);
    }

    /// Detach an in-flight request from its entry so a late resolution cannot
    /// commit. The entry falls back to its pre-fetch status.
    pub fn clear_in_flight(&mut self, key: &QueryKey, request_id: Uuid) {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.in_flight == Some(request_id) {
                entry.in_flight = None;
                if entry.status == EntryStatus::Fetching {
                    entry.status = if entry.data.is_some() {
                        EntryStatus::Success
                    } else {
                        EntryStatus::Idle
                    };
                }
            }
        }
    }

    /// The request id currently allowed to commit into this entry.
    pub fn in_flight_id(&self, key: &QueryKey) -> Option<Uuid> {
        self.entries.get(key).and_then(|e| e.in_flight)
    }

    /// Mark every matching entry stale and return the stale keys that have
    /// active watchers, in no particular order. The caller re-fetches those.
    pub fn invalidate<P>(&mut self, predicate: P) -> Vec<QueryKey>
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut watched = Vec::new();
        let keys: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|k| predicate(k))
            .cloned()
            .collect();

        for key in keys {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.stale = true;
            }
            if self.watchers.get(&key).copied().unwrap_or(0) > 0 {
                watched.push(key.clone());
            }
            self.notify(&key, NoticeKind::Invalidated);
        }

        self.stats.invalidations += 1;
        debug!(watched = watched.len(), "invalidated cache entries");
        watched
    }

    /// Invalidate the whole resource namespace. The common case after a
    /// mutation: the mutated user may sit in any page/filter combination.
    pub fn invalidate_all(&mut self, resource: &'static str) -> Vec<QueryKey> {
        self.invalidate(|key| key.resource == resource)
    }

    /// Apply `patch` to every cached user matching `predicate`, across every
    /// entry that contains one. Returns the pre-images of all touched entries
    /// as the rollback set. Snapshot and apply happen under the same lock the
    /// caller already holds, so they are indivisible.
    pub fn patch_where<P, F>(&mut self, predicate: P, patch: F) -> PatchSnapshot
    where
        P: Fn(&User) -> bool,
        F: Fn(&mut User),
    {
        let mut snapshot = Vec::new();
        let mut touched_keys = Vec::new();

        for (key, entry) in self.entries.iter_mut() {
            let Some(page) = entry.data.as_mut() else {
                continue;
            };
            if !page.items.iter().any(&predicate) {
                continue;
            }

            snapshot.push(SnapshotEntry {
                key: key.clone(),
                page: page.clone(),
                last_updated_at: entry.last_updated_at,
            });

            for user in page.items.iter_mut() {
                if predicate(user) {
                    patch(user);
                }
            }
            touched_keys.push(key.clone());
        }

        for key in &touched_keys {
            self.notify(key, NoticeKind::Updated);
        }

        self.stats.patches += 1;
        debug!(entries = snapshot.len(), "applied optimistic patch");
        PatchSnapshot { entries: snapshot }
    }

    /// Restore every snapshot entry verbatim (full rollback, not a merge).
    pub fn restore(&mut self, snapshot: PatchSnapshot) {
        for saved in snapshot.entries {
            if let Some(entry) = self.entries.get_mut(&saved.key) {
                entry.data = Some(saved.page);
                entry.last_updated_at = saved.last_updated_at;
            }
            self.notify(&saved.key, NoticeKind::Updated);
        }
        self.stats.rollbacks += 1;
    }

    /// Register an active view on a key.
    pub fn watch(&mut self, key: &QueryKey) {
        *self.watchers.entry(key.clone()).or_insert(0) += 1;
    }

    /// Drop an active view on a key.
    pub fn unwatch(&mut self, key: &QueryKey) {
        if let Some(count) = self.watchers.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.watchers.remove(key);
            }
        }
    }

    pub fn watcher_count(&self, key: &QueryKey) -> usize {
        self.watchers.get(key).copied().unwrap_or(0)
    }

    /// Subscribe to change notices.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheNotice> {
        self.notices.subscribe()
    }

    /// Full-cache reset; the only way entries are ever destroyed.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn entry_mut(&mut self, key: &QueryKey) -> &mut CacheEntry {
        self.entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(key.clone()))
    }

    fn notify(&self, key: &QueryKey, kind: NoticeKind) {
        // Send fails when no view is subscribed; that is not an error.
        let _ = self.notices.send(CacheNotice {
            key: key.clone(),
            kind,
        });
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe handle to the cache, shared by orchestrator, mutation
/// controller, and views.
pub type SharedCache = Arc<RwLock<ResponseCache>>;

/// Create a new shared cache.
pub fn new_shared_cache() -> SharedCache {
    Arc::new(RwLock::new(ResponseCache::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UserPage, UserStatus};
    use crate::query::key::{QueryParams, StatusFilter};
    use crate::transport::mock::seed_users;

    fn key(page: u32, status: StatusFilter) -> QueryKey {
        QueryParams {
            page,
            page_size: 10,
            query: None,
            status: Some(status),
        }
        .canonicalize()
    }

    fn page_with(users: &[usize]) -> UserPage {
        let all = seed_users(100);
        UserPage {
            items: users.iter().map(|i| all[i - 1].clone()).collect(),
            total_count: users.len(),
        }
    }

    #[test]
    fn test_put_then_get() {
        let mut cache = ResponseCache::new();
        let k = key(1, StatusFilter::All);

        assert!(cache.get(&k).is_none());

        cache.put(&k, page_with(&[1, 2, 3]));
        let entry = cache.get(&k).expect("entry");
        assert_eq!(entry.status, EntryStatus::Success);
        assert!(entry.is_fresh());
        assert_eq!(entry.data.as_ref().map(|p| p.items.len()), Some(3));
    }

    #[test]
    fn test_patch_reaches_every_entry_containing_user() {
        let mut cache = ResponseCache::new();
        let all = key(1, StatusFilter::All);
        let active = key(1, StatusFilter::Active);
        let other = key(2, StatusFilter::All);

        cache.put(&all, page_with(&[1, 2, 3]));
        cache.put(&active, page_with(&[3, 4]));
        cache.put(&other, page_with(&[5, 6]));

        let snapshot = cache.patch_where(
            |u| u.user_id == "user-3",
            |u| u.status = UserStatus::Inactive,
        );
        assert_eq!(snapshot.len(), 2);

        for k in [&all, &active] {
            let page = cache.get(k).and_then(|e| e.data.clone()).expect("data");
            let user = page.items.iter().find(|u| u.user_id == "user-3").expect("user-3");
            assert_eq!(user.status, UserStatus::Inactive);
        }

        // Entry without user-3 is untouched and not in the snapshot.
        let untouched = cache.get(&other).and_then(|e| e.data.clone()).expect("data");
        assert!(untouched.items.iter().all(|u| u.user_id != "user-3"));
    }

    #[test]
    fn test_restore_is_verbatim() {
        let mut cache = ResponseCache::new();
        let k = key(1, StatusFilter::All);
        cache.put(&k, page_with(&[1, 2, 3]));

        let before = cache.get(&k).and_then(|e| e.data.clone()).expect("data");

        let snapshot = cache.patch_where(
            |u| u.user_id == "user-2",
            |u| u.status = UserStatus::Inactive,
        );
        assert!(!snapshot.is_empty());

        cache.restore(snapshot);
        let after = cache.get(&k).and_then(|e| e.data.clone()).expect("data");
        assert_eq!(before, after);
    }

    #[test]
    fn test_patch_missing_user_is_noop() {
        let mut cache = ResponseCache::new();
        let k = key(1, StatusFilter::All);
        cache.put(&k, page_with(&[1, 2]));

        let snapshot = cache.patch_where(
            |u| u.user_id == "user-404",
            |u| u.status = UserStatus::Inactive,
        );
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_invalidate_reports_watched_keys_only() {
        let mut cache = ResponseCache::new();
        let watched = key(1, StatusFilter::All);
        let unwatched = key(2, StatusFilter::All);

        cache.put(&watched, page_with(&[1]));
        cache.put(&unwatched, page_with(&[2]));
        cache.watch(&watched);

        let stale = cache.invalidate_all(crate::query::key::RESOURCE_USERS);
        assert_eq!(stale, vec![watched.clone()]);

        assert!(cache.get(&watched).is_some_and(|e| e.stale));
        assert!(cache.get(&unwatched).is_some_and(|e| e.stale));
    }

    #[test]
    fn test_clear_in_flight_requires_matching_id() {
        let mut cache = ResponseCache::new();
        let k = key(1, StatusFilter::All);
        let ours = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        cache.mark_fetching(&k, ours);
        cache.clear_in_flight(&k, theirs);
        assert_eq!(cache.in_flight_id(&k), Some(ours));

        cache.clear_in_flight(&k, ours);
        assert_eq!(cache.in_flight_id(&k), None);
        assert_eq!(cache.get(&k).map(|e| e.status), Some(EntryStatus::Idle));
    }

    #[test]
    fn test_watch_refcounting() {
        let mut cache = ResponseCache::new();
        let k = key(1, StatusFilter::All);

        cache.watch(&k);
        cache.watch(&k);
        assert_eq!(cache.watcher_count(&k), 2);

        cache.unwatch(&k);
        assert_eq!(cache.watcher_count(&k), 1);
        cache.unwatch(&k);
        assert_eq!(cache.watcher_count(&k), 0);
    }

    #[tokio::test]
    async fn test_notices_reach_subscribers() {
        let mut cache = ResponseCache::new();
        let k = key(1, StatusFilter::All);
        let mut notices = cache.subscribe();

        cache.put(&k, page_with(&[1]));
        cache.invalidate_all(crate::query::key::RESOURCE_USERS);

        let first = notices.recv().await.expect("updated notice");
        assert_eq!(first.key, k);
        assert_eq!(first.kind, NoticeKind::Updated);

        let second = notices.recv().await.expect("invalidated notice");
        assert_eq!(second.kind, NoticeKind::Invalidated);
    }

    #[test]
    fn test_reset_destroys_entries() {
        let mut cache = ResponseCache::new();
        cache.put(&key(1, StatusFilter::All), page_with(&[1]));
        assert_eq!(cache.len(), 1);

        cache.reset();
        assert!(cache.is_empty());
    }
}
