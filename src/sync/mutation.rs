//! Optimistic mutation controller.
//!
//! Makes a status toggle feel instantaneous while staying correct when the
//! server rejects it. The protocol is strictly ordered:
//!
//! 1. cancel in-flight fetches that could overwrite the optimistic write
//! 2. snapshot every cache entry containing the target user
//! 3. apply the new status to every occurrence (one atomic `patch_where`;
//!    steps 2 and 3 are indivisible)
//! 4. issue the network mutation
//! 5. on success, invalidate the whole resource namespace and re-fetch the
//!    watched keys, so filter membership is re-derived rather than guessed
//! 6. on failure, restore the snapshot verbatim and surface the error

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::store::SharedCache;
use crate::model::UserStatus;
use crate::notify::{Notifier, Severity};
use crate::query::key::RESOURCE_USERS;
use crate::sync::orchestrator::FetchOrchestrator;
use crate::transport::{Directory, MutationError, StatusUpdate};

/// Counters for mutation activity.
#[derive(Debug, Default)]
struct MutationStats {
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

/// Point-in-time copy of the mutation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationStatsSnapshot {
    pub committed: u64,
    pub rolled_back: u64,
}

/// The optimistic mutation controller.
pub struct MutationController {
    cache: SharedCache,
    orchestrator: Arc<FetchOrchestrator>,
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    // Serializes concurrent toggles on the same user id; different ids
    // proceed independently.
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    stats: MutationStats,
}

impl MutationController {
    pub fn new(
        cache: SharedCache,
        orchestrator: Arc<FetchOrchestrator>,
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            cache,
            orchestrator,
            directory,
            notifier,
            user_locks: Mutex::new(HashMap::new()),
            stats: MutationStats::default(),
        }
    }

    /// Toggle a user's activation status optimistically.
    ///
    /// If the user is not present in any cached page, the snapshot is empty
    /// and the apply is a no-op; the network call still proceeds and its
    /// result is authoritative.
    pub async fn set_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<StatusUpdate, MutationError> {
        let user_lock = {
            let mut locks = self.user_locks.lock().await;
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _serialized = user_lock.lock().await;

        // 1. A stale in-flight read must not land on top of the optimistic
        //    write while the mutation is pending.
        self.orchestrator.abandon_all().await;

        // 2 + 3. Snapshot and apply in one cache lock acquisition.
        let snapshot = {
            let mut cache = self.cache.write().await;
            cache.patch_where(|u| u.user_id == user_id, |u| u.status = status)
        };
        if snapshot.is_empty() {
            debug!(user_id, "target user not present in any cached page");
        }

        // 4. Commit.
        match self.directory.update_status(user_id, status).await {
            Ok(update) => {
                // 5. Server-authoritative membership: invalidate everything
                //    under the namespace, not just the patched entries.
                let watched = {
                    let mut cache = self.cache.write().await;
                    cache.invalidate_all(RESOURCE_USERS)
                };
                self.orchestrator.refetch_all(watched).await;

                self.stats.committed.fetch_add(1, Ordering::SeqCst);
                self.notifier.notify(&update.message, Severity::Success);
                Ok(update)
            }
            Err(error) => {
                // 6. Full rollback, then surface.
                {
                    let mut cache = self.cache.write().await;
                    cache.restore(snapshot);
                }
                self.stats.rolled_back.fetch_add(1, Ordering::SeqCst);
                warn!(user_id, %error, "status mutation failed, optimistic write reverted");
                self.notifier
                    .notify("Failed to update user status", Severity::Error);
                Err(error)
            }
        }
    }

    pub fn stats(&self) -> MutationStatsSnapshot {
        MutationStatsSnapshot {
            committed: self.stats.committed.load(Ordering::SeqCst),
            rolled_back: self.stats.rolled_back.load(Ordering::SeqCst),
        }
    }
}
