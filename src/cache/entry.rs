//! Cache entries.
//!
//! One [`CacheEntry`] exists per query key. Entries are owned exclusively by
//! the store; orchestrator and mutation controller mutate them only through
//! store operations, never directly.

use std::time::Instant;

use uuid::Uuid;

use crate::model::UserPage;
use crate::query::key::QueryKey;
use crate::transport::FetchError;

/// Lifecycle state of a cache entry.
///
/// `Success` and `Error` can both transition back to `Fetching` on re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Idle,
    Fetching,
    Success,
    Error,
}

/// The latest known server response for one query key.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: QueryKey,

    /// Last-known-good page. Retained while a refresh is in flight so readers
    /// can serve stale data immediately.
    pub data: Option<UserPage>,

    pub status: EntryStatus,

    /// The read error, retained until the next successful fetch.
    pub error: Option<FetchError>,

    /// Set by invalidation; cleared by the next `put`.
    pub stale: bool,

    pub last_updated_at: Option<Instant>,

    /// Identifies the in-flight request allowed to commit into this entry.
    /// A resolution carrying any other id is discarded.
    pub in_flight: Option<Uuid>,
}

impl CacheEntry {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            data: None,
            status: EntryStatus::Idle,
            error: None,
            stale: false,
            last_updated_at: None,
            in_flight: None,
        }
    }

    /// Successful data that has not been invalidated.
    pub fn is_fresh(&self) -> bool {
        self.status == EntryStatus::Success && !self.stale
    }
}
