//! Transport boundary to the directory service.
//!
//! The synchronization core only ever talks to the [`Directory`] trait; the
//! in-memory [`mock::MockDirectory`] stands in for the real service. Errors
//! are `Clone` so one network result can fan out to every coalesced waiter
//! and be retained on the cache entry it belongs to.

pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{User, UserPage, UserStatus};
use crate::query::key::StatusFilter;

/// Read-path failure: transport trouble or a non-2xx response.
///
/// Never thrown across the cache boundary; it is recorded on the cache entry
/// and consumed by the view as a retry affordance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("directory returned status {0}")]
    Status(u16),
}

/// Write-path failure. Triggers rollback of the optimistic write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("directory returned status {0}")]
    Status(u16),

    #[error("user {0} not found")]
    NotFound(String),
}

/// One page request, exactly as it goes on the wire. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub query: String,
    pub status: StatusFilter,
}

/// Successful mutation response: the authoritative user record plus the
/// human-readable message the notifier relays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub user: User,
    pub message: String,
}

/// The directory service the core synchronizes against.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Fetch one filtered page of users.
    async fn fetch_page(&self, request: &PageRequest) -> Result<UserPage, FetchError>;

    /// Set a user's activation status.
    async fn update_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<StatusUpdate, MutationError>;
}
