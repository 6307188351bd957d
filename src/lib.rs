//! viewsync: client-side data-synchronization core for paginated list views.
//!
//! A keyed cache of server responses kept consistent across pagination and
//! filter changes, optimistic mutations with rollback, and URL-driven state:
//!
//! - [`query`]: canonical query keys, the pagination/filter state machine,
//!   and the search-input debouncer
//! - [`cache`]: the shared response cache with patch/snapshot and
//!   invalidation
//! - [`sync`]: fetch orchestration (coalescing, stale-while-revalidate) and
//!   the optimistic mutation controller
//! - [`render`]: metadata-driven column rendering
//! - [`transport`]: the directory-service boundary and its in-memory mock
//! - [`server`]: an HTTP surface over the mock directory

pub mod cache;
pub mod config;
pub mod model;
pub mod notify;
pub mod query;
pub mod render;
pub mod server;
pub mod sync;
pub mod transport;
pub mod url;
