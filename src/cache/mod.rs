//! Keyed response cache.
//!
//! This module contains the client-side cache the whole core hangs off:
//! - [`entry`]: per-key cache entries and their status machine
//! - [`store`]: the shared store with patch/snapshot, invalidation-by-
//!   predicate, and change notices for subscribed views

pub mod entry;
pub mod store;
