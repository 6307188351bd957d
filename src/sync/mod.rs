//! Synchronization between the cache and the directory service.
//!
//! - [`orchestrator`]: coalesced fetches, stale-while-revalidate,
//!   abandonment of superseded requests
//! - [`mutation`]: the optimistic snapshot/apply/rollback/reconcile protocol
//! - [`view`]: the per-view controller binding state machine, URL, debounce,
//!   and cache subscription together

pub mod mutation;
pub mod orchestrator;
pub mod view;
