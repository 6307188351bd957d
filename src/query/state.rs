//! Pagination/filter state machine.
//!
//! One [`ListState`] is the authoritative in-memory tuple per view session.
//! It reconciles bidirectionally with the persisted URL representation: the
//! URL seeds the state at session start (before the first fetch goes out),
//! and every local transition writes the URL back synchronously so a reload
//! reproduces the same view.

use crate::query::key::{QueryKey, QueryParams, StatusFilter};
use crate::url::UrlStore;

pub const PARAM_PAGE: &str = "page";
pub const PARAM_PAGE_SIZE: &str = "pageSize";
pub const PARAM_QUERY: &str = "query";
pub const PARAM_STATUS: &str = "status";

/// The `(page_index, page_size, query, status)` tuple. `page_index` is
/// 0-based; the wire and the URL carry the 1-based page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    page_index: u32,
    page_size: u32,
    query: String,
    status: StatusFilter,
}

impl ListState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            query: String::new(),
            status: StatusFilter::All,
        }
    }

    /// Seed state from the persisted representation. Unparsable or missing
    /// values fall back to defaults; seeding never fails.
    pub fn seed(url: &dyn UrlStore, default_page_size: u32) -> Self {
        let mut state = Self::new(default_page_size);

        if let Some(page) = url.get(PARAM_PAGE).and_then(|v| v.parse::<u32>().ok()) {
            state.page_index = page.saturating_sub(1);
        }
        if let Some(size) = url.get(PARAM_PAGE_SIZE).and_then(|v| v.parse::<u32>().ok()) {
            if size > 0 {
                state.page_size = size;
            }
        }
        if let Some(query) = url.get(PARAM_QUERY) {
            state.query = query;
        }
        if let Some(status) = url.get(PARAM_STATUS).and_then(|v| v.parse::<StatusFilter>().ok()) {
            state.status = status;
        }

        state
    }

    /// Mirror the current tuple into the persisted representation.
    pub fn write_url(&self, url: &dyn UrlStore) {
        url.set(PARAM_PAGE, &(self.page_index + 1).to_string());
        url.set(PARAM_PAGE_SIZE, &self.page_size.to_string());
        url.set(PARAM_QUERY, &self.query);
        url.set(PARAM_STATUS, &self.status.to_string());
    }

    /// Change the free-text query. Resets the page offset: the old offset is
    /// meaningless once the result universe changes. Returns whether the
    /// state actually changed.
    pub fn set_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.page_index = 0;
        true
    }

    /// Change the status filter; resets the page offset like `set_query`.
    pub fn set_status(&mut self, status: StatusFilter) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.page_index = 0;
        true
    }

    pub fn set_page(&mut self, page_index: u32) -> bool {
        if self.page_index == page_index {
            return false;
        }
        self.page_index = page_index;
        true
    }

    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        true
    }

    /// The canonical cache key for the current tuple.
    pub fn query_key(&self) -> QueryKey {
        QueryParams {
            page: self.page_index + 1,
            page_size: self.page_size,
            query: Some(self.query.clone()),
            status: Some(self.status),
        }
        .canonicalize()
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> StatusFilter {
        self.status
    }
}
