//! Persisted external state (URL stand-in).
//!
//! A string-keyed store the state machine mirrors itself into. Treated as
//! synchronous and always available; persistence failures are not modeled.

use std::collections::HashMap;
use std::sync::Mutex;

pub trait UrlStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory URL parameter store standing in for the browser location.
#[derive(Default)]
pub struct MemoryUrlStore {
    params: Mutex<HashMap<String, String>>,
}

impl MemoryUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a query string (`page=2&status=active`).
    pub fn from_query(query: &str) -> Self {
        let store = Self::new();
        for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
            store.set(&k, &v);
        }
        store
    }

    /// Render the current parameters as a query string, keys sorted so the
    /// output is stable.
    pub fn to_query(&self) -> String {
        let params = self
            .params
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut pairs: Vec<(&String, &String)> = params.iter().collect();
        pairs.sort();

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in pairs {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}

impl UrlStore for MemoryUrlStore {
    fn get(&self, key: &str) -> Option<String> {
        self.params
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.params
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}
