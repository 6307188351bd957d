//! Canonical query keys.
//!
//! A [`QueryKey`] identifies one (pagination x filter) combination and indexes
//! the response cache. Canonicalization substitutes defaults before the key is
//! built, so a request that says nothing about `status` and a request that
//! says `status=all` land in the same cache slot.

use serde::{Deserialize, Serialize};

use crate::transport::PageRequest;

/// The resource namespace all user-list keys live under.
///
/// Invalidation after a mutation targets this whole namespace, because the
/// mutated user may appear in any page/filter combination.
pub const RESOURCE_USERS: &str = "users";

/// Status filter over the user universe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Active,
    Inactive,
    #[default]
    All,
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::Active => write!(f, "active"),
            StatusFilter::Inactive => write!(f, "inactive"),
            StatusFilter::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(StatusFilter::Active),
            "inactive" => Ok(StatusFilter::Inactive),
            "all" => Ok(StatusFilter::All),
            _ => Err(()),
        }
    }
}

/// Raw query parameters as a caller assembles them.
///
/// `query` and `status` are optional; canonicalization fills in the defaults
/// (empty query, `all` status). `page` is 1-based, matching the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub page: u32,
    pub page_size: u32,
    pub query: Option<String>,
    pub status: Option<StatusFilter>,
}

impl QueryParams {
    /// Derive the canonical cache key for these parameters.
    ///
    /// Pure and total: out-of-range numerics are clamped, unset optionals are
    /// replaced by their defaults. Two parameter sets that are semantically
    /// equal canonicalize to identical keys.
    pub fn canonicalize(&self) -> QueryKey {
        QueryKey {
            resource: RESOURCE_USERS,
            page: self.page.max(1),
            page_size: self.page_size.max(1),
            query: self.query.clone().unwrap_or_default(),
            status: self.status.unwrap_or_default(),
        }
    }
}

/// Canonical identifier for one cached page of the user list.
///
/// Equality and hashing are field-wise, so keys index a `HashMap` directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: &'static str,
    pub page: u32,
    pub page_size: u32,
    pub query: String,
    pub status: StatusFilter,
}

impl QueryKey {
    /// The transport request this key describes.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
            query: self.query.clone(),
            status: self.status,
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}?page={}&pageSize={}&status={}&query={}",
            self.resource, self.page, self.page_size, self.status, self.query
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_equivalence() {
        let implicit = QueryParams {
            page: 1,
            page_size: 10,
            query: None,
            status: None,
        };
        let explicit = QueryParams {
            page: 1,
            page_size: 10,
            query: Some(String::new()),
            status: Some(StatusFilter::All),
        };

        assert_eq!(implicit.canonicalize(), explicit.canonicalize());
    }

    #[test]
    fn test_distinct_params_distinct_keys() {
        let base = QueryParams {
            page: 1,
            page_size: 10,
            query: None,
            status: None,
        };
        let filtered = QueryParams {
            status: Some(StatusFilter::Active),
            ..base.clone()
        };

        assert_ne!(base.canonicalize(), filtered.canonicalize());
    }

    #[test]
    fn test_clamping_never_fails() {
        let degenerate = QueryParams {
            page: 0,
            page_size: 0,
            query: None,
            status: None,
        };
        let key = degenerate.canonicalize();
        assert_eq!(key.page, 1);
        assert_eq!(key.page_size, 1);
    }

    #[test]
    fn test_status_filter_roundtrip() {
        for status in [StatusFilter::Active, StatusFilter::Inactive, StatusFilter::All] {
            let parsed: StatusFilter = status.to_string().parse().expect("roundtrip");
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<StatusFilter>().is_err());
    }
}
