//! Domain types for the user directory.
//!
//! These mirror the wire format of the directory service exactly (camelCase
//! field names), so a page fetched over HTTP and a page built by the in-memory
//! mock are indistinguishable to the cache.

use serde::{Deserialize, Serialize};

/// A role granted through group membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "roleId")]
    pub role_id: String,

    #[serde(rename = "roleName")]
    pub role_name: String,
}

/// A group a user belongs to, carrying its ordered role list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "groupId")]
    pub group_id: String,

    #[serde(rename = "groupName")]
    pub group_name: String,

    pub roles: Vec<Role>,
}

/// Activation state of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    /// The opposite state, used by the activate/deactivate toggle.
    pub fn toggled(self) -> UserStatus {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A directory user.
///
/// `user_id` is the identity key across all cache entries: the same logical
/// user may appear in many cached pages at once, and mutations must reach
/// every occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userId")]
    pub user_id: String,

    pub name: String,

    pub email: String,

    pub status: UserStatus,

    /// ISO-8601 timestamp, kept as the wire string. Parsing happens in the
    /// date renderer, which must tolerate malformed input anyway.
    #[serde(rename = "createdAt")]
    pub created_at: String,

    pub groups: Vec<Group>,
}

impl User {
    /// Whether any of the user's groups grants the named role.
    pub fn has_role(&self, role_name: &str) -> bool {
        self.groups
            .iter()
            .any(|group| group.roles.iter().any(|role| role.role_name == role_name))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("Admin")
    }
}

/// One page of the filtered user universe.
///
/// `total_count` covers the whole filtered result set, not this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub items: Vec<User>,

    #[serde(rename = "totalCount")]
    pub total_count: usize,
}
