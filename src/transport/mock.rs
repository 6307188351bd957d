//! In-memory mock directory.
//!
//! Stands in for the real directory service: deterministic seed data,
//! name/email/status filtering, 1-based page slicing, simulated latency, and
//! failure injection hooks for exercising rollback paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DataConfig;
use crate::model::{Group, Role, User, UserPage, UserStatus};
use crate::query::key::StatusFilter;
use crate::transport::{Directory, FetchError, MutationError, PageRequest, StatusUpdate};

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Daniel", "Nancy", "Matthew", "Emily",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee",
    "Perez", "Thompson", "White", "Harris", "Clark", "Lewis",
];

fn role_catalog() -> Vec<Role> {
    [
        ("role-1", "Admin"),
        ("role-2", "Manager"),
        ("role-3", "Standard User"),
        ("role-4", "Viewer"),
        ("role-5", "Editor"),
    ]
    .iter()
    .map(|(id, name)| Role {
        role_id: id.to_string(),
        role_name: name.to_string(),
    })
    .collect()
}

fn group_catalog() -> Vec<Group> {
    let roles = role_catalog();
    vec![
        Group {
            group_id: "grp-1".to_string(),
            group_name: "Administrators".to_string(),
            roles: vec![roles[0].clone()],
        },
        Group {
            group_id: "grp-2".to_string(),
            group_name: "Management Team".to_string(),
            roles: vec![roles[1].clone(), roles[4].clone()],
        },
        Group {
            group_id: "grp-3".to_string(),
            group_name: "Standard Users".to_string(),
            roles: vec![roles[2].clone()],
        },
        Group {
            group_id: "grp-4".to_string(),
            group_name: "Read Only".to_string(),
            roles: vec![roles[3].clone()],
        },
        Group {
            group_id: "grp-5".to_string(),
            group_name: "Content Team".to_string(),
            roles: vec![roles[4].clone(), roles[2].clone()],
        },
    ]
}

/// Deterministic creation timestamp: seed epoch plus five days per user.
fn created_at_for(index: usize) -> String {
    let ts = 1_672_531_200_i64 + (index as i64) * 5 * 86_400;
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| "2023-01-01T00:00:00Z".to_string())
}

/// Build the deterministic seed population.
///
/// User `i` is active when `i % 10` falls in 1..=7, giving the familiar
/// 70/30 active split without any randomness.
pub fn seed_users(count: usize) -> Vec<User> {
    let groups = group_catalog();

    (1..=count)
        .map(|i| {
            let first = FIRST_NAMES[(i * 7) % FIRST_NAMES.len()];
            let last = LAST_NAMES[(i * 13) % LAST_NAMES.len()];
            let slot = i % 10;

            let group_count = (i % 3) + 1;
            let member_of: Vec<Group> = (0..group_count)
                .map(|offset| groups[(i + offset) % groups.len()].clone())
                .collect();

            User {
                user_id: format!("user-{i}"),
                name: format!("{first} {last}"),
                email: format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), i),
                status: if (1..=7).contains(&slot) {
                    UserStatus::Active
                } else {
                    UserStatus::Inactive
                },
                created_at: created_at_for(i),
                groups: member_of,
            }
        })
        .collect()
}

/// The in-memory directory.
pub struct MockDirectory {
    users: Mutex<Vec<User>>,
    read_delay: Duration,
    write_delay: Duration,

    fail_reads: AtomicBool,
    fail_mutations: AtomicBool,

    read_calls: AtomicU64,
    write_calls: AtomicU64,
    last_page_request: StdMutex<Option<PageRequest>>,
}

impl MockDirectory {
    /// Seed a directory from configuration.
    pub fn new(config: &DataConfig) -> Self {
        Self::with_users_and_delays(
            seed_users(config.user_count),
            Duration::from_millis(config.read_delay_ms),
            Duration::from_millis(config.write_delay_ms),
        )
    }

    /// A directory over explicit users with no simulated latency.
    pub fn with_users(users: Vec<User>) -> Self {
        Self::with_users_and_delays(users, Duration::ZERO, Duration::ZERO)
    }

    pub fn with_users_and_delays(users: Vec<User>, read_delay: Duration, write_delay: Duration) -> Self {
        Self {
            users: Mutex::new(users),
            read_delay,
            write_delay,
            fail_reads: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            read_calls: AtomicU64::new(0),
            write_calls: AtomicU64::new(0),
            last_page_request: StdMutex::new(None),
        }
    }

    /// Make every subsequent read fail until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent mutation fail until cleared.
    pub fn set_fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Number of page fetches the directory has served (or rejected).
    pub fn read_calls(&self) -> u64 {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Number of mutation calls the directory has seen.
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// The most recent page request, for asserting on requested parameters.
    pub fn last_page_request(&self) -> Option<PageRequest> {
        self.last_page_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub async fn user_count(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn get(&self, user_id: &str) -> Option<User> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn fetch_page(&self, request: &PageRequest) -> Result<UserPage, FetchError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_page_request
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(request.clone());

        if !self.read_delay.is_zero() {
            tokio::time::sleep(self.read_delay).await;
        }

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(FetchError::Transport("injected read failure".to_string()));
        }

        let users = self.users.lock().await;
        let needle = request.query.to_lowercase();

        let filtered: Vec<&User> = users
            .iter()
            .filter(|user| {
                needle.is_empty()
                    || user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .filter(|user| match request.status {
                StatusFilter::All => true,
                StatusFilter::Active => user.status == UserStatus::Active,
                StatusFilter::Inactive => user.status == UserStatus::Inactive,
            })
            .collect();

        let total_count = filtered.len();
        let start = (request.page.saturating_sub(1) as usize) * request.page_size as usize;
        let items: Vec<User> = filtered
            .into_iter()
            .skip(start)
            .take(request.page_size as usize)
            .cloned()
            .collect();

        debug!(
            page = request.page,
            page_size = request.page_size,
            total_count,
            returned = items.len(),
            "mock directory served page"
        );

        Ok(UserPage { items, total_count })
    }

    async fn update_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<StatusUpdate, MutationError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(MutationError::Transport(
                "injected mutation failure".to_string(),
            ));
        }

        let mut users = self.users.lock().await;
        let user = users
            .iter_mut()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| MutationError::NotFound(user_id.to_string()))?;

        user.status = status;

        Ok(StatusUpdate {
            user: user.clone(),
            message: format!("User status updated to {status}"),
        })
    }
}
