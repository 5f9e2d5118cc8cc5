use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{User, UserRole};
use crate::users::rules::{legacy_role_for, RoleChange};
use crate::users::{UserError, UserFilter, UserPage, UserStore};

/// [`UserStore`] held in process memory.
///
/// Backs the router tests; `admin` always talks to Postgres.
/// Ordering matches the Postgres store: byte-wise `(username, id)`.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<String, User>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    offline: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(map),
            ..Self::default()
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn get(&self, id: &str) -> Option<User> {
        self.users.read().await.get(id).cloned()
    }

    /// Number of store calls that read users.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of store calls that attempted a write.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate an unreachable database.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn available(&self) -> Result<(), DatabaseError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.available()?;
        Ok(self.get(id).await)
    }

    async fn find_page(&self, filter: &UserFilter, skip: i64, take: i64) -> Result<UserPage, DatabaseError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.available()?;

        let users = self.users.read().await;
        let mut matching: Vec<&User> = users.values().filter(|u| filter.matches(u)).collect();
        matching.sort_by(|a, b| (&a.username, &a.id).cmp(&(&b.username, &b.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(take).unwrap_or(0))
            .cloned()
            .collect();

        Ok(UserPage { users: page, total })
    }

    async fn update_role(&self, id: &str, change: &RoleChange) -> Result<User, UserError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.available()?;

        let mut users = self.users.write().await;
        let current = users.get(id).ok_or(UserError::NotFound)?.role;

        let owner_count = change
            .demotes_owner(current)
            .then(|| users.values().filter(|u| u.role == UserRole::Owner).count() as i64);
        change.check(current, owner_count)?;

        let user = users.get_mut(id).ok_or(UserError::NotFound)?;
        user.role = change.role;
        user.is_admin = change.is_admin();
        Ok(user.clone())
    }

    async fn set_admin_flag(&self, id: &str, is_admin: bool) -> Result<Option<User>, DatabaseError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.available()?;

        let mut users = self.users.write().await;
        Ok(users.get_mut(id).map(|user| {
            user.is_admin = is_admin;
            user.role = legacy_role_for(is_admin);
            user.clone()
        }))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, username: &str, role: UserRole) -> User {
        User {
            id: id.to_string(),
            email: format!("{}@example.com", username),
            username: username.to_string(),
            subscription_status: None,
            payment_processor_user_id: None,
            is_admin: role.is_administrative(),
            role,
        }
    }

    #[tokio::test]
    async fn pages_are_ordered_by_username_then_id() {
        let store = InMemoryUserStore::with_users(vec![
            user("3", "bob", UserRole::Viewer),
            user("2", "alice", UserRole::Viewer),
            user("1", "bob", UserRole::Viewer),
            user("4", "Zed", UserRole::Viewer),
        ]);
        let page = store.find_page(&UserFilter::default(), 0, 10).await.unwrap();
        let ids: Vec<&str> = page.users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "2", "1", "3"]);
        assert_eq!(page.total, 4);

        let page = store.find_page(&UserFilter::default(), 3, 10).await.unwrap();
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn refused_role_change_leaves_state_untouched() {
        let store = InMemoryUserStore::with_users(vec![user("o", "owner", UserRole::Owner)]);
        let change = RoleChange::new(UserRole::Viewer, Some(UserRole::Owner));
        assert!(matches!(store.update_role("o", &change).await, Err(UserError::LastOwner)));
        assert_eq!(store.get("o").await.unwrap().role, UserRole::Owner);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn legacy_flag_overwrites_owner() {
        let store = InMemoryUserStore::with_users(vec![user("o", "owner", UserRole::Owner)]);
        let updated = store.set_admin_flag("o", false).await.unwrap().unwrap();
        assert_eq!(updated.role, UserRole::Viewer);
        assert!(!updated.is_admin);
        assert!(store.set_admin_flag("missing", true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = InMemoryUserStore::new();
        store.set_offline(true);
        let err = store.ping().await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
