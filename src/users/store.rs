use async_trait::async_trait;
use serde::Serialize;

use crate::database::manager::DatabaseError;
use crate::database::models::User;
use crate::users::args::UserFilter;
use crate::users::error::UserError;
use crate::users::rules::RoleChange;

/// One page of users plus the number of users matching the filter overall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
}

/// Persistence port for the user-management operations.
///
/// Implementations must read a page and its total from one consistent
/// snapshot, and must apply a role change atomically with the checks in
/// [`RoleChange::check`] so two concurrent demotions cannot both see a
/// second OWNER.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError>;

    /// Users matching `filter` ordered by `(username, id)`, skipping `skip`.
    async fn find_page(&self, filter: &UserFilter, skip: i64, take: i64) -> Result<UserPage, DatabaseError>;

    /// Returns [`UserError::NotFound`] when `id` does not exist, otherwise
    /// whatever [`RoleChange::check`] decides, otherwise the updated user.
    async fn update_role(&self, id: &str, change: &RoleChange) -> Result<User, UserError>;

    /// Legacy toggle. Writes `is_admin` and the collapsed role without the OWNER
    /// rules; `None` when `id` does not exist.
    async fn set_admin_flag(&self, id: &str, is_admin: bool) -> Result<Option<User>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}
