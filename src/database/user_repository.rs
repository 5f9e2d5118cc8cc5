use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{User, UserRole, UserRow};
use crate::database::repository::Repository;
use crate::filter::FilterData;
use crate::users::rules::{legacy_role_for, RoleChange};
use crate::users::{UserError, UserFilter, UserPage, UserStore};

const USERS_TABLE: &str = "users";
const USER_ORDER: &str = "username asc, id asc";
const RETURNING: &str = "id, email, username, subscription_status, payment_processor_user_id, is_admin, role";

/// Serialises role changes across the cluster so the OWNER count read inside
/// one change cannot be invalidated by another.
const ROLE_CHANGE_LOCK: i64 = 0x7573_6572_726f_6c65;

/// Postgres-backed [`UserStore`].
pub struct PgUserRepository {
    rows: Repository<UserRow>,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rows: Repository::new(USERS_TABLE, pool),
        }
    }

    fn pool(&self) -> &PgPool {
        self.rows.pool()
    }

    fn columns() -> Vec<String> {
        UserRow::COLUMNS.iter().map(|c| c.to_string()).collect()
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let row = self
            .rows
            .select_one(FilterData {
                select: Some(Self::columns()),
                where_clause: Some(json!({ "id": id })),
                limit: Some(1),
                ..Default::default()
            })
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_page(&self, filter: &UserFilter, skip: i64, take: i64) -> Result<UserPage, DatabaseError> {
        let (rows, total) = self
            .rows
            .select_page(FilterData {
                select: Some(Self::columns()),
                where_clause: Some(filter.to_where()),
                order: Some(json!(USER_ORDER)),
                limit: Some(take),
                offset: Some(skip),
            })
            .await?;

        let users = rows.into_iter().map(User::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(UserPage { users, total })
    }

    async fn update_role(&self, id: &str, change: &RoleChange) -> Result<User, UserError> {
        let mut tx = self.pool().begin().await.map_err(DatabaseError::from)?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ROLE_CHANGE_LOCK)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        let current: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        let current = current
            .ok_or(UserError::NotFound)?
            .parse::<UserRole>()
            .map_err(|e| DatabaseError::Decode(format!("users.role for {}: {}", id, e)))?;

        let owner_count = if change.demotes_owner(current) {
            let owners: Vec<String> = sqlx::query_scalar("SELECT id FROM users WHERE role = $1 FOR UPDATE")
                .bind(UserRole::Owner.as_str())
                .fetch_all(&mut *tx)
                .await
                .map_err(DatabaseError::from)?;
            Some(owners.len() as i64)
        } else {
            None
        };

        // Dropping the transaction on a refused change rolls it back
        change.check(current, owner_count)?;

        let row: UserRow = sqlx::query_as(&format!(
            "UPDATE users SET role = $2, is_admin = $3, updated_at = now() WHERE id = $1 RETURNING {}",
            RETURNING
        ))
        .bind(id)
        .bind(change.role.as_str())
        .bind(change.is_admin())
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(User::try_from(row)?)
    }

    async fn set_admin_flag(&self, id: &str, is_admin: bool) -> Result<Option<User>, DatabaseError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET is_admin = $2, role = $3, updated_at = now() WHERE id = $1 RETURNING {}",
            RETURNING
        ))
        .bind(id)
        .bind(is_admin)
        .bind(legacy_role_for(is_admin).as_str())
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(self.pool()).await
    }
}
