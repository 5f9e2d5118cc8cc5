use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::auth::{is_admin_user, CallerIdentity};
use crate::database::models::User;
use crate::users::args::{
    ensure_args, GetPaginatedUsersArgs, UpdateUserAdminArgs, UpdateUserRoleArgs, PAGE_SIZE,
};
use crate::users::error::UserError;
use crate::users::rules::RoleChange;
use crate::users::store::UserStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedUsers {
    pub users: Vec<User>,
    pub total_pages: i64,
}

/// The three admin operations. Every operation checks, in order: argument
/// shape, presence of a caller, the admin guard, and only then touches the
/// store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    audit: bool,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, audit: bool) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub async fn get_paginated_users(
        &self,
        raw_args: Value,
        caller: Option<&CallerIdentity>,
    ) -> Result<PaginatedUsers, UserError> {
        let args: GetPaginatedUsersArgs = ensure_args(raw_args)?;
        authorize(caller)?;

        let page = self.store.find_page(&args.filter, args.offset(), PAGE_SIZE).await?;
        tracing::debug!(
            skip_pages = args.skip_pages,
            returned = page.users.len(),
            total = page.total,
            "listed users"
        );

        Ok(PaginatedUsers {
            users: page.users,
            total_pages: total_pages(page.total),
        })
    }

    pub async fn update_user_role_by_id(
        &self,
        raw_args: Value,
        caller: Option<&CallerIdentity>,
    ) -> Result<User, UserError> {
        let args: UpdateUserRoleArgs = ensure_args(raw_args)?;
        let caller = authorize(caller)?;

        let change = RoleChange::new(args.role, caller.role);
        match self.store.update_role(&args.id, &change).await {
            Ok(user) => {
                if self.audit {
                    tracing::info!(
                        target: "audit",
                        caller = %caller.id,
                        target_user = %user.id,
                        role = %user.role,
                        is_admin = user.is_admin,
                        "role updated"
                    );
                }
                Ok(user)
            }
            Err(e) => {
                if self.audit && matches!(e, UserError::LastOwner | UserError::OwnerAssignmentForbidden) {
                    tracing::warn!(
                        target: "audit",
                        caller = %caller.id,
                        target_user = %args.id,
                        role = %args.role,
                        "role update refused: {}", e
                    );
                }
                Err(e)
            }
        }
    }

    /// Legacy two-state toggle kept for older admin screens. It writes
    /// ADMIN or VIEWER and bypasses the OWNER rules entirely.
    pub async fn update_is_user_admin_by_id(
        &self,
        raw_args: Value,
        caller: Option<&CallerIdentity>,
    ) -> Result<User, UserError> {
        let args: UpdateUserAdminArgs = ensure_args(raw_args)?;
        let caller = authorize(caller)?;

        let user = self
            .store
            .set_admin_flag(&args.id, args.is_admin)
            .await?
            .ok_or(UserError::NotFound)?;

        if self.audit {
            tracing::info!(
                target: "audit",
                caller = %caller.id,
                target_user = %user.id,
                role = %user.role,
                is_admin = user.is_admin,
                "admin flag updated"
            );
        }
        Ok(user)
    }
}

fn authorize(caller: Option<&CallerIdentity>) -> Result<&CallerIdentity, UserError> {
    let caller = caller.ok_or(UserError::Unauthenticated)?;
    if !is_admin_user(Some(caller)) {
        return Err(UserError::NotAdmin);
    }
    Ok(caller)
}

/// `ceil(total / PAGE_SIZE)`; zero matches means zero pages.
pub fn total_pages(total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (total + PAGE_SIZE - 1) / PAGE_SIZE
}
