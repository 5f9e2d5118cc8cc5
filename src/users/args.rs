//! Argument schemas for the user-management operations.
//!
//! Operations receive raw JSON and must reject malformed input before they
//! touch authorization or the database, so every schema is parsed through
//! [`ensure_args`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::models::{SubscriptionStatus, User, UserRole};
use crate::filter::escape_like;
use crate::users::error::UserError;

/// Rows per page of the user listing.
pub const PAGE_SIZE: i64 = 10;

/// Semantic checks that run after the JSON shape has been accepted.
pub trait Validate {
    fn validate(&self) -> Result<(), UserError>;
}

/// Parse and validate raw operation arguments.
pub fn ensure_args<T>(raw: Value) -> Result<T, UserError>
where
    T: DeserializeOwned + Validate,
{
    let args: T = serde_json::from_value(raw)
        .map_err(|e| UserError::validation(format!("Invalid arguments: {}", e)))?;
    args.validate()?;
    Ok(args)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_in: Option<Vec<UserRole>>,
    /// `None` members select users without any subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_status_in: Option<Vec<Option<SubscriptionStatus>>>,
}

impl UserFilter {
    /// WHERE document for the `users` table. Empty role or status lists do
    /// not restrict.
    pub fn to_where(&self) -> Value {
        let mut conditions = Vec::new();

        if let Some(needle) = &self.email_contains {
            conditions.push(json!({ "email": { "$ilike": format!("%{}%", escape_like(needle)) } }));
        }
        if let Some(is_admin) = self.is_admin {
            conditions.push(json!({ "is_admin": is_admin }));
        }
        if let Some(roles) = self.role_in.as_ref().filter(|r| !r.is_empty()) {
            let roles: Vec<&str> = roles.iter().map(UserRole::as_str).collect();
            conditions.push(json!({ "role": { "$in": roles } }));
        }
        if let Some(statuses) = self.subscription_status_in.as_ref().filter(|s| !s.is_empty()) {
            // A null member turns into `OR subscription_status IS NULL`
            let statuses: Vec<Value> = statuses
                .iter()
                .map(|s| s.map_or(Value::Null, |s| Value::from(s.as_str())))
                .collect();
            conditions.push(json!({ "subscription_status": { "$in": statuses } }));
        }

        json!({ "$and": conditions })
    }

    /// The same predicate as [`Self::to_where`], evaluated in memory.
    pub fn matches(&self, user: &User) -> bool {
        if let Some(needle) = &self.email_contains {
            if !user.email.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(is_admin) = self.is_admin {
            if user.is_admin != is_admin {
                return false;
            }
        }
        if let Some(roles) = self.role_in.as_ref().filter(|r| !r.is_empty()) {
            if !roles.contains(&user.role) {
                return false;
            }
        }
        if let Some(statuses) = self.subscription_status_in.as_ref().filter(|s| !s.is_empty()) {
            if !statuses.contains(&user.subscription_status) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPaginatedUsersArgs {
    pub skip_pages: i64,
    pub filter: UserFilter,
}

impl GetPaginatedUsersArgs {
    pub fn offset(&self) -> i64 {
        self.skip_pages * PAGE_SIZE
    }
}

impl Validate for GetPaginatedUsersArgs {
    fn validate(&self) -> Result<(), UserError> {
        if self.skip_pages < 0 {
            return Err(UserError::invalid_field("skipPages", "must be a non-negative integer"));
        }
        if self.skip_pages.checked_mul(PAGE_SIZE).is_none() {
            return Err(UserError::invalid_field("skipPages", "is too large"));
        }
        if self.filter.email_contains.as_deref().is_some_and(str::is_empty) {
            return Err(UserError::invalid_field("filter.emailContains", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRoleArgs {
    pub id: String,
    pub role: UserRole,
}

impl Validate for UpdateUserRoleArgs {
    fn validate(&self) -> Result<(), UserError> {
        require_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserAdminArgs {
    pub id: String,
    pub is_admin: bool,
}

impl Validate for UpdateUserAdminArgs {
    fn validate(&self) -> Result<(), UserError> {
        require_id(&self.id)
    }
}

fn require_id(id: &str) -> Result<(), UserError> {
    if id.is_empty() {
        return Err(UserError::invalid_field("id", "must not be empty"));
    }
    Ok(())
}
