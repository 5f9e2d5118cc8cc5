use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::database::manager::DatabaseError;

/// Closed role hierarchy. OWNER and ADMIN are administrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Owner,
    Admin,
    Editor,
    Viewer,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [UserRole::Owner, UserRole::Admin, UserRole::Editor, UserRole::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "OWNER",
            UserRole::Admin => "ADMIN",
            UserRole::Editor => "EDITOR",
            UserRole::Viewer => "VIEWER",
        }
    }

    /// Whether holding this role implies the `is_admin` flag.
    pub fn is_administrative(&self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Billing state of a user, owned by the payment subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    CancelAtPeriodEnd,
    Deleted,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::CancelAtPeriodEnd,
        SubscriptionStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::CancelAtPeriodEnd => "cancel_at_period_end",
            SubscriptionStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown subscription status '{}'", s))
    }
}

/// The user projection this service reads and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub subscription_status: Option<SubscriptionStatus>,
    pub payment_processor_user_id: Option<String>,
    pub is_admin: bool,
    pub role: UserRole,
}

/// Raw `users` row; enum columns are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub subscription_status: Option<String>,
    pub payment_processor_user_id: Option<String>,
    pub is_admin: bool,
    pub role: String,
}

impl UserRow {
    pub const COLUMNS: [&'static str; 7] = [
        "id",
        "email",
        "username",
        "subscription_status",
        "payment_processor_user_id",
        "is_admin",
        "role",
    ];
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(|e| DatabaseError::Decode(format!("users.role for {}: {}", row.id, e)))?;
        let subscription_status = row
            .subscription_status
            .as_deref()
            .map(str::parse::<SubscriptionStatus>)
            .transpose()
            .map_err(|e| DatabaseError::Decode(format!("users.subscription_status for {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            email: row.email,
            username: row.username,
            subscription_status,
            payment_processor_user_id: row.payment_processor_user_id,
            is_admin: row.is_admin,
            role,
        })
    }
}
