use serde::{Deserialize, Serialize};

use crate::database::models::{User, UserRole};

/// Identity of whoever is calling an operation, as resolved from a verified
/// session. Both privilege fields are optional because session records from
/// older identity providers may carry neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub id: String,
    pub role: Option<UserRole>,
    pub is_admin: Option<bool>,
}

impl From<&User> for CallerIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: Some(user.role),
            is_admin: Some(user.is_admin),
        }
    }
}

/// Admin guard shared by every user-management operation.
///
/// True when a caller is present and either carries the legacy admin flag or
/// holds an administrative role (ADMIN or OWNER).
pub fn is_admin_user(caller: Option<&CallerIdentity>) -> bool {
    let Some(caller) = caller else {
        return false;
    };
    if caller.is_admin == Some(true) {
        return true;
    }
    caller.role.is_some_and(|role| role.is_administrative())
}
