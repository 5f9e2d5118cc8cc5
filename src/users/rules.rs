use crate::database::models::UserRole;
use crate::users::error::UserError;

/// A requested role assignment together with the role of whoever asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChange {
    pub role: UserRole,
    pub caller_role: Option<UserRole>,
}

impl RoleChange {
    pub fn new(role: UserRole, caller_role: Option<UserRole>) -> Self {
        Self { role, caller_role }
    }

    /// Moving an OWNER to any other role needs the current OWNER count.
    pub fn demotes_owner(&self, current: UserRole) -> bool {
        current == UserRole::Owner && self.role != UserRole::Owner
    }

    /// Business rules applied once the target is known to exist.
    ///
    /// `owner_count` is only consulted when [`Self::demotes_owner`] holds;
    /// stores pass `None` otherwise.
    pub fn check(&self, current: UserRole, owner_count: Option<i64>) -> Result<(), UserError> {
        if self.demotes_owner(current) && owner_count.unwrap_or(0) <= 1 {
            return Err(UserError::LastOwner);
        }
        if self.role == UserRole::Owner && self.caller_role != Some(UserRole::Owner) {
            return Err(UserError::OwnerAssignmentForbidden);
        }
        Ok(())
    }

    /// Value of `is_admin` written alongside the new role.
    pub fn is_admin(&self) -> bool {
        self.role.is_administrative()
    }
}

/// Role written by the legacy admin-flag toggle, which only knows two states.
pub fn legacy_role_for(is_admin: bool) -> UserRole {
    if is_admin {
        UserRole::Admin
    } else {
        UserRole::Viewer
    }
}
