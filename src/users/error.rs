use std::collections::HashMap;
use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Failures of the user-management operations, in the order they are checked.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    #[error("Only authenticated users are allowed to perform this operation")]
    Unauthenticated,

    #[error("Only admins are allowed to perform this operation")]
    NotAdmin,

    #[error("User not found")]
    NotFound,

    #[error("At least one OWNER account must remain.")]
    LastOwner,

    #[error("Only OWNER users can assign OWNER role.")]
    OwnerAssignmentForbidden,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl UserError {
    pub fn validation(message: impl Into<String>) -> Self {
        UserError::Validation { message: message.into(), field_errors: None }
    }

    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), problem.into());
        UserError::Validation {
            message: "Invalid arguments".to_string(),
            field_errors: Some(field_errors),
        }
    }
}
