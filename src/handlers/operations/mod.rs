// handlers/operations/mod.rs - admin user-management RPC endpoints
//
// Each operation is a POST whose JSON body is the argument object. The body
// is passed to the service untouched so argument validation always runs
// before the caller checks.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;

pub mod get_paginated_users;
pub mod update_is_user_admin_by_id;
pub mod update_user_role_by_id;

pub use get_paginated_users::get_paginated_users_post;
pub use update_is_user_admin_by_id::update_is_user_admin_by_id_post;
pub use update_user_role_by_id::update_user_role_by_id_post;

/// Turn axum's JSON rejection into the API's own 400 body.
fn json_args(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}
