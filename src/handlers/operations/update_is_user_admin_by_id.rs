use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde_json::Value;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::server::AppState;

/// POST /api/operations/update-is-user-admin-by-id
///
/// Legacy two-state toggle; see `UserService::update_is_user_admin_by_id`.
pub async fn update_is_user_admin_by_id_post(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<User> {
    let args = super::json_args(body)?;
    let user = state.users.update_is_user_admin_by_id(args, caller.as_ref()).await?;
    Ok(ApiResponse::success(user))
}
