use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde_json::Value;

use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::server::AppState;
use crate::users::PaginatedUsers;

/// POST /api/operations/get-paginated-users
pub async fn get_paginated_users_post(
    State(state): State<AppState>,
    Extension(Caller(caller)): Extension<Caller>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<PaginatedUsers> {
    let args = super::json_args(body)?;
    let page = state.users.get_paginated_users(args, caller.as_ref()).await?;
    Ok(ApiResponse::success(page))
}
