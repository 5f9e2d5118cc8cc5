use axum::Extension;
use serde::Serialize;

use crate::auth::{is_admin_user, CallerIdentity};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub caller: CallerIdentity,
    /// Whether the admin operations will accept this caller.
    pub is_admin_user: bool,
}

/// GET /api/auth/me - the caller as the admin guard sees it
pub async fn me_get(Extension(Caller(caller)): Extension<Caller>) -> ApiResult<MeResponse> {
    let caller = caller.ok_or_else(|| {
        ApiError::unauthorized("Only authenticated users are allowed to perform this operation")
    })?;

    Ok(ApiResponse::success(MeResponse {
        is_admin_user: is_admin_user(Some(&caller)),
        caller,
    }))
}
