use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, CallerIdentity};
use crate::error::ApiError;
use crate::server::AppState;

/// Caller resolved for this request; `None` for anonymous requests and for
/// tokens whose user has since been deleted.
#[derive(Clone, Debug, Default)]
pub struct Caller(pub Option<CallerIdentity>);

/// Resolves the bearer token into a [`Caller`] extension.
///
/// Role and admin flag always come from the store, so a demotion takes
/// effect on the next request rather than when the token expires.
pub async fn caller_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match extract_jwt_from_headers(request.headers())? {
        Some(token) => resolve(&state, &token).await?,
        None => None,
    };

    request.extensions_mut().insert(Caller(caller));
    Ok(next.run(request).await)
}

async fn resolve(state: &AppState, token: &str) -> Result<Option<CallerIdentity>, ApiError> {
    let claims = validate_jwt(token, &state.config.security.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    let user = state.users.store().find_by_id(&claims.sub).await?;
    if user.is_none() {
        tracing::debug!(user_id = %claims.sub, "token subject no longer exists");
    }
    Ok(user.as_ref().map(CallerIdentity::from))
}

/// Extract JWT token from Authorization header. A missing header is an
/// anonymous request; a present but malformed one is rejected.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        Some(_) => Err(ApiError::unauthorized("Empty JWT token")),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}
