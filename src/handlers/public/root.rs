use axum::response::Json;
use serde_json::{json, Value};

/// GET / - service descriptor
pub async fn root_get() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "SaaS Admin API",
            "version": version,
            "description": "Admin user management for the multi-tenant SaaS platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/me (bearer token)",
                "operations": "/api/operations/get-paginated-users, /api/operations/update-user-role-by-id, /api/operations/update-is-user-admin-by-id (admin)",
            }
        }
    }))
}
