mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{user, TestApp, SET_ADMIN};
use saas_admin_api::database::models::UserRole;

#[tokio::test]
async fn flag_collapses_role_to_admin_or_viewer() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("e", "erin", UserRole::Editor),
    ]);

    let (status, body) = app.post(SET_ADMIN, Some("o"), json!({ "id": "e", "isAdmin": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("ADMIN"));
    assert_eq!(body["data"]["isAdmin"], json!(true));

    let (status, body) = app.post(SET_ADMIN, Some("o"), json!({ "id": "e", "isAdmin": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("VIEWER"));
    assert_eq!(body["data"]["isAdmin"], json!(false));
}

#[tokio::test]
async fn legacy_path_skips_owner_rules() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("ad", "adam", UserRole::Admin),
    ]);

    // The strict operation refuses this...
    let (status, _) = app
        .post(common::SET_ROLE, Some("ad"), json!({ "id": "o", "role": "VIEWER" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // ...the legacy one does not, and leaves no OWNER behind
    let (status, body) = app.post(SET_ADMIN, Some("ad"), json!({ "id": "o", "isAdmin": false })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("VIEWER"));
    assert_eq!(app.store.get("o").await.unwrap().role, UserRole::Viewer);
}

#[tokio::test]
async fn missing_target_is_not_found() {
    let app = TestApp::new(vec![user("o", "olivia", UserRole::Owner)]);
    let (status, body) = app.post(SET_ADMIN, Some("o"), json!({ "id": "nope", "isAdmin": true })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn validation_and_guard_apply() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("v", "vera", UserRole::Viewer),
    ]);

    let (status, _) = app.post(SET_ADMIN, None, json!({ "id": "v", "isAdmin": "yes" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(SET_ADMIN, None, json!({ "id": "v", "isAdmin": true })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post(SET_ADMIN, Some("v"), json!({ "id": "v", "isAdmin": true })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(app.store.writes(), 0);
    assert_eq!(app.store.get("v").await.unwrap().role, UserRole::Viewer);
}
