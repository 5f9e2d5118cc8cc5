mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use tokio::sync::Barrier;

use common::{user, TestApp, SET_ROLE};
use saas_admin_api::database::models::UserRole;
use saas_admin_api::database::InMemoryUserStore;
use saas_admin_api::users::{RoleChange, UserError, UserStore};

#[tokio::test]
async fn sole_owner_cannot_be_demoted() {
    let app = TestApp::new(vec![user("a", "alice", UserRole::Owner)]);

    for role in ["ADMIN", "EDITOR", "VIEWER"] {
        let (status, body) = app.post(SET_ROLE, Some("a"), json!({ "id": "a", "role": role })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("At least one OWNER account must remain."));
    }
    assert_eq!(app.store.get("a").await.unwrap().role, UserRole::Owner);
}

#[tokio::test]
async fn owner_promotion_then_demotion() {
    let app = TestApp::new(vec![
        user("a", "alice", UserRole::Owner),
        user("b", "bob", UserRole::Viewer),
    ]);

    let (status, _) = app.post(SET_ROLE, Some("a"), json!({ "id": "a", "role": "VIEWER" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(SET_ROLE, Some("a"), json!({ "id": "b", "role": "OWNER" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("OWNER"));
    assert_eq!(body["data"]["isAdmin"], json!(true));

    let (status, body) = app.post(SET_ROLE, Some("a"), json!({ "id": "a", "role": "VIEWER" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("VIEWER"));
    assert_eq!(body["data"]["isAdmin"], json!(false));
}

#[tokio::test]
async fn only_owners_assign_owner() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("ad", "adam", UserRole::Admin),
        user("v", "vera", UserRole::Viewer),
    ]);

    let (status, body) = app.post(SET_ROLE, Some("ad"), json!({ "id": "v", "role": "OWNER" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], json!("Only OWNER users can assign OWNER role."));
    assert_eq!(app.store.get("v").await.unwrap().role, UserRole::Viewer);

    // Admins may still move users between the other roles
    let (status, _) = app.post(SET_ROLE, Some("ad"), json!({ "id": "v", "role": "EDITOR" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_flag_tracks_role_after_every_update() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("t", "tom", UserRole::Viewer),
    ]);

    for role in ["ADMIN", "EDITOR", "OWNER", "VIEWER", "ADMIN"] {
        let (status, body) = app.post(SET_ROLE, Some("o"), json!({ "id": "t", "role": role })).await;
        assert_eq!(status, StatusCode::OK, "role {}", role);
        let stored = app.store.get("t").await.unwrap();
        assert_eq!(stored.role.as_str(), role);
        assert_eq!(stored.is_admin, stored.role.is_administrative());
        assert_eq!(body["data"]["isAdmin"], json!(stored.is_admin));
    }
}

#[tokio::test]
async fn checks_run_in_order() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("ad", "adam", UserRole::Admin),
        user("v", "vera", UserRole::Viewer),
    ]);

    // Validation beats a missing caller
    let (status, _) = app.post(SET_ROLE, None, json!({ "id": "v", "role": "ROOT" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.post(SET_ROLE, None, json!({ "id": "", "role": "VIEWER" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing caller beats a non-admin caller
    let (status, _) = app.post(SET_ROLE, None, json!({ "id": "missing", "role": "OWNER" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Non-admin caller beats a missing target
    let (status, _) = app.post(SET_ROLE, Some("v"), json!({ "id": "missing", "role": "OWNER" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Missing target beats the escalation rule
    let (status, body) = app.post(SET_ROLE, Some("ad"), json!({ "id": "missing", "role": "OWNER" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("User not found"));

    assert_eq!(app.store.writes(), 1);
}

#[tokio::test]
async fn refused_callers_never_write() {
    let app = TestApp::new(vec![
        user("o", "olivia", UserRole::Owner),
        user("e", "erin", UserRole::Editor),
        user("v", "vera", UserRole::Viewer),
    ]);

    for caller in [None, Some("e"), Some("v")] {
        let (status, _) = app.post(SET_ROLE, caller, json!({ "id": "v", "role": "ADMIN" })).await;
        assert!(status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN);
    }
    assert_eq!(app.store.writes(), 0);
    assert_eq!(app.store.get("v").await.unwrap().role, UserRole::Viewer);
}

#[tokio::test]
async fn owner_keeping_owner_role_is_allowed() {
    let app = TestApp::new(vec![user("o", "olivia", UserRole::Owner)]);
    let (status, body) = app.post(SET_ROLE, Some("o"), json!({ "id": "o", "role": "OWNER" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], json!("OWNER"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_owner_demotions_leave_one_owner() {
    for _ in 0..50 {
        let store = Arc::new(InMemoryUserStore::with_users(vec![
            user("o1", "olivia", UserRole::Owner),
            user("o2", "oscar", UserRole::Owner),
        ]));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["o1", "o2"]
            .into_iter()
            .map(|id| {
                let store = store.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    let change = RoleChange::new(UserRole::Viewer, Some(UserRole::Owner));
                    store.update_role(id, &change).await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results.iter().filter(|r| matches!(r, Err(UserError::LastOwner))).count(),
            1
        );

        let mut owners = 0;
        for id in ["o1", "o2"] {
            if store.get(id).await.unwrap().role == UserRole::Owner {
                owners += 1;
            }
        }
        assert_eq!(owners, 1);
    }
}
