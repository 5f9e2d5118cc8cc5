mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = common::ensure_server().await?;
    let body: Value = reqwest::get(format!("{}/", server.base_url)).await?.json().await?;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["name"], json!("SaaS Admin API"));
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::get(format!("{}/health", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["status"], json!("degraded"));
    Ok(())
}

#[tokio::test]
async fn operations_require_a_caller_before_touching_the_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}{}", server.base_url, common::LIST))
        .json(&json!({ "skipPages": 0, "filter": {} }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], json!("UNAUTHORIZED"));
    assert_eq!(
        body["message"],
        json!("Only authenticated users are allowed to perform this operation")
    );
    Ok(())
}

#[tokio::test]
async fn malformed_bearer_tokens_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}{}", server.base_url, common::SET_ROLE))
        .bearer_auth("not-a-jwt")
        .json(&json!({ "id": "u1", "role": "ADMIN" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
