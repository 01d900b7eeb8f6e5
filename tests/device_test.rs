//! Integration tests for device presence and bans.

mod helpers;

use axum::http::StatusCode;
use helpers::TestApp;

#[tokio::test]
async fn register_heartbeat_and_list() {
    let app = TestApp::new();
    app.login_admin().await;

    let response = app
        .request(
            "POST",
            "/api/devices",
            Some(serde_json::json!({"id": "dev-1", "device_name": "laptop"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("POST", "/api/devices/dev-1/heartbeat", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/devices", None).await;
    assert_eq!(response.data()["online_count"], 1);
    let devices = response.data()["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["device_name"], "laptop");
    assert_eq!(devices[0]["user_type"], "admin");
}

#[tokio::test]
async fn kick_requires_admin() {
    let app = TestApp::new();
    app.login_admin().await;
    app.create_manager("omar", "mgr-pass-1", 5).await;
    app.request(
        "POST",
        "/api/devices",
        Some(serde_json::json!({"id": "dev-1", "device_name": "laptop"})),
    )
    .await;
    app.logout().await;
    app.login_manager("mgr-pass-1").await;

    let response = app.request("DELETE", "/api/devices/dev-1", None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    app.logout().await;
    app.login_admin().await;
    let response = app.request("DELETE", "/api/devices/dev-1", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/devices", None).await;
    assert!(response.data()["devices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn banned_device_cannot_register_until_unbanned() {
    let app = TestApp::new();
    app.login_admin().await;

    let response = app
        .request(
            "POST",
            "/api/devices/bans",
            Some(serde_json::json!({
                "device_name": "laptop",
                "duration_minutes": 30,
                "reason": "abuse",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let ban_id = response.data()["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/devices",
            Some(serde_json::json!({"id": "dev-1", "device_name": "laptop"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("DELETE", &format!("/api/devices/bans/{ban_id}"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(
            "POST",
            "/api/devices",
            Some(serde_json::json!({"id": "dev-1", "device_name": "laptop"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn ban_listing_is_admin_only() {
    let app = TestApp::new();
    app.login_admin().await;
    app.create_manager("omar", "mgr-pass-1", 5).await;
    app.logout().await;
    app.login_manager("mgr-pass-1").await;

    let response = app.request("GET", "/api/devices/bans", None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            "POST",
            "/api/devices/bans",
            Some(serde_json::json!({"device_name": "x", "duration_minutes": 5})),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_endpoint_needs_no_session() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
}
