//! Integration tests for the login, lockout, and session flow.

mod helpers;

use axum::http::StatusCode;
use helpers::{ADMIN_SECRET, TestApp};

#[tokio::test]
async fn admin_login_opens_a_session() {
    let app = TestApp::new();
    app.login_admin().await;

    let response = app.request("GET", "/api/auth/session", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["logged_in"], true);
    assert_eq!(response.data()["user_type"], "admin");
}

#[tokio::test]
async fn wrong_password_is_rejected_and_counted() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"password": "wrong", "role": "admin"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/api/auth/session", None).await;
    assert_eq!(response.data()["attempts_left"], 4);
    assert_eq!(response.data()["blocked"], false);
}

#[tokio::test]
async fn fifth_failure_locks_out_even_the_correct_secret() {
    let app = TestApp::new();

    for (i, wrong) in ["a", "b", "c", "d"].iter().enumerate() {
        let response = app
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({"password": wrong, "role": "admin"})),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "attempt {i}");
    }

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"password": "e", "role": "admin"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::LOCKED);

    // Correct credentials are also refused while blocked.
    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"password": ADMIN_SECRET, "role": "admin"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::LOCKED);

    let response = app.request("GET", "/api/auth/session", None).await;
    assert_eq!(response.data()["blocked"], true);
    assert_eq!(response.data()["block_minutes_left"], 15);
}

#[tokio::test]
async fn successful_login_resets_the_attempt_counter() {
    let app = TestApp::new();

    for wrong in ["a", "b"] {
        app.request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"password": wrong, "role": "admin"})),
        )
        .await;
    }
    app.login_admin().await;

    let response = app.request("GET", "/api/auth/session", None).await;
    assert_eq!(response.data()["attempts_left"], 5);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let app = TestApp::new();

    for path in ["/api/licenses", "/api/managers", "/api/devices", "/api/activity"] {
        let response = app.request("GET", path, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn logout_closes_the_session() {
    let app = TestApp::new();
    app.login_admin().await;
    app.logout().await;

    let response = app.request("GET", "/api/licenses", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn manager_login_path_resolves_against_the_roster() {
    let app = TestApp::new();
    app.login_admin().await;
    app.create_manager("omar", "mgr-pass-1", 5).await;
    app.logout().await;

    let response = app.login_manager("mgr-pass-1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["user_type"], "manager");
    assert_eq!(response.data()["manager_name"], "omar");

    // Wrong manager password is a uniform rejection.
    app.logout().await;
    let response = app.login_manager("nope").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_manager_cannot_log_in() {
    let app = TestApp::new();
    app.login_admin().await;
    let id = app.create_manager("omar", "mgr-pass-1", 5).await;

    let response = app
        .request(
            "PUT",
            &format!("/api/managers/{id}"),
            Some(serde_json::json!({"is_active": false})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    app.logout().await;

    let response = app.login_manager("mgr-pass-1").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_role_is_a_validation_error() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({"password": "x", "role": "root"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
