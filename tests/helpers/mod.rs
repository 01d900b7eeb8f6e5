//! Shared test helpers for integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use keydesk_api::state::AppState;
use keydesk_auth::{ManagerRoster, SessionGuard};
use keydesk_core::config::AppConfig;
use keydesk_core::traits::{KeyValueStore, RecordStore};
use keydesk_remote::{MemoryRecordStore, MirrorStats};
use keydesk_service::{ActivityLogger, DashboardService, PresenceService};
use keydesk_store::MemoryStore;

/// The configured admin secret used across tests.
pub const ADMIN_SECRET: &str = "780431";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The in-memory record store, for direct assertions
    pub records: Arc<dyn RecordStore>,
}

impl TestApp {
    /// Create a new test application over in-memory stores
    pub fn new() -> Self {
        let config = AppConfig::default();

        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());

        let mut guard =
            SessionGuard::new(Arc::clone(&kv), &config.security).expect("Failed to build guard");
        guard.check_block_status().expect("Block check failed");
        guard.restore_session().expect("Restore failed");
        let session = Arc::new(Mutex::new(guard));

        let roster = Arc::new(Mutex::new(
            ManagerRoster::load(Arc::clone(&kv)).expect("Failed to load roster"),
        ));

        let activity = Arc::new(ActivityLogger::new(Arc::clone(&records)));
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&records),
            Arc::clone(&roster),
            ActivityLogger::new(Arc::clone(&records)),
        ));
        let presence = Arc::new(PresenceService::new(
            Arc::clone(&records),
            config.presence.clone(),
        ));
        let mirrors = Arc::new(MirrorStats::new(&config.remote).expect("Failed to build mirrors"));

        let app_state = AppState {
            config: Arc::new(config),
            session,
            roster,
            records: Arc::clone(&records),
            dashboard,
            presence,
            activity,
            mirrors,
        };

        let router = keydesk_api::router::build_router(app_state);

        Self { router, records }
    }

    /// Log in on the admin path; panics on failure
    pub async fn login_admin(&self) {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({
                    "password": ADMIN_SECRET,
                    "role": "admin",
                })),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Admin login failed: {:?}",
            response.body
        );
    }

    /// Log in on the manager path with the given password
    pub async fn login_manager(&self, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "password": password,
                "role": "manager",
            })),
        )
        .await
    }

    /// Log out the current session
    pub async fn logout(&self) {
        let response = self.request("POST", "/api/auth/logout", None).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    /// Create a manager via the API (requires an admin session); returns its id
    pub async fn create_manager(&self, name: &str, password: &str, max_licenses: u32) -> String {
        let response = self
            .request(
                "POST",
                "/api/managers",
                Some(serde_json::json!({
                    "name": name,
                    "password": password,
                    "max_licenses": max_licenses,
                })),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Manager creation failed: {:?}",
            response.body
        );
        response.data()["id"].as_str().expect("No manager id").to_string()
    }

    /// Create a license via the API
    pub async fn create_license(&self, key: &str, user_name: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/licenses",
            Some(serde_json::json!({
                "key": key,
                "user_name": user_name,
                "expires_at": "2030-01-01",
                "notes": "",
            })),
        )
        .await
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            text,
            content_type,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body (Null when the body is not JSON)
    pub body: Value,
    /// Raw body text
    pub text: String,
    /// Content-Type header value
    pub content_type: Option<String>,
}

impl TestResponse {
    /// The `data` field of the standard success envelope
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }
}
