//! Route definitions for the KeyDesk HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`. The
//! router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(license_routes())
        .merge(manager_routes())
        .merge(device_routes())
        .merge(activity_routes())
        .merge(stats_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Auth endpoints: login, logout, session status
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/session", get(handlers::auth::session_status))
}

/// License CRUD, HWID reset, archive flow, export
fn license_routes() -> Router<AppState> {
    Router::new()
        .route("/licenses", get(handlers::license::list))
        .route("/licenses", post(handlers::license::create))
        .route("/licenses/stats", get(handlers::license::stats))
        .route("/licenses/export", get(handlers::license::export))
        .route("/licenses/deleted", get(handlers::license::deleted))
        .route(
            "/licenses/deleted/{id}/restore",
            post(handlers::license::restore),
        )
        .route("/licenses/deleted/{id}", delete(handlers::license::purge))
        .route("/licenses/{key}", put(handlers::license::update))
        .route("/licenses/{key}", delete(handlers::license::delete))
        .route("/licenses/{key}/reset", post(handlers::license::reset_hwid))
        .route("/licenses/{key}/archive", post(handlers::license::archive))
}

/// Manager roster management (admin)
fn manager_routes() -> Router<AppState> {
    Router::new()
        .route("/managers", get(handlers::manager::list))
        .route("/managers", post(handlers::manager::create))
        .route("/managers/{id}", put(handlers::manager::update))
        .route("/managers/{id}", delete(handlers::manager::delete))
        .route("/managers/{id}/quota", get(handlers::manager::quota))
}

/// Device presence and bans
fn device_routes() -> Router<AppState> {
    Router::new()
        .route("/devices", get(handlers::device::list))
        .route("/devices", post(handlers::device::register))
        .route("/devices/bans", get(handlers::device::bans))
        .route("/devices/bans", post(handlers::device::ban))
        .route("/devices/bans/{id}", delete(handlers::device::unban))
        .route(
            "/devices/{id}/heartbeat",
            post(handlers::device::heartbeat),
        )
        .route("/devices/{id}", delete(handlers::device::kick))
}

/// Activity log (admin)
fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/activity", get(handlers::activity::list))
        .route("/activity", delete(handlers::activity::clear))
}

/// Mirror-database stats
fn stats_routes() -> Router<AppState> {
    Router::new().route(
        "/stats/mirrors/{index}",
        get(handlers::stats::mirror_count),
    )
}

/// Health check (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use axum::http::{HeaderValue, Method};
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(cors_config.max_age_seconds));

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}
