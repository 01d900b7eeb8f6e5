//! KeyDesk Server — License Key Administration Console
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use keydesk_api::state::AppState;
use keydesk_auth::{ManagerRoster, SessionGuard};
use keydesk_core::config::AppConfig;
use keydesk_core::error::AppError;
use keydesk_core::traits::{KeyValueStore, RecordStore};
use keydesk_remote::{HttpRecordStore, MirrorStats};
use keydesk_service::{ActivityLogger, DashboardService, PresenceService};
use keydesk_store::FileStore;

#[tokio::main]
async fn main() {
    let env = std::env::var("KEYDESK_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting KeyDesk v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Local persistent store ───────────────────────────
    let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.store.path)?);
    tracing::info!(path = %config.store.path, "Local store opened");

    // ── Step 2: Remote record store + mirrors ────────────────────
    let records: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::new(&config.remote)?);
    let mirrors = Arc::new(MirrorStats::new(&config.remote)?);
    tracing::info!(
        base_url = %config.remote.base_url,
        mirrors = mirrors.mirror_count(),
        "Record store client ready"
    );

    // ── Step 3: Auth state machines ──────────────────────────────
    let mut guard = SessionGuard::new(Arc::clone(&kv), &config.security)?;
    guard.check_block_status()?;
    guard.restore_session()?;
    let session = Arc::new(Mutex::new(guard));

    let roster = Arc::new(Mutex::new(ManagerRoster::load(Arc::clone(&kv))?));
    tracing::info!(
        managers = roster.lock().map(|r| r.managers().len()).unwrap_or(0),
        "Auth state initialized"
    );

    // ── Step 4: Services ─────────────────────────────────────────
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

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Background tasks ─────────────────────────────────
    // Session countdown: one tick per second while logged in.
    let tick_session = Arc::clone(&session);
    let mut tick_shutdown = shutdown_rx.clone();
    let tick_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let expired = {
                        let mut guard = tick_session.lock().unwrap_or_else(|e| e.into_inner());
                        guard.tick().unwrap_or(false)
                    };
                    if expired {
                        tracing::info!("Console session timed out");
                    }
                }
                _ = tick_shutdown.changed() => break,
            }
        }
    });

    // Presence sweep: purge stale devices and expired bans.
    let sweep_presence = Arc::clone(&presence);
    let sweep_interval = config.presence.sweep_interval_seconds;
    let mut sweep_shutdown = shutdown_rx.clone();
    let sweep_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval.max(1)));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = sweep_presence.sweep().await {
                        tracing::warn!(error = %e, "Presence sweep failed");
                    }
                }
                _ = sweep_shutdown.changed() => break,
            }
        }
    });

    // ── Step 7: Build and start HTTP server ──────────────────────
    let app_state = AppState {
        config: Arc::new(config.clone()),
        session,
        roster,
        records,
        dashboard,
        presence,
        activity,
        mirrors,
    };

    let app = keydesk_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("KeyDesk server listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    let _ = tokio::time::timeout(Duration::from_secs(5), tick_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), sweep_handle).await;

    tracing::info!("KeyDesk server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
