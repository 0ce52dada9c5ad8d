//! Token Cache Guard service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use token_cache_guard::api::ClientRateLimiter;
use token_cache_guard::auth::JwtKeys;
use token_cache_guard::config::{Config, StoreBackend};
use token_cache_guard::{
    create_router, spawn_cleanup_task, AppState, KvStore, MemoryStore, RedisStore,
};

/// Startup: tracing, config, store connect, sweep task (in-process store
/// only), router. Shutdown on SIGINT/SIGTERM aborts the sweep and releases
/// the store connection.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_cache_guard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Token Cache Guard");

    let config = Config::from_env();
    info!(
        backend = ?config.backend,
        default_ttl = config.default_ttl,
        port = config.server_port,
        "Configuration loaded"
    );

    let secret = config
        .jwt_secret
        .as_deref()
        .context("JWT_SECRET_KEY must be set")?;
    let jwt = JwtKeys::from_secret(secret.as_bytes())?;

    let mut cleanup_handle = None;
    let state = match config.backend {
        StoreBackend::Memory => {
            let memory = MemoryStore::new(config.max_entries);
            cleanup_handle = Some(spawn_cleanup_task(memory.clone(), config.cleanup_period()));
            AppState::with_memory_store(memory, jwt, config.default_ttl)
        }
        StoreBackend::Redis => {
            let redis =
                RedisStore::open(&config.redis_connection_url(), config.reconnect_settings())?;
            AppState::new(Arc::new(redis), jwt, config.default_ttl)
        }
    };
    let limiter = ClientRateLimiter::new(config.rate_limit_max, config.rate_limit_window());
    if limiter.is_none() {
        warn!("Rate limiting disabled");
    }
    let state = state
        .with_cors_origins(&config.cors_allowed_origins)
        .with_rate_limiter(limiter);

    state
        .store
        .connect()
        .await
        .context("failed to connect to key-value store")?;
    info!(store = state.store.name(), "Key-value store ready");

    let store = state.store.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Expiry sweep task aborted");
    }
    store.close().await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
