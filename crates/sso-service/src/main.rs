//! SSO Ticket Service
//!
//! Owns the store connection pool backing ticket issuance and validation.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize tracing (`RUST_LOG` overrides `SSO_LOG_LEVEL`)
//! 3. Install the Prometheus exporter
//! 4. Open the store pool; an unreachable store aborts startup
//! 5. Wait for shutdown signal, then close the pool

#![warn(clippy::pedantic)]

use metrics_exporter_prometheus::PrometheusBuilder;
use sso_service::config::Config;
use sso_service::store::{RedisConnector, StoreClient, StorePool};
use sso_service::tickets::Tickets;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing is configured from the loaded config, so config errors are
    // reported on stderr by the runtime.
    let config = Config::from_env()?;

    let json_logs = config.observability.json_logs;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.observability.log_level))?,
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting SSO Ticket Service");
    info!(
        max_total = config.redis.pool.max_total,
        max_idle = config.redis.pool.max_idle,
        max_wait_ms = config.redis.pool.max_wait_ms,
        request_timeout_ms = config.redis.pool.request_timeout_ms,
        test_on_borrow = config.redis.pool.test_on_borrow,
        tgc_ttl_seconds = config.tickets.tgc_ttl_seconds,
        st_ttl_seconds = config.tickets.st_ttl_seconds,
        metrics_bind_address = %config.metrics_bind_address,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    PrometheusBuilder::new()
        .with_http_listener(config.metrics_bind_address)
        .install()
        .map_err(|e| {
            error!(error = %e, "Failed to install Prometheus exporter");
            format!("Failed to install Prometheus exporter: {e}")
        })?;
    info!(
        metrics_bind_address = %config.metrics_bind_address,
        "Prometheus exporter listening"
    );

    info!("Connecting to store...");
    let connector = RedisConnector::new(&config.redis.url)?;
    let pool = StorePool::connect(connector, config.redis.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to store");
            e
        })?;

    let status = pool.status();
    info!(
        max_size = status.max_size,
        idle = status.idle,
        in_use = status.in_use,
        "Store pool established"
    );

    let tickets = Tickets::new(StoreClient::new(pool.clone()), config.tickets);
    info!("Ticket managers ready");

    shutdown_signal().await;
    info!("Shutdown signal received, closing store pool...");

    drop(tickets);
    pool.close();

    info!("SSO Ticket Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
