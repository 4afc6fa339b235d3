//! UniNinja Server
//!
//! Main entry point for the UniNinja GraphQL gateway.
//! This binary wires the document store, the Unistats client and the HTTP
//! server together and shuts down gracefully.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{info, warn};
use unininja_api::{build_gateway, build_schema, GatewayState, MiddlewareConfig};
use unininja_db::{close_pool, create_pool, pool::mask_password, PostgresDocumentStore};
use unininja_service::{ServiceRegistry, UnistatsClient};

use config::ServerConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration directory
    #[arg(short, long, env = "CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment (development, production, etc.)
    #[arg(short, long, env = "ENVIRONMENT", default_value = "development")]
    environment: String,

    /// Server host
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Document store URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = ServerConfig::load_or_default(&args.config_dir, &args.environment);

    // Override with command-line arguments
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database_url) = args.database_url {
        config.store.url = database_url;
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }

    telemetry::init_with_config(
        telemetry::TelemetryConfig::new()
            .with_log_level(config.logging.level.clone())
            .with_json_format(config.logging.json_format)
            .with_target(config.logging.include_target),
    );

    info!("Starting UniNinja gateway");
    info!("Environment: {}", args.environment);
    info!("Server: {}", config.bind_address());
    info!("Store: {}", mask_password(&config.store.url));
    info!("Unistats: {}", config.unistats.base_url);

    if !config.unistats.has_credential() {
        warn!("No Unistats credential configured; upstream calls will be rejected");
    }

    let pool = create_pool(&config.store.pool_config())
        .await
        .context("Failed to create store connection pool")?;
    let store = Arc::new(PostgresDocumentStore::new(pool.clone()));

    let unistats = UnistatsClient::new(config.unistats.client_config())
        .context("Failed to create Unistats client")?;
    let services = Arc::new(ServiceRegistry::from_client(unistats));

    let state = GatewayState::new(build_schema(services), store)
        .with_settings(config.gateway.settings());

    let middleware = MiddlewareConfig::new().with_cors(config.cors.api_config());
    let app = build_gateway(state, middleware);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .context("Invalid HTTP bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind HTTP server")?;

    info!("HTTP Server listening on http://{}", addr);

    if config.server.graceful_shutdown {
        let timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
        let (signalled_tx, signalled_rx) = oneshot::channel::<()>();

        let server = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .into_future();

        // Starts counting only once a shutdown signal has arrived.
        let deadline = async move {
            if signalled_rx.await.is_ok() {
                info!("Waiting up to {} seconds for in-flight requests", timeout.as_secs());
                tokio::time::sleep(timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = server => result.context("HTTP Server error")?,
            _ = deadline => warn!("Shutdown timeout elapsed, dropping in-flight requests"),
        }
    } else {
        axum::serve(listener, app.into_make_service())
            .await
            .context("HTTP Server error")?;
    }

    close_pool(pool).await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
///
/// Waits for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
