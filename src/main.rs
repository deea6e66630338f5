//! Stardust Engine - Entry Point
//!
//! Starts the RPC and API servers with graceful shutdown support.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod bootstrap;
mod config;
mod database;
mod error;
mod models;
mod registry;
mod repository;
mod rpc;

use api::ApiServer;
use bootstrap::driver::LocalDriver;
use bootstrap::{BootstrapConfig, BootstrapCoordinator};
use config::Config;
use database::Database;
use registry::{Registry, RotationStrategy};
use repository::{GroupRepository, SessionRepository};
use rpc::RpcServer;

#[tokio::main]
async fn main() -> error::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("stardust={},tower_http=info", config.log.level).into()
    });
    if config.log.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Stardust Engine");

    // Connect to database
    let db = Database::new(&config).await?;
    info!("Connected to database");

    // Run migrations
    db.run_migrations().await?;
    info!("Database migrations complete");

    // Load persisted proxy groups into the registry
    let group_repo = GroupRepository::new(db.pool().clone());
    let registry = Arc::new(Registry::new());
    let groups = group_repo.load_all().await?;
    registry.seed(groups);
    info!("Loaded {} proxy groups", registry.group_count());

    // Wire up the session bootstrap coordinator
    let session_repo = SessionRepository::new(db.pool().clone());
    let driver = LocalDriver::new();
    let bootstrap_config = BootstrapConfig {
        default_group: config.bootstrap.default_group.clone(),
        strategy: RotationStrategy::from_str(&config.bootstrap.rotation_strategy),
        action_timeout: Duration::from_secs(config.bootstrap.action_timeout),
    };
    let coordinator = Arc::new(BootstrapCoordinator::new(
        Arc::clone(&registry),
        Arc::new(session_repo),
        Arc::new(driver),
        bootstrap_config,
    ));

    // Create shutdown channel (also reachable via the quit endpoint)
    let (shutdown_tx, _) = watch::channel(false);

    // Create RPC server
    let rpc_server = RpcServer::new(config.rpc.clone(), Arc::clone(&registry));

    // Create API server
    let api_server = ApiServer::new(
        config.api.clone(),
        config.clone(),
        Arc::clone(&registry),
        group_repo.clone(),
        coordinator,
        shutdown_tx.clone(),
    );

    // Start servers
    let rpc_shutdown = shutdown_tx.subscribe();
    let api_shutdown = shutdown_tx.subscribe();

    let rpc_task = tokio::spawn(async move {
        if let Err(e) = rpc_server.run(rpc_shutdown).await {
            error!("RPC server error: {}", e);
        }
    });

    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(api_shutdown).await {
            error!("API server error: {}", e);
        }
    });

    info!(
        "Servers started - RPC: {}, API: {}",
        config.rpc_addr(),
        config.api_addr()
    );

    // Wait for a signal or a quit request over the API
    let mut quit_rx = shutdown_tx.subscribe();
    tokio::select! {
        _ = shutdown_signal() => info!("Shutdown signal received"),
        _ = quit_rx.changed() => info!("Quit requested over API"),
    }

    // Send shutdown signal to all services
    let _ = shutdown_tx.send(true);

    // Wait for all tasks to complete
    let _ = tokio::join!(rpc_task, api_task);

    db.close().await;

    info!("Stardust Engine stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
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
