//! API server using Axum

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Extension, Router};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::bootstrap::BootstrapCoordinator;
use crate::config::{ApiServerConfig, Config};
use crate::error::Result;
use crate::registry::Registry;
use crate::repository::GroupRepository;

use super::middleware::{cors_layer, JwtAuth};
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub jwt_auth: JwtAuth,
    pub registry: Arc<Registry>,
    pub groups: GroupRepository,
    pub coordinator: Arc<BootstrapCoordinator>,
    /// Sending `true` requests graceful process shutdown
    pub shutdown_tx: watch::Sender<bool>,
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(
        api_config: ApiServerConfig,
        full_config: Config,
        registry: Arc<Registry>,
        groups: GroupRepository,
        coordinator: Arc<BootstrapCoordinator>,
        shutdown_tx: watch::Sender<bool>,
    ) -> Self {
        let jwt_auth = JwtAuth::new(&api_config.jwt_secret);

        let state = AppState {
            config: full_config,
            jwt_auth,
            registry,
            groups,
            coordinator,
            shutdown_tx,
        };

        Self {
            config: api_config,
            state,
        }
    }

    /// Build the router
    fn build_router(&self) -> Router {
        let cors = cors_layer(&self.config.cors_origins);

        routes::create_router(self.state.clone())
            .layer(Extension(self.state.jwt_auth.clone()))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                crate::error::StardustError::InvalidConfig("invalid API server address".into())
            })?;

        let router = self.build_router();

        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| crate::error::StardustError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}
