//! Session bootstrap coordination
//!
//! Assembling a new session takes three sub-actions: assign a proxy from the
//! registry, allocate a session record in storage, and warm an automation
//! context bound to the assigned proxy. Storage allocation runs concurrently
//! with the proxy/driver chain; the coordinator joins both legs, and only
//! then decides success or failure. A failed bootstrap rolls back whatever
//! did succeed and reports every failing sub-action, not just the first.

pub mod driver;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{ChatMessage, NewSessionRequest, Proxy, SessionBootstrap};
use crate::registry::{Registry, RotationStrategy};

/// Storage collaborator: owns session record persistence
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session record, returning its identifier
    async fn create_session(
        &self,
        flow: &str,
        agent: &str,
        first_message: Option<&ChatMessage>,
    ) -> Result<String>;

    /// Delete a session record; used for bootstrap rollback
    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Automation-driver collaborator: prepares egress-bound contexts
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Prepare an automation context routed through the given proxy
    async fn warm_context(&self, proxy: &Proxy) -> Result<ContextHandle>;

    /// Tear down a previously warmed context
    async fn release_context(&self, handle: &ContextHandle) -> Result<()>;
}

/// Handle to a warmed automation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextHandle {
    pub id: String,
    pub proxy_address: String,
}

/// One failed bootstrap sub-action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapFailure {
    ProxyUnavailable(String),
    StorageError(String),
    DriverError(String),
}

impl BootstrapFailure {
    /// Stable name of the failing sub-action, for error reports
    pub fn kind(&self) -> &'static str {
        match self {
            BootstrapFailure::ProxyUnavailable(_) => "ProxyUnavailable",
            BootstrapFailure::StorageError(_) => "StorageError",
            BootstrapFailure::DriverError(_) => "DriverError",
        }
    }
}

impl std::fmt::Display for BootstrapFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapFailure::ProxyUnavailable(msg) => write!(f, "proxy assignment failed: {}", msg),
            BootstrapFailure::StorageError(msg) => write!(f, "session storage failed: {}", msg),
            BootstrapFailure::DriverError(msg) => write!(f, "driver warm-up failed: {}", msg),
        }
    }
}

/// Composite bootstrap error naming every failing sub-action
#[derive(Error, Debug)]
#[error("session bootstrap failed: {}", self.describe())]
pub struct BootstrapError {
    failures: Vec<BootstrapFailure>,
}

impl BootstrapError {
    pub fn new(failures: Vec<BootstrapFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[BootstrapFailure] {
        &self.failures
    }

    /// Names of the failing sub-actions, in the order they were observed
    pub fn failed_actions(&self) -> Vec<&'static str> {
        self.failures.iter().map(BootstrapFailure::kind).collect()
    }

    fn describe(&self) -> String {
        self.failures
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Bootstrap configuration
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Group that new sessions draw their proxy from
    pub default_group: String,
    /// Rotation strategy for proxy assignment
    pub strategy: RotationStrategy,
    /// Deadline applied to each sub-action
    pub action_timeout: Duration,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            default_group: "default".to_string(),
            strategy: RotationStrategy::RoundRobin,
            action_timeout: Duration::from_secs(30),
        }
    }
}

/// Coordinates the concurrent setup of a new session
pub struct BootstrapCoordinator {
    registry: Arc<Registry>,
    store: Arc<dyn SessionStore>,
    driver: Arc<dyn AutomationDriver>,
    config: BootstrapConfig,
}

impl BootstrapCoordinator {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn SessionStore>,
        driver: Arc<dyn AutomationDriver>,
        config: BootstrapConfig,
    ) -> Self {
        Self {
            registry,
            store,
            driver,
            config,
        }
    }

    /// Assemble a ready-to-use session, or fail as a whole.
    ///
    /// The proxy/driver chain and the storage allocation run concurrently;
    /// driver warm-up waits on the proxy assignment it depends on. Each
    /// sub-action is bounded by the configured timeout.
    pub async fn bootstrap(
        &self,
        request: &NewSessionRequest,
    ) -> std::result::Result<SessionBootstrap, BootstrapError> {
        let deadline = self.config.action_timeout;

        let proxy_leg = async {
            let proxy = self
                .registry
                .pick(&self.config.default_group, self.config.strategy)
                .map_err(|e| BootstrapFailure::ProxyUnavailable(e.to_string()))?;

            let context = match timeout(deadline, self.driver.warm_context(&proxy)).await {
                Ok(Ok(context)) => context,
                Ok(Err(e)) => return Err(BootstrapFailure::DriverError(e.to_string())),
                Err(_) => {
                    return Err(BootstrapFailure::DriverError(format!(
                        "timed out after {:?}",
                        deadline
                    )))
                }
            };

            Ok((proxy, context))
        };

        let storage_leg = async {
            let first_message = request.messages.first();
            match timeout(
                deadline,
                self.store
                    .create_session(&request.flow, &request.agent, first_message),
            )
            .await
            {
                Ok(Ok(session_id)) => Ok(session_id),
                Ok(Err(e)) => Err(BootstrapFailure::StorageError(e.to_string())),
                Err(_) => Err(BootstrapFailure::StorageError(format!(
                    "timed out after {:?}",
                    deadline
                ))),
            }
        };

        let (proxy_result, storage_result) = tokio::join!(proxy_leg, storage_leg);

        match (proxy_result, storage_result) {
            (Ok((proxy, context)), Ok(session_id)) => {
                info!(
                    session = %session_id,
                    proxy = %proxy.address,
                    context = %context.id,
                    "Session bootstrap complete"
                );
                Ok(SessionBootstrap {
                    session_id,
                    proxy: proxy.address,
                    context_id: context.id,
                })
            }
            (proxy_result, storage_result) => {
                let mut failures = Vec::new();

                match proxy_result {
                    Ok((_, context)) => self.release_context(&context).await,
                    Err(failure) => failures.push(failure),
                }
                match storage_result {
                    Ok(session_id) => self.delete_session(&session_id).await,
                    Err(failure) => failures.push(failure),
                }

                Err(BootstrapError::new(failures))
            }
        }
    }

    async fn release_context(&self, context: &ContextHandle) {
        let rollback = timeout(self.config.action_timeout, self.driver.release_context(context));
        match rollback.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(context = %context.id, "Context rollback failed: {}", e),
            Err(_) => warn!(context = %context.id, "Context rollback timed out"),
        }
    }

    async fn delete_session(&self, session_id: &str) {
        let rollback = timeout(self.config.action_timeout, self.store.delete_session(session_id));
        match rollback.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(session = %session_id, "Session rollback failed: {}", e),
            Err(_) => warn!(session = %session_id, "Session rollback timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StardustError;
    use crate::models::ProxyGroup;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockStore {
        fail: AtomicBool,
        created: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                created: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn live_sessions(&self) -> usize {
            self.created.lock().len() - self.deleted.lock().len()
        }
    }

    #[async_trait]
    impl SessionStore for MockStore {
        async fn create_session(
            &self,
            _flow: &str,
            _agent: &str,
            _first_message: Option<&ChatMessage>,
        ) -> Result<String> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(StardustError::StorageError("insert failed".to_string()));
            }
            let id = uuid::Uuid::new_v4().to_string();
            self.created.lock().push(id.clone());
            Ok(id)
        }

        async fn delete_session(&self, session_id: &str) -> Result<()> {
            self.deleted.lock().push(session_id.to_string());
            Ok(())
        }
    }

    struct MockDriver {
        fail: AtomicBool,
        hang: AtomicBool,
        warmed: Mutex<Vec<ContextHandle>>,
        released: Mutex<Vec<String>>,
    }

    impl MockDriver {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                hang: AtomicBool::new(false),
                warmed: Mutex::new(Vec::new()),
                released: Mutex::new(Vec::new()),
            }
        }

        fn live_contexts(&self) -> usize {
            self.warmed.lock().len() - self.released.lock().len()
        }
    }

    #[async_trait]
    impl AutomationDriver for MockDriver {
        async fn warm_context(&self, proxy: &Proxy) -> Result<ContextHandle> {
            if self.hang.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.fail.load(Ordering::Relaxed) {
                return Err(StardustError::DriverError("launch failed".to_string()));
            }
            let handle = ContextHandle {
                id: uuid::Uuid::new_v4().to_string(),
                proxy_address: proxy.address.clone(),
            };
            self.warmed.lock().push(handle.clone());
            Ok(handle)
        }

        async fn release_context(&self, handle: &ContextHandle) -> Result<()> {
            self.released.lock().push(handle.id.clone());
            Ok(())
        }
    }

    struct Fixture {
        coordinator: BootstrapCoordinator,
        store: Arc<MockStore>,
        driver: Arc<MockDriver>,
    }

    fn fixture_with_group(proxies: Vec<Proxy>) -> Fixture {
        let registry = Arc::new(Registry::new());
        registry
            .upsert(ProxyGroup::new("default", "default", proxies))
            .unwrap();

        let store = Arc::new(MockStore::new());
        let driver = Arc::new(MockDriver::new());
        let config = BootstrapConfig {
            action_timeout: Duration::from_millis(200),
            ..Default::default()
        };

        let coordinator = BootstrapCoordinator::new(
            registry,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&driver) as Arc<dyn AutomationDriver>,
            config,
        );

        Fixture {
            coordinator,
            store,
            driver,
        }
    }

    fn request() -> NewSessionRequest {
        NewSessionRequest {
            messages: vec![],
            flow: "support".to_string(),
            agent: "bot1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_success_returns_all_handles() {
        let fx = fixture_with_group(vec![Proxy::new("10.0.0.1:8080", "a", "b")]);

        let result = fx.coordinator.bootstrap(&request()).await.unwrap();

        assert!(!result.session_id.is_empty());
        assert_eq!(result.proxy, "10.0.0.1:8080");
        assert!(!result.context_id.is_empty());
        assert_eq!(fx.store.live_sessions(), 1);
        assert_eq!(fx.driver.live_contexts(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_reports_only_storage_and_rolls_back_context() {
        let fx = fixture_with_group(vec![Proxy::new("10.0.0.1:8080", "a", "b")]);
        fx.store.fail.store(true, Ordering::Relaxed);

        let err = fx.coordinator.bootstrap(&request()).await.unwrap_err();

        assert_eq!(err.failed_actions(), vec!["StorageError"]);
        // The warmed context must not outlive the failed request
        assert_eq!(fx.driver.live_contexts(), 0);
    }

    #[tokio::test]
    async fn test_empty_group_reports_proxy_unavailable_and_rolls_back_session() {
        let fx = fixture_with_group(vec![]);

        let err = fx.coordinator.bootstrap(&request()).await.unwrap_err();

        assert_eq!(err.failed_actions(), vec!["ProxyUnavailable"]);
        // Storage succeeded concurrently, so its record must be rolled back
        assert_eq!(fx.store.live_sessions(), 0);
        assert_eq!(fx.driver.live_contexts(), 0);
    }

    #[tokio::test]
    async fn test_driver_failure_reports_driver_and_rolls_back_session() {
        let fx = fixture_with_group(vec![Proxy::new("10.0.0.1:8080", "a", "b")]);
        fx.driver.fail.store(true, Ordering::Relaxed);

        let err = fx.coordinator.bootstrap(&request()).await.unwrap_err();

        assert_eq!(err.failed_actions(), vec!["DriverError"]);
        assert_eq!(fx.store.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_multiple_failures_are_all_named() {
        let fx = fixture_with_group(vec![Proxy::new("10.0.0.1:8080", "a", "b")]);
        fx.store.fail.store(true, Ordering::Relaxed);
        fx.driver.fail.store(true, Ordering::Relaxed);

        let err = fx.coordinator.bootstrap(&request()).await.unwrap_err();

        assert_eq!(err.failed_actions(), vec!["DriverError", "StorageError"]);
    }

    #[tokio::test]
    async fn test_driver_timeout_counts_as_driver_failure() {
        let fx = fixture_with_group(vec![Proxy::new("10.0.0.1:8080", "a", "b")]);
        fx.driver.hang.store(true, Ordering::Relaxed);

        let err = fx.coordinator.bootstrap(&request()).await.unwrap_err();

        assert_eq!(err.failed_actions(), vec!["DriverError"]);
        assert_eq!(fx.store.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_error_message_names_every_failure() {
        let err = BootstrapError::new(vec![
            BootstrapFailure::ProxyUnavailable("group empty".to_string()),
            BootstrapFailure::StorageError("insert failed".to_string()),
        ]);

        let text = err.to_string();
        assert!(text.contains("proxy assignment failed"));
        assert!(text.contains("session storage failed"));
    }
}
