//! Local automation driver
//!
//! A minimal in-process `AutomationDriver`: validates the proxy address and
//! tracks live context handles. Deployments with a real browser-automation
//! backend swap this out behind the same trait.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bootstrap::{AutomationDriver, ContextHandle};
use crate::error::{Result, StardustError};
use crate::models::Proxy;

/// Driver that allocates context handles locally
pub struct LocalDriver {
    /// Live contexts: handle id -> proxy address
    contexts: DashMap<String, String>,
}

impl LocalDriver {
    pub fn new() -> Self {
        Self {
            contexts: DashMap::new(),
        }
    }

    /// Number of contexts currently warmed and not released
    pub fn active_contexts(&self) -> usize {
        self.contexts.len()
    }
}

impl Default for LocalDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutomationDriver for LocalDriver {
    async fn warm_context(&self, proxy: &Proxy) -> Result<ContextHandle> {
        let (host, port) = proxy.host_port().ok_or_else(|| {
            StardustError::DriverError(format!("proxy address {} is not host:port", proxy.address))
        })?;
        debug!(host = host, port = port, "Validated proxy endpoint");

        let handle = ContextHandle {
            id: Uuid::new_v4().to_string(),
            proxy_address: proxy.address.clone(),
        };
        self.contexts
            .insert(handle.id.clone(), proxy.address.clone());

        info!(context = %handle.id, proxy = %proxy.address, "Warmed automation context");
        Ok(handle)
    }

    async fn release_context(&self, handle: &ContextHandle) -> Result<()> {
        if self.contexts.remove(&handle.id).is_some() {
            info!(context = %handle.id, "Released automation context");
        }
        Ok(())
    }
}
