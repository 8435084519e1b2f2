//! Service discovery
//!
//! Resolves a logical service name to the current set of network addresses
//! of healthy instances. The mechanism is treated as authoritative and
//! eventually consistent; membership churn is not modeled beyond "resolve
//! again on the next connection".

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use tracing::debug;

use crate::domain::ServiceEndpoint;
use crate::error::{StoreResult, UnavailableCause};

/// Resolution of a logical service endpoint to socket addresses.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Resolve `endpoint` to the current set of instance addresses.
    ///
    /// An empty set is a resolution failure, never an `Ok`.
    async fn resolve(&self, endpoint: &ServiceEndpoint) -> StoreResult<Vec<SocketAddr>>;
}

/// DNS-backed discovery over the deployment's private namespace.
///
/// Resolves `{name}.{namespace}:{port}` through the system resolver; with an
/// empty namespace the bare name is looked up, which is what local runs use.
pub struct DnsDiscovery {
    namespace: String,
}

impl DnsDiscovery {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn authority(&self, endpoint: &ServiceEndpoint) -> String {
        if self.namespace.is_empty() {
            format!("{}:{}", endpoint.name, endpoint.port)
        } else {
            format!("{}.{}:{}", endpoint.name, self.namespace, endpoint.port)
        }
    }
}

#[async_trait]
impl ServiceDiscovery for DnsDiscovery {
    async fn resolve(&self, endpoint: &ServiceEndpoint) -> StoreResult<Vec<SocketAddr>> {
        let authority = self.authority(endpoint);
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&authority)
            .await
            .map_err(|e| UnavailableCause::ResolutionFailed {
                service: endpoint.name.clone(),
                detail: e.to_string(),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(UnavailableCause::ResolutionFailed {
                service: endpoint.name.clone(),
                detail: format!("no addresses for {}", authority),
            }
            .into());
        }

        debug!(
            "[Discovery] {} -> {} address(es)",
            authority,
            addrs.len()
        );
        Ok(addrs)
    }
}

/// Fixed name-to-address table, for tests and local runs.
#[derive(Default)]
pub struct StaticDiscovery {
    table: HashMap<String, Vec<SocketAddr>>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(mut self, name: impl Into<String>, addr: SocketAddr) -> Self {
        self.table.entry(name.into()).or_default().push(addr);
        self
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn resolve(&self, endpoint: &ServiceEndpoint) -> StoreResult<Vec<SocketAddr>> {
        match self.table.get(&endpoint.name) {
            Some(addrs) if !addrs.is_empty() => Ok(addrs.clone()),
            _ => Err(UnavailableCause::ResolutionFailed {
                service: endpoint.name.clone(),
                detail: "not registered".to_string(),
            }
            .into()),
        }
    }
}
