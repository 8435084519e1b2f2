//! Store Client - one fresh round trip per operation
//!
//! Translates `read`/`write`/`ping` into GET/SET/PING over pooled wire
//! connections. Before dialing, the connectivity policy is consulted and the
//! endpoint is resolved through service discovery; a connection-level
//! failure anywhere marks the client degraded so later operations fail fast
//! until the health probe observes recovery. A failed operation is reported
//! exactly once to its caller; nothing is retried or buffered.

use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use kvgate_core::{
    Ack, Key, KeyValueStore, ServiceDiscovery, ServiceEndpoint, StoreError, StoreResult, Topology,
    UnavailableCause, Value, Visibility, GATEWAY_SERVICE, STORE_PORT,
};

use crate::health::StoreHealth;
use crate::pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection};
use crate::resp::Reply;

/// Store endpoint configuration, environment-driven.
///
/// The endpoint is given as a URL (`redis://store.service.internal:6379`);
/// the host's first DNS label is the store's logical service name and the
/// remaining labels are the private namespace. A bare host (`localhost`)
/// has an empty namespace and resolves as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Logical name of the store service.
    pub service: String,
    /// Private namespace the service registers under ("" for bare hosts).
    pub namespace: String,
    /// Store service port.
    pub port: u16,
}

impl StoreSettings {
    /// Environment variable naming the store endpoint URL.
    pub const ENV_URL: &'static str = "STORE_URL";

    /// Endpoint used when the environment supplies nothing.
    pub const DEFAULT_URL: &'static str = "redis://store.service.internal:6379";

    pub fn from_url(raw: &str) -> anyhow::Result<Self> {
        let url: Url = raw.parse().with_context(|| format!("invalid store URL '{raw}'"))?;
        anyhow::ensure!(
            url.scheme() == "redis",
            "unsupported store URL scheme '{}'",
            url.scheme()
        );
        let host = url.host_str().context("store URL missing host")?;
        let (service, namespace) = match host.split_once('.') {
            Some((service, namespace)) => (service, namespace),
            None => (host, ""),
        };
        Ok(Self {
            service: service.to_string(),
            namespace: namespace.to_string(),
            port: url.port().unwrap_or(STORE_PORT),
        })
    }

    /// Read `STORE_URL`, falling back to [`Self::DEFAULT_URL`].
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(Self::ENV_URL) {
            Ok(raw) => Self::from_url(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// The store tier's endpoint identity.
    pub fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::new(&self.service, self.port, Visibility::Private)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::from_url(Self::DEFAULT_URL).expect("default store URL is valid")
    }
}

/// Thin connection to the remote key-value store tier.
pub struct StoreClient {
    endpoint: ServiceEndpoint,
    pool: ConnectionPool,
    health: Arc<StoreHealth>,
    topology: Arc<Topology>,
    identity: String,
}

impl StoreClient {
    pub fn new(
        settings: &StoreSettings,
        discovery: Arc<dyn ServiceDiscovery>,
        topology: Arc<Topology>,
    ) -> Self {
        Self::with_pool_config(settings, discovery, topology, PoolConfig::default())
    }

    pub fn with_pool_config(
        settings: &StoreSettings,
        discovery: Arc<dyn ServiceDiscovery>,
        topology: Arc<Topology>,
        pool_config: PoolConfig,
    ) -> Self {
        let endpoint = settings.endpoint();
        info!(
            "[StoreClient] Target {} (namespace '{}')",
            endpoint, settings.namespace
        );
        Self {
            pool: ConnectionPool::new(endpoint.clone(), discovery, pool_config),
            endpoint,
            health: Arc::new(StoreHealth::new()),
            topology,
            identity: GATEWAY_SERVICE.to_string(),
        }
    }

    /// Override the network identity this client connects as.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Shared breaker state, for the health monitor and for tests.
    pub fn health(&self) -> Arc<StoreHealth> {
        Arc::clone(&self.health)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn authorize(&self) -> StoreResult<()> {
        self.topology
            .authorize(&self.identity, &self.endpoint.name, self.endpoint.port)
            .map_err(|violation| UnavailableCause::PolicyDenied(violation).into())
    }

    async fn acquire(&self) -> StoreResult<PooledConnection> {
        match self.pool.acquire().await {
            Ok(conn) => Ok(conn),
            Err(err) => {
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    /// Open the breaker on connection-level failures. Per-operation
    /// outcomes (NotFound, error replies, policy denials) pass through.
    fn note_failure(&self, err: &StoreError) {
        if let StoreError::Unavailable(cause) = err {
            if cause.is_connection_failure() {
                self.health.mark_degraded(&cause.to_string());
            }
        }
    }

    fn unexpected_reply(&self, command: &str, reply: Reply) -> StoreError {
        let err: StoreError =
            UnavailableCause::Protocol(format!("unexpected {command} reply: {reply:?}")).into();
        self.note_failure(&err);
        err
    }
}

#[async_trait]
impl KeyValueStore for StoreClient {
    async fn read(&self, key: &Key) -> StoreResult<Value> {
        self.health.guard()?;
        self.authorize()?;

        let mut conn = self.acquire().await?;
        match conn.command(&[b"GET", key.as_bytes()]).await {
            Ok(Reply::Bulk(bytes)) => {
                conn.release();
                debug!("[StoreClient] GET {} -> {} byte(s)", key, bytes.len());
                Ok(Value::from(bytes))
            }
            Ok(Reply::NullBulk) => {
                conn.release();
                debug!("[StoreClient] GET {} -> not found", key);
                Err(StoreError::NotFound)
            }
            Ok(Reply::Error(msg)) => {
                conn.release();
                Err(UnavailableCause::ErrorReply(msg).into())
            }
            Ok(other) => Err(self.unexpected_reply("GET", other)),
            Err(cause) => {
                let err: StoreError = cause.into();
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    async fn write(&self, key: &Key, value: &Value) -> StoreResult<Ack> {
        self.health.guard()?;
        self.authorize()?;

        let mut conn = self.acquire().await?;
        match conn.command(&[b"SET", key.as_bytes(), value.as_bytes()]).await {
            Ok(Reply::Simple(ack)) => {
                conn.release();
                debug!("[StoreClient] SET {} <- {} byte(s)", key, value.len());
                Ok(Ack::from(ack))
            }
            Ok(Reply::Error(msg)) => {
                conn.release();
                Err(UnavailableCause::ErrorReply(msg).into())
            }
            Ok(other) => Err(self.unexpected_reply("SET", other)),
            Err(cause) => {
                let err: StoreError = cause.into();
                self.note_failure(&err);
                Err(err)
            }
        }
    }

    /// Probe the store. Bypasses the fail-fast guard so a recovery can be
    /// observed while the breaker is open.
    async fn ping(&self) -> StoreResult<()> {
        self.authorize()?;

        let mut conn = self.acquire().await?;
        match conn.command(&[b"PING"]).await {
            Ok(Reply::Simple(_)) => {
                conn.release();
                self.health.mark_healthy();
                Ok(())
            }
            Ok(Reply::Error(msg)) => {
                conn.release();
                Err(UnavailableCause::ErrorReply(msg).into())
            }
            Ok(other) => Err(self.unexpected_reply("PING", other)),
            Err(cause) => {
                let err: StoreError = cause.into();
                self.note_failure(&err);
                Err(err)
            }
        }
    }
}
