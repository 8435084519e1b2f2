//! Bounded connection pool with scoped acquisition
//!
//! One connection is acquired per store operation and released back only on
//! a clean round trip; any I/O or protocol error discards the connection
//! instead of returning it. The pool is sized independently of request
//! volume, and resolved addresses are taken round-robin, which is where the
//! store tier's load-balancing endpoint shows up in process.

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use kvgate_core::{ServiceDiscovery, ServiceEndpoint, StoreResult, UnavailableCause};

use crate::resp::{RespConnection, StoreConnection};

/// Default cap on live connections to the store tier.
const DEFAULT_MAX_CONNECTIONS: usize = 8;

/// Default bound on connection establishment.
const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing and dialing knobs.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum live connections; acquisition beyond this waits.
    pub max_connections: usize,
    /// Bound on a single connection attempt.
    pub dial_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub idle: usize,
    pub capacity: usize,
}

/// Pooled connections to one service endpoint.
///
/// Connections are established lazily, on the first acquisition that finds
/// no idle connection to reuse.
pub struct ConnectionPool {
    endpoint: ServiceEndpoint,
    discovery: Arc<dyn ServiceDiscovery>,
    idle: Arc<Mutex<Vec<StoreConnection>>>,
    permits: Arc<Semaphore>,
    cursor: AtomicUsize,
    config: PoolConfig,
}

impl ConnectionPool {
    pub fn new(
        endpoint: ServiceEndpoint,
        discovery: Arc<dyn ServiceDiscovery>,
        config: PoolConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_connections));
        Self {
            endpoint,
            discovery,
            idle: Arc::new(Mutex::new(Vec::new())),
            permits,
            cursor: AtomicUsize::new(0),
            config,
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.idle.lock().len(),
            capacity: self.config.max_connections,
        }
    }

    /// Acquire a connection for one operation.
    ///
    /// Reuses an idle connection when one exists, otherwise resolves the
    /// endpoint and dials. The returned guard must be [`released`] after a
    /// clean round trip; dropping it instead closes the connection.
    ///
    /// [`released`]: PooledConnection::release
    pub async fn acquire(&self) -> StoreResult<PooledConnection> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| UnavailableCause::Io("connection pool closed".to_string()))?;

        let idle_conn = self.idle.lock().pop();
        let conn = match idle_conn {
            Some(conn) => conn,
            None => self.dial().await?,
        };

        Ok(PooledConnection {
            conn,
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }

    async fn dial(&self) -> StoreResult<StoreConnection> {
        let addrs = self.discovery.resolve(&self.endpoint).await?;
        let addr = self.pick(&addrs);

        debug!("[Pool] Dialing {} at {}", self.endpoint, addr);

        let stream = tokio::time::timeout(self.config.dial_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| UnavailableCause::Io(format!("dial {addr} timed out")))?
            .map_err(|e| UnavailableCause::Io(format!("dial {addr}: {e}")))?;

        Ok(RespConnection::new(stream))
    }

    fn pick(&self, addrs: &[SocketAddr]) -> SocketAddr {
        let n = self.cursor.fetch_add(1, Ordering::Relaxed);
        addrs[n % addrs.len()]
    }
}

/// A connection checked out for one operation.
///
/// Dereferences to the underlying [`StoreConnection`]. Dropping the guard
/// closes the connection; call [`release`](Self::release) after a clean
/// round trip to return it for reuse.
pub struct PooledConnection {
    conn: StoreConnection,
    idle: Arc<Mutex<Vec<StoreConnection>>>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// Return the connection to the pool for reuse.
    pub fn release(self) {
        self.idle.lock().push(self.conn);
    }
}

impl Deref for PooledConnection {
    type Target = StoreConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
