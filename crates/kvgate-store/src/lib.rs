//! # Kvgate Store Client
//!
//! Thin connection to the remote key-value store tier:
//!
//! - **resp** - Wire codec for the store's GET/SET protocol
//! - **pool** - Bounded connection pool with scoped acquisition
//! - **health** - Breaker state and the background probe driving it
//! - **client** - [`StoreClient`], the [`kvgate_core::KeyValueStore`] impl

mod client;
mod health;
mod pool;
mod resp;

pub use client::{StoreClient, StoreSettings};
pub use health::{HealthMonitor, HealthState, StoreHealth, DEFAULT_PROBE_INTERVAL};
pub use pool::{ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use resp::{Reply, RespConnection, StoreConnection};
