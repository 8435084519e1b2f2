//! Client-side contract for the store tier
//!
//! The gateway talks to the store only through this trait, so tests swap in
//! in-memory implementations without touching the wire.

use async_trait::async_trait;

use crate::domain::{Ack, Key, Value};
use crate::error::StoreResult;

/// Remote key-value store operations.
///
/// Every call is one fresh round trip; implementations hold no cached
/// entries, buffer no writes, and never retry a failed operation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn read(&self, key: &Key) -> StoreResult<Value>;

    /// Store `value` under `key`, overwriting any prior entry.
    async fn write(&self, key: &Key, value: &Value) -> StoreResult<Ack>;

    /// Round-trip liveness probe against the store tier.
    ///
    /// Used by the health monitor only; request handling never calls it.
    async fn ping(&self) -> StoreResult<()>;
}
