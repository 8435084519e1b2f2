//! # Kvgate Core Library
//!
//! Domain types, topology model, and service discovery for kvgate.
//!
//! ## Modules
//!
//! - `domain` - Core entities (Key, Value, StoreEntry, ServiceEndpoint)
//! - `discovery` - Logical-name resolution to network addresses
//! - `error` - Store error taxonomy
//! - `store` - Client-side contract for the store tier
//! - `topology` - Two-tier service topology and connectivity policy

pub mod discovery;
pub mod domain;
pub mod error;
pub mod store;
pub mod topology;

// Re-export commonly used types
pub use discovery::{DnsDiscovery, ServiceDiscovery, StaticDiscovery};
pub use domain::{Ack, Key, ServiceEndpoint, StoreEntry, Value, Visibility};
pub use error::{StoreError, StoreResult, UnavailableCause};
pub use store::KeyValueStore;
pub use topology::{
    IngressRule, IngressSource, PolicyViolation, ResourceAllocation, ServiceSpec, Topology,
    DEFAULT_NAMESPACE, GATEWAY_LISTENER_PORT, GATEWAY_PORT, GATEWAY_SERVICE, STORE_PORT,
    STORE_SERVICE,
};
