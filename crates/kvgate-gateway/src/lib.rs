//! # Kvgate Gateway
//!
//! Stateless HTTP request handler translating inbound verbs into store
//! operations: GET a path segment to read, POST to write, GET `/` for the
//! liveness probe.

pub mod server;

pub use server::{AppState, GatewayConfig, GatewayDependencies, GatewayServer};
