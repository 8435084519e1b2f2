//! HTTP handlers for the gateway server
//!
//! Verb-to-operation mapping: GET `/{key}` reads, POST `/{key}` writes,
//! GET `/` answers the liveness probe. Keys are taken verbatim from the
//! path segment and bodies verbatim as bytes; nothing is validated.
//!
//! Failure kinds map to distinct statuses: a missing key is 404, an
//! unreachable store is 503. A store failure never affects other in-flight
//! requests and never crashes the process.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use kvgate_core::{Key, KeyValueStore, StoreError, Value};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    /// Configured listening port, echoed by the liveness probe.
    pub port: u16,
}

/// Liveness/identity probe.
///
/// Always succeeds, independent of store reachability; this is not a
/// readiness check against the store tier.
pub async fn root(State(state): State<AppState>) -> String {
    debug!("[Gateway] Liveness probe");
    format!("hello from port {}", state.port)
}

/// Read the value stored under the path segment.
pub async fn read_key(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let key = Key::from(key);
    match state.store.read(&key).await {
        Ok(value) => (StatusCode::OK, value.into_bytes()).into_response(),
        Err(StoreError::NotFound) => {
            debug!("[Gateway] GET {}: not found", key);
            (StatusCode::NOT_FOUND, "key not found").into_response()
        }
        Err(StoreError::Unavailable(cause)) => {
            warn!("[Gateway] GET {} failed: {}", key, cause);
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable").into_response()
        }
    }
}

/// Write the request body under the path segment, overwriting any prior
/// entry. Racing writes to the same key resolve in whichever order the
/// store applies them.
pub async fn write_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Response {
    let key = Key::from(key);
    let value = Value::from(body.to_vec());
    match state.store.write(&key, &value).await {
        Ok(ack) => (StatusCode::OK, ack.to_string()).into_response(),
        Err(StoreError::NotFound) => {
            // A write never reports a missing key; kept for exhaustiveness.
            (StatusCode::NOT_FOUND, "key not found").into_response()
        }
        Err(StoreError::Unavailable(cause)) => {
            warn!("[Gateway] POST {} failed: {}", key, cause);
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable").into_response()
        }
    }
}
