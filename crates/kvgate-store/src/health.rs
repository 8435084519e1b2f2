//! Breaker state and the background probe driving it
//!
//! A connection-level failure anywhere in the client opens the breaker;
//! while open, operations fail fast with `CircuitOpen` instead of dialing.
//! The probe is the only remediation loop: it pings the store on a fixed
//! interval and a successful round trip closes the breaker. Individual
//! operations are never retried.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use kvgate_core::{KeyValueStore, StoreResult, UnavailableCause};

/// Default cadence of the background store probe.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Reachability of the store tier as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Degraded,
}

/// Shared breaker state for one store client.
///
/// Starts `Healthy`: connections are lazy, so nothing is known until the
/// first operation or probe touches the wire.
pub struct StoreHealth {
    state: RwLock<HealthState>,
}

impl StoreHealth {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HealthState::Healthy),
        }
    }

    pub fn state(&self) -> HealthState {
        *self.state.read()
    }

    pub fn is_degraded(&self) -> bool {
        self.state() == HealthState::Degraded
    }

    /// Fail fast when the breaker is open.
    pub fn guard(&self) -> StoreResult<()> {
        if self.is_degraded() {
            return Err(UnavailableCause::CircuitOpen.into());
        }
        Ok(())
    }

    /// Open the breaker after a connection-level failure.
    pub fn mark_degraded(&self, reason: &str) {
        let mut state = self.state.write();
        if *state != HealthState::Degraded {
            warn!("[Health] Store degraded: {}", reason);
            *state = HealthState::Degraded;
        }
    }

    /// Close the breaker after a successful round trip.
    pub fn mark_healthy(&self) {
        let mut state = self.state.write();
        if *state != HealthState::Healthy {
            info!("[Health] Store recovered");
            *state = HealthState::Healthy;
        }
    }
}

impl Default for StoreHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Background probe pinging the store tier on a fixed interval.
///
/// The ping itself updates the breaker (it bypasses the fail-fast guard),
/// so the monitor only provides cadence.
pub struct HealthMonitor {
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Start probing in the background.
    pub fn spawn(self, store: Arc<dyn KeyValueStore>) -> JoinHandle<()> {
        info!("[Health] Probe every {:?}", self.interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = store.ping().await {
                    debug!("[Health] Probe failed: {}", e);
                }
            }
        })
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_INTERVAL)
    }
}
