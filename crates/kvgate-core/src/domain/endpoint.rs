//! Service endpoint identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who may reach a service's load-balancing endpoint at the network edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Internet-reachable.
    Public,
    /// Reachable only from within the private namespace.
    Private,
}

/// A (logical name, port, visibility) triple identifying one tier.
///
/// Endpoints are resolved to concrete network addresses at connection time
/// through [`crate::discovery::ServiceDiscovery`], never hardcoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    /// Logical name the tier registers under in the shared namespace.
    pub name: String,
    /// Service port the tier listens on.
    pub port: u16,
    /// Exposure of the tier's load-balancing endpoint.
    pub visibility: Visibility,
}

impl ServiceEndpoint {
    pub fn new(name: impl Into<String>, port: u16, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            port,
            visibility,
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}
