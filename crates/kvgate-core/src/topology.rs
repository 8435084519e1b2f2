//! Two-tier service topology and connectivity policy
//!
//! Models the deployment shape: independently addressable services in a
//! shared private namespace, each with a fixed compute allocation and a
//! static instance count, plus an ingress allow-list that decides who may
//! reach whom on which port. There is no autoscaling and no health-based
//! membership here; counts are configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::{ServiceEndpoint, Visibility};

/// Shared private namespace services register under.
pub const DEFAULT_NAMESPACE: &str = "service.internal";

/// Logical name of the gateway tier.
pub const GATEWAY_SERVICE: &str = "gateway";

/// Logical name of the store tier.
pub const STORE_SERVICE: &str = "store";

/// Service port of the gateway tier.
pub const GATEWAY_PORT: u16 = 8080;

/// Listener port of the gateway tier's public load balancer.
pub const GATEWAY_LISTENER_PORT: u16 = 80;

/// Service port of the store tier.
pub const STORE_PORT: u16 = 6379;

/// Fixed compute/memory allocation for one service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub cpu_units: u32,
    pub memory_mib: u32,
}

impl ResourceAllocation {
    pub fn new(cpu_units: u32, memory_mib: u32) -> Self {
        Self {
            cpu_units,
            memory_mib,
        }
    }
}

/// One registered service: endpoint identity plus provisioning shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub endpoint: ServiceEndpoint,
    /// Port the service's load balancer listens on. Equals the service port
    /// unless the deployment maps it (gateway: 80 -> 8080).
    pub listener_port: u16,
    pub resources: ResourceAllocation,
    /// Static target instance count. No autoscaling.
    pub desired_count: u32,
}

impl ServiceSpec {
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        let listener_port = endpoint.port;
        Self {
            endpoint,
            listener_port,
            resources: ResourceAllocation::new(512, 2048),
            desired_count: 1,
        }
    }

    pub fn with_listener_port(mut self, port: u16) -> Self {
        self.listener_port = port;
        self
    }

    pub fn with_resources(mut self, cpu_units: u32, memory_mib: u32) -> Self {
        self.resources = ResourceAllocation::new(cpu_units, memory_mib);
        self
    }

    pub fn with_desired_count(mut self, count: u32) -> Self {
        self.desired_count = count;
        self
    }
}

/// Network identity an ingress rule accepts traffic from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngressSource {
    /// A registered service, matched by logical name.
    Service(String),
    /// Any external IPv4 source.
    AnyIpv4,
}

impl fmt::Display for IngressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(name) => f.write_str(name),
            Self::AnyIpv4 => f.write_str("any"),
        }
    }
}

/// Allow rule: `source` may open connections to `target` on `port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub source: IngressSource,
    pub target: String,
    pub port: u16,
}

/// Why a connection attempt was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    UnknownService(String),

    PortMismatch { service: String, port: u16 },

    NotPermitted {
        source: String,
        target: String,
        port: u16,
    },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::UnknownService(name) => {
                write!(f, "unknown service '{name}'")
            }
            PolicyViolation::PortMismatch { service, port } => {
                write!(f, "service '{service}' does not listen on port {port}")
            }
            PolicyViolation::NotPermitted {
                source,
                target,
                port,
            } => write!(f, "no ingress rule permits {source} -> {target}:{port}"),
        }
    }
}

impl std::error::Error for PolicyViolation {}

/// Registered services and the ingress allow-list between them.
///
/// Default-deny: a connection is permitted only when an explicit rule
/// matches the (source, target, port) triple.
#[derive(Debug, Clone)]
pub struct Topology {
    namespace: String,
    services: HashMap<String, ServiceSpec>,
    ingress: Vec<IngressRule>,
}

impl Topology {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            services: HashMap::new(),
            ingress: Vec::new(),
        }
    }

    /// The canonical two-tier deployment: a public gateway fronted on port
    /// 80, and a private store reachable only from the gateway's identity.
    pub fn two_tier(namespace: impl Into<String>, gateway_port: u16, store: ServiceEndpoint) -> Self {
        let store_name = store.name.clone();
        let store_port = store.port;
        Self::new(namespace)
            .register(
                ServiceSpec::new(ServiceEndpoint::new(
                    GATEWAY_SERVICE,
                    gateway_port,
                    Visibility::Public,
                ))
                .with_listener_port(GATEWAY_LISTENER_PORT),
            )
            .register(ServiceSpec::new(store))
            .allow_from_any(GATEWAY_SERVICE, gateway_port)
            .allow_from_service(GATEWAY_SERVICE, store_name, store_port)
    }

    pub fn register(mut self, spec: ServiceSpec) -> Self {
        self.services.insert(spec.endpoint.name.clone(), spec);
        self
    }

    /// Permit `source` (a registered service identity) to reach `target` on `port`.
    pub fn allow_from_service(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        port: u16,
    ) -> Self {
        self.ingress.push(IngressRule {
            source: IngressSource::Service(source.into()),
            target: target.into(),
            port,
        });
        self
    }

    /// Permit any external source to reach `target` on `port`.
    pub fn allow_from_any(mut self, target: impl Into<String>, port: u16) -> Self {
        self.ingress.push(IngressRule {
            source: IngressSource::AnyIpv4,
            target: target.into(),
            port,
        });
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.get(name)
    }

    /// Decide whether `source` may open a connection to `target` on `port`.
    ///
    /// Default-deny: anything not matching an allow rule is a violation.
    pub fn authorize(&self, source: &str, target: &str, port: u16) -> Result<(), PolicyViolation> {
        let spec = self
            .services
            .get(target)
            .ok_or_else(|| PolicyViolation::UnknownService(target.to_string()))?;

        if spec.endpoint.port != port {
            return Err(PolicyViolation::PortMismatch {
                service: target.to_string(),
                port,
            });
        }

        let permitted = self.ingress.iter().any(|rule| {
            rule.target == target
                && rule.port == port
                && match &rule.source {
                    IngressSource::Service(name) => name == source,
                    IngressSource::AnyIpv4 => true,
                }
        });

        if permitted {
            Ok(())
        } else {
            Err(PolicyViolation::NotPermitted {
                source: source.to_string(),
                target: target.to_string(),
                port,
            })
        }
    }
}
