//! Service topology and discovery tests
//!
//! The connectivity contract between tiers: who may reach whom, on which
//! port, and how logical names turn into addresses.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use tests::{store_endpoint, store_settings_for, MockStore};

use kvgate_core::{
    DnsDiscovery, PolicyViolation, ServiceDiscovery, ServiceEndpoint, StaticDiscovery, Topology,
    Visibility, GATEWAY_LISTENER_PORT, GATEWAY_PORT, GATEWAY_SERVICE, STORE_PORT, STORE_SERVICE,
};
use kvgate_store::{ConnectionPool, PoolConfig};

// ============================================================================
// Connectivity policy
// ============================================================================

#[tokio::test]
async fn only_the_gateway_reaches_the_store() {
    let topology = Topology::two_tier("service.internal", GATEWAY_PORT, store_endpoint(STORE_PORT));

    assert!(topology
        .authorize(GATEWAY_SERVICE, STORE_SERVICE, STORE_PORT)
        .is_ok());

    for intruder in ["metrics", "debug-shell", "some-external-client"] {
        let denied = topology.authorize(intruder, STORE_SERVICE, STORE_PORT);
        assert!(matches!(denied, Err(PolicyViolation::NotPermitted { .. })));
    }
}

#[tokio::test]
async fn the_gateway_accepts_any_external_source() {
    let topology = Topology::two_tier("service.internal", GATEWAY_PORT, store_endpoint(STORE_PORT));

    assert!(topology
        .authorize("some-external-client", GATEWAY_SERVICE, GATEWAY_PORT)
        .is_ok());
    assert!(topology
        .authorize(STORE_SERVICE, GATEWAY_SERVICE, GATEWAY_PORT)
        .is_ok());
}

#[tokio::test]
async fn tier_exposure_and_port_mapping() {
    let topology = Topology::two_tier("service.internal", GATEWAY_PORT, store_endpoint(STORE_PORT));

    let gateway = topology.service(GATEWAY_SERVICE).unwrap();
    assert_eq!(gateway.endpoint.visibility, Visibility::Public);
    assert_eq!(gateway.listener_port, GATEWAY_LISTENER_PORT);
    assert_eq!(gateway.endpoint.port, GATEWAY_PORT);

    let store = topology.service(STORE_SERVICE).unwrap();
    assert_eq!(store.endpoint.visibility, Visibility::Private);
    assert_eq!(store.listener_port, STORE_PORT);
    assert_eq!(store.desired_count, 1);
}

#[tokio::test]
async fn settings_derived_topology_authorizes_the_configured_port() {
    let settings = kvgate_store::StoreSettings::from_url("redis://cache.prod.local:6380").unwrap();
    assert_eq!(settings.service, "cache");
    assert_eq!(settings.namespace, "prod.local");

    let topology = Topology::two_tier(settings.namespace.clone(), GATEWAY_PORT, settings.endpoint());
    assert!(topology.authorize(GATEWAY_SERVICE, "cache", 6380).is_ok());
    assert!(matches!(
        topology.authorize(GATEWAY_SERVICE, "cache", STORE_PORT),
        Err(PolicyViolation::PortMismatch { .. })
    ));
}

// ============================================================================
// Discovery
// ============================================================================

#[tokio::test]
async fn dns_discovery_resolves_bare_hosts() {
    let discovery = DnsDiscovery::new("");
    let endpoint = ServiceEndpoint::new("localhost", 6379, Visibility::Private);

    let addrs = discovery.resolve(&endpoint).await.unwrap();
    assert!(addrs.iter().all(|a| a.port() == 6379));
    assert!(!addrs.is_empty());
}

#[tokio::test]
async fn connections_rotate_across_discovered_instances() {
    let instance_a = MockStore::start().await;
    let instance_b = MockStore::start().await;

    let settings = store_settings_for(instance_a.addr());
    let discovery: Arc<dyn ServiceDiscovery> = Arc::new(
        StaticDiscovery::new()
            .with_service(STORE_SERVICE, instance_a.addr())
            .with_service(STORE_SERVICE, instance_b.addr()),
    );

    let pool = ConnectionPool::new(settings.endpoint(), discovery, PoolConfig::default());

    // Acquire two fresh connections without releasing either.
    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();

    // Accept loops run asynchronously; give them a beat to count.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert_eq!(instance_a.connections(), 1);
    assert_eq!(instance_b.connections(), 1);

    drop(first);
    drop(second);
}
