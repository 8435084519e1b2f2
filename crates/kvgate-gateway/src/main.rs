//! Gateway binary: assemble the two-tier topology and serve.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use kvgate_core::{DnsDiscovery, KeyValueStore, ServiceDiscovery, Topology};
use kvgate_gateway::{GatewayConfig, GatewayDependencies, GatewayServer};
use kvgate_store::{HealthMonitor, StoreClient, StoreSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = GatewayConfig::from_env()?;
    let settings = StoreSettings::from_env()?;

    let topology = Arc::new(Topology::two_tier(
        settings.namespace.clone(),
        config.port,
        settings.endpoint(),
    ));
    let discovery: Arc<dyn ServiceDiscovery> = Arc::new(DnsDiscovery::new(settings.namespace.clone()));

    let store: Arc<StoreClient> = Arc::new(StoreClient::new(&settings, discovery, topology));
    let store: Arc<dyn KeyValueStore> = store;

    HealthMonitor::default().spawn(Arc::clone(&store));

    info!("[Main] Gateway tier up, store tier at {}", settings.endpoint());

    let dependencies = GatewayDependencies::new(store);
    GatewayServer::new(config, dependencies).run().await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
