//! Gateway Server
//!
//! HTTP server exposing the key-value surface. Self-contained with
//! dependency injection: the store handle is passed in behind a trait
//! object, so tests run the full router against a mock store.

mod handlers;

pub use handlers::AppState;

use anyhow::Context;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use kvgate_core::{KeyValueStore, GATEWAY_PORT};

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS for browser access
    pub enable_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: GATEWAY_PORT,
            enable_cors: true,
        }
    }
}

impl GatewayConfig {
    /// Environment variable naming the listening port.
    pub const ENV_PORT: &'static str = "PORT";

    /// Read `PORT` from the environment, defaulting to 8080.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(port) = std::env::var(Self::ENV_PORT) {
            config.port = port
                .parse()
                .with_context(|| format!("invalid {} value '{port}'", Self::ENV_PORT))?;
        }
        Ok(config)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid address")
    }
}

/// External dependencies injected into the gateway.
pub struct GatewayDependencies {
    pub store: Arc<dyn KeyValueStore>,
}

impl GatewayDependencies {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

/// Key-Value Gateway Server
///
/// Stateless per request: each inbound request is an independent unit of
/// work performing at most one store round trip, so no in-process
/// synchronization exists here.
pub struct GatewayServer {
    config: GatewayConfig,
    dependencies: GatewayDependencies,
}

impl GatewayServer {
    /// Create a new gateway server with dependency injection
    pub fn new(config: GatewayConfig, dependencies: GatewayDependencies) -> Self {
        Self {
            config,
            dependencies,
        }
    }

    /// Build the Axum router
    fn build_router(&self) -> Router {
        let app_state = AppState {
            store: Arc::clone(&self.dependencies.store),
            port: self.config.port,
        };

        let mut router = Router::new()
            // Liveness/identity probe. The only static route: every other
            // path segment is key namespace.
            .route("/", get(handlers::root))
            .route("/{key}", get(handlers::read_key).post(handlers::write_key))
            .with_state(app_state)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Run the gateway server, binding from its configuration.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.addr();

        info!("[Gateway] Starting on {}", addr);
        info!(
            "[Gateway] CORS: {}",
            if self.config.enable_cors {
                "enabled"
            } else {
                "disabled"
            }
        );

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.
    ///
    /// Used directly by tests, which bind an ephemeral port themselves.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let router = self.build_router();

        info!("[Gateway] Ready to accept connections");

        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Start the server in the background
    ///
    /// Returns a JoinHandle that can be used to wait for completion or abort.
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
