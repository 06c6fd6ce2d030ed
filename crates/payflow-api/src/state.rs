//! # Application State
//!
//! Shared state for the Axum application: the lifecycle controller (which
//! owns the gateway registry and the store boundary) plus service config.

use payflow_core::{
    Amount, Currency, GatewayRegistry, MemoryTransactionStore, PaymentFlow, RedirectContext,
    Transaction, TransactionStore,
};
use payflow_wompi::WompiGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Public base URL used for provider redirect-back URLs
    pub base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Seed one demo transaction at startup (development convenience)
    pub seed_demo: bool,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            seed_demo: std::env::var("SEED_DEMO_TRANSACTION")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(false),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Transaction lifecycle controller
    pub flow: PaymentFlow,
    /// Store handle kept for seeding (the controller owns its own handle)
    pub store: Arc<MemoryTransactionStore>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Wompi gateway from the environment
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let store = Arc::new(MemoryTransactionStore::new());
        if config.seed_demo {
            let demo = Transaction::new(Amount::from_minor(50000, Currency::COP)?);
            tracing::info!("Seeded demo transaction: {}", demo.id);
            store.insert(demo).await;
        }

        let wompi = WompiGateway::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Wompi: {}", e))?;
        let registry = GatewayRegistry::new().with_gateway(Arc::new(wompi));

        Ok(Self::with_parts(registry, store, config))
    }

    /// Assemble state from explicit parts (used by tests)
    pub fn with_parts(
        registry: GatewayRegistry,
        store: Arc<MemoryTransactionStore>,
        config: AppConfig,
    ) -> Self {
        let flow = PaymentFlow::new(registry, store.clone() as Arc<dyn TransactionStore>);
        Self {
            flow,
            store,
            config,
        }
    }

    /// Ambient context for building absolute redirect-back URLs
    pub fn redirect_context(&self) -> RedirectContext {
        RedirectContext::new(self.config.base_url.as_str())
    }
}
