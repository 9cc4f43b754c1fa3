//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the order/payment services built over one store, and configuration.

use crate::notify::WebhookNotifier;
use shop_core::{
    BoxedPaymentGateway, BoxedPaymentNotifier, Currency, LoggingNotifier, MemoryStore,
    OrderPlacementService, OrderQueryService, OrderStatusService, PaymentIntentService,
    PaymentVerificationService, ProductCatalog, SignatureVerifier, DEFAULT_GATEWAY_TIMEOUT,
};
use shop_razorpay::{RazorpayConfig, RazorpayGateway};
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// HS256 key for bearer tokens
    pub jwt_secret: String,
    /// Currency all prices and payments are denominated in
    pub currency: Currency,
    /// Upper bound on a gateway round trip
    pub gateway_timeout: Duration,
    /// Receives a JSON summary of every verified payment
    pub notify_webhook_url: Option<String>,
    /// Catalog seed file
    pub products_file: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            None => {
                tracing::warn!("JWT_SECRET not set, using an insecure development key");
                "dev-only-insecure-jwt-secret".to_string()
            }
        };

        let currency = match var("CURRENCY") {
            Some(code) => code
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid CURRENCY: {}", e))?,
            None => Currency::default(),
        };

        let gateway_timeout = match var("GATEWAY_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .map_err(|e| anyhow::anyhow!("Invalid GATEWAY_TIMEOUT_SECS: {}", e))?,
            ),
            None => DEFAULT_GATEWAY_TIMEOUT,
        };

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            environment,
            jwt_secret,
            currency,
            gateway_timeout,
            notify_webhook_url: var("NOTIFY_WEBHOOK_URL"),
            products_file: var("PRODUCTS_FILE"),
        })
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e)
            })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("currency", &self.currency)
            .field("gateway_timeout", &self.gateway_timeout)
            .field("notify_webhook_url", &self.notify_webhook_url)
            .field("products_file", &self.products_file)
            .finish_non_exhaustive()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub placement: OrderPlacementService,
    pub intents: PaymentIntentService,
    pub verification: PaymentVerificationService,
    pub statuses: OrderStatusService,
    pub queries: OrderQueryService,
    /// Name of the configured payment provider
    pub provider: &'static str,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Razorpay gateway
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let catalog = load_product_catalog(config.products_file.as_deref())?;

        let razorpay = RazorpayConfig::from_env().with_timeout(config.gateway_timeout);
        tracing::info!("Razorpay mode: {}", razorpay_mode(&razorpay));
        let verifier = razorpay.signature_verifier();
        let gateway = RazorpayGateway::new(razorpay)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Razorpay: {}", e))?;

        let notifier: BoxedPaymentNotifier = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
            None => Arc::new(LoggingNotifier),
        };

        Ok(Self::build(config, catalog, Arc::new(gateway), verifier, notifier))
    }

    /// Wire the services over a fresh in-memory store
    pub fn build(
        config: AppConfig,
        catalog: ProductCatalog,
        gateway: BoxedPaymentGateway,
        verifier: Option<SignatureVerifier>,
        notifier: BoxedPaymentNotifier,
    ) -> Self {
        let store = Arc::new(MemoryStore::with_catalog(catalog));
        let provider = gateway.provider_name();

        Self {
            placement: OrderPlacementService::new(store.clone(), store.clone()),
            intents: PaymentIntentService::new(store.clone(), gateway.clone(), config.currency)
                .with_timeout(config.gateway_timeout),
            verification: PaymentVerificationService::new(
                store.clone(),
                gateway,
                verifier,
                notifier,
                config.currency,
            )
            .with_timeout(config.gateway_timeout),
            statuses: OrderStatusService::new(store.clone()),
            queries: OrderQueryService::new(store.clone(), store),
            provider,
            config,
        }
    }
}

/// Which Razorpay account the credentials point at
fn razorpay_mode(config: &RazorpayConfig) -> &'static str {
    if !config.is_configured() {
        "unconfigured"
    } else if config.is_test_mode() {
        "test"
    } else {
        "live"
    }
}

/// Load product catalog from config file
fn load_product_catalog(explicit: Option<&str>) -> anyhow::Result<ProductCatalog> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
        return parse_catalog(path, &content);
    }

    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            return parse_catalog(path, &content);
        }
    }

    tracing::warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::default())
}

fn parse_catalog(path: &str, content: &str) -> anyhow::Result<ProductCatalog> {
    let catalog = ProductCatalog::from_toml(content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
    tracing::info!("Loaded {} products from {}", catalog.products.len(), path);
    Ok(catalog)
}
