//! # Razorpay Orders
//!
//! Implementation of the Razorpay Orders API. A Razorpay order is the
//! handle the checkout widget pays against; its id is later signed into the
//! payment callback.

use crate::config::RazorpayConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use shop_core::{GatewayOrder, GatewayOrderRequest, PaymentGateway, ShopError, ShopResult};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "razorpay";

/// Razorpay gateway
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Client,
}

impl RazorpayGateway {
    /// Create a new Razorpay gateway
    pub fn new(config: RazorpayConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShopError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn credentials(&self) -> ShopResult<(&str, &str)> {
        match (self.config.key_id.as_deref(), self.config.key_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => {
                error!("Razorpay credentials not configured");
                Err(ShopError::PaymentSystemUnavailable(
                    "payment system not configured".to_string(),
                ))
            }
        }
    }

    /// Send an authenticated request and read the whole body
    async fn send(&self, request: RequestBuilder) -> ShopResult<(StatusCode, String)> {
        let (key_id, key_secret) = self.credentials()?;

        let response = request
            .basic_auth(key_id, Some(key_secret))
            .send()
            .await
            .map_err(|e| {
                error!("Razorpay request failed: {}", e);
                ShopError::PaymentSystemUnavailable(format!("{} unreachable: {}", PROVIDER, e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ShopError::PaymentSystemUnavailable(format!("{} response unreadable: {}", PROVIDER, e))
        })?;

        if !status.is_success() {
            error!("Razorpay API error: status={}, body={}", status, body);
        }
        Ok((status, body))
    }
}

/// Provider-facing message for a non-2xx response
fn rejection_message(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<RazorpayErrorResponse>(body)
        .map(|r| r.error.description)
        .unwrap_or_else(|_| format!("HTTP {}", status));
    format!("{}: {}", PROVIDER, message)
}

fn parse_order(body: &str) -> ShopResult<GatewayOrder> {
    serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse Razorpay order: {}", e);
        ShopError::PaymentSystemUnavailable(format!(
            "{} returned an unexpected response",
            PROVIDER
        ))
    })
}

/// Razorpay order ids are `order_` followed by alphanumerics.
fn is_order_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self, request), fields(receipt = %request.receipt, amount = request.amount))]
    async fn create_order(&self, request: &GatewayOrderRequest) -> ShopResult<GatewayOrder> {
        let url = format!("{}/v1/orders", self.config.api_base_url);

        debug!("Creating Razorpay order: {} {}", request.amount, request.currency);

        let (status, body) = self.send(self.client.post(&url).json(request)).await?;
        if !status.is_success() {
            return Err(ShopError::PaymentSystemUnavailable(rejection_message(
                status, &body,
            )));
        }

        let order = parse_order(&body)?;
        info!("Created Razorpay order: id={}", order.id);
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn fetch_order(&self, gateway_order_id: &str) -> ShopResult<GatewayOrder> {
        if !is_order_id(gateway_order_id) {
            return Err(ShopError::Validation(format!(
                "malformed gateway order id {:?}",
                gateway_order_id
            )));
        }
        let url = format!("{}/v1/orders/{}", self.config.api_base_url, gateway_order_id);

        let (status, body) = self.send(self.client.get(&url)).await?;
        match status {
            // Razorpay answers 400 for ids it never issued
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(ShopError::Validation(rejection_message(status, &body)))
            }
            s if !s.is_success() => Err(ShopError::PaymentSystemUnavailable(rejection_message(
                status, &body,
            ))),
            _ => {
                let order = parse_order(&body)?;
                debug!("Fetched Razorpay order: id={}, amount={}", order.id, order.amount);
                Ok(order)
            }
        }
    }

    fn key_id(&self) -> &str {
        self.config.key_id.as_deref().unwrap_or_default()
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Razorpay API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RazorpayErrorResponse {
    error: RazorpayError,
}

#[derive(Debug, Deserialize)]
struct RazorpayError {
    #[serde(default)]
    description: String,
}
