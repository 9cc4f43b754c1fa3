//! # Payment Gateway Trait
//!
//! The external payment processor as an injected capability. The intent
//! bridge mints gateway orders; verification reads them back to confirm a
//! signed callback was minted for the order it claims to pay. Callback
//! authenticity is checked with a [`SignatureVerifier`](crate::SignatureVerifier).
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          PaymentGateway (trait)             │
//! │  ├── create_order()                         │
//! │  ├── fetch_order()                          │
//! │  ├── key_id()                               │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                      ▲
//!          ┌───────────┴───────────┐
//!  ┌───────┴───────┐       ┌───────┴───────┐
//!  │RazorpayGateway│       │  test fakes   │
//!  └───────────────┘       └───────────────┘
//! ```

use crate::error::ShopResult;
use crate::payment::{GatewayOrder, GatewayOrderRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for payment gateway implementations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Mint a payable order handle on the gateway.
    ///
    /// Implementations report missing credentials, transport failures and
    /// gateway-side rejections as `ShopError::PaymentSystemUnavailable`.
    async fn create_order(&self, request: &GatewayOrderRequest) -> ShopResult<GatewayOrder>;

    /// Read back a gateway order, including the notes it was minted with.
    ///
    /// An id the gateway does not know is a `ShopError::Validation`; other
    /// failures are `ShopError::PaymentSystemUnavailable`.
    async fn fetch_order(&self, gateway_order_id: &str) -> ShopResult<GatewayOrder>;

    /// Public key the client uses to open the gateway checkout.
    fn key_id(&self) -> &str;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;
