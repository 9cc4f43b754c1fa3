//! # shop-razorpay
//!
//! Razorpay payment gateway for storefront-rs.
//!
//! `RazorpayGateway` mints Razorpay orders for the payment intent bridge and
//! reads them back when a payment callback is verified.
//! Callback signatures use the same account secret and are checked with the
//! `SignatureVerifier` returned by [`RazorpayConfig::signature_verifier`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_razorpay::{RazorpayConfig, RazorpayGateway};
//!
//! let config = RazorpayConfig::from_env();
//! let verifier = config.signature_verifier();
//! let gateway = Arc::new(RazorpayGateway::new(config)?);
//!
//! let intents = PaymentIntentService::new(store.clone(), gateway.clone(), Currency::INR);
//! ```

pub mod config;
pub mod gateway;

// Re-exports
pub use config::{RazorpayConfig, DEFAULT_API_BASE_URL};
pub use gateway::RazorpayGateway;
