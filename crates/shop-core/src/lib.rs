//! # shop-core
//!
//! Core types, stores and services for the storefront order/payment engine.
//!
//! This crate provides:
//! - `Product` and `ProductCatalog` for the product catalog
//! - `Order`, `LineItem` and `Payment` records
//! - `CatalogStore` / `OrderStore` traits with an in-memory `MemoryStore`
//! - `PaymentGateway` trait for implementing payment providers
//! - `SignatureVerifier` for authenticating gateway callbacks
//! - The order placement, payment intent, payment verification and status services
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Actor, MemoryStore, OrderPlacementService, PaymentVerificationService};
//!
//! let store = Arc::new(MemoryStore::with_catalog(catalog));
//!
//! // Place an order (stock is checked, not reserved)
//! let order = placement.place_order(&Actor::customer("u1"), request).await?;
//!
//! // Mint a gateway handle for the client checkout widget
//! let intent = intents.create_intent(&Actor::customer("u1"), &order.id).await?;
//!
//! // Verify the callback and commit the payment
//! let receipt = verification.verify_payment(callback).await?;
//! assert!(receipt.order.is_paid());
//! ```

pub mod error;
pub mod gateway;
pub mod notify;
pub mod order;
pub mod payment;
pub mod product;
pub mod services;
pub mod signature;
pub mod store;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use error::{ShopError, ShopResult};
pub use gateway::{BoxedPaymentGateway, PaymentGateway};
pub use notify::{BoxedPaymentNotifier, LoggingNotifier, PaymentNotifier};
pub use order::{LineItem, Order, OrderStatus, PaymentStatus, ShippingAddress};
pub use payment::{
    GatewayOrder, GatewayOrderRequest, Payment, PaymentCallback, PaymentIntent,
    PaymentRecordStatus, ORDER_ID_NOTE, USER_ID_NOTE,
};
pub use product::{Currency, Product, ProductCatalog};
pub use services::{
    Actor, OrderLineRequest, OrderPlacementService, OrderQueryService, OrderStatusService,
    PaymentIntentService, PaymentReceipt, PaymentVerificationService, PlaceOrder,
    DEFAULT_GATEWAY_TIMEOUT,
};
pub use signature::SignatureVerifier;
pub use store::{
    CatalogStore, CommitOutcome, MemoryStore, OrderStore, StatusChange, StockDecrement,
};
