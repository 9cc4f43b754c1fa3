//! # Shop Error Types
//!
//! Typed error handling for the storefront order/payment core.
//! All service operations return `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for all order, catalog and payment operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Order does not exist
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Product does not resolve in the catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Caller does not own the resource or lacks the admin role
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Malformed input (empty items, bad quantity, incomplete address)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested quantity exceeds current stock
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// Order already has a completed payment
    #[error("Order already paid: {order_id}")]
    AlreadyPaid { order_id: String },

    /// Gateway callback signature mismatch
    #[error("Invalid payment signature")]
    InvalidSignature,

    /// Gateway unreachable, misconfigured or timed out
    #[error("Payment system unavailable: {0}")]
    PaymentSystemUnavailable(String),

    /// Unexpected store failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Stable, caller-visible error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ShopError::OrderNotFound { .. } | ShopError::ProductNotFound { .. } => "not_found",
            ShopError::AccessDenied(_) => "access_denied",
            ShopError::Validation(_) => "validation_error",
            ShopError::InsufficientStock { .. } => "insufficient_stock",
            ShopError::AlreadyPaid { .. } => "already_paid",
            ShopError::InvalidSignature => "invalid_signature",
            ShopError::PaymentSystemUnavailable(_) => "payment_system_unavailable",
            ShopError::Internal(_) => "internal",
        }
    }

    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShopError::PaymentSystemUnavailable(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::OrderNotFound { .. } => 404,
            ShopError::ProductNotFound { .. } => 404,
            ShopError::AccessDenied(_) => 403,
            ShopError::Validation(_) => 400,
            ShopError::InsufficientStock { .. } => 409,
            ShopError::AlreadyPaid { .. } => 409,
            ShopError::InvalidSignature => 400,
            ShopError::PaymentSystemUnavailable(_) => 503,
            ShopError::Internal(_) => 500,
        }
    }

    pub(crate) fn order_not_found(order_id: impl Into<String>) -> Self {
        ShopError::OrderNotFound {
            order_id: order_id.into(),
        }
    }

    pub(crate) fn product_not_found(product_id: impl Into<String>) -> Self {
        ShopError::ProductNotFound {
            product_id: product_id.into(),
        }
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
