//! # Services
//!
//! The order/payment consistency core. Each service is a small struct over
//! injected stores and capabilities, cheap to clone into request handlers.

pub mod intent;
pub mod placement;
pub mod queries;
pub mod status;
pub mod verification;

pub use intent::{PaymentIntentService, DEFAULT_GATEWAY_TIMEOUT};
pub use placement::{OrderLineRequest, OrderPlacementService, PlaceOrder};
pub use queries::OrderQueryService;
pub use status::OrderStatusService;
pub use verification::{PaymentReceipt, PaymentVerificationService};

use crate::error::{ShopError, ShopResult};
use std::future::Future;
use std::time::Duration;
use tracing::error;

/// The authenticated caller of a service operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn customer(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: true,
        }
    }
}

/// Bound a gateway round trip; an elapsed timer is `PaymentSystemUnavailable`.
pub(crate) async fn gateway_call<T>(
    provider: &str,
    timeout: Duration,
    call: impl Future<Output = ShopResult<T>>,
) -> ShopResult<T> {
    tokio::time::timeout(timeout, call).await.map_err(|_| {
        error!("Gateway timed out after {:?}", timeout);
        ShopError::PaymentSystemUnavailable(format!(
            "{} did not respond within {:?}",
            provider, timeout
        ))
    })?
}
