//! # Payment Intent Bridge
//!
//! Mints a gateway order handle for an unpaid order. Handles are not cached:
//! each call may produce a new one, and no local state is written.

use super::{gateway_call, Actor};
use crate::error::{ShopError, ShopResult};
use crate::gateway::BoxedPaymentGateway;
use crate::payment::{GatewayOrderRequest, PaymentIntent, ORDER_ID_NOTE, USER_ID_NOTE};
use crate::product::Currency;
use crate::store::OrderStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Upper bound on a single gateway round trip
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway receipts are capped at 40 characters.
fn receipt_for(order_id: &str) -> String {
    let compact: String = order_id.chars().filter(|c| *c != '-').collect();
    let mut receipt = format!("order_{}", compact);
    receipt.truncate(40);
    receipt
}

#[derive(Clone)]
pub struct PaymentIntentService {
    orders: Arc<dyn OrderStore>,
    gateway: BoxedPaymentGateway,
    currency: Currency,
    timeout: Duration,
}

impl PaymentIntentService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        gateway: BoxedPaymentGateway,
        currency: Currency,
    ) -> Self {
        Self {
            orders,
            gateway,
            currency,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Builder: set the gateway call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Obtain a payable gateway handle for `order_id`.
    #[instrument(
        skip(self),
        fields(user_id = %actor.user_id, provider = self.gateway.provider_name())
    )]
    pub async fn create_intent(&self, actor: &Actor, order_id: &str) -> ShopResult<PaymentIntent> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| ShopError::order_not_found(order_id))?;

        if !order.is_owned_by(&actor.user_id) {
            return Err(ShopError::AccessDenied(format!(
                "order {} belongs to another user",
                order.id
            )));
        }

        if order.is_paid() {
            return Err(ShopError::AlreadyPaid { order_id: order.id });
        }

        let amount = self.currency.to_minor_units(order.total_amount).ok_or_else(|| {
            ShopError::Internal(format!(
                "order total {} does not fit in minor units",
                order.total_amount
            ))
        })?;

        let mut notes = HashMap::new();
        notes.insert(ORDER_ID_NOTE.to_string(), order.id.clone());
        notes.insert(USER_ID_NOTE.to_string(), actor.user_id.clone());

        let request = GatewayOrderRequest {
            amount,
            currency: self.currency,
            receipt: receipt_for(&order.id),
            notes,
        };

        let provider = self.gateway.provider_name();
        let call = self.gateway.create_order(&request);
        let gateway_order = gateway_call(provider, self.timeout, call)
            .await
            .map_err(|e| {
                error!("Failed to create gateway order: {}", e);
                match e {
                    unavailable @ ShopError::PaymentSystemUnavailable(_) => unavailable,
                    other => ShopError::PaymentSystemUnavailable(other.to_string()),
                }
            })?;

        info!(
            "Created gateway order: id={}, amount={} {}",
            gateway_order.id, gateway_order.amount, gateway_order.currency
        );

        Ok(PaymentIntent {
            gateway_order_id: gateway_order.id,
            amount: gateway_order.amount,
            currency: gateway_order.currency,
            key_id: self.gateway.key_id().to_string(),
        })
    }
}
