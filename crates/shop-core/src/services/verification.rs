//! # Payment Verification
//!
//! The critical path. A callback is authenticated by its HMAC signature
//! before anything is written. The signature only covers the gateway
//! handles, so the gateway order is then read back and must have been
//! minted for this order and for its total. A callback that passes both
//! checks is committed through `OrderStore::commit_payment`, which appends
//! the payment, marks the order paid and decrements stock in one step.
//!
//! Resubmitting a callback that was already committed returns the stored
//! payment unchanged, so a client retrying after a lost response converges
//! instead of double-charging stock.

use super::{gateway_call, DEFAULT_GATEWAY_TIMEOUT};
use crate::error::{ShopError, ShopResult};
use crate::gateway::BoxedPaymentGateway;
use crate::notify::BoxedPaymentNotifier;
use crate::order::Order;
use crate::payment::{Payment, PaymentCallback};
use crate::product::Currency;
use crate::signature::SignatureVerifier;
use crate::store::{CommitOutcome, OrderStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn, Instrument};

/// Result of a successful verification
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub order: Order,
    pub payment: Payment,
    /// True when this callback had already been committed earlier
    pub replayed: bool,
}

/// The only writer of payments and of the order's payment fields.
#[derive(Clone)]
pub struct PaymentVerificationService {
    orders: Arc<dyn OrderStore>,
    gateway: BoxedPaymentGateway,
    verifier: Option<SignatureVerifier>,
    notifier: BoxedPaymentNotifier,
    currency: Currency,
    timeout: Duration,
}

impl PaymentVerificationService {
    /// `verifier` is `None` when the gateway secret is not configured; every
    /// verification then fails with `PaymentSystemUnavailable`.
    pub fn new(
        orders: Arc<dyn OrderStore>,
        gateway: BoxedPaymentGateway,
        verifier: Option<SignatureVerifier>,
        notifier: BoxedPaymentNotifier,
        currency: Currency,
    ) -> Self {
        Self {
            orders,
            gateway,
            verifier,
            notifier,
            currency,
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Builder: set the gateway call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Authenticate `callback` and commit the payment it reports.
    #[instrument(
        skip(self, callback),
        fields(
            order_id = %callback.order_id,
            gateway_payment_id = %callback.gateway_payment_id
        )
    )]
    pub async fn verify_payment(&self, callback: PaymentCallback) -> ShopResult<PaymentReceipt> {
        let order = self
            .orders
            .find_order(&callback.order_id)
            .await?
            .ok_or_else(|| ShopError::order_not_found(&callback.order_id))?;

        let verifier = self.verifier.as_ref().ok_or_else(|| {
            error!("Gateway secret not configured");
            ShopError::PaymentSystemUnavailable("payment system not configured".to_string())
        })?;

        if !verifier.verify(
            &callback.gateway_order_id,
            &callback.gateway_payment_id,
            &callback.gateway_signature,
        ) {
            warn!("Rejected callback with invalid signature");
            return Err(ShopError::InvalidSignature);
        }

        if order.is_paid() {
            return self.replay(order, &callback).await;
        }

        self.confirm_minted_for(&order, &callback).await?;

        let payment = Payment::completed(&order, &callback, self.currency);

        match self.orders.commit_payment(payment).await? {
            CommitOutcome::Committed {
                order,
                payment,
                stock,
                missing_products,
            } => {
                for oversold in stock.iter().filter(|s| s.is_oversold()) {
                    warn!(
                        "Oversell on {}: requested={}, decremented={}, shortfall={}",
                        oversold.product_id,
                        oversold.requested,
                        oversold.applied,
                        oversold.shortfall()
                    );
                }
                for product_id in &missing_products {
                    warn!("Paid line item references missing product {}", product_id);
                }

                info!(
                    "Payment verified: order={}, payment={}, amount={} {}",
                    order.id, payment.gateway_payment_id, payment.amount, payment.currency
                );

                self.notify(order.clone(), payment.clone());

                Ok(PaymentReceipt {
                    order,
                    payment,
                    replayed: false,
                })
            }
            CommitOutcome::AlreadyCommitted { order, payment } => {
                info!("Callback already committed by a concurrent request");
                Ok(PaymentReceipt {
                    order,
                    payment,
                    replayed: true,
                })
            }
        }
    }

    /// Check the gateway order behind `callback` was minted for `order`'s
    /// id and total.
    async fn confirm_minted_for(
        &self,
        order: &Order,
        callback: &PaymentCallback,
    ) -> ShopResult<()> {
        let provider = self.gateway.provider_name();
        let call = self.gateway.fetch_order(&callback.gateway_order_id);
        let minted = gateway_call(provider, self.timeout, call)
            .await
            .map_err(|e| {
                error!("Failed to fetch gateway order {}: {}", callback.gateway_order_id, e);
                match e {
                    keep @ (ShopError::Validation(_) | ShopError::PaymentSystemUnavailable(_)) => {
                        keep
                    }
                    other => ShopError::PaymentSystemUnavailable(other.to_string()),
                }
            })?;

        if minted.order_reference() != Some(order.id.as_str()) {
            warn!(
                "Gateway order {} was minted for {:?}, not {}",
                minted.id,
                minted.order_reference(),
                order.id
            );
            return Err(ShopError::Validation(format!(
                "gateway order {} was not issued for order {}",
                minted.id, order.id
            )));
        }

        let expected = self.currency.to_minor_units(order.total_amount);
        if Some(minted.amount) != expected || minted.currency != self.currency {
            warn!(
                "Gateway order {} is for {} {}, order {} totals {} {}",
                minted.id,
                minted.amount,
                minted.currency,
                order.id,
                order.total_amount,
                self.currency
            );
            return Err(ShopError::Validation(format!(
                "gateway order {} amount does not match order total",
                minted.id
            )));
        }

        Ok(())
    }

    /// Send the payment notification without holding up the caller
    fn notify(&self, order: Order, payment: Payment) {
        let notifier = self.notifier.clone();
        tokio::spawn(
            async move {
                if let Err(e) = notifier.payment_received(&order, &payment).await {
                    error!("Payment notification failed: {}", e);
                }
            }
            .in_current_span(),
        );
    }

    /// Handle a callback for an order that is already paid
    async fn replay(&self, order: Order, callback: &PaymentCallback) -> ShopResult<PaymentReceipt> {
        let payment = self.orders.payment_for_order(&order.id).await?.ok_or_else(|| {
            ShopError::Internal(format!("order {} is paid but has no payment record", order.id))
        })?;

        if !payment.matches_gateway_payment(&callback.gateway_payment_id) {
            warn!(
                "Order already paid by {}, rejecting {}",
                payment.gateway_payment_id, callback.gateway_payment_id
            );
            return Err(ShopError::AlreadyPaid { order_id: order.id });
        }

        info!("Replayed callback for already committed payment");
        Ok(PaymentReceipt {
            order,
            payment,
            replayed: true,
        })
    }
}
