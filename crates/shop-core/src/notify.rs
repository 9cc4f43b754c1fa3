//! # Payment Notifications
//!
//! Fire-and-forget hook invoked after a payment commits. Failures are
//! logged by the caller and never reach the payer.

use crate::error::ShopResult;
use crate::order::Order;
use crate::payment::Payment;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Receives "payment received" events
#[async_trait]
pub trait PaymentNotifier: Send + Sync {
    async fn payment_received(&self, order: &Order, payment: &Payment) -> ShopResult<()>;
}

/// Type alias for a shared notifier
pub type BoxedPaymentNotifier = Arc<dyn PaymentNotifier>;

/// Default notifier (just logs events)
pub struct LoggingNotifier;

#[async_trait]
impl PaymentNotifier for LoggingNotifier {
    async fn payment_received(&self, order: &Order, payment: &Payment) -> ShopResult<()> {
        info!(
            "Payment received: order={}, payment={}, amount={} {}",
            order.id, payment.gateway_payment_id, payment.amount, payment.currency
        );
        Ok(())
    }
}
