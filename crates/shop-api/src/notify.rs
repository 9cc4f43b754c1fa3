//! Forwards "payment received" events to an external webhook.

use async_trait::async_trait;
use shop_core::{Order, Payment, PaymentNotifier, ShopError, ShopResult};
use std::time::Duration;
use tracing::{error, info};

/// Posts a JSON summary of each verified payment to `url`
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> ShopResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ShopError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

/// Body sent to the webhook
pub(crate) fn payment_summary(order: &Order, payment: &Payment) -> serde_json::Value {
    serde_json::json!({
        "event": "payment.received",
        "orderId": order.id,
        "userId": order.user_id,
        "paymentId": payment.gateway_payment_id,
        "amount": payment.amount.to_string(),
        "currency": payment.currency,
        "items": order.items.iter().map(|item| serde_json::json!({
            "productId": item.product_id,
            "name": item.name,
            "quantity": item.quantity,
        })).collect::<Vec<_>>(),
        "shippingAddress": order.shipping_address,
        "paidAt": payment.created_at.to_rfc3339(),
    })
}

#[async_trait]
impl PaymentNotifier for WebhookNotifier {
    async fn payment_received(&self, order: &Order, payment: &Payment) -> ShopResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&payment_summary(order, payment))
            .send()
            .await
            .map_err(|e| ShopError::Internal(format!("notification webhook unreachable: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            info!("Payment notification delivered: order={}, status={}", order.id, status);
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("Payment notification rejected: {} | {}", status, body);
            Err(ShopError::Internal(format!(
                "notification webhook returned {}",
                status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use shop_core::{Currency, LineItem, PaymentCallback, Product, ShippingAddress};

    #[test]
    fn test_payment_summary_shape() {
        let product = Product::new("desk-lamp", "Desk Lamp", dec!(100.00), 5);
        let order = Order::new(
            "u1",
            vec![LineItem::from_product(&product, 2)],
            ShippingAddress {
                street: "12 MG Road".to_string(),
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                zip_code: "560001".to_string(),
                country: "India".to_string(),
            },
        )
        .unwrap();
        let callback = PaymentCallback {
            gateway_order_id: "order_gw".to_string(),
            gateway_payment_id: "pay_1".to_string(),
            gateway_signature: "sig".to_string(),
            order_id: order.id.clone(),
        };
        let payment = Payment::completed(&order, &callback, Currency::INR);

        let summary = payment_summary(&order, &payment);

        assert_eq!(summary["orderId"], order.id.as_str());
        assert_eq!(summary["paymentId"], "pay_1");
        assert_eq!(summary["amount"], "200.00");
        assert_eq!(summary["currency"], "INR");
        assert_eq!(summary["items"][0]["quantity"], 2);
        assert_eq!(summary["shippingAddress"]["city"], "Bengaluru");
    }
}
