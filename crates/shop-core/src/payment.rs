//! # Payment Records
//!
//! Append-only audit entries for verified gateway payments, plus the
//! gateway-facing request/response types used by the intent bridge.

use crate::order::Order;
use crate::product::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Status of a payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    Completed,
}

/// A verified payment, linked 1:1 to an order. Never updated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub user_id: String,

    /// Gateway order handle the customer paid against
    pub gateway_order_id: String,

    /// Gateway payment handle
    pub gateway_payment_id: String,

    /// Signature the gateway attached to the callback
    pub gateway_signature: String,

    pub amount: Decimal,
    pub currency: Currency,
    pub status: PaymentRecordStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Build a completed payment for `order` from a verified callback
    pub fn completed(order: &Order, callback: &PaymentCallback, currency: Currency) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
            gateway_order_id: callback.gateway_order_id.clone(),
            gateway_payment_id: callback.gateway_payment_id.clone(),
            gateway_signature: callback.gateway_signature.clone(),
            amount: order.total_amount,
            currency,
            status: PaymentRecordStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// True if this record was produced by the given gateway payment
    pub fn matches_gateway_payment(&self, gateway_payment_id: &str) -> bool {
        self.gateway_payment_id == gateway_payment_id
    }
}

/// Callback payload submitted after the customer pays on the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub order_id: String,
}

/// Request to mint a gateway order
#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in the currency's smallest unit
    pub amount: i64,
    pub currency: Currency,
    /// Our receipt reference
    pub receipt: String,
    /// Opaque metadata echoed back by the gateway
    pub notes: HashMap<String, String>,
}

/// A gateway order handle
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: Currency,
    #[serde(default)]
    pub receipt: Option<String>,
    /// Metadata attached when the order was minted
    #[serde(default, deserialize_with = "notes_or_empty")]
    pub notes: HashMap<String, String>,
}

impl GatewayOrder {
    /// Our order id, as recorded in the gateway order's notes
    pub fn order_reference(&self) -> Option<&str> {
        self.notes.get(ORDER_ID_NOTE).map(String::as_str)
    }
}

/// Note key carrying our order id on a gateway order
pub const ORDER_ID_NOTE: &str = "orderId";

/// Note key carrying the paying user's id on a gateway order
pub const USER_ID_NOTE: &str = "userId";

// Razorpay sends `"notes": []` when an order has no notes.
fn notes_or_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Notes {
        Map(HashMap<String, String>),
        List(Vec<String>),
    }

    Ok(match Option::<Notes>::deserialize(deserializer)? {
        Some(Notes::Map(notes)) => notes,
        Some(Notes::List(_)) | None => HashMap::new(),
    })
}

/// What the client needs to open the gateway checkout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentIntent {
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: Currency,
    pub key_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_order_notes() {
        let order: GatewayOrder = serde_json::from_value(serde_json::json!({
            "id": "order_1",
            "amount": 20000,
            "currency": "INR",
            "notes": { "orderId": "o1", "userId": "u1" }
        }))
        .unwrap();
        assert_eq!(order.order_reference(), Some("o1"));

        let empty: GatewayOrder = serde_json::from_value(serde_json::json!({
            "id": "order_2",
            "amount": 100,
            "currency": "INR",
            "notes": []
        }))
        .unwrap();
        assert!(empty.notes.is_empty());
        assert_eq!(empty.order_reference(), None);
    }
}
