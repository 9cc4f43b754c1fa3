//! # Order Types
//!
//! The order aggregate: snapshotted line items, the total computed at
//! placement time, the shipping address and the two status fields.

use crate::error::{ShopError, ShopResult};
use crate::product::Product;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line item in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product ID
    pub product_id: String,

    /// Product name (denormalized for display)
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Unit price, snapshotted when the order was placed
    pub unit_price: Decimal,
}

impl LineItem {
    /// Create a line item from a product, snapshotting its current price
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity,
            unit_price: product.price,
        }
    }

    /// Calculate the total price for this line item, `None` on overflow
    pub fn total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Postal address the order ships to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    #[serde(alias = "zipCode")]
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Check every field against its minimum trimmed length
    pub fn validate(&self) -> ShopResult<()> {
        let fields = [
            ("street", &self.street, 5),
            ("city", &self.city, 2),
            ("state", &self.state, 2),
            ("zip_code", &self.zip_code, 5),
            ("country", &self.country, 2),
        ];

        for (name, value, min_len) in fields {
            if value.trim().chars().count() < min_len {
                return Err(ShopError::Validation(format!(
                    "shipping_address.{} must be at least {} characters",
                    name, min_len
                )));
            }
        }
        Ok(())
    }

    /// Copy of the address with surrounding whitespace removed
    pub fn trimmed(&self) -> Self {
        Self {
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

/// Fulfilment lifecycle of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Position along the happy path; `Cancelled` sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// True when moving from `self` to `next` goes back along the lifecycle
    /// or reopens a cancelled order.
    pub fn is_backward_to(&self, next: OrderStatus) -> bool {
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to < from,
            (None, Some(_)) => true,
            _ => false,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// A customer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID (generated)
    pub id: String,

    /// Owning account
    pub user_id: String,

    /// Line items (never empty)
    pub items: Vec<LineItem>,

    /// Sum of the line totals at placement time
    pub total_amount: Decimal,

    pub shipping_address: ShippingAddress,

    #[serde(default)]
    pub status: OrderStatus,

    #[serde(default)]
    pub payment_status: PaymentStatus,

    /// Gateway payment id, set once the payment is verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending order from already-priced line items.
    pub fn new(
        user_id: impl Into<String>,
        items: Vec<LineItem>,
        shipping_address: ShippingAddress,
    ) -> ShopResult<Self> {
        if items.is_empty() {
            return Err(ShopError::Validation(
                "At least one item required".to_string(),
            ));
        }
        if items.iter().any(|item| item.quantity == 0) {
            return Err(ShopError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let total_amount = items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total()?))
            .ok_or_else(|| ShopError::Validation("Order total is too large".to_string()))?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            items,
            total_amount,
            shipping_address,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check if the order has a completed payment
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }

    /// Check if `user_id` owns this order
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Get item count
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Record a verified gateway payment.
    pub(crate) fn mark_paid(&mut self, gateway_payment_id: &str, at: DateTime<Utc>) {
        self.payment_id = Some(gateway_payment_id.to_string());
        self.payment_status = PaymentStatus::Completed;
        self.status = OrderStatus::Processing;
        self.updated_at = at;
    }

    /// Move to `status`; `Delivered` also stamps `delivered_at`.
    pub(crate) fn apply_status(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        if status == OrderStatus::Delivered {
            self.delivered_at = Some(at);
        }
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "221B Baker Street".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            zip_code: "NW16XE".to_string(),
            country: "UK".to_string(),
        }
    }

    #[test]
    fn test_line_item_total() {
        let product = Product::new("p1", "Lamp", dec!(19.99), 10);
        let item = LineItem::from_product(&product, 3);

        assert_eq!(item.total(), Some(dec!(59.97)));
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let huge = Product::new("p1", "Vault", Decimal::MAX, 10);
        assert_eq!(LineItem::from_product(&huge, 2).total(), None);

        let err = Order::new("u1", vec![LineItem::from_product(&huge, 2)], address()).unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));

        // Each line fits on its own; the sum does not.
        let err = Order::new(
            "u1",
            vec![
                LineItem::from_product(&huge, 1),
                LineItem::from_product(&huge, 1),
            ],
            address(),
        )
        .unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
    }

    #[test]
    fn test_order_total() {
        let lamp = Product::new("p1", "Lamp", dec!(10.00), 10);
        let desk = Product::new("p2", "Desk", dec!(25.50), 10);
        let order = Order::new(
            "u1",
            vec![
                LineItem::from_product(&lamp, 2),
                LineItem::from_product(&desk, 1),
            ],
            address(),
        )
        .unwrap();

        assert_eq!(order.total_amount, dec!(45.50));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(!order.is_paid());
    }

    #[test]
    fn test_price_snapshot() {
        let mut lamp = Product::new("p1", "Lamp", dec!(100.00), 5);
        let order = Order::new("u1", vec![LineItem::from_product(&lamp, 2)], address()).unwrap();

        lamp.price = dec!(150.00);

        assert_eq!(order.items[0].unit_price, dec!(100.00));
        assert_eq!(order.total_amount, dec!(200.00));
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = Order::new("u1", Vec::new(), address()).unwrap_err();
        assert!(matches!(err, ShopError::Validation(_)));
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_ok());

        let mut short_zip = address();
        short_zip.zip_code = " 12 ".to_string();
        assert!(matches!(
            short_zip.validate(),
            Err(ShopError::Validation(msg)) if msg.contains("zip_code")
        ));

        let mut blank_city = address();
        blank_city.city = "   ".to_string();
        assert!(blank_city.validate().is_err());
    }

    #[test]
    fn test_mark_paid_and_deliver() {
        let lamp = Product::new("p1", "Lamp", dec!(1.00), 5);
        let mut order =
            Order::new("u1", vec![LineItem::from_product(&lamp, 1)], address()).unwrap();
        let now = Utc::now();

        order.mark_paid("pay_123", now);
        assert!(order.is_paid());
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_id.as_deref(), Some("pay_123"));

        order.apply_status(OrderStatus::Shipped, now);
        assert!(order.delivered_at.is_none());

        order.apply_status(OrderStatus::Delivered, now);
        assert_eq!(order.delivered_at, Some(now));
    }

    #[test]
    fn test_backward_transitions() {
        assert!(OrderStatus::Delivered.is_backward_to(OrderStatus::Pending));
        assert!(OrderStatus::Cancelled.is_backward_to(OrderStatus::Processing));
        assert!(!OrderStatus::Pending.is_backward_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Processing.is_backward_to(OrderStatus::Shipped));
    }
}
