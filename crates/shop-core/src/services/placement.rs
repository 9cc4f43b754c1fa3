//! # Order Placement
//!
//! Validates a purchase request against the catalog, snapshots prices and
//! persists a pending order. Stock is checked, not reserved: nothing in the
//! catalog changes until the payment is verified.

use super::Actor;
use crate::error::{ShopError, ShopResult};
use crate::order::{LineItem, Order, ShippingAddress};
use crate::store::{CatalogStore, OrderStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One requested line
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    #[serde(alias = "product")]
    pub product_id: String,
    /// Signed so that zero and negative quantities reach validation
    pub quantity: i64,
}

/// Request to place an order
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    #[serde(alias = "shippingAddress")]
    pub shipping_address: ShippingAddress,
}

impl PlaceOrder {
    /// Check shape-level rules and return `(product_id, quantity)` pairs
    fn validate(&self) -> ShopResult<Vec<(&str, u32)>> {
        if self.items.is_empty() {
            return Err(ShopError::Validation(
                "At least one item required".to_string(),
            ));
        }

        let lines = self
            .items
            .iter()
            .map(|line| {
                if line.product_id.trim().is_empty() {
                    return Err(ShopError::Validation(
                        "Valid product ID required".to_string(),
                    ));
                }
                match u32::try_from(line.quantity) {
                    Ok(qty) if qty >= 1 => Ok((line.product_id.as_str(), qty)),
                    _ => Err(ShopError::Validation(format!(
                        "Quantity must be at least 1 (got {} for {})",
                        line.quantity, line.product_id
                    ))),
                }
            })
            .collect::<ShopResult<Vec<_>>>()?;

        self.shipping_address.validate()?;
        Ok(lines)
    }
}

/// Creates orders. The only writer of new `Order` records.
#[derive(Clone)]
pub struct OrderPlacementService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderPlacementService {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    /// Place an order for `actor`, or fail without side effects.
    #[instrument(
        skip(self, request),
        fields(user_id = %actor.user_id, items = request.items.len())
    )]
    pub async fn place_order(&self, actor: &Actor, request: PlaceOrder) -> ShopResult<Order> {
        let lines = request.validate()?;

        // Lines naming the same product draw on the same stock.
        let mut requested: HashMap<&str, u32> = HashMap::new();
        let mut items = Vec::with_capacity(lines.len());

        for (product_id, quantity) in lines {
            let product = self
                .catalog
                .find_product(product_id)
                .await?
                .ok_or_else(|| ShopError::product_not_found(product_id))?;

            let total = requested.entry(product_id).or_insert(0);
            *total = total.saturating_add(quantity);

            if !product.has_stock_for(*total) {
                warn!(
                    "Insufficient stock for {}: available={}, requested={}",
                    product.id, product.stock, total
                );
                return Err(ShopError::InsufficientStock {
                    product_id: product.id,
                    requested: *total,
                    available: product.stock,
                });
            }

            items.push(LineItem::from_product(&product, quantity));
        }

        let order = Order::new(
            actor.user_id.clone(),
            items,
            request.shipping_address.trimmed(),
        )?;
        self.orders.insert_order(order.clone()).await?;

        info!(
            "Order placed: id={}, items={}, total={}",
            order.id,
            order.item_count(),
            order.total_amount
        );

        Ok(order)
    }
}
