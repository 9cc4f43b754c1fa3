//! Read-only views over orders and the catalog.

use super::Actor;
use crate::error::{ShopError, ShopResult};
use crate::order::Order;
use crate::product::Product;
use crate::store::{CatalogStore, OrderStore};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct OrderQueryService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderQueryService {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    /// The actor's own orders, newest first
    pub async fn list_orders_for(&self, actor: &Actor) -> ShopResult<Vec<Order>> {
        let orders = self.orders.orders_for_user(&actor.user_id).await?;
        debug!("Listed {} orders for {}", orders.len(), actor.user_id);
        Ok(orders)
    }

    /// A single order, visible to its owner and to admins
    pub async fn get_order(&self, actor: &Actor, order_id: &str) -> ShopResult<Order> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| ShopError::order_not_found(order_id))?;

        if !actor.is_admin && !order.is_owned_by(&actor.user_id) {
            return Err(ShopError::AccessDenied(format!(
                "order {} belongs to another user",
                order_id
            )));
        }

        Ok(order)
    }

    pub async fn list_products(&self) -> ShopResult<Vec<Product>> {
        self.catalog.list_products().await
    }

    pub async fn get_product(&self, product_id: &str) -> ShopResult<Product> {
        self.catalog
            .find_product(product_id)
            .await?
            .ok_or_else(|| ShopError::product_not_found(product_id))
    }
}
