//! Administrative order status updates.

use super::Actor;
use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderStatus};
use crate::store::OrderStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct OrderStatusService {
    orders: Arc<dyn OrderStore>,
}

impl OrderStatusService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Set the status of `order_id`. Admin only; any transition is allowed.
    #[instrument(skip(self), fields(admin = %actor.user_id))]
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: &str,
        status: OrderStatus,
    ) -> ShopResult<Order> {
        if !actor.is_admin {
            return Err(ShopError::AccessDenied(
                "admin role required to update order status".to_string(),
            ));
        }

        let change = self
            .orders
            .set_order_status(order_id, status, Utc::now())
            .await?;

        if change.previous.is_backward_to(status) {
            warn!(
                "Order {} moved backward: {} -> {}",
                order_id, change.previous, status
            );
        }

        info!("Order {} status: {} -> {}", order_id, change.previous, status);
        Ok(change.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{LineItem, PaymentStatus};
    use crate::store::{CatalogStore, MemoryStore};
    use crate::testing::{address, catalog_with};
    use rust_decimal_macros::dec;

    async fn setup() -> (Arc<MemoryStore>, OrderStatusService, Order) {
        let store = Arc::new(MemoryStore::with_catalog(catalog_with(&[("lamp", dec!(100.00), 5)])));
        let lamp = store.find_product("lamp").await.unwrap().unwrap();
        let order = Order::new("u1", vec![LineItem::from_product(&lamp, 1)], address()).unwrap();
        store.insert_order(order.clone()).await.unwrap();
        (store.clone(), OrderStatusService::new(store), order)
    }

    #[tokio::test]
    async fn test_admin_can_update_status() {
        let (_store, svc, order) = setup().await;
        let admin = Actor::admin("root");

        let shipped = svc
            .update_status(&admin, &order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert!(shipped.delivered_at.is_none());

        let delivered = svc
            .update_status(&admin, &order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert!(delivered.delivered_at.is_some());
        assert_eq!(delivered.payment_status, PaymentStatus::Pending);
        assert_eq!(delivered.total_amount, order.total_amount);
    }

    #[tokio::test]
    async fn test_backward_transition_is_allowed() {
        let (_store, svc, order) = setup().await;
        let admin = Actor::admin("root");

        svc.update_status(&admin, &order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        let back = svc
            .update_status(&admin, &order.id, OrderStatus::Pending)
            .await
            .unwrap();

        assert_eq!(back.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_customer_is_denied() {
        let (store, svc, order) = setup().await;

        let err = svc
            .update_status(&Actor::customer("u1"), &order.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::AccessDenied(_)));
        let stored = store.find_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let (_store, svc, _order) = setup().await;

        assert!(matches!(
            svc.update_status(&Actor::admin("root"), "missing", OrderStatus::Shipped)
                .await,
            Err(ShopError::OrderNotFound { .. })
        ));
    }
}
