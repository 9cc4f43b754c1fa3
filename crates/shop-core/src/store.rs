//! # Stores
//!
//! Storage seams for the catalog and for orders/payments, plus the
//! in-process [`MemoryStore`] that backs both.
//!
//! `OrderStore::commit_payment` is the unit of atomicity for a verified
//! payment: appending the payment, marking the order paid and decrementing
//! stock either all happen or none do. Payment uniqueness per order is
//! enforced inside it, so two concurrent callbacks for one order cannot
//! both commit.

use crate::error::{ShopError, ShopResult};
use crate::order::{Order, OrderStatus};
use crate::payment::Payment;
use crate::product::{Product, ProductCatalog};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Result of decrementing one product's stock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: String,
    pub requested: u32,
    /// Units actually removed; less than `requested` when stock ran out
    pub applied: u32,
}

impl StockDecrement {
    /// Units sold beyond what was on hand
    pub fn shortfall(&self) -> u32 {
        self.requested - self.applied
    }

    pub fn is_oversold(&self) -> bool {
        self.applied < self.requested
    }
}

/// Outcome of [`OrderStore::commit_payment`]
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// The payment was appended and the order/stock updated
    Committed {
        order: Order,
        payment: Payment,
        stock: Vec<StockDecrement>,
        /// Line items whose product no longer exists in the catalog
        missing_products: Vec<String>,
    },
    /// The same gateway payment was already committed; nothing changed
    AlreadyCommitted { order: Order, payment: Payment },
}

/// Before/after view of an administrative status change
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub previous: OrderStatus,
    pub order: Order,
}

/// Product records with a stock counter
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, product_id: &str) -> ShopResult<Option<Product>>;

    async fn list_products(&self) -> ShopResult<Vec<Product>>;

    /// Insert or replace a product record
    async fn upsert_product(&self, product: Product) -> ShopResult<()>;

    /// Atomically remove up to `quantity` units, never going below zero
    async fn decrement_stock(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> ShopResult<StockDecrement>;
}

/// Orders and their payment records
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> ShopResult<()>;

    async fn find_order(&self, order_id: &str) -> ShopResult<Option<Order>>;

    /// Orders owned by `user_id`, newest first
    async fn orders_for_user(&self, user_id: &str) -> ShopResult<Vec<Order>>;

    /// Set the order status (and `delivered_at` for deliveries)
    async fn set_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> ShopResult<StatusChange>;

    async fn payment_for_order(&self, order_id: &str) -> ShopResult<Option<Payment>>;

    /// Append `payment`, mark its order paid and decrement stock per line
    /// item as one atomic step.
    ///
    /// Fails with `AlreadyPaid` if the order already carries a payment from
    /// a different gateway payment; returns `AlreadyCommitted` if it carries
    /// this one.
    async fn commit_payment(&self, payment: Payment) -> ShopResult<CommitOutcome>;
}

#[derive(Default)]
struct Inner {
    products: HashMap<String, Product>,
    orders: HashMap<String, Order>,
    /// Keyed by order id: at most one payment per order
    payments: HashMap<String, Payment>,
}

/// In-process store backing both the catalog and orders.
///
/// A single lock covers all three tables, so `commit_payment` is atomic
/// with respect to every other operation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given catalog
    pub fn with_catalog(catalog: ProductCatalog) -> Self {
        let products = catalog
            .products
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Self {
            inner: RwLock::new(Inner {
                products,
                ..Inner::default()
            }),
        }
    }

    /// Number of payment records
    pub async fn payment_count(&self) -> usize {
        self.inner.read().await.payments.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_product(&self, product_id: &str) -> ShopResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(product_id).cloned())
    }

    async fn list_products(&self) -> ShopResult<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<Product> = inner.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(products)
    }

    async fn upsert_product(&self, product: Product) -> ShopResult<()> {
        self.inner
            .write()
            .await
            .products
            .insert(product.id.clone(), product);
        Ok(())
    }

    async fn decrement_stock(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> ShopResult<StockDecrement> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(product_id)
            .ok_or_else(|| ShopError::product_not_found(product_id))?;
        Ok(take_stock(product, quantity))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: Order) -> ShopResult<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.contains_key(&order.id) {
            return Err(ShopError::Internal(format!(
                "duplicate order id: {}",
                order.id
            )));
        }
        inner.orders.insert(order.id.clone(), order);
        Ok(())
    }

    async fn find_order(&self, order_id: &str) -> ShopResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(order_id).cloned())
    }

    async fn orders_for_user(&self, user_id: &str) -> ShopResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<Order> = inner
            .orders
            .values()
            .filter(|o| o.is_owned_by(user_id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn set_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        at: DateTime<Utc>,
    ) -> ShopResult<StatusChange> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ShopError::order_not_found(order_id))?;

        let previous = order.status;
        order.apply_status(status, at);

        Ok(StatusChange {
            previous,
            order: order.clone(),
        })
    }

    async fn payment_for_order(&self, order_id: &str) -> ShopResult<Option<Payment>> {
        Ok(self.inner.read().await.payments.get(order_id).cloned())
    }

    async fn commit_payment(&self, payment: Payment) -> ShopResult<CommitOutcome> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let mut order = inner
            .orders
            .get(&payment.order_id)
            .cloned()
            .ok_or_else(|| ShopError::order_not_found(&payment.order_id))?;

        if let Some(existing) = inner.payments.get(&payment.order_id) {
            if existing.matches_gateway_payment(&payment.gateway_payment_id) {
                return Ok(CommitOutcome::AlreadyCommitted {
                    order,
                    payment: existing.clone(),
                });
            }
            return Err(ShopError::AlreadyPaid {
                order_id: payment.order_id.clone(),
            });
        }

        if order.is_paid() {
            return Err(ShopError::AlreadyPaid {
                order_id: payment.order_id.clone(),
            });
        }

        let mut stock = Vec::with_capacity(order.items.len());
        let mut missing_products = Vec::new();
        for item in &order.items {
            match inner.products.get_mut(&item.product_id) {
                Some(product) => stock.push(take_stock(product, item.quantity)),
                None => missing_products.push(item.product_id.clone()),
            }
        }

        order.mark_paid(&payment.gateway_payment_id, payment.created_at);
        inner.orders.insert(order.id.clone(), order.clone());
        inner
            .payments
            .insert(payment.order_id.clone(), payment.clone());

        Ok(CommitOutcome::Committed {
            order,
            payment,
            stock,
            missing_products,
        })
    }
}

fn take_stock(product: &mut Product, quantity: u32) -> StockDecrement {
    let applied = quantity.min(product.stock);
    product.stock -= applied;
    StockDecrement {
        product_id: product.id.clone(),
        requested: quantity,
        applied,
    }
}
