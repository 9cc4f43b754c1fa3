//! Shared fixtures for the in-crate tests.

use crate::error::{ShopError, ShopResult};
use crate::gateway::PaymentGateway;
use crate::notify::PaymentNotifier;
use crate::order::{Order, ShippingAddress};
use crate::payment::{
    GatewayOrder, GatewayOrderRequest, Payment, PaymentCallback, ORDER_ID_NOTE, USER_ID_NOTE,
};
use crate::product::{Currency, Product, ProductCatalog};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const SECRET: &str = "test_gateway_secret";

pub fn address() -> ShippingAddress {
    ShippingAddress {
        street: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        zip_code: "560001".to_string(),
        country: "India".to_string(),
    }
}

pub fn catalog_with(products: &[(&str, Decimal, u32)]) -> ProductCatalog {
    ProductCatalog {
        products: products
            .iter()
            .map(|(id, price, stock)| Product::new(*id, id.to_uppercase(), *price, *stock))
            .collect(),
    }
}

pub fn callback_for(order: &Order, gateway_payment_id: &str, signature: &str) -> PaymentCallback {
    PaymentCallback {
        gateway_order_id: format!("order_gw_{}", order.id),
        gateway_payment_id: gateway_payment_id.to_string(),
        gateway_signature: signature.to_string(),
        order_id: order.id.clone(),
    }
}

/// The gateway order `callback_for` pays against, as minted for `order`
pub fn minted_for(order: &Order) -> GatewayOrder {
    let mut notes = HashMap::new();
    notes.insert(ORDER_ID_NOTE.to_string(), order.id.clone());
    notes.insert(USER_ID_NOTE.to_string(), order.user_id.clone());
    GatewayOrder {
        id: format!("order_gw_{}", order.id),
        amount: Currency::INR.to_minor_units(order.total_amount).unwrap(),
        currency: Currency::INR,
        receipt: None,
        notes,
    }
}

/// Gateway double that echoes the request back as a handle and remembers
/// every order it minted
#[derive(Default)]
pub struct FakeGateway {
    pub calls: AtomicUsize,
    pub fetches: AtomicUsize,
    pub last_request: Mutex<Option<GatewayOrderRequest>>,
    pub orders: Mutex<HashMap<String, GatewayOrder>>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl FakeGateway {
    /// Make `order` known to the gateway as if it had been minted earlier
    pub fn register(&self, order: GatewayOrder) {
        self.orders.lock().unwrap().insert(order.id.clone(), order);
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &GatewayOrderRequest) -> ShopResult<GatewayOrder> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ShopError::PaymentSystemUnavailable("gateway down".into()));
        }
        *self.last_request.lock().unwrap() = Some(request.clone());
        let order = GatewayOrder {
            id: format!("order_fake_{}", n),
            amount: request.amount,
            currency: request.currency,
            receipt: Some(request.receipt.clone()),
            notes: request.notes.clone(),
        };
        self.register(order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, gateway_order_id: &str) -> ShopResult<GatewayOrder> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ShopError::PaymentSystemUnavailable("gateway down".into()));
        }
        self.orders
            .lock()
            .unwrap()
            .get(gateway_order_id)
            .cloned()
            .ok_or_else(|| {
                ShopError::Validation(format!("unknown gateway order {}", gateway_order_id))
            })
    }

    fn key_id(&self) -> &str {
        "rzp_test_key"
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Notifier double that counts calls and can be told to fail
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl RecordingNotifier {
    /// Notifications run detached; give them a moment to land
    pub async fn wait_for_calls(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.calls.load(Ordering::SeqCst) >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::task::yield_now().await;
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentNotifier for RecordingNotifier {
    async fn payment_received(&self, _order: &Order, _payment: &Payment) -> ShopResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ShopError::Internal("smtp down".into()));
        }
        Ok(())
    }
}
