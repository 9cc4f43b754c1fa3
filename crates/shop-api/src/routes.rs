//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog:
///   - GET  /api/products - List products
///   - GET  /api/products/{product_id} - Get product by ID
///
/// - Orders (bearer token):
///   - POST  /api/orders - Place order
///   - GET   /api/orders/my-orders - Caller's orders
///   - GET   /api/orders/{order_id} - Get order (owner or admin)
///   - PATCH /api/orders/{order_id}/status - Update status (admin)
///
/// - Payment:
///   - POST /api/payment/create-order - Mint gateway order (bearer token)
///   - POST /api/payment/verify - Verify signed callback
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let product_routes = Router::new()
        .route("/", get(handlers::list_products))
        .route("/{product_id}", get(handlers::get_product));

    let order_routes = Router::new()
        .route("/", post(handlers::place_order))
        .route("/my-orders", get(handlers::my_orders))
        .route("/{order_id}", get(handlers::get_order))
        .route("/{order_id}/status", patch(handlers::update_order_status));

    let payment_routes = Router::new()
        .route("/create-order", post(handlers::create_payment_order))
        .route("/verify", post(handlers::verify_payment));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/products", product_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/payment", payment_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}
