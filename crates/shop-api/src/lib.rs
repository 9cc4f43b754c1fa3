//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for products, orders and payments
//! - Bearer token authentication
//! - Webhook forwarding of payment notifications
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/products` | List products |
//! | GET | `/api/products/{id}` | Get product |
//! | POST | `/api/orders` | Place order |
//! | GET | `/api/orders/my-orders` | List own orders |
//! | GET | `/api/orders/{id}` | Get order |
//! | PATCH | `/api/orders/{id}/status` | Update status (admin) |
//! | POST | `/api/payment/create-order` | Create gateway order |
//! | POST | `/api/payment/verify` | Verify payment callback |

pub mod auth;
pub mod handlers;
pub mod notify;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
