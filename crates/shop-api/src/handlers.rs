//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//! Handlers translate HTTP into service calls; all business rules live in
//! `shop-core`.

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{
    Currency, Order, OrderStatus, PaymentCallback, PlaceOrder, Product, ShopError,
};
use tracing::{error, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Status update request (admin)
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Create payment order request
#[derive(Debug, Deserialize)]
pub struct CreatePaymentOrderRequest {
    #[serde(alias = "orderId")]
    pub order_id: String,
}

/// Create payment order response: what the checkout widget needs
#[derive(Debug, Serialize)]
pub struct CreatePaymentOrderResponse {
    /// Gateway order handle
    pub id: String,
    /// Amount in minor units
    pub amount: i64,
    pub currency: Currency,
    /// Public gateway key
    pub key: String,
}

/// Payment callback as posted by the checkout widget
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpayOrderId")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpayPaymentId")]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpaySignature")]
    pub gateway_signature: String,
    pub order_id: String,
}

impl From<VerifyPaymentRequest> for PaymentCallback {
    fn from(req: VerifyPaymentRequest) -> Self {
        PaymentCallback {
            gateway_order_id: req.gateway_order_id,
            gateway_payment_id: req.gateway_payment_id,
            gateway_signature: req.gateway_signature,
            order_id: req.order_id,
        }
    }
}

/// Verify payment response
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub message: String,
    pub order: Order,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, kind: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            kind: kind.into(),
            code,
        }
    }
}

/// Handler error: status plus JSON body
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn shop_error_to_response(err: ShopError) -> ApiError {
    let code = err.status_code();
    let message = match &err {
        ShopError::Internal(detail) => {
            error!("Internal error: {}", detail);
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };
    let response = ErrorResponse::new(message, err.kind(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

/// Undecodable bodies are validation errors; a missing JSON content type
/// keeps its 415.
pub(crate) fn json_rejection_to_response(rejection: JsonRejection) -> ApiError {
    let status = match rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    let response = ErrorResponse::new(rejection.body_text(), "validation_error", status.as_u16());
    (status, Json(response))
}

/// `Json` extractor whose rejections use the `ErrorResponse` shape
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                Err(json_rejection_to_response(rejection))
            }
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront",
        "version": env!("CARGO_PKG_VERSION"),
        "payment_provider": state.provider,
    }))
}

/// Get products list
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state
        .queries
        .list_products()
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(serde_json::json!({
        "count": products.len(),
        "products": products,
    })))
}

/// Get single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .queries
        .get_product(&product_id)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

/// Place an order
#[instrument(skip(state, user, request), fields(user_id = %user.actor().user_id))]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .placement
        .place_order(user.actor(), request)
        .await
        .map_err(shop_error_to_response)?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// List the caller's orders
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    state
        .queries
        .list_orders_for(user.actor())
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

/// Get a single order (owner or admin)
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .queries
        .get_order(user.actor(), &order_id)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

/// Update order status (admin)
#[instrument(skip(state, user, request), fields(order_id = %order_id))]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    state
        .statuses
        .update_status(user.actor(), &order_id, request.status)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

/// Mint a gateway order for an unpaid order
#[instrument(skip(state, user, request), fields(order_id = %request.order_id))]
pub async fn create_payment_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreatePaymentOrderRequest>,
) -> Result<Json<CreatePaymentOrderResponse>, ApiError> {
    let intent = state
        .intents
        .create_intent(user.actor(), &request.order_id)
        .await
        .map_err(shop_error_to_response)?;

    Ok(Json(CreatePaymentOrderResponse {
        id: intent.gateway_order_id,
        amount: intent.amount,
        currency: intent.currency,
        key: intent.key_id,
    }))
}

/// Verify a payment callback
#[instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn verify_payment(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let receipt = state
        .verification
        .verify_payment(request.into())
        .await
        .map_err(|e| {
            warn!("Payment verification failed: {}", e);
            shop_error_to_response(e)
        })?;

    let message = if receipt.replayed {
        "Payment already verified"
    } else {
        "Payment verified successfully"
    };

    Ok(Json(VerifyPaymentResponse {
        message: message.to_string(),
        order: receipt.order,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", "validation_error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_shop_error_conversion() {
        let (status, Json(body)) = shop_error_to_response(ShopError::InvalidSignature);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, "invalid_signature");

        let (status, _) = shop_error_to_response(ShopError::AlreadyPaid {
            order_id: "o1".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) =
            shop_error_to_response(ShopError::PaymentSystemUnavailable("down".to_string()));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let (status, Json(body)) =
            shop_error_to_response(ShopError::Internal("lock poisoned".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.contains("lock poisoned"));
    }

    #[test]
    fn test_verify_request_accepts_gateway_field_names() {
        let req: VerifyPaymentRequest = serde_json::from_value(serde_json::json!({
            "razorpayOrderId": "order_1",
            "razorpayPaymentId": "pay_1",
            "razorpaySignature": "abc",
            "orderId": "o1"
        }))
        .unwrap();

        let callback: PaymentCallback = req.into();
        assert_eq!(callback.gateway_order_id, "order_1");
        assert_eq!(callback.gateway_payment_id, "pay_1");
        assert_eq!(callback.order_id, "o1");
    }
}
