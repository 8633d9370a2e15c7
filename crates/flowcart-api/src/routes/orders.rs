//! Checkout and order endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use flowcart_checkout::CheckoutRequest;
use flowcart_commerce::order::{Order, OrderItem};
use flowcart_commerce::{CommerceError, MerchantId, OrderId};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, Role};
use crate::envelope::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub shipping_address: String,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipOrderRequest {
    pub tracking_number: String,
}

/// An order joined with its items.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// POST /checkout
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CheckoutBody>,
) -> ApiResult<Vec<Order>> {
    let outcome = state
        .checkout
        .checkout(CheckoutRequest {
            user_id: auth.user_id,
            shipping_address: body.shipping_address,
            billing_address: body.billing_address,
            payment_method: body.payment_method,
        })
        .await?;

    let message = match outcome.warning {
        Some(warning) => warning,
        None => format!("Created {} order(s)", outcome.orders.len()),
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(outcome.orders, message)),
    ))
}

/// GET /orders
pub async fn list_orders(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Vec<Order>> {
    let orders = state.orders.find_by_user(&auth.user_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(orders))))
}

/// GET /orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<OrderDetail> {
    let order_id = OrderId::new(id);
    let order = state
        .orders
        .find_by_id(&order_id)
        .await?
        .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))?;

    let is_owner = order.user_id == auth.user_id;
    if !is_owner && !matches!(auth.role, Role::Admin | Role::Merchant) {
        return Err(
            CommerceError::Forbidden("not authorized to view this order".to_string()).into(),
        );
    }

    let items = state.orders.items(&order_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(OrderDetail { order, items })),
    ))
}

/// POST /orders/:id/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    let order = state
        .checkout
        .cancel_order(&OrderId::new(id), &auth.user_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok_with_message(
            order,
            "Order cancelled successfully",
        )),
    ))
}

/// POST /orders/:id/confirm
pub async fn confirm_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Order> {
    require_merchant(&auth)?;
    let order = state.checkout.confirm_order(&OrderId::new(id)).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(order))))
}

/// POST /orders/:id/ship
pub async fn ship_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ShipOrderRequest>,
) -> ApiResult<Order> {
    require_merchant(&auth)?;
    if body.tracking_number.trim().is_empty() {
        return Err(CommerceError::Validation("tracking number is required".to_string()).into());
    }

    let order = state
        .checkout
        .mark_shipped(&OrderId::new(id), &body.tracking_number)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(order))))
}

/// GET /merchant/orders
///
/// Merchant accounts authenticate with their merchant id as the user id;
/// the gateway owns that mapping.
pub async fn merchant_orders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Vec<Order>> {
    require_merchant(&auth)?;
    let orders = state
        .orders
        .find_by_merchant(&MerchantId::new(auth.user_id.as_str()))
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(orders))))
}

fn require_merchant(auth: &AuthUser) -> Result<(), CommerceError> {
    if !auth.role.is_merchant_or_admin() {
        return Err(CommerceError::Forbidden(
            "merchant or admin role required".to_string(),
        ));
    }
    Ok(())
}
