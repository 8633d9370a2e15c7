//! Cart endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use flowcart_commerce::cart::{cart_total, CartItem};
use flowcart_commerce::{CartItemId, CommerceError, Currency, Money, ProductId, VariantId};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::envelope::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: i64,
    pub variant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub item_id: String,
}

/// Cart contents plus the running total.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Money,
}

/// POST /cart/add
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AddToCartRequest>,
) -> ApiResult<CartItem> {
    if body.product_id.is_empty() {
        return Err(CommerceError::Validation("product ID is required".to_string()).into());
    }

    let product_id = ProductId::new(body.product_id);
    let product = state
        .catalog
        .product(&product_id)
        .await?
        .filter(|product| product.is_active)
        .ok_or_else(|| CommerceError::ProductUnavailable(product_id.to_string()))?;

    let cart = state.carts.get_or_create(&auth.user_id).await?;
    let variant_id = body.variant_id.map(VariantId::new);
    let item = state
        .carts
        .add_item(
            &cart.id,
            &product_id,
            variant_id.as_ref(),
            body.quantity,
            product.price,
        )
        .await?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(item))))
}

/// GET /cart
pub async fn get_cart(State(state): State<AppState>, auth: AuthUser) -> ApiResult<CartView> {
    let view = match state.carts.find_by_user(&auth.user_id).await? {
        Some(cart) => {
            let items = state.carts.items(&cart.id).await?;
            let total = cart_total(&items)?;
            CartView { items, total }
        }
        None => CartView {
            items: Vec::new(),
            total: Money::zero(Currency::USD),
        },
    };

    Ok((StatusCode::OK, Json(ApiResponse::ok(view))))
}

/// POST /cart/remove
pub async fn remove_from_cart(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RemoveItemRequest>,
) -> ApiResult<()> {
    if body.item_id.is_empty() {
        return Err(CommerceError::Validation("item ID is required".to_string()).into());
    }

    let cart = state
        .carts
        .find_by_user(&auth.user_id)
        .await?
        .ok_or_else(|| CommerceError::CartNotFound(auth.user_id.to_string()))?;

    state
        .carts
        .remove_item(&cart.id, &CartItemId::new(body.item_id))
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok_with_message((), "Item removed from cart")),
    ))
}

/// POST /cart/clear
pub async fn clear_cart(State(state): State<AppState>, auth: AuthUser) -> ApiResult<()> {
    if let Some(cart) = state.carts.find_by_user(&auth.user_id).await? {
        state.carts.clear(&cart.id).await?;
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok_with_message((), "Cart cleared")),
    ))
}
