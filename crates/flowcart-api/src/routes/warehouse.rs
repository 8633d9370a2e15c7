//! Warehouse stock endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use flowcart_commerce::catalog::InventoryLog;
use flowcart_commerce::{CommerceError, MerchantId, ProductId, VariantId};
use flowcart_warehouse::{StockKey, StockLevel};
use serde::Deserialize;

use crate::auth::{AuthUser, Role};
use crate::envelope::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockRequest {
    pub product_id: String,
    pub merchant_id: String,
    pub quantity: i64,
    pub variant_id: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuery {
    pub merchant_id: String,
    pub variant_id: Option<String>,
}

/// POST /warehouse/stock/add
pub async fn add_stock(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AddStockRequest>,
) -> ApiResult<StockLevel> {
    if !auth.role.is_merchant_or_admin() {
        return Err(
            CommerceError::Forbidden("merchant or admin role required".to_string()).into(),
        );
    }
    // A merchant can only stock its own shelf; admins may stock any.
    if auth.role == Role::Merchant && body.merchant_id != auth.user_id.as_str() {
        return Err(
            CommerceError::Forbidden("cannot add stock for another merchant".to_string()).into(),
        );
    }
    if body.product_id.is_empty() || body.merchant_id.is_empty() {
        return Err(
            CommerceError::Validation("product ID and merchant ID are required".to_string())
                .into(),
        );
    }

    let key = StockKey::new(
        ProductId::new(body.product_id),
        MerchantId::new(body.merchant_id),
        body.variant_id.map(VariantId::new),
    );
    let level = state
        .ledger
        .add_stock(key, body.quantity, body.location, None)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok_with_message(level, "Stock added")),
    ))
}

/// GET /warehouse/stock/:product_id
pub async fn get_stock(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(product_id): Path<String>,
    Query(query): Query<StockQuery>,
) -> ApiResult<StockLevel> {
    let key = StockKey::new(
        ProductId::new(product_id),
        MerchantId::new(query.merchant_id),
        query.variant_id.map(VariantId::new),
    );
    let level = state.ledger.availability(&key).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(level))))
}

/// GET /warehouse/stock/:product_id/logs
pub async fn stock_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(product_id): Path<String>,
) -> ApiResult<Vec<InventoryLog>> {
    if !matches!(auth.role, Role::Merchant | Role::Admin | Role::WarehouseStaff) {
        return Err(CommerceError::Forbidden(
            "not authorized to view stock movements".to_string(),
        )
        .into());
    }

    let logs = state
        .ledger
        .logs_for_product(&ProductId::new(product_id))
        .await;
    Ok((StatusCode::OK, Json(ApiResponse::ok(logs))))
}
