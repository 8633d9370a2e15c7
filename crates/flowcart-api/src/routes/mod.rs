//! Route table.

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod orders;
pub mod warehouse;

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Cart
        .route("/cart/add", post(cart::add_to_cart))
        .route("/cart", get(cart::get_cart))
        .route("/cart/remove", post(cart::remove_from_cart))
        .route("/cart/clear", post(cart::clear_cart))
        // Checkout and orders
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route("/orders/:id/confirm", post(orders::confirm_order))
        .route("/orders/:id/ship", post(orders::ship_order))
        .route("/merchant/orders", get(orders::merchant_orders))
        // Warehouse
        .route("/warehouse/stock/add", post(warehouse::add_stock))
        .route("/warehouse/stock/:product_id", get(warehouse::get_stock))
        .route(
            "/warehouse/stock/:product_id/logs",
            get(warehouse::stock_logs),
        )
        .with_state(state)
}
