//! Commerce error types.

use thiserror::Error;

/// Broad classification of a commerce error, used by transport layers to
/// choose a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing input, detected before any mutation.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The requester is not allowed to perform the operation.
    Forbidden,
    /// The operation conflicts with current state (stock, status machine).
    Conflict,
    /// Storage or transport failure.
    Internal,
}

/// Errors that can occur in marketplace operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Cart not found for a customer.
    #[error("Cart not found for user: {0}")]
    CartNotFound(String),

    /// Checkout attempted on a cart with no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart item not found.
    #[error("Item not in cart: {0}")]
    CartItemNotFound(String),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is not purchasable.
    #[error("Product is no longer available: {0}")]
    ProductUnavailable(String),

    /// Snapshot price no longer matches the catalog price.
    #[error("Price changed for {product_id}: cart has {snapshot_cents}, catalog has {current_cents}")]
    PriceChanged {
        product_id: String,
        snapshot_cents: i64,
        current_cents: i64,
    },

    /// Inventory record not found.
    #[error("Inventory not found for product: {0}")]
    InventoryNotFound(String),

    /// Not enough available stock to reserve or deduct.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Attempted to release more than is reserved.
    #[error("Cannot release {requested}: only {reserved} reserved")]
    OverRelease { requested: i64, reserved: i64 },

    /// Attempted to confirm more than is reserved.
    #[error("Cannot confirm {requested}: only {reserved} reserved")]
    OverConfirm { requested: i64, reserved: i64 },

    /// Invalid quantity for a cart or order line.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Invalid amount for a stock mutation.
    #[error("Stock amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Invalid order status transition.
    #[error("Invalid order transition from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Requester does not own the resource.
    #[error("Not authorized: {0}")]
    Forbidden(String),

    /// Bad or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Arithmetic overflow in a money calculation.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Checkout exceeded its deadline.
    #[error("Checkout timed out")]
    Timeout,

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CommerceError {
    /// Classify the error for transport-level handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommerceError::CartNotFound(_)
            | CommerceError::CartItemNotFound(_)
            | CommerceError::OrderNotFound(_)
            | CommerceError::ProductNotFound(_)
            | CommerceError::InventoryNotFound(_) => ErrorKind::NotFound,

            CommerceError::EmptyCart
            | CommerceError::InvalidQuantity(_)
            | CommerceError::InvalidAmount(_)
            | CommerceError::Validation(_)
            | CommerceError::ProductUnavailable(_) => ErrorKind::Validation,

            CommerceError::Forbidden(_) => ErrorKind::Forbidden,

            CommerceError::PriceChanged { .. }
            | CommerceError::InsufficientStock { .. }
            | CommerceError::OverRelease { .. }
            | CommerceError::OverConfirm { .. }
            | CommerceError::InvalidTransition { .. } => ErrorKind::Conflict,

            CommerceError::Overflow
            | CommerceError::Timeout
            | CommerceError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            CommerceError::CartNotFound(_) => "CART_NOT_FOUND",
            CommerceError::EmptyCart => "EMPTY_CART",
            CommerceError::CartItemNotFound(_) => "ITEM_NOT_FOUND",
            CommerceError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CommerceError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CommerceError::ProductUnavailable(_) => "PRODUCT_UNAVAILABLE",
            CommerceError::PriceChanged { .. } => "PRICE_CHANGED",
            CommerceError::InventoryNotFound(_) => "INVENTORY_NOT_FOUND",
            CommerceError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CommerceError::OverRelease { .. } => "OVER_RELEASE",
            CommerceError::OverConfirm { .. } => "OVER_CONFIRM",
            CommerceError::InvalidQuantity(_) => "INVALID_QUANTITY",
            CommerceError::InvalidAmount(_) => "INVALID_AMOUNT",
            CommerceError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CommerceError::Forbidden(_) => "FORBIDDEN",
            CommerceError::Validation(_) => "VALIDATION_ERROR",
            CommerceError::Overflow => "OVERFLOW",
            CommerceError::Timeout => "CHECKOUT_TIMEOUT",
            CommerceError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
