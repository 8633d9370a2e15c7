//! Commerce domain types and logic for the FlowCart marketplace.
//!
//! This crate provides the pure domain layer shared by the FlowCart
//! services:
//!
//! - **Catalog**: read-only product view, inventory records, movement log
//! - **Cart**: one active cart per customer, price-snapshotting line items
//! - **Order**: merchant-scoped orders with status machines
//!
//! All types are plain data plus invariant-checking methods; persistence
//! and orchestration live in the sibling crates.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod money;
pub mod order;

pub use error::{CommerceError, ErrorKind};
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CommerceError, ErrorKind};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Cart
    pub use crate::cart::{cart_total, Cart, CartItem};

    // Catalog
    pub use crate::catalog::{
        InventoryLog, InventoryLogType, InventoryRecord, ProductSummary, StockRef,
    };

    // Orders
    pub use crate::order::{Order, OrderItem, OrderStatus, PaymentStatus};
}
