//! Inventory ledger for FlowCart.
//!
//! The ledger owns one record per (product, merchant, variant) and is the
//! only component allowed to mutate stock. Every mutation runs under that
//! record's own lock and appends one entry to an append-only movement
//! log, so two checkouts racing for the last unit can never both win.
//!
//! Checkout consumes the ledger through the [`StockGateway`] contract:
//! reserve, then confirm (stock ships) or release (attempt failed).

mod gateway;
mod ledger;

pub use gateway::StockGateway;
pub use ledger::{InventoryLedger, StockClaim, StockKey, StockLevel};
