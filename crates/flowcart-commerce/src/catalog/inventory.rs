//! Inventory record and movement log.
//!
//! Each record tracks physical on-hand stock plus a separately counted
//! reserved quantity held against unconfirmed orders. Invariant on every
//! record: `0 <= reserved_quantity <= quantity`.

use crate::error::CommerceError;
use crate::ids::{InventoryId, InventoryLogId, MerchantId, ProductId, VariantId};
use serde::{Deserialize, Serialize};

/// Default reorder threshold for newly created records.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;
/// Default reorder batch size for newly created records.
pub const DEFAULT_REORDER_QUANTITY: i64 = 50;

/// Stock for one (product, merchant, variant) combination.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    /// Unique inventory identifier.
    pub id: InventoryId,
    /// Product this stock belongs to.
    pub product_id: ProductId,
    /// Merchant that owns the stock.
    pub merchant_id: MerchantId,
    /// Variant, when stock is tracked per variant.
    pub variant_id: Option<VariantId>,
    /// Physical on-hand quantity.
    pub quantity: i64,
    /// Quantity held against unconfirmed orders.
    pub reserved_quantity: i64,
    /// Available-quantity threshold that flags a reorder.
    pub reorder_level: i64,
    /// Suggested quantity to reorder.
    pub reorder_quantity: i64,
    /// Warehouse location label.
    pub location: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl InventoryRecord {
    /// Create a record with an initial on-hand quantity.
    pub fn new(
        product_id: ProductId,
        merchant_id: MerchantId,
        variant_id: Option<VariantId>,
        quantity: i64,
        location: Option<String>,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: InventoryId::generate(),
            product_id,
            merchant_id,
            variant_id,
            quantity,
            reserved_quantity: 0,
            reorder_level: DEFAULT_REORDER_LEVEL,
            reorder_quantity: DEFAULT_REORDER_QUANTITY,
            location,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity not held by any reservation.
    pub fn available_quantity(&self) -> i64 {
        self.quantity - self.reserved_quantity
    }

    /// Whether available stock has fallen to the reorder threshold.
    pub fn needs_reorder(&self) -> bool {
        self.available_quantity() <= self.reorder_level
    }

    /// Add physical stock.
    pub fn add_stock(&mut self, amount: i64) -> Result<(), CommerceError> {
        self.check_amount(amount)?;
        self.quantity = self
            .quantity
            .checked_add(amount)
            .ok_or(CommerceError::Overflow)?;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Deduct physical stock directly, bypassing reservation.
    pub fn deduct_stock(&mut self, amount: i64) -> Result<(), CommerceError> {
        self.check_amount(amount)?;
        if self.available_quantity() < amount {
            return Err(self.insufficient(amount));
        }
        self.quantity -= amount;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Hold stock against an unconfirmed order.
    pub fn reserve_stock(&mut self, amount: i64) -> Result<(), CommerceError> {
        self.check_amount(amount)?;
        if self.available_quantity() < amount {
            return Err(self.insufficient(amount));
        }
        self.reserved_quantity += amount;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Undo a reservation.
    pub fn release_stock(&mut self, amount: i64) -> Result<(), CommerceError> {
        self.check_amount(amount)?;
        if amount > self.reserved_quantity {
            return Err(CommerceError::OverRelease {
                requested: amount,
                reserved: self.reserved_quantity,
            });
        }
        self.reserved_quantity -= amount;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Convert a reservation into a physical deduction, at the point
    /// stock actually leaves the warehouse.
    pub fn confirm_reservation(&mut self, amount: i64) -> Result<(), CommerceError> {
        self.check_amount(amount)?;
        if amount > self.reserved_quantity {
            return Err(CommerceError::OverConfirm {
                requested: amount,
                reserved: self.reserved_quantity,
            });
        }
        self.reserved_quantity -= amount;
        self.quantity -= amount;
        self.updated_at = current_timestamp();
        Ok(())
    }

    fn check_amount(&self, amount: i64) -> Result<(), CommerceError> {
        if amount <= 0 {
            return Err(CommerceError::InvalidAmount(amount));
        }
        Ok(())
    }

    fn insufficient(&self, requested: i64) -> CommerceError {
        CommerceError::InsufficientStock {
            product_id: self.product_id.to_string(),
            requested,
            available: self.available_quantity(),
        }
    }
}

/// Kind of inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryLogType {
    /// Physical stock added.
    Add,
    /// Physical stock removed.
    Deduct,
    /// Stock held against an order.
    Reserve,
    /// A hold undone.
    Release,
    /// Manual correction.
    Adjustment,
}

impl InventoryLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryLogType::Add => "add",
            InventoryLogType::Deduct => "deduct",
            InventoryLogType::Reserve => "reserve",
            InventoryLogType::Release => "release",
            InventoryLogType::Adjustment => "adjustment",
        }
    }
}

/// Reference to the entity that caused a stock movement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockRef {
    /// Identifier of the referencing entity.
    pub id: String,
    /// Kind of the referencing entity, e.g., "order".
    pub kind: String,
}

impl StockRef {
    /// Reference an order.
    pub fn order(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "order".to_string(),
        }
    }

    /// Reference a checkout attempt that has no order yet.
    pub fn checkout(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "checkout".to_string(),
        }
    }
}

/// One append-only audit entry per inventory mutation.
///
/// For physical movements (add/deduct/adjustment) the before/after pair
/// tracks `quantity`; for reserve/release it tracks `reserved_quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLog {
    /// Unique log identifier.
    pub id: InventoryLogId,
    /// Record that was mutated.
    pub inventory_id: InventoryId,
    /// Movement kind.
    pub log_type: InventoryLogType,
    /// Requested movement amount.
    pub quantity: i64,
    /// Tracked quantity before the mutation.
    pub previous_quantity: i64,
    /// Tracked quantity after the mutation.
    pub new_quantity: i64,
    /// Entity that triggered the movement, if any.
    pub reference: Option<StockRef>,
    /// Free-form note.
    pub notes: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl InventoryLog {
    /// Create a log entry.
    pub fn new(
        inventory_id: InventoryId,
        log_type: InventoryLogType,
        quantity: i64,
        previous_quantity: i64,
        new_quantity: i64,
        reference: Option<StockRef>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: InventoryLogId::generate(),
            inventory_id,
            log_type,
            quantity,
            previous_quantity,
            new_quantity,
            reference,
            notes,
            created_at: current_timestamp(),
        }
    }
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
