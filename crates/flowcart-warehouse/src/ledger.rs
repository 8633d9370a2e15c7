//! The inventory ledger.

use std::collections::HashMap;
use std::sync::Arc;

use flowcart_commerce::catalog::{InventoryLog, InventoryLogType, InventoryRecord, StockRef};
use flowcart_commerce::{CommerceError, MerchantId, ProductId, VariantId};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Identity of one inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StockKey {
    /// Product the stock belongs to.
    pub product_id: ProductId,
    /// Merchant that owns the stock.
    pub merchant_id: MerchantId,
    /// Variant, when stock is tracked per variant.
    pub variant_id: Option<VariantId>,
}

impl StockKey {
    /// Create a stock key.
    pub fn new(
        product_id: ProductId,
        merchant_id: MerchantId,
        variant_id: Option<VariantId>,
    ) -> Self {
        Self {
            product_id,
            merchant_id,
            variant_id,
        }
    }
}

/// A quantity claimed against one inventory record.
#[derive(Debug, Clone, PartialEq)]
pub struct StockClaim {
    /// Record being claimed against.
    pub key: StockKey,
    /// Units claimed, always positive.
    pub quantity: i64,
}

impl StockClaim {
    /// Create a stock claim.
    pub fn new(key: StockKey, quantity: i64) -> Self {
        Self { key, quantity }
    }
}

/// Read-only snapshot of a record's stock position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    /// Physical on-hand quantity.
    pub quantity: i64,
    /// Quantity held by reservations.
    pub reserved: i64,
    /// Quantity free to sell.
    pub available: i64,
    /// Whether available stock is at or below the reorder threshold.
    pub needs_reorder: bool,
}

impl From<&InventoryRecord> for StockLevel {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            quantity: record.quantity,
            reserved: record.reserved_quantity,
            available: record.available_quantity(),
            needs_reorder: record.needs_reorder(),
        }
    }
}

/// Owns all inventory records and their movement log.
///
/// Records sit behind one mutex each; the outer map lock is held only
/// long enough to fetch or insert an entry. A read-modify-write on a
/// record therefore serializes with every other mutation of that record
/// while leaving unrelated records untouched.
#[derive(Clone, Default)]
pub struct InventoryLedger {
    records: Arc<RwLock<HashMap<StockKey, Arc<Mutex<InventoryRecord>>>>>,
    logs: Arc<RwLock<Vec<InventoryLog>>>,
}

impl InventoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, key: &StockKey) -> Result<Arc<Mutex<InventoryRecord>>, CommerceError> {
        self.records
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| CommerceError::InventoryNotFound(key.product_id.to_string()))
    }

    async fn append_log(&self, log: InventoryLog) {
        self.logs.write().await.push(log);
    }

    /// Add physical stock, creating the record on first addition.
    pub async fn add_stock(
        &self,
        key: StockKey,
        amount: i64,
        location: Option<String>,
        reference: Option<StockRef>,
    ) -> Result<StockLevel, CommerceError> {
        if amount <= 0 {
            return Err(CommerceError::InvalidAmount(amount));
        }

        let (entry, created) = {
            let mut records = self.records.write().await;
            match records.get(&key) {
                Some(entry) => (entry.clone(), false),
                None => {
                    let record = InventoryRecord::new(
                        key.product_id.clone(),
                        key.merchant_id.clone(),
                        key.variant_id.clone(),
                        0,
                        location,
                    );
                    let entry = Arc::new(Mutex::new(record));
                    records.insert(key.clone(), entry.clone());
                    (entry, true)
                }
            }
        };

        let mut record = entry.lock().await;
        let previous = record.quantity;
        record.add_stock(amount)?;

        debug!(
            product = %key.product_id,
            merchant = %key.merchant_id,
            amount,
            quantity = record.quantity,
            "stock added"
        );
        let notes = if created { "Initial stock" } else { "Stock added" };
        self.append_log(InventoryLog::new(
            record.id.clone(),
            InventoryLogType::Add,
            amount,
            previous,
            record.quantity,
            reference,
            Some(notes.to_string()),
        ))
        .await;

        Ok(StockLevel::from(&*record))
    }

    /// Current stock position for a record.
    pub async fn availability(&self, key: &StockKey) -> Result<StockLevel, CommerceError> {
        let entry = self.entry(key).await?;
        let record = entry.lock().await;
        Ok(StockLevel::from(&*record))
    }

    /// Hold stock against an unconfirmed order.
    pub async fn reserve(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        let entry = self.entry(&claim.key).await?;
        let mut record = entry.lock().await;
        let previous = record.reserved_quantity;
        record.reserve_stock(claim.quantity)?;

        debug!(
            product = %claim.key.product_id,
            quantity = claim.quantity,
            reserved = record.reserved_quantity,
            reference = %reference.id,
            "stock reserved"
        );
        self.append_log(InventoryLog::new(
            record.id.clone(),
            InventoryLogType::Reserve,
            claim.quantity,
            previous,
            record.reserved_quantity,
            Some(reference.clone()),
            None,
        ))
        .await;
        Ok(())
    }

    /// Undo a hold after a failed downstream step.
    pub async fn release(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        let entry = self.entry(&claim.key).await?;
        let mut record = entry.lock().await;
        let previous = record.reserved_quantity;
        record.release_stock(claim.quantity)?;

        debug!(
            product = %claim.key.product_id,
            quantity = claim.quantity,
            reserved = record.reserved_quantity,
            reference = %reference.id,
            "reservation released"
        );
        self.append_log(InventoryLog::new(
            record.id.clone(),
            InventoryLogType::Release,
            claim.quantity,
            previous,
            record.reserved_quantity,
            Some(reference.clone()),
            None,
        ))
        .await;
        Ok(())
    }

    /// Convert a hold into a physical deduction once stock leaves the
    /// warehouse.
    pub async fn confirm(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        let entry = self.entry(&claim.key).await?;
        let mut record = entry.lock().await;
        let previous = record.quantity;
        record.confirm_reservation(claim.quantity)?;

        debug!(
            product = %claim.key.product_id,
            quantity = claim.quantity,
            remaining = record.quantity,
            reference = %reference.id,
            "reservation confirmed"
        );
        self.append_log(InventoryLog::new(
            record.id.clone(),
            InventoryLogType::Deduct,
            claim.quantity,
            previous,
            record.quantity,
            Some(reference.clone()),
            None,
        ))
        .await;
        Ok(())
    }

    /// Deduct stock directly, bypassing reservation.
    pub async fn deduct(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        let entry = self.entry(&claim.key).await?;
        let mut record = entry.lock().await;
        let previous = record.quantity;
        record.deduct_stock(claim.quantity)?;

        debug!(
            product = %claim.key.product_id,
            quantity = claim.quantity,
            remaining = record.quantity,
            reference = %reference.id,
            "stock deducted"
        );
        self.append_log(InventoryLog::new(
            record.id.clone(),
            InventoryLogType::Deduct,
            claim.quantity,
            previous,
            record.quantity,
            Some(reference.clone()),
            None,
        ))
        .await;
        Ok(())
    }

    /// Movement log entries for a product, oldest first.
    pub async fn logs_for_product(&self, product_id: &ProductId) -> Vec<InventoryLog> {
        // Resolve the record ids owned by this product first.
        let record_ids: Vec<_> = {
            let records = self.records.read().await;
            let mut ids = Vec::new();
            for (key, entry) in records.iter() {
                if key.product_id == *product_id {
                    ids.push(entry.lock().await.id.clone());
                }
            }
            ids
        };

        self.logs
            .read()
            .await
            .iter()
            .filter(|log| record_ids.contains(&log.inventory_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(product: &str) -> StockKey {
        StockKey::new(
            ProductId::new(product),
            MerchantId::new("merchant-1"),
            None,
        )
    }

    fn claim(product: &str, quantity: i64) -> StockClaim {
        StockClaim::new(key(product), quantity)
    }

    async fn seeded(product: &str, quantity: i64) -> InventoryLedger {
        let ledger = InventoryLedger::new();
        ledger
            .add_stock(key(product), quantity, None, None)
            .await
            .unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_add_stock_creates_record() {
        let ledger = InventoryLedger::new();
        let level = ledger.add_stock(key("p1"), 10, None, None).await.unwrap();
        assert_eq!(level.quantity, 10);
        assert_eq!(level.available, 10);
    }

    #[tokio::test]
    async fn test_add_stock_accumulates() {
        let ledger = seeded("p1", 10).await;
        let level = ledger.add_stock(key("p1"), 5, None, None).await.unwrap();
        assert_eq!(level.quantity, 15);
    }

    #[tokio::test]
    async fn test_reserve_unknown_record() {
        let ledger = InventoryLedger::new();
        let result = ledger
            .reserve(&claim("ghost", 1), &StockRef::order("o1"))
            .await;
        assert!(matches!(result, Err(CommerceError::InventoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_reserve_then_release_restores_level() {
        let ledger = seeded("p1", 10).await;
        let reference = StockRef::order("o1");

        ledger.reserve(&claim("p1", 4), &reference).await.unwrap();
        let held = ledger.availability(&key("p1")).await.unwrap();
        assert_eq!(held.available, 6);
        assert_eq!(held.quantity, 10);

        ledger.release(&claim("p1", 4), &reference).await.unwrap();
        let restored = ledger.availability(&key("p1")).await.unwrap();
        assert_eq!(restored.available, 10);
        assert_eq!(restored.reserved, 0);
    }

    #[tokio::test]
    async fn test_confirm_deducts_physical_stock() {
        let ledger = seeded("p1", 10).await;
        let reference = StockRef::order("o1");

        ledger.reserve(&claim("p1", 4), &reference).await.unwrap();
        ledger.confirm(&claim("p1", 4), &reference).await.unwrap();

        let level = ledger.availability(&key("p1")).await.unwrap();
        assert_eq!(level.quantity, 6);
        assert_eq!(level.reserved, 0);
    }

    #[tokio::test]
    async fn test_oversell_blocked() {
        let ledger = seeded("p1", 1).await;
        let result = ledger
            .reserve(&claim("p1", 2), &StockRef::order("o1"))
            .await;
        assert!(matches!(
            result,
            Err(CommerceError::InsufficientStock { .. })
        ));

        let level = ledger.availability(&key("p1")).await.unwrap();
        assert_eq!(level.available, 1);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_never_oversell() {
        let ledger = seeded("p1", 5).await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .reserve(&claim("p1", 1), &StockRef::order(format!("o{i}")))
                    .await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }

        assert_eq!(wins, 5);
        let level = ledger.availability(&key("p1")).await.unwrap();
        assert_eq!(level.reserved, 5);
        assert_eq!(level.available, 0);
        assert!(level.reserved <= level.quantity);
    }

    #[tokio::test]
    async fn test_movement_log_captures_mutations() {
        let ledger = seeded("p1", 10).await;
        let reference = StockRef::order("o1");

        ledger.reserve(&claim("p1", 3), &reference).await.unwrap();
        ledger.release(&claim("p1", 1), &reference).await.unwrap();
        ledger.confirm(&claim("p1", 2), &reference).await.unwrap();

        let logs = ledger.logs_for_product(&ProductId::new("p1")).await;
        let kinds: Vec<_> = logs.iter().map(|log| log.log_type).collect();
        assert_eq!(
            kinds,
            vec![
                InventoryLogType::Add,
                InventoryLogType::Reserve,
                InventoryLogType::Release,
                InventoryLogType::Deduct,
            ]
        );

        // Reserve log tracks the reserved counter before/after.
        assert_eq!(logs[1].previous_quantity, 0);
        assert_eq!(logs[1].new_quantity, 3);
        // Confirm log tracks the physical counter before/after.
        assert_eq!(logs[3].previous_quantity, 10);
        assert_eq!(logs[3].new_quantity, 8);
    }

    #[tokio::test]
    async fn test_variants_tracked_separately() {
        let ledger = InventoryLedger::new();
        let base = key("p1");
        let variant = StockKey::new(
            ProductId::new("p1"),
            MerchantId::new("merchant-1"),
            Some(VariantId::new("v1")),
        );

        ledger.add_stock(base.clone(), 5, None, None).await.unwrap();
        ledger
            .add_stock(variant.clone(), 2, None, None)
            .await
            .unwrap();

        assert_eq!(ledger.availability(&base).await.unwrap().quantity, 5);
        assert_eq!(ledger.availability(&variant).await.unwrap().quantity, 2);
    }
}
