//! Stock gateway contract.

use async_trait::async_trait;
use flowcart_commerce::catalog::StockRef;
use flowcart_commerce::CommerceError;

use crate::ledger::{InventoryLedger, StockClaim, StockKey, StockLevel};

/// The slice of the warehouse that checkout depends on.
///
/// The two-phase protocol: `reserve` holds stock while orders are being
/// created, then either `confirm` turns the hold into a physical
/// deduction (stock ships) or `release` undoes it (the attempt failed or
/// the order was cancelled). `restock` returns physically deducted stock
/// after a post-shipment cancellation.
#[async_trait]
pub trait StockGateway: Send + Sync {
    /// Current stock position for a record.
    async fn availability(&self, key: &StockKey) -> Result<StockLevel, CommerceError>;

    /// Hold stock against the referenced order.
    async fn reserve(&self, claim: &StockClaim, reference: &StockRef)
        -> Result<(), CommerceError>;

    /// Undo a hold.
    async fn release(&self, claim: &StockClaim, reference: &StockRef)
        -> Result<(), CommerceError>;

    /// Convert a hold into a physical deduction.
    async fn confirm(&self, claim: &StockClaim, reference: &StockRef)
        -> Result<(), CommerceError>;

    /// Return physically deducted stock.
    async fn restock(&self, claim: &StockClaim, reference: &StockRef)
        -> Result<(), CommerceError>;
}

#[async_trait]
impl StockGateway for InventoryLedger {
    async fn availability(&self, key: &StockKey) -> Result<StockLevel, CommerceError> {
        InventoryLedger::availability(self, key).await
    }

    async fn reserve(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        InventoryLedger::reserve(self, claim, reference).await
    }

    async fn release(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        InventoryLedger::release(self, claim, reference).await
    }

    async fn confirm(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        InventoryLedger::confirm(self, claim, reference).await
    }

    async fn restock(
        &self,
        claim: &StockClaim,
        reference: &StockRef,
    ) -> Result<(), CommerceError> {
        self.add_stock(claim.key.clone(), claim.quantity, None, Some(reference.clone()))
            .await
            .map(|_| ())
    }
}
