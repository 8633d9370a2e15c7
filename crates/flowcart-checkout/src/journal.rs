//! Reservation journal for compensating rollback.

use flowcart_commerce::OrderId;
use flowcart_warehouse::StockClaim;
use tokio::sync::Mutex;

/// Everything a checkout attempt has done that would need undoing.
#[derive(Debug, Default)]
pub struct JournalState {
    /// Stock holds taken, in the order they were made.
    pub claims: Vec<StockClaim>,
    /// Orders created, in the order they were created.
    pub orders: Vec<OrderId>,
}

/// Records the side effects of one checkout attempt.
///
/// The journal lives outside the deadline-bounded future: when the
/// attempt errors or times out mid-flight, whatever it managed to do is
/// still on record and can be compensated.
#[derive(Debug, Default)]
pub struct ReservationJournal {
    state: Mutex<JournalState>,
}

impl ReservationJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stock hold.
    pub async fn record_claim(&self, claim: StockClaim) {
        self.state.lock().await.claims.push(claim);
    }

    /// Record a created order.
    pub async fn record_order(&self, order_id: OrderId) {
        self.state.lock().await.orders.push(order_id);
    }

    /// Drain the journal for rollback. Leaves it empty.
    pub async fn take(&self) -> JournalState {
        std::mem::take(&mut *self.state.lock().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcart_commerce::{MerchantId, ProductId};
    use flowcart_warehouse::StockKey;

    #[tokio::test]
    async fn test_journal_records_and_drains() {
        let journal = ReservationJournal::new();
        let claim = StockClaim::new(
            StockKey::new(ProductId::new("p1"), MerchantId::new("m1"), None),
            2,
        );

        journal.record_claim(claim.clone()).await;
        journal.record_order(OrderId::new("o1")).await;

        let state = journal.take().await;
        assert_eq!(state.claims, vec![claim]);
        assert_eq!(state.orders, vec![OrderId::new("o1")]);

        let drained = journal.take().await;
        assert!(drained.claims.is_empty());
        assert!(drained.orders.is_empty());
    }
}
