//! Order store contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowcart_commerce::order::{Order, OrderItem};
use flowcart_commerce::{CommerceError, MerchantId, Money, OrderId, UserId};
use tokio::sync::RwLock;

/// Owns orders and their line items.
///
/// An order and its items are persisted as one atomic unit; an order can
/// never exist without its items. After creation only status, payment
/// status, tracking number, and notes may change.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order together with its items.
    ///
    /// Rejects an empty item list, items pointing at a different order,
    /// and a total that does not equal the sum of line subtotals.
    async fn create(&self, order: Order, items: Vec<OrderItem>) -> Result<Order, CommerceError>;

    /// Fetch an order by id.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, CommerceError>;

    /// List a customer's orders, oldest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError>;

    /// List a merchant's orders, oldest first.
    async fn find_by_merchant(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<Order>, CommerceError>;

    /// Fetch an order's items.
    async fn items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, CommerceError>;

    /// Persist the mutable fields of an order: status, payment status,
    /// tracking number, notes. Identity and totals are never updated.
    async fn update(&self, order: &Order) -> Result<(), CommerceError>;
}

/// Thread-safe in-memory order store.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    items: Arc<RwLock<HashMap<OrderId, Vec<OrderItem>>>>,
    // Insertion sequence, so listings are deterministic.
    sequence: Arc<RwLock<Vec<OrderId>>>,
}

impl InMemoryOrderStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders in the store.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the store holds no orders.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

fn verify_total(order: &Order, items: &[OrderItem]) -> Result<(), CommerceError> {
    let total = Money::try_sum(
        items.iter().map(|item| &item.subtotal),
        order.total_amount.currency,
    )
    .ok_or(CommerceError::Overflow)?;

    if total != order.total_amount {
        return Err(CommerceError::Validation(format!(
            "order total {} does not match item subtotals {}",
            order.total_amount, total
        )));
    }
    Ok(())
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order, items: Vec<OrderItem>) -> Result<Order, CommerceError> {
        if items.is_empty() {
            return Err(CommerceError::Validation(
                "order must have at least one item".to_string(),
            ));
        }
        if items.iter().any(|item| item.order_id != order.id) {
            return Err(CommerceError::Validation(
                "order item does not belong to this order".to_string(),
            ));
        }
        verify_total(&order, &items)?;

        // Single write section so the order and its items land together.
        let mut orders = self.orders.write().await;
        let mut item_map = self.items.write().await;
        let mut sequence = self.sequence.write().await;

        orders.insert(order.id.clone(), order.clone());
        item_map.insert(order.id.clone(), items);
        sequence.push(order.id.clone());

        Ok(order)
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, CommerceError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Order>, CommerceError> {
        let orders = self.orders.read().await;
        let sequence = self.sequence.read().await;
        Ok(sequence
            .iter()
            .filter_map(|id| orders.get(id))
            .filter(|order| order.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn find_by_merchant(
        &self,
        merchant_id: &MerchantId,
    ) -> Result<Vec<Order>, CommerceError> {
        let orders = self.orders.read().await;
        let sequence = self.sequence.read().await;
        Ok(sequence
            .iter()
            .filter_map(|id| orders.get(id))
            .filter(|order| order.merchant_id == *merchant_id)
            .cloned()
            .collect())
    }

    async fn items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, CommerceError> {
        Ok(self
            .items
            .read()
            .await
            .get(order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update(&self, order: &Order) -> Result<(), CommerceError> {
        let mut orders = self.orders.write().await;
        let stored = orders
            .get_mut(&order.id)
            .ok_or_else(|| CommerceError::OrderNotFound(order.id.to_string()))?;

        // Mutable fields only
        stored.status = order.status;
        stored.payment_status = order.payment_status;
        stored.tracking_number = order.tracking_number.clone();
        stored.notes = order.notes.clone();
        stored.updated_at = order.updated_at;
        Ok(())
    }
}
