//! Cart store contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowcart_commerce::cart::{Cart, CartItem};
use flowcart_commerce::{CartId, CartItemId, CommerceError, Money, ProductId, UserId, VariantId};
use tokio::sync::RwLock;

/// Owns carts and their line items.
///
/// A customer has at most one active cart; `get_or_create` is the only
/// way a cart comes into existence. Clearing a cart removes its items and
/// keeps the cart row.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Fetch the customer's cart, creating it if absent.
    async fn get_or_create(&self, user_id: &UserId) -> Result<Cart, CommerceError>;

    /// Fetch the customer's cart without creating one.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Cart>, CommerceError>;

    /// Add a line to the cart.
    ///
    /// If a line with the same (product, variant) pair exists, its
    /// quantity is increased by `quantity` instead of inserting a second
    /// line. Rejects non-positive quantities.
    async fn add_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<CartItem, CommerceError>;

    /// List the cart's items.
    async fn items(&self, cart_id: &CartId) -> Result<Vec<CartItem>, CommerceError>;

    /// Remove a single line.
    async fn remove_item(&self, cart_id: &CartId, item_id: &CartItemId)
        -> Result<(), CommerceError>;

    /// Delete all lines, keeping the cart row.
    async fn clear(&self, cart_id: &CartId) -> Result<(), CommerceError>;
}

/// Thread-safe in-memory cart store.
///
/// Carts are keyed by customer, which makes the one-active-cart rule hold
/// under concurrent `get_or_create` calls: the write lock serializes the
/// lookup-or-insert.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
    items: Arc<RwLock<HashMap<CartId, Vec<CartItem>>>>,
}

impl InMemoryCartStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn cart_exists(&self, cart_id: &CartId) -> bool {
        self.carts
            .read()
            .await
            .values()
            .any(|cart| cart.id == *cart_id)
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_or_create(&self, user_id: &UserId) -> Result<Cart, CommerceError> {
        let mut carts = self.carts.write().await;
        let cart = carts
            .entry(user_id.clone())
            .or_insert_with(|| Cart::new(user_id.clone()));
        Ok(cart.clone())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Cart>, CommerceError> {
        Ok(self.carts.read().await.get(user_id).cloned())
    }

    async fn add_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<CartItem, CommerceError> {
        if !self.cart_exists(cart_id).await {
            return Err(CommerceError::CartNotFound(cart_id.to_string()));
        }

        let mut items = self.items.write().await;
        let lines = items.entry(cart_id.clone()).or_default();

        if let Some(existing) = lines
            .iter_mut()
            .find(|line| line.matches(product_id, variant_id))
        {
            existing.increase_quantity(quantity)?;
            return Ok(existing.clone());
        }

        let item = CartItem::new(
            cart_id.clone(),
            product_id.clone(),
            variant_id.cloned(),
            quantity,
            unit_price,
        )?;
        lines.push(item.clone());
        Ok(item)
    }

    async fn items(&self, cart_id: &CartId) -> Result<Vec<CartItem>, CommerceError> {
        Ok(self
            .items
            .read()
            .await
            .get(cart_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_item(
        &self,
        cart_id: &CartId,
        item_id: &CartItemId,
    ) -> Result<(), CommerceError> {
        let mut items = self.items.write().await;
        let lines = items
            .get_mut(cart_id)
            .ok_or_else(|| CommerceError::CartItemNotFound(item_id.to_string()))?;

        let before = lines.len();
        lines.retain(|line| line.id != *item_id);
        if lines.len() == before {
            return Err(CommerceError::CartItemNotFound(item_id.to_string()));
        }
        Ok(())
    }

    async fn clear(&self, cart_id: &CartId) -> Result<(), CommerceError> {
        self.items.write().await.remove(cart_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcart_commerce::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let store = InMemoryCartStore::new();
        let user = UserId::new("user-1");

        let first = store.get_or_create(&user).await.unwrap();
        let second = store.get_or_create(&user).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_one_cart_per_user() {
        let store = InMemoryCartStore::new();
        let user = UserId::new("user-1");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let user = user.clone();
            handles.push(tokio::spawn(
                async move { store.get_or_create(&user).await },
            ));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_add_item_merges_same_line() {
        let store = InMemoryCartStore::new();
        let cart = store.get_or_create(&UserId::new("user-1")).await.unwrap();
        let product = ProductId::new("prod-x");

        store
            .add_item(&cart.id, &product, None, 3, usd(1000))
            .await
            .unwrap();
        let merged = store
            .add_item(&cart.id, &product, None, 2, usd(1000))
            .await
            .unwrap();

        assert_eq!(merged.quantity, 5);
        let items = store.items(&cart.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_item_distinct_variants() {
        let store = InMemoryCartStore::new();
        let cart = store.get_or_create(&UserId::new("user-1")).await.unwrap();
        let product = ProductId::new("prod-x");
        let variant = VariantId::new("var-1");

        store
            .add_item(&cart.id, &product, None, 1, usd(1000))
            .await
            .unwrap();
        store
            .add_item(&cart.id, &product, Some(&variant), 1, usd(1000))
            .await
            .unwrap();

        assert_eq!(store.items(&cart.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_item_rejects_zero_quantity() {
        let store = InMemoryCartStore::new();
        let cart = store.get_or_create(&UserId::new("user-1")).await.unwrap();

        let result = store
            .add_item(&cart.id, &ProductId::new("prod-x"), None, 0, usd(1000))
            .await;
        assert!(matches!(result, Err(CommerceError::InvalidQuantity(0))));
    }

    #[tokio::test]
    async fn test_add_item_unknown_cart() {
        let store = InMemoryCartStore::new();
        let result = store
            .add_item(
                &CartId::new("ghost"),
                &ProductId::new("prod-x"),
                None,
                1,
                usd(1000),
            )
            .await;
        assert!(matches!(result, Err(CommerceError::CartNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_item() {
        let store = InMemoryCartStore::new();
        let cart = store.get_or_create(&UserId::new("user-1")).await.unwrap();
        let item = store
            .add_item(&cart.id, &ProductId::new("prod-x"), None, 1, usd(1000))
            .await
            .unwrap();

        store.remove_item(&cart.id, &item.id).await.unwrap();
        assert!(store.items(&cart.id).await.unwrap().is_empty());

        let again = store.remove_item(&cart.id, &item.id).await;
        assert!(matches!(again, Err(CommerceError::CartItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_clear_keeps_cart_row() {
        let store = InMemoryCartStore::new();
        let user = UserId::new("user-1");
        let cart = store.get_or_create(&user).await.unwrap();
        store
            .add_item(&cart.id, &ProductId::new("prod-x"), None, 2, usd(1000))
            .await
            .unwrap();

        store.clear(&cart.id).await.unwrap();

        assert!(store.items(&cart.id).await.unwrap().is_empty());
        let found = store.find_by_user(&user).await.unwrap().unwrap();
        assert_eq!(found.id, cart.id);
    }
}
