//! Cart and cart item types.
//!
//! A customer has at most one active cart. Items snapshot the unit price
//! at add time; the snapshot is re-checked against the catalog during
//! checkout.

use crate::error::CommerceError;
use crate::ids::{CartId, CartItemId, ProductId, UserId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A customer's shopping cart.
///
/// The cart row itself persists across checkouts; clearing a cart removes
/// its items only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    /// Owning customer.
    pub user_id: UserId,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Cart {
    /// Create a new cart for a customer.
    pub fn new(user_id: UserId) -> Self {
        let now = current_timestamp();
        Self {
            id: CartId::generate(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the cart as touched.
    pub fn touch(&mut self) {
        self.updated_at = current_timestamp();
    }
}

/// A line item in a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique line item identifier.
    pub id: CartItemId,
    /// Cart this item belongs to.
    pub cart_id: CartId,
    /// Product being purchased.
    pub product_id: ProductId,
    /// Variant, when the product has variants.
    pub variant_id: Option<VariantId>,
    /// Quantity, always positive.
    pub quantity: i64,
    /// Unit price captured when the item was added.
    pub unit_price: Money,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl CartItem {
    /// Create a new cart item.
    ///
    /// Returns `InvalidQuantity` if quantity is not positive.
    pub fn new(
        cart_id: CartId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        let now = current_timestamp();
        Ok(Self {
            id: CartItemId::generate(),
            cart_id,
            product_id,
            variant_id,
            quantity,
            unit_price,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check whether this line matches a (product, variant) pair.
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.product_id == *product_id && self.variant_id.as_ref() == variant_id
    }

    /// Increase quantity by the given amount (merge semantics for
    /// repeated adds of the same line).
    pub fn increase_quantity(&mut self, amount: i64) -> Result<(), CommerceError> {
        if amount <= 0 {
            return Err(CommerceError::InvalidQuantity(amount));
        }
        self.quantity = self
            .quantity
            .checked_add(amount)
            .ok_or(CommerceError::Overflow)?;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Line subtotal: unit price times quantity.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        self.unit_price
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)
    }
}

/// Sum the subtotals of a set of cart items.
pub fn cart_total(items: &[CartItem]) -> Result<Money, CommerceError> {
    let currency = items
        .first()
        .map(|i| i.unit_price.currency)
        .unwrap_or_default();
    let mut total = Money::zero(currency);
    for item in items {
        total = total
            .try_add(&item.subtotal()?)
            .ok_or(CommerceError::Overflow)?;
    }
    Ok(total)
}

/// Get current Unix timestamp.
fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn item(quantity: i64, cents: i64) -> CartItem {
        CartItem::new(
            CartId::new("cart-1"),
            ProductId::new("prod-1"),
            None,
            quantity,
            Money::new(cents, Currency::USD),
        )
        .unwrap()
    }

    #[test]
    fn test_cart_creation() {
        let cart = Cart::new(UserId::new("user-1"));
        assert_eq!(cart.user_id.as_str(), "user-1");
    }

    #[test]
    fn test_item_rejects_zero_quantity() {
        let result = CartItem::new(
            CartId::new("cart-1"),
            ProductId::new("prod-1"),
            None,
            0,
            Money::new(1000, Currency::USD),
        );
        assert!(matches!(result, Err(CommerceError::InvalidQuantity(0))));
    }

    #[test]
    fn test_item_subtotal() {
        let item = item(3, 1000);
        assert_eq!(item.subtotal().unwrap().amount_cents, 3000);
    }

    #[test]
    fn test_increase_quantity() {
        let mut item = item(3, 1000);
        item.increase_quantity(2).unwrap();
        assert_eq!(item.quantity, 5);
    }

    #[test]
    fn test_increase_quantity_rejects_non_positive() {
        let mut item = item(3, 1000);
        assert!(item.increase_quantity(0).is_err());
        assert!(item.increase_quantity(-1).is_err());
        assert_eq!(item.quantity, 3);
    }

    #[test]
    fn test_matches_variant() {
        let with_variant = CartItem::new(
            CartId::new("cart-1"),
            ProductId::new("prod-1"),
            Some(VariantId::new("var-1")),
            1,
            Money::new(1000, Currency::USD),
        )
        .unwrap();

        let variant = VariantId::new("var-1");
        assert!(with_variant.matches(&ProductId::new("prod-1"), Some(&variant)));
        assert!(!with_variant.matches(&ProductId::new("prod-1"), None));
        assert!(!with_variant.matches(&ProductId::new("prod-2"), Some(&variant)));
    }

    #[test]
    fn test_cart_total() {
        let items = vec![item(2, 1000), item(1, 2500)];
        assert_eq!(cart_total(&items).unwrap().amount_cents, 4500);
    }

    #[test]
    fn test_cart_total_empty() {
        assert_eq!(cart_total(&[]).unwrap().amount_cents, 0);
    }
}
