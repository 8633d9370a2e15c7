//! Read-only product view.

use crate::ids::{MerchantId, ProductId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// The slice of a product that cart and checkout logic needs: who sells
/// it, what it costs, and whether it can still be bought.
///
/// Catalog management (create/update/delete) lives elsewhere; this type
/// is only ever read here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Unique product identifier.
    pub id: ProductId,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Current catalog price.
    pub price: Money,
    /// Whether the product is purchasable.
    pub is_active: bool,
}

impl ProductSummary {
    /// Create a product summary.
    pub fn new(id: ProductId, merchant_id: MerchantId, price: Money, is_active: bool) -> Self {
        Self {
            id,
            merchant_id,
            price,
            is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    #[test]
    fn test_product_summary() {
        let product = ProductSummary::new(
            ProductId::new("prod-1"),
            MerchantId::new("merchant-1"),
            Money::new(1000, Currency::USD),
            true,
        );
        assert!(product.is_active);
        assert_eq!(product.merchant_id.as_str(), "merchant-1");
    }
}
