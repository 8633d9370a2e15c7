//! Product catalog reader.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowcart_commerce::catalog::ProductSummary;
use flowcart_commerce::{CommerceError, ProductId};
use tokio::sync::RwLock;

/// Read-only product lookup consumed by cart and checkout.
///
/// Catalog CRUD belongs to the merchant service; this contract only
/// resolves a product's price, owner, and active flag.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look up a product. `Ok(None)` when the product does not exist.
    async fn product(&self, id: &ProductId) -> Result<Option<ProductSummary>, CommerceError>;
}

/// Thread-safe in-memory catalog for tests and the dev server.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, ProductSummary>>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product.
    pub async fn upsert(&self, product: ProductSummary) {
        self.products
            .write()
            .await
            .insert(product.id.clone(), product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn product(&self, id: &ProductId) -> Result<Option<ProductSummary>, CommerceError> {
        Ok(self.products.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcart_commerce::{Currency, MerchantId, Money};

    #[tokio::test]
    async fn test_lookup() {
        let catalog = InMemoryCatalog::new();
        catalog
            .upsert(ProductSummary::new(
                ProductId::new("prod-1"),
                MerchantId::new("merchant-1"),
                Money::new(1000, Currency::USD),
                true,
            ))
            .await;

        let found = catalog.product(&ProductId::new("prod-1")).await.unwrap();
        assert!(found.is_some());

        let missing = catalog.product(&ProductId::new("prod-2")).await.unwrap();
        assert!(missing.is_none());
    }
}
