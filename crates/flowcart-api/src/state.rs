//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use flowcart_checkout::CheckoutService;
use flowcart_store::{
    CartStore, InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, OrderStore, ProductCatalog,
};
use flowcart_warehouse::InventoryLedger;

use crate::config::ApiConfig;

/// Handles shared by every request task.
///
/// Constructed once at startup and cloned per request; no ambient
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub ledger: Arc<InventoryLedger>,
    pub checkout: Arc<CheckoutService>,
}

impl AppState {
    /// Wire the service graph from explicit parts.
    pub fn new(
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        ledger: Arc<InventoryLedger>,
        config: &ApiConfig,
    ) -> Self {
        let checkout = Arc::new(
            CheckoutService::new(
                carts.clone(),
                orders.clone(),
                catalog.clone(),
                ledger.clone(),
            )
            .with_deadline(Duration::from_secs(config.checkout.deadline_secs)),
        );

        Self {
            carts,
            orders,
            catalog,
            ledger,
            checkout,
        }
    }

    /// In-memory wiring for the dev server and tests. Returns the typed
    /// catalog handle so callers can seed products.
    pub fn in_memory(config: &ApiConfig) -> (Self, Arc<InMemoryCatalog>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let state = Self::new(
            Arc::new(InMemoryCartStore::new()),
            Arc::new(InMemoryOrderStore::new()),
            catalog.clone(),
            Arc::new(InventoryLedger::new()),
            config,
        );
        (state, catalog)
    }
}
