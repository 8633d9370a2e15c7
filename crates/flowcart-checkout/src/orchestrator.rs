//! The checkout orchestrator.

use std::sync::Arc;
use std::time::Duration;

use flowcart_commerce::cart::CartItem;
use flowcart_commerce::catalog::{ProductSummary, StockRef};
use flowcart_commerce::order::{Order, OrderItem, OrderStatus};
use flowcart_commerce::{CheckoutId, CommerceError, MerchantId, Money, OrderId, UserId};
use flowcart_store::{CartStore, OrderStore, ProductCatalog};
use flowcart_warehouse::{StockClaim, StockGateway, StockKey};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::journal::ReservationJournal;

/// Default bound on a whole checkout attempt.
pub const DEFAULT_CHECKOUT_DEADLINE: Duration = Duration::from_secs(30);

/// Input to a checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Customer checking out.
    pub user_id: UserId,
    /// Destination address. Required, non-empty.
    pub shipping_address: String,
    /// Billing address. Defaults to the shipping address.
    pub billing_address: Option<String>,
    /// Payment method label, if the customer chose one.
    pub payment_method: Option<String>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    /// One order per merchant, in first-seen merchant order.
    pub orders: Vec<Order>,
    /// Set when order creation succeeded but cart cleanup did not.
    pub warning: Option<String>,
}

/// One cart line joined with its resolved product.
struct ResolvedLine {
    item: CartItem,
    product: ProductSummary,
}

impl ResolvedLine {
    fn claim(&self) -> StockClaim {
        StockClaim::new(
            StockKey::new(
                self.item.product_id.clone(),
                self.product.merchant_id.clone(),
                self.item.variant_id.clone(),
            ),
            self.item.quantity,
        )
    }
}

/// All of one merchant's lines in a checkout.
struct MerchantGroup {
    merchant_id: MerchantId,
    lines: Vec<ResolvedLine>,
    total: Money,
}

/// Coordinates cart, catalog, warehouse, and orders for checkout and
/// order cancellation.
///
/// Stock moves through the warehouse's two-phase protocol: every line is
/// reserved before any order is created, and holds stay in place until
/// the order ships (confirm) or is cancelled (release). A failure
/// anywhere in the attempt releases every hold the attempt made.
pub struct CheckoutService {
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockGateway>,
    deadline: Duration,
}

impl CheckoutService {
    /// Create a checkout service with the default deadline.
    pub fn new(
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockGateway>,
    ) -> Self {
        Self {
            carts,
            orders,
            catalog,
            stock,
            deadline: DEFAULT_CHECKOUT_DEADLINE,
        }
    }

    /// Override the checkout deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Execute a checkout: split the cart by merchant, hold stock, create
    /// one order per merchant, clear the cart.
    ///
    /// Fails whole: on any error (or deadline expiry) every hold made by
    /// this attempt is released and no orders remain.
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CommerceError> {
        if request.shipping_address.trim().is_empty() {
            return Err(CommerceError::Validation(
                "shipping address is required".to_string(),
            ));
        }

        let attempt = CheckoutId::generate();
        let attempt_ref = StockRef::checkout(attempt.to_string());
        let journal = ReservationJournal::new();

        let result = timeout(
            self.deadline,
            self.run_checkout(&request, &attempt_ref, &journal),
        )
        .await;

        match result {
            Ok(Ok(outcome)) => {
                info!(
                    user = %request.user_id,
                    orders = outcome.orders.len(),
                    "checkout succeeded"
                );
                Ok(outcome)
            }
            Ok(Err(err)) => {
                self.rollback(&journal, &attempt_ref).await;
                Err(err)
            }
            Err(_elapsed) => {
                warn!(user = %request.user_id, "checkout deadline expired");
                self.rollback(&journal, &attempt_ref).await;
                Err(CommerceError::Timeout)
            }
        }
    }

    async fn run_checkout(
        &self,
        request: &CheckoutRequest,
        attempt_ref: &StockRef,
        journal: &ReservationJournal,
    ) -> Result<CheckoutOutcome, CommerceError> {
        let cart = self
            .carts
            .find_by_user(&request.user_id)
            .await?
            .ok_or_else(|| CommerceError::CartNotFound(request.user_id.to_string()))?;

        let items = self.carts.items(&cart.id).await?;
        if items.is_empty() {
            return Err(CommerceError::EmptyCart);
        }

        let groups = self.resolve_and_group(items).await?;

        // Phase one: hold stock for every line before creating anything.
        for group in &groups {
            for line in &group.lines {
                let claim = line.claim();
                self.stock.reserve(&claim, attempt_ref).await?;
                journal.record_claim(claim).await;
            }
        }

        // Phase two: one order per merchant.
        let mut created = Vec::with_capacity(groups.len());
        for group in &groups {
            let order = Order::new(
                request.user_id.clone(),
                group.merchant_id.clone(),
                group.total,
                request.shipping_address.clone(),
                request.billing_address.clone(),
                request.payment_method.clone(),
            );

            let mut order_items = Vec::with_capacity(group.lines.len());
            for line in &group.lines {
                order_items.push(OrderItem::new(
                    order.id.clone(),
                    line.item.product_id.clone(),
                    line.item.variant_id.clone(),
                    line.item.quantity,
                    line.item.unit_price,
                )?);
            }

            let order = self.orders.create(order, order_items).await?;
            journal.record_order(order.id.clone()).await;
            created.push(order);
        }

        // Phase three: the cart goes away only after every order exists.
        // Failure here is best-effort territory; the orders stand.
        let warning = match self.carts.clear(&cart.id).await {
            Ok(()) => None,
            Err(err) => {
                warn!(cart = %cart.id, error = %err, "cart clear failed after checkout");
                Some(format!("orders created but cart was not cleared: {err}"))
            }
        };

        Ok(CheckoutOutcome {
            orders: created,
            warning,
        })
    }

    /// Resolve every cart line against the catalog and partition by
    /// merchant, preserving first-seen merchant order.
    async fn resolve_and_group(
        &self,
        items: Vec<CartItem>,
    ) -> Result<Vec<MerchantGroup>, CommerceError> {
        let mut groups: Vec<MerchantGroup> = Vec::new();

        for item in items {
            let product = self
                .catalog
                .product(&item.product_id)
                .await?
                .ok_or_else(|| CommerceError::ProductUnavailable(item.product_id.to_string()))?;

            if !product.is_active {
                return Err(CommerceError::ProductUnavailable(item.product_id.to_string()));
            }

            // The price snapshot must still match the catalog; silent
            // drift would make the order total disagree with what the
            // customer saw.
            if item.unit_price != product.price {
                return Err(CommerceError::PriceChanged {
                    product_id: item.product_id.to_string(),
                    snapshot_cents: item.unit_price.amount_cents,
                    current_cents: product.price.amount_cents,
                });
            }

            let subtotal = item.subtotal()?;
            match groups
                .iter_mut()
                .find(|group| group.merchant_id == product.merchant_id)
            {
                Some(group) => {
                    group.total = group
                        .total
                        .try_add(&subtotal)
                        .ok_or(CommerceError::Overflow)?;
                    group.lines.push(ResolvedLine { item, product });
                }
                None => groups.push(MerchantGroup {
                    merchant_id: product.merchant_id.clone(),
                    total: subtotal,
                    lines: vec![ResolvedLine { item, product }],
                }),
            }
        }

        Ok(groups)
    }

    /// Undo whatever a failed attempt managed to do: release every hold,
    /// cancel any order that was already created.
    async fn rollback(&self, journal: &ReservationJournal, attempt_ref: &StockRef) {
        let state = journal.take().await;

        for order_id in state.orders.iter().rev() {
            match self.orders.find_by_id(order_id).await {
                Ok(Some(mut order)) => {
                    if order.cancel().is_ok() {
                        if let Err(err) = self.orders.update(&order).await {
                            warn!(order = %order_id, error = %err, "rollback: order cancel not persisted");
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(order = %order_id, error = %err, "rollback: order lookup failed");
                }
            }
        }

        for claim in state.claims.iter().rev() {
            if let Err(err) = self.stock.release(claim, attempt_ref).await {
                warn!(
                    product = %claim.key.product_id,
                    quantity = claim.quantity,
                    error = %err,
                    "rollback: release failed"
                );
            }
        }
    }

    /// Cancel an order on behalf of its owning customer.
    ///
    /// Stock held for the order is released; stock already shipped is
    /// returned to the shelf.
    pub async fn cancel_order(
        &self,
        order_id: &OrderId,
        requester: &UserId,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))?;

        if order.user_id != *requester {
            return Err(CommerceError::Forbidden(
                "only the ordering customer may cancel".to_string(),
            ));
        }

        let was_shipped = order.status == OrderStatus::Shipped;
        order.cancel()?;
        self.orders.update(&order).await?;

        let reference = StockRef::order(order.id.to_string());
        for item in self.orders.items(&order.id).await? {
            let claim = StockClaim::new(
                StockKey::new(
                    item.product_id.clone(),
                    order.merchant_id.clone(),
                    item.variant_id.clone(),
                ),
                item.quantity,
            );
            let result = if was_shipped {
                self.stock.restock(&claim, &reference).await
            } else {
                self.stock.release(&claim, &reference).await
            };
            if let Err(err) = result {
                warn!(
                    order = %order.id,
                    product = %item.product_id,
                    error = %err,
                    "cancel: stock return failed"
                );
            }
        }

        info!(order = %order.id, "order cancelled");
        Ok(order)
    }

    /// Merchant confirms a pending order.
    pub async fn confirm_order(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.advance(order_id, |order| order.confirm()).await
    }

    /// Merchant starts preparing the order.
    pub async fn mark_processing(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.advance(order_id, |order| order.mark_processing()).await
    }

    /// Order handed to the courier: stock held for it physically leaves
    /// the warehouse.
    pub async fn mark_shipped(
        &self,
        order_id: &OrderId,
        tracking_number: &str,
    ) -> Result<Order, CommerceError> {
        let order = self
            .advance(order_id, |order| order.ship(tracking_number))
            .await?;

        let reference = StockRef::order(order.id.to_string());
        for item in self.orders.items(&order.id).await? {
            let claim = StockClaim::new(
                StockKey::new(
                    item.product_id.clone(),
                    order.merchant_id.clone(),
                    item.variant_id.clone(),
                ),
                item.quantity,
            );
            if let Err(err) = self.stock.confirm(&claim, &reference).await {
                warn!(
                    order = %order.id,
                    product = %item.product_id,
                    error = %err,
                    "ship: reservation confirm failed"
                );
            }
        }

        Ok(order)
    }

    /// Courier delivered the order.
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<Order, CommerceError> {
        self.advance(order_id, |order| order.deliver()).await
    }

    async fn advance(
        &self,
        order_id: &OrderId,
        apply: impl FnOnce(&mut Order) -> Result<(), CommerceError>,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| CommerceError::OrderNotFound(order_id.to_string()))?;
        apply(&mut order)?;
        self.orders.update(&order).await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcart_commerce::catalog::ProductSummary;
    use flowcart_commerce::{Currency, ProductId};
    use flowcart_store::{InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore};
    use flowcart_warehouse::InventoryLedger;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn service() -> (CheckoutService, InMemoryCartStore, InMemoryCatalog) {
        let carts = InMemoryCartStore::new();
        let catalog = InMemoryCatalog::new();
        let service = CheckoutService::new(
            Arc::new(carts.clone()),
            Arc::new(InMemoryOrderStore::new()),
            Arc::new(catalog.clone()),
            Arc::new(InventoryLedger::new()),
        );
        (service, carts, catalog)
    }

    fn request(user: &str) -> CheckoutRequest {
        CheckoutRequest {
            user_id: UserId::new(user),
            shipping_address: "12 Harbor Way".to_string(),
            billing_address: None,
            payment_method: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_requires_shipping_address() {
        let (service, _, _) = service();
        let mut req = request("user-1");
        req.shipping_address = "   ".to_string();

        let result = service.checkout(req).await;
        assert!(matches!(result, Err(CommerceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_checkout_without_cart() {
        let (service, _, _) = service();
        let result = service.checkout(request("user-1")).await;
        assert!(matches!(result, Err(CommerceError::CartNotFound(_))));
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let (service, carts, _) = service();
        carts.get_or_create(&UserId::new("user-1")).await.unwrap();

        let result = service.checkout(request("user-1")).await;
        assert!(matches!(result, Err(CommerceError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_checkout_inactive_product() {
        let (service, carts, catalog) = service();
        let user = UserId::new("user-1");
        let product = ProductId::new("prod-1");

        catalog
            .upsert(ProductSummary::new(
                product.clone(),
                MerchantId::new("m1"),
                usd(1000),
                false,
            ))
            .await;

        let cart = carts.get_or_create(&user).await.unwrap();
        carts
            .add_item(&cart.id, &product, None, 1, usd(1000))
            .await
            .unwrap();

        let result = service.checkout(request("user-1")).await;
        assert!(matches!(result, Err(CommerceError::ProductUnavailable(_))));

        // Cart untouched
        assert_eq!(carts.items(&cart.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_price_drift() {
        let (service, carts, catalog) = service();
        let user = UserId::new("user-1");
        let product = ProductId::new("prod-1");

        catalog
            .upsert(ProductSummary::new(
                product.clone(),
                MerchantId::new("m1"),
                usd(1200),
                true,
            ))
            .await;

        let cart = carts.get_or_create(&user).await.unwrap();
        carts
            .add_item(&cart.id, &product, None, 1, usd(1000))
            .await
            .unwrap();

        let result = service.checkout(request("user-1")).await;
        assert!(matches!(result, Err(CommerceError::PriceChanged { .. })));
    }
}
