//! Order types and status machines.
//!
//! Orders are merchant-scoped: a multi-vendor checkout produces one order
//! per merchant present in the cart.

use crate::error::CommerceError;
use crate::ids::{MerchantId, OrderId, OrderItemId, ProductId, UserId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, awaiting processing.
    #[default]
    Pending,
    /// Order confirmed by the merchant.
    Confirmed,
    /// Order being prepared.
    Processing,
    /// Order handed to the courier.
    Shipped,
    /// Order delivered. Terminal.
    Delivered,
    /// Order cancelled. Terminal.
    Cancelled,
    /// Order refunded. Terminal.
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Check if the status permits a given transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Processing | Shipped, Cancelled)
                | (Pending | Confirmed | Processing | Shipped | Delivered | Cancelled, Refunded)
        )
    }

    /// Check if the order can still be cancelled.
    pub fn can_cancel(&self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }

    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

/// Payment status, tracked independently of fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment not yet taken.
    #[default]
    Pending,
    /// Payment captured.
    Completed,
    /// Payment attempt failed.
    Failed,
    /// Payment returned to the customer.
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Check if the status permits a given transition.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Completed) | (Pending, Failed) | (Completed, Refunded)
        )
    }
}

/// A merchant-scoped order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Customer who placed the order.
    pub user_id: UserId,
    /// Merchant fulfilling the order. Exactly one per order.
    pub merchant_id: MerchantId,
    /// Sum of line subtotals, fixed at creation.
    pub total_amount: Money,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Shipping address.
    pub shipping_address: String,
    /// Billing address. Defaults to the shipping address when not given.
    pub billing_address: String,
    /// Payment method label, when provided at checkout.
    pub payment_method: Option<String>,
    /// Courier tracking number, set when shipped.
    pub tracking_number: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Order {
    /// Create a new pending order.
    pub fn new(
        user_id: UserId,
        merchant_id: MerchantId,
        total_amount: Money,
        shipping_address: String,
        billing_address: Option<String>,
        payment_method: Option<String>,
    ) -> Self {
        let now = current_timestamp();
        Self {
            id: OrderId::generate(),
            user_id,
            merchant_id,
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            billing_address: billing_address.unwrap_or_else(|| shipping_address.clone()),
            shipping_address,
            payment_method,
            tracking_number: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: OrderStatus) -> Result<(), CommerceError> {
        if !self.status.can_transition_to(next) {
            return Err(CommerceError::InvalidTransition {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Merchant confirms the order.
    pub fn confirm(&mut self) -> Result<(), CommerceError> {
        self.transition(OrderStatus::Confirmed)
    }

    /// Order preparation has started.
    pub fn mark_processing(&mut self) -> Result<(), CommerceError> {
        self.transition(OrderStatus::Processing)
    }

    /// Order handed to the courier.
    pub fn ship(&mut self, tracking_number: impl Into<String>) -> Result<(), CommerceError> {
        self.transition(OrderStatus::Shipped)?;
        self.tracking_number = Some(tracking_number.into());
        Ok(())
    }

    /// Order delivered to the customer.
    pub fn deliver(&mut self) -> Result<(), CommerceError> {
        self.transition(OrderStatus::Delivered)
    }

    /// Cancel the order. Fails once delivered or already terminal.
    pub fn cancel(&mut self) -> Result<(), CommerceError> {
        self.transition(OrderStatus::Cancelled)
    }

    /// Refund the order. Requires a completed payment.
    pub fn refund(&mut self) -> Result<(), CommerceError> {
        if !self.payment_status.can_transition_to(PaymentStatus::Refunded) {
            return Err(CommerceError::InvalidTransition {
                from: self.payment_status.as_str(),
                to: PaymentStatus::Refunded.as_str(),
            });
        }
        self.transition(OrderStatus::Refunded)?;
        self.payment_status = PaymentStatus::Refunded;
        Ok(())
    }

    /// Record a captured payment.
    pub fn mark_payment_completed(&mut self) -> Result<(), CommerceError> {
        self.set_payment_status(PaymentStatus::Completed)
    }

    /// Record a failed payment attempt.
    pub fn mark_payment_failed(&mut self) -> Result<(), CommerceError> {
        self.set_payment_status(PaymentStatus::Failed)
    }

    fn set_payment_status(&mut self, next: PaymentStatus) -> Result<(), CommerceError> {
        if !self.payment_status.can_transition_to(next) {
            return Err(CommerceError::InvalidTransition {
                from: self.payment_status.as_str(),
                to: next.as_str(),
            });
        }
        self.payment_status = next;
        self.updated_at = current_timestamp();
        Ok(())
    }
}

/// A line item in an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Unique line item identifier.
    pub id: OrderItemId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Product ordered.
    pub product_id: ProductId,
    /// Variant, when the product has variants.
    pub variant_id: Option<VariantId>,
    /// Quantity ordered, always positive.
    pub quantity: i64,
    /// Unit price at time of order.
    pub price: Money,
    /// Line subtotal: price times quantity. Immutable after creation.
    pub subtotal: Money,
    /// Unix timestamp of creation.
    pub created_at: i64,
}

impl OrderItem {
    /// Create a new order line.
    ///
    /// The subtotal is computed here and never recomputed afterwards.
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: i64,
        price: Money,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        let subtotal = price.try_multiply(quantity).ok_or(CommerceError::Overflow)?;
        Ok(Self {
            id: OrderItemId::generate(),
            order_id,
            product_id,
            variant_id,
            quantity,
            price,
            subtotal,
            created_at: current_timestamp(),
        })
    }
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

    fn order() -> Order {
        Order::new(
            UserId::new("user-1"),
            MerchantId::new("merchant-1"),
            Money::new(1000, Currency::USD),
            "12 Harbor Way".to_string(),
            None,
            None,
        )
    }

    #[test]
    fn test_new_order_defaults() {
        let order = order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.billing_address, order.shipping_address);
    }

    #[test]
    fn test_billing_address_when_given() {
        let order = Order::new(
            UserId::new("user-1"),
            MerchantId::new("merchant-1"),
            Money::new(1000, Currency::USD),
            "12 Harbor Way".to_string(),
            Some("9 Bank St".to_string()),
            None,
        );
        assert_eq!(order.billing_address, "9 Bank St");
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut order = order();
        order.confirm().unwrap();
        order.mark_processing().unwrap();
        order.ship("TRACK-1").unwrap();
        order.deliver().unwrap();

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.tracking_number.as_deref(), Some("TRACK-1"));
    }

    #[test]
    fn test_cannot_skip_states() {
        let mut order = order();
        assert!(order.ship("TRACK-1").is_err());
        assert!(order.deliver().is_err());
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_cancel_before_delivery() {
        for advance in 0..4 {
            let mut order = order();
            if advance >= 1 {
                order.confirm().unwrap();
            }
            if advance >= 2 {
                order.mark_processing().unwrap();
            }
            if advance >= 3 {
                order.ship("T").unwrap();
            }
            assert!(order.cancel().is_ok(), "cancel failed at step {advance}");
            assert_eq!(order.status, OrderStatus::Cancelled);
        }
    }

    #[test]
    fn test_cancel_delivered_fails() {
        let mut order = order();
        order.confirm().unwrap();
        order.mark_processing().unwrap();
        order.ship("T").unwrap();
        order.deliver().unwrap();

        let err = order.cancel().unwrap_err();
        assert!(matches!(
            err,
            CommerceError::InvalidTransition {
                from: "delivered",
                to: "cancelled",
            }
        ));
    }

    #[test]
    fn test_cancel_twice_fails_cleanly() {
        let mut order = order();
        order.cancel().unwrap();
        assert!(order.cancel().is_err());
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_refund_requires_completed_payment() {
        let mut order = order();
        assert!(order.refund().is_err());

        order.mark_payment_completed().unwrap();
        order.refund().unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_payment_transitions() {
        let mut order = order();
        order.mark_payment_completed().unwrap();
        assert!(order.mark_payment_failed().is_err());
    }

    #[test]
    fn test_order_item_subtotal() {
        let item = OrderItem::new(
            OrderId::new("order-1"),
            ProductId::new("prod-1"),
            None,
            3,
            Money::new(500, Currency::USD),
        )
        .unwrap();
        assert_eq!(item.subtotal.amount_cents, 1500);
    }

    #[test]
    fn test_order_item_rejects_zero_quantity() {
        let result = OrderItem::new(
            OrderId::new("order-1"),
            ProductId::new("prod-1"),
            None,
            0,
            Money::new(500, Currency::USD),
        );
        assert!(result.is_err());
    }
}
