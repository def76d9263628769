//! Order record and embedded line items.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// How the order is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cash,

    /// Online payment through the gateway.
    Gateway,
}

impl PaymentMethod {
    /// Returns the method name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Gateway => "gateway",
        }
    }

    /// Parses a payment method from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "gateway" => Some(PaymentMethod::Gateway),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A line item embedded in an order.
///
/// Name and unit price are captured at order time; they are never
/// recomputed from the current catalog price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// The product ordered.
    pub product_id: ProductId,

    /// Product name snapshot.
    pub name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Unit price snapshot in minor units.
    pub unit_price: Money,
}

impl LineItem {
    /// Creates a new line item.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this line (quantity * unit_price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A durable order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,

    /// Customer who placed the order (non-owning reference).
    pub user_id: UserId,

    /// Ordered sequence of line items.
    pub items: Vec<LineItem>,

    /// Total amount, always the sum of line totals.
    pub total_amount: Money,

    /// Settlement method.
    pub payment_method: PaymentMethod,

    /// Delivery address.
    pub address: String,

    /// Whether payment has settled.
    pub paid: bool,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order.
    ///
    /// The total amount is computed from the snapshotted line items; a
    /// client-supplied total is never trusted. The paid flag is
    /// provisional: gateway orders are settled by the customer before
    /// placement, cash orders settle on delivery.
    pub fn new(
        user_id: UserId,
        items: Vec<LineItem>,
        address: String,
        payment_method: PaymentMethod,
    ) -> Self {
        let now = Utc::now();
        let total_amount = items.iter().map(LineItem::line_total).sum();
        Self {
            id: OrderId::new(),
            user_id,
            items,
            total_amount,
            payment_method,
            address,
            paid: payment_method != PaymentMethod::Cash,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the total quantity across all line items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<LineItem> {
        vec![
            LineItem::new("SKU-001", "Rose Bouquet", 2, Money::from_cents(1500)),
            LineItem::new("SKU-002", "Fern", 1, Money::from_cents(800)),
        ]
    }

    #[test]
    fn line_total_is_price_times_quantity() {
        let item = LineItem::new("SKU-001", "Rose Bouquet", 3, Money::from_cents(1000));
        assert_eq!(item.line_total().cents(), 3000);
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let order = Order::new(
            UserId::new(),
            items(),
            "123 Main St".to_string(),
            PaymentMethod::Cash,
        );
        assert_eq!(order.total_amount.cents(), 2 * 1500 + 800);

        let computed: Money = order.items.iter().map(LineItem::line_total).sum();
        assert_eq!(order.total_amount, computed);
    }

    #[test]
    fn cash_orders_start_unpaid() {
        let order = Order::new(
            UserId::new(),
            items(),
            "123 Main St".to_string(),
            PaymentMethod::Cash,
        );
        assert!(!order.paid);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn gateway_orders_start_provisionally_paid() {
        let order = Order::new(
            UserId::new(),
            items(),
            "123 Main St".to_string(),
            PaymentMethod::Gateway,
        );
        assert!(order.paid);
    }

    #[test]
    fn total_quantity_sums_lines() {
        let order = Order::new(
            UserId::new(),
            items(),
            "123 Main St".to_string(),
            PaymentMethod::Cash,
        );
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn order_serialization_round_trip() {
        let order = Order::new(
            UserId::new(),
            items(),
            "123 Main St".to_string(),
            PaymentMethod::Gateway,
        );
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }

    #[test]
    fn payment_method_round_trip() {
        assert_eq!(PaymentMethod::parse("cash"), Some(PaymentMethod::Cash));
        assert_eq!(
            PaymentMethod::parse("gateway"),
            Some(PaymentMethod::Gateway)
        );
        assert_eq!(PaymentMethod::parse("card"), None);
    }
}
