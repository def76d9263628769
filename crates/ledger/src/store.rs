//! Order store trait and query filter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};

use crate::error::Result;
use crate::order::Order;
use crate::status::OrderStatus;

/// Filter for administrative order queries.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only orders with this status.
    pub status: Option<OrderStatus>,

    /// Only orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,

    /// Only orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,

    /// Maximum number of orders returned (newest first).
    pub limit: Option<usize>,
}

/// Durable store for order records.
///
/// Orders are append-mostly: the only mutations are the conditional status
/// update and the idempotent paid-flag set, both of which refresh the
/// modification timestamp. Orders are never deleted.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    async fn insert(&self, order: Order) -> Result<()>;

    /// Fetches an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Lists orders matching a filter, newest first.
    async fn query(&self, filter: OrderFilter) -> Result<Vec<Order>>;

    /// Conditionally moves an order from `from` to `to`.
    ///
    /// The update applies only when the stored status still equals `from`,
    /// so two racing transitions cannot both win. Returns the updated
    /// order, or `None` when the stored status has moved on. `set_paid`
    /// additionally settles the paid flag in the same write.
    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        set_paid: bool,
    ) -> Result<Option<Order>>;

    /// Sets the paid flag, idempotently.
    ///
    /// Already-paid orders are returned unchanged (no-op success). A
    /// cancelled unpaid order cannot be marked paid. Returns `None` when
    /// the order does not exist.
    async fn set_paid(&self, id: OrderId) -> Result<Option<Order>>;

    /// Returns the total number of orders.
    async fn count(&self) -> Result<u64>;
}
