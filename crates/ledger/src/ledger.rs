//! Order ledger service.

use common::{Money, OrderId, UserId};

use crate::{
    LedgerError, Result,
    order::{LineItem, Order, PaymentMethod},
    status::OrderStatus,
    store::{OrderFilter, OrderStore},
};

/// Aggregate figures over the ledger, for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LedgerStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub paid_revenue: Money,
}

/// Service wrapping an [`OrderStore`] with the order lifecycle rules.
///
/// Policy note: a transition to `Delivered` always settles the paid flag,
/// covering cash-on-delivery orders that were never verified through the
/// payment gateway.
#[derive(Clone)]
pub struct OrderLedger<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderLedger<S> {
    /// Creates a new ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a new pending order from snapshotted line items.
    ///
    /// The total is computed server-side from the line items.
    #[tracing::instrument(skip(self, items, address))]
    pub async fn create(
        &self,
        user_id: UserId,
        items: Vec<LineItem>,
        address: String,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        let order = Order::new(user_id, items, address, payment_method);
        self.store.insert(order.clone()).await?;

        tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");
        Ok(order)
    }

    /// Loads an order by ID.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.store.get(id).await
    }

    /// Lists a user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        self.store.list_for_user(user_id).await
    }

    /// Lists orders matching a filter, newest first.
    pub async fn query(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        self.store.query(filter).await
    }

    /// Moves an order to `target` along an allowed edge.
    ///
    /// Rejects anything outside the declared edges with
    /// [`LedgerError::InvalidTransition`] carrying the current and
    /// requested status. A transition to `Delivered` forces `paid = true`.
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, id: OrderId, target: OrderStatus) -> Result<Order> {
        loop {
            let order = self
                .store
                .get(id)
                .await?
                .ok_or(LedgerError::OrderNotFound { order_id: id })?;

            if !order.status.can_transition_to(target) {
                metrics::counter!("ledger_invalid_transitions_total").increment(1);
                return Err(LedgerError::InvalidTransition {
                    from: order.status,
                    to: target,
                });
            }

            let settles = target == OrderStatus::Delivered;
            match self
                .store
                .update_status(id, order.status, target, settles)
                .await?
            {
                Some(updated) => {
                    tracing::info!(order_id = %id, from = %order.status, to = %target, "order status updated");
                    return Ok(updated);
                }
                // Lost a race with a concurrent transition; re-validate
                // against the fresh status.
                None => continue,
            }
        }
    }

    /// Marks an order as paid, idempotently.
    ///
    /// Calling this on an already-paid order is a no-op success.
    #[tracing::instrument(skip(self))]
    pub async fn mark_paid(&self, id: OrderId) -> Result<Order> {
        self.store
            .set_paid(id)
            .await?
            .ok_or(LedgerError::OrderNotFound { order_id: id })
    }

    /// Computes aggregate figures over the whole ledger.
    pub async fn stats(&self) -> Result<LedgerStats> {
        let orders = self.store.query(OrderFilter::default()).await?;

        let paid_revenue = orders
            .iter()
            .filter(|o| o.paid)
            .map(|o| o.total_amount)
            .sum();
        let pending_orders = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count() as u64;

        Ok(LedgerStats {
            total_orders: orders.len() as u64,
            pending_orders,
            paid_revenue,
        })
    }
}
