use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, UserId};
use tokio::sync::RwLock;

use crate::{
    LedgerError, Result,
    order::Order,
    status::OrderStatus,
    store::{OrderFilter, OrderStore},
};

/// In-memory order store.
///
/// Used by the test suites and as the default backend when no database is
/// configured. Provides the same conditional-update semantics as the
/// PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut mine: Vec<_> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn query(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<_> = orders
            .values()
            .filter(|o| {
                if let Some(status) = filter.status
                    && o.status != status
                {
                    return false;
                }
                if let Some(from) = filter.created_from
                    && o.created_at < from
                {
                    return false;
                }
                if let Some(to) = filter.created_to
                    && o.created_at > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        set_paid: bool,
    ) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or(LedgerError::OrderNotFound { order_id: id })?;

        if order.status != from {
            return Ok(None);
        }

        order.status = to;
        if set_paid {
            order.paid = true;
        }
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn set_paid(&self, id: OrderId) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&id) else {
            return Ok(None);
        };

        if order.paid {
            // No-op success: already settled.
            return Ok(Some(order.clone()));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(LedgerError::OrderClosed {
                order_id: id,
                status: order.status,
            });
        }

        order.paid = true;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.orders.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{LineItem, PaymentMethod};
    use common::Money;

    fn order(user_id: UserId) -> Order {
        Order::new(
            user_id,
            vec![LineItem::new(
                "SKU-001",
                "Rose Bouquet",
                1,
                Money::from_cents(1500),
            )],
            "123 Main St".to_string(),
            PaymentMethod::Cash,
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryOrderStore::new();
        let o = order(UserId::new());
        let id = o.id;
        store.insert(o).await.unwrap();

        assert!(store.get(id).await.unwrap().is_some());
        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_for_user_filters_by_owner() {
        let store = InMemoryOrderStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        store.insert(order(alice)).await.unwrap();
        store.insert(order(alice)).await.unwrap();
        store.insert(order(bob)).await.unwrap();

        assert_eq!(store.list_for_user(alice).await.unwrap().len(), 2);
        assert_eq!(store.list_for_user(bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_status_is_conditional() {
        let store = InMemoryOrderStore::new();
        let o = order(UserId::new());
        let id = o.id;
        store.insert(o).await.unwrap();

        let updated = store
            .update_status(id, OrderStatus::Pending, OrderStatus::Processing, false)
            .await
            .unwrap();
        assert_eq!(updated.unwrap().status, OrderStatus::Processing);

        // Stale `from` loses the race.
        let stale = store
            .update_status(id, OrderStatus::Pending, OrderStatus::Cancelled, false)
            .await
            .unwrap();
        assert!(stale.is_none());
    }

    #[tokio::test]
    async fn update_status_missing_order_errors() {
        let store = InMemoryOrderStore::new();
        let result = store
            .update_status(
                OrderId::new(),
                OrderStatus::Pending,
                OrderStatus::Processing,
                false,
            )
            .await;
        assert!(matches!(result, Err(LedgerError::OrderNotFound { .. })));
    }

    #[tokio::test]
    async fn set_paid_is_idempotent() {
        let store = InMemoryOrderStore::new();
        let o = order(UserId::new());
        let id = o.id;
        store.insert(o).await.unwrap();

        let first = store.set_paid(id).await.unwrap().unwrap();
        assert!(first.paid);
        let second = store.set_paid(id).await.unwrap().unwrap();
        assert!(second.paid);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn set_paid_rejected_after_cancellation() {
        let store = InMemoryOrderStore::new();
        let o = order(UserId::new());
        let id = o.id;
        store.insert(o).await.unwrap();

        store
            .update_status(id, OrderStatus::Pending, OrderStatus::Cancelled, false)
            .await
            .unwrap();

        let result = store.set_paid(id).await;
        assert!(matches!(result, Err(LedgerError::OrderClosed { .. })));
    }

    #[tokio::test]
    async fn query_by_status_and_limit() {
        let store = InMemoryOrderStore::new();
        for _ in 0..3 {
            store.insert(order(UserId::new())).await.unwrap();
        }
        let o = order(UserId::new());
        let id = o.id;
        store.insert(o).await.unwrap();
        store
            .update_status(id, OrderStatus::Pending, OrderStatus::Processing, false)
            .await
            .unwrap();

        let pending = store
            .query(OrderFilter {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 3);

        let limited = store
            .query(OrderFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
    }
}
