//! Order lifecycle controller.

use std::sync::Arc;
use std::time::Instant;

use catalog::CatalogStore;
use common::{OrderId, ProductId, Role, UserId};
use ledger::{Order, OrderLedger, OrderStatus, OrderStore, PaymentMethod};
use serde::Deserialize;

use crate::error::FulfillmentError;
use crate::reservation::InventoryReservation;

/// A requested order line, before validation against the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Front door for order placement and status changes.
///
/// Placement is reservation-first: stock is held before the ledger entry
/// is written, and released again if the write fails. The catalog is
/// therefore never left short by an order that does not exist.
pub struct FulfillmentService<C: CatalogStore + 'static, S: OrderStore> {
    reservation: InventoryReservation<C>,
    ledger: OrderLedger<S>,
}

impl<C: CatalogStore + 'static, S: OrderStore + Clone> Clone for FulfillmentService<C, S> {
    fn clone(&self) -> Self {
        Self {
            reservation: self.reservation.clone(),
            ledger: self.ledger.clone(),
        }
    }
}

impl<C: CatalogStore + 'static, S: OrderStore + Clone> FulfillmentService<C, S> {
    /// Creates a new service over the given catalog and ledger.
    pub fn new(catalog: Arc<C>, ledger: OrderLedger<S>) -> Self {
        Self {
            reservation: InventoryReservation::new(catalog),
            ledger,
        }
    }

    /// Returns the underlying ledger.
    pub fn ledger(&self) -> &OrderLedger<S> {
        &self.ledger
    }

    /// Places an order: validate, reserve stock, write the ledger entry.
    ///
    /// Rejections happen before any stock is touched. If the ledger write
    /// fails after stock was reserved, the reservation is released before
    /// the error is returned.
    #[tracing::instrument(skip(self, items, address), fields(items = items.len()))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        items: Vec<OrderItemRequest>,
        address: &str,
        payment_method: PaymentMethod,
    ) -> Result<Order, FulfillmentError> {
        let started = Instant::now();

        if items.is_empty() {
            return self.reject(FulfillmentError::EmptyOrder);
        }
        if address.trim().is_empty() {
            return self.reject(FulfillmentError::MissingAddress);
        }
        for item in &items {
            if item.quantity == 0 {
                return self.reject(FulfillmentError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
        }

        let lines: Vec<(ProductId, u32)> = items
            .into_iter()
            .map(|i| (i.product_id, i.quantity))
            .collect();

        let (guard, snapshots) = match self.reservation.reserve(&lines).await {
            Ok(reserved) => reserved,
            Err(e) => return self.reject(e),
        };

        match self
            .ledger
            .create(user_id, snapshots, address.trim().to_string(), payment_method)
            .await
        {
            Ok(order) => {
                guard.commit();
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("order_placement_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                Ok(order)
            }
            Err(e) => {
                // Compensate: the ledger entry does not exist, so the
                // stock hold must not survive.
                if let Err(release_err) = guard.release().await {
                    tracing::error!(
                        error = %release_err,
                        "failed to release reservation after ledger failure"
                    );
                }
                self.reject(e.into())
            }
        }
    }

    /// Moves an order to `target`. Admin only.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(
        &self,
        role: Role,
        order_id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, FulfillmentError> {
        if !role.is_admin() {
            return Err(FulfillmentError::Forbidden);
        }
        Ok(self.ledger.transition(order_id, target).await?)
    }

    fn reject(&self, error: FulfillmentError) -> Result<Order, FulfillmentError> {
        metrics::counter!("orders_rejected_total", "reason" => error.reason()).increment(1);
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{InMemoryCatalog, Product, ProductCategory};
    use common::Money;
    use ledger::InMemoryOrderStore;

    async fn service() -> (
        FulfillmentService<InMemoryCatalog, InMemoryOrderStore>,
        Arc<InMemoryCatalog>,
    ) {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog
            .insert(
                Product::new(
                    "SKU-001",
                    "Rose Bouquet",
                    ProductCategory::Flower,
                    Money::from_cents(1500),
                    5,
                    "",
                    "",
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let ledger = OrderLedger::new(InMemoryOrderStore::new());
        (
            FulfillmentService::new(Arc::clone(&catalog), ledger),
            catalog,
        )
    }

    fn item(product_id: &str, quantity: u32) -> OrderItemRequest {
        OrderItemRequest {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[tokio::test]
    async fn place_order_decrements_stock_and_records_order() {
        let (service, catalog) = service().await;
        let user = UserId::new();

        let order = service
            .place_order(user, vec![item("SKU-001", 2)], "123 Main St", PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(order.user_id, user);
        assert_eq!(order.total_amount, Money::from_cents(3000));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(
            catalog.stock_of(&ProductId::new("SKU-001")).await,
            Some(3)
        );

        let stored = service.ledger().get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.items[0].name, "Rose Bouquet");
    }

    #[tokio::test]
    async fn empty_order_is_rejected_without_touching_stock() {
        let (service, catalog) = service().await;

        let result = service
            .place_order(UserId::new(), vec![], "123 Main St", PaymentMethod::Cash)
            .await;
        assert!(matches!(result, Err(FulfillmentError::EmptyOrder)));
        assert_eq!(
            catalog.stock_of(&ProductId::new("SKU-001")).await,
            Some(5)
        );
    }

    #[tokio::test]
    async fn blank_address_is_rejected() {
        let (service, _catalog) = service().await;

        let result = service
            .place_order(UserId::new(), vec![item("SKU-001", 1)], "   ", PaymentMethod::Cash)
            .await;
        assert!(matches!(result, Err(FulfillmentError::MissingAddress)));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let (service, _catalog) = service().await;

        let result = service
            .place_order(
                UserId::new(),
                vec![item("SKU-001", 0)],
                "123 Main St",
                PaymentMethod::Cash,
            )
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[tokio::test]
    async fn oversell_is_rejected_with_availability() {
        let (service, catalog) = service().await;

        let result = service
            .place_order(
                UserId::new(),
                vec![item("SKU-001", 6)],
                "123 Main St",
                PaymentMethod::Cash,
            )
            .await;
        match result {
            Err(FulfillmentError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(
            catalog.stock_of(&ProductId::new("SKU-001")).await,
            Some(5)
        );
    }

    #[tokio::test]
    async fn set_status_requires_admin() {
        let (service, _catalog) = service().await;
        let order = service
            .place_order(
                UserId::new(),
                vec![item("SKU-001", 1)],
                "123 Main St",
                PaymentMethod::Cash,
            )
            .await
            .unwrap();

        let result = service
            .set_status(Role::Customer, order.id, OrderStatus::Processing)
            .await;
        assert!(matches!(result, Err(FulfillmentError::Forbidden)));

        let order = service
            .set_status(Role::Admin, order.id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn invalid_transition_surfaces_from_ledger() {
        let (service, _catalog) = service().await;
        let order = service
            .place_order(
                UserId::new(),
                vec![item("SKU-001", 1)],
                "123 Main St",
                PaymentMethod::Cash,
            )
            .await
            .unwrap();

        let result = service
            .set_status(Role::Admin, order.id, OrderStatus::Delivered)
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::Ledger(
                ledger::LedgerError::InvalidTransition { .. }
            ))
        ));
    }
}
