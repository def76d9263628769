//! All-or-nothing inventory reservation.
//!
//! Reserving runs in two phases. Phase one validates every line against
//! the current catalog and snapshots name and unit price. Phase two
//! commits each line with an atomic conditional decrement; if any line
//! loses a race for the last units, the lines already committed are
//! rolled back and the whole reservation fails. Partial reservations are
//! never observable in the catalog.

use std::sync::Arc;
use std::time::Duration;

use catalog::{CatalogError, CatalogStore};
use common::ProductId;
use ledger::LineItem;

use crate::error::FulfillmentError;

const RELEASE_RETRIES: u32 = 3;
const RELEASE_BACKOFF: Duration = Duration::from_millis(50);

/// A committed stock hold, pending the order write.
///
/// Dropping the guard without calling [`commit`](Reservation::commit)
/// releases the held stock from a spawned task. Callers that need the
/// release to complete before proceeding (compensation after a ledger
/// failure) should call [`release`](Reservation::release) instead.
#[must_use = "an unreleased reservation holds stock"]
pub struct Reservation<C: CatalogStore + 'static> {
    catalog: Arc<C>,
    lines: Vec<(ProductId, u32)>,
    committed: bool,
}

impl<C: CatalogStore + 'static> Reservation<C> {
    /// Keeps the held stock; the decrements become permanent.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Releases the held stock, re-incrementing every line.
    ///
    /// Retries with backoff on storage failures. Lines are removed from
    /// the pending set as they succeed, so a retry never double-credits.
    pub async fn release(mut self) -> Result<(), FulfillmentError> {
        self.committed = true;
        let mut lines = std::mem::take(&mut self.lines);
        release_with_retry(&*self.catalog, &mut lines).await
    }
}

impl<C: CatalogStore + 'static> std::fmt::Debug for Reservation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("lines", &self.lines)
            .field("committed", &self.committed)
            .finish()
    }
}

impl<C: CatalogStore + 'static> Drop for Reservation<C> {
    fn drop(&mut self) {
        if self.committed || self.lines.is_empty() {
            return;
        }
        let catalog = Arc::clone(&self.catalog);
        let mut lines = std::mem::take(&mut self.lines);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = release_with_retry(&*catalog, &mut lines).await {
                        tracing::error!(error = %e, "failed to release abandoned reservation");
                    }
                });
            }
            Err(_) => {
                tracing::error!("reservation dropped outside a runtime; stock not released");
            }
        }
    }
}

async fn release_with_retry<C: CatalogStore>(
    catalog: &C,
    lines: &mut Vec<(ProductId, u32)>,
) -> Result<(), FulfillmentError> {
    let mut backoff = RELEASE_BACKOFF;
    for attempt in 1..=RELEASE_RETRIES {
        match release_lines(catalog, lines).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < RELEASE_RETRIES => {
                tracing::warn!(error = %e, attempt, "reservation release failed, retrying");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

async fn release_lines<C: CatalogStore>(
    catalog: &C,
    lines: &mut Vec<(ProductId, u32)>,
) -> Result<(), FulfillmentError> {
    while let Some((product_id, quantity)) = lines.last().cloned() {
        match catalog.increment(&product_id, quantity).await {
            Ok(()) => {}
            // The product was removed while we held its stock; there is
            // nothing left to credit.
            Err(CatalogError::ProductNotFound { .. }) => {
                tracing::warn!(product_id = %product_id, "released line for a removed product");
            }
            Err(e) => return Err(e.into()),
        }
        lines.pop();
    }
    Ok(())
}

/// Reserves stock for order lines against a shared catalog.
pub struct InventoryReservation<C: CatalogStore + 'static> {
    catalog: Arc<C>,
}

impl<C: CatalogStore + 'static> Clone for InventoryReservation<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C: CatalogStore + 'static> InventoryReservation<C> {
    /// Creates a reservation engine over the given catalog.
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Reserves every requested line or none of them.
    ///
    /// On success returns the stock hold together with line items
    /// snapshotting the catalog name and unit price at reservation time.
    /// A line that loses a concurrent race for the last units fails the
    /// whole reservation: previously committed lines are rolled back and
    /// the error reports the availability seen after the rollback.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn reserve(
        &self,
        items: &[(ProductId, u32)],
    ) -> Result<(Reservation<C>, Vec<LineItem>), FulfillmentError> {
        // Phase one: validate and snapshot. No writes yet.
        let mut snapshots = Vec::with_capacity(items.len());
        for (product_id, quantity) in items {
            let product = self
                .catalog
                .get(product_id)
                .await?
                .ok_or_else(|| FulfillmentError::ProductNotFound {
                    product_id: product_id.clone(),
                })?;

            if product.stock < *quantity {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: product_id.clone(),
                    name: product.name,
                    requested: *quantity,
                    available: product.stock,
                });
            }

            snapshots.push(LineItem::new(
                product_id.clone(),
                product.name,
                *quantity,
                product.price,
            ));
        }

        // Phase two: commit each line atomically; roll back on the first
        // loss. A duplicate product across two lines can pass phase one
        // and still lose here, which is the correct outcome.
        let mut committed: Vec<(ProductId, u32)> = Vec::with_capacity(items.len());
        for (index, (product_id, quantity)) in items.iter().enumerate() {
            match self.catalog.conditional_decrement(product_id, *quantity).await {
                Ok(true) => committed.push((product_id.clone(), *quantity)),
                Ok(false) => {
                    release_with_retry(&*self.catalog, &mut committed).await?;
                    metrics::counter!("reservations_total", "outcome" => "lost_race").increment(1);

                    let available = match self.catalog.get(product_id).await? {
                        Some(product) => product.stock,
                        None => 0,
                    };
                    return Err(FulfillmentError::InsufficientStock {
                        product_id: product_id.clone(),
                        name: snapshots[index].name.clone(),
                        requested: *quantity,
                        available,
                    });
                }
                Err(e) => {
                    release_with_retry(&*self.catalog, &mut committed).await?;
                    return Err(e.into());
                }
            }
        }

        metrics::counter!("reservations_total", "outcome" => "reserved").increment(1);
        Ok((
            Reservation {
                catalog: Arc::clone(&self.catalog),
                lines: committed,
                committed: false,
            },
            snapshots,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{InMemoryCatalog, Product, ProductCategory};
    use common::Money;

    async fn catalog_with(products: &[(&str, &str, u32, i64)]) -> Arc<InMemoryCatalog> {
        let catalog = Arc::new(InMemoryCatalog::new());
        for (id, name, stock, cents) in products {
            catalog
                .insert(
                    Product::new(
                        ProductId::from(*id),
                        (*name).to_string(),
                        ProductCategory::Flower,
                        Money::from_cents(*cents),
                        *stock,
                        "",
                        "",
                    )
                    .unwrap(),
                )
                .await
                .unwrap();
        }
        catalog
    }

    fn pid(s: &str) -> ProductId {
        ProductId::from(s)
    }

    #[tokio::test]
    async fn reserve_snapshots_name_and_price() {
        let catalog = catalog_with(&[("SKU-001", "Rose Bouquet", 5, 1500)]).await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let (guard, lines) = engine.reserve(&[(pid("SKU-001"), 2)]).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Rose Bouquet");
        assert_eq!(lines[0].unit_price, Money::from_cents(1500));
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(3));

        guard.commit();
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(3));
    }

    #[tokio::test]
    async fn insufficient_stock_changes_nothing() {
        let catalog = catalog_with(&[
            ("SKU-001", "Rose Bouquet", 5, 1500),
            ("SKU-002", "Fern", 1, 800),
        ])
        .await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let result = engine
            .reserve(&[(pid("SKU-001"), 2), (pid("SKU-002"), 3)])
            .await;
        match result {
            Err(FulfillmentError::InsufficientStock {
                name, available, ..
            }) => {
                assert_eq!(name, "Fern");
                assert_eq!(available, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // No line was committed.
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(5));
        assert_eq!(catalog.stock_of(&pid("SKU-002")).await, Some(1));
    }

    #[tokio::test]
    async fn unknown_product_fails_whole_reservation() {
        let catalog = catalog_with(&[("SKU-001", "Rose Bouquet", 5, 1500)]).await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let result = engine
            .reserve(&[(pid("SKU-001"), 1), (pid("SKU-404"), 1)])
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::ProductNotFound { .. })
        ));
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(5));
    }

    #[tokio::test]
    async fn duplicate_lines_roll_back_on_commit_loss() {
        // Two lines of the same product pass validation individually but
        // exceed stock together; the second decrement must fail and the
        // first must be rolled back.
        let catalog = catalog_with(&[("SKU-001", "Rose Bouquet", 4, 1500)]).await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let result = engine
            .reserve(&[(pid("SKU-001"), 3), (pid("SKU-001"), 3)])
            .await;
        assert!(matches!(
            result,
            Err(FulfillmentError::InsufficientStock { .. })
        ));
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(4));
    }

    #[tokio::test]
    async fn explicit_release_restores_stock() {
        let catalog = catalog_with(&[("SKU-001", "Rose Bouquet", 5, 1500)]).await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let (guard, _lines) = engine.reserve(&[(pid("SKU-001"), 2)]).await.unwrap();
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(3));

        guard.release().await.unwrap();
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(5));
    }

    #[tokio::test]
    async fn dropped_guard_releases_stock() {
        let catalog = catalog_with(&[("SKU-001", "Rose Bouquet", 5, 1500)]).await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let (guard, _lines) = engine.reserve(&[(pid("SKU-001"), 2)]).await.unwrap();
        drop(guard);

        // The release runs on a spawned task.
        for _ in 0..50 {
            if catalog.stock_of(&pid("SKU-001")).await == Some(5) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("dropped reservation never released its stock");
    }

    #[tokio::test]
    async fn concurrent_reservations_never_oversell() {
        let catalog = catalog_with(&[("SKU-001", "Rose Bouquet", 10, 1500)]).await;
        let engine = InventoryReservation::new(Arc::clone(&catalog));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                match engine.reserve(&[(pid("SKU-001"), 1)]).await {
                    Ok((guard, _)) => {
                        guard.commit();
                        true
                    }
                    Err(FulfillmentError::InsufficientStock { .. }) => false,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }));
        }

        let mut reserved = 0;
        for handle in handles {
            if handle.await.unwrap() {
                reserved += 1;
            }
        }
        assert_eq!(reserved, 10);
        assert_eq!(catalog.stock_of(&pid("SKU-001")).await, Some(0));
    }
}
