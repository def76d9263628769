use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::{
    CatalogError, Result,
    product::{Product, ProductPatch},
    store::CatalogStore,
};

/// In-memory catalog store.
///
/// Used by the test suites and as the default backend when no database is
/// configured. The write lock makes check-and-decrement atomic, matching
/// the conditional-update guarantee of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock for a product, for test assertions.
    pub async fn stock_of(&self, id: &ProductId) -> Option<u32> {
        self.products.read().await.get(id).map(|p| p.stock)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<_> = products.values().cloned().collect();
        all.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(all)
    }

    async fn insert(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(CatalogError::ProductAlreadyExists {
                product_id: product.id,
            });
        }
        products.insert(product.id.clone(), product);
        Ok(())
    }

    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| CatalogError::ProductNotFound {
                product_id: id.clone(),
            })?;
        patch.apply(product)?;
        Ok(product.clone())
    }

    async fn remove(&self, id: &ProductId) -> Result<()> {
        let mut products = self.products.write().await;
        products
            .remove(id)
            .ok_or_else(|| CatalogError::ProductNotFound {
                product_id: id.clone(),
            })?;
        Ok(())
    }

    async fn conditional_decrement(&self, id: &ProductId, quantity: u32) -> Result<bool> {
        let mut products = self.products.write().await;
        match products.get_mut(id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment(&self, id: &ProductId, quantity: u32) -> Result<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| CatalogError::ProductNotFound {
                product_id: id.clone(),
            })?;
        product.stock += quantity;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.products.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductCategory;
    use common::Money;

    fn product(id: &str, stock: u32) -> Product {
        Product::new(
            id,
            "Tulip",
            ProductCategory::Flower,
            Money::from_cents(500),
            stock,
            "",
            "",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_get() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 5)).await.unwrap();

        let found = catalog.get(&ProductId::new("SKU-001")).await.unwrap();
        assert_eq!(found.unwrap().stock, 5);

        let missing = catalog.get(&ProductId::new("SKU-404")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn insert_duplicate_fails() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 5)).await.unwrap();

        let result = catalog.insert(product("SKU-001", 9)).await;
        assert!(matches!(
            result,
            Err(CatalogError::ProductAlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn conditional_decrement_succeeds_within_stock() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 5)).await.unwrap();

        let id = ProductId::new("SKU-001");
        assert!(catalog.conditional_decrement(&id, 3).await.unwrap());
        assert_eq!(catalog.stock_of(&id).await, Some(2));
    }

    #[tokio::test]
    async fn conditional_decrement_fails_beyond_stock() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 2)).await.unwrap();

        let id = ProductId::new("SKU-001");
        assert!(!catalog.conditional_decrement(&id, 3).await.unwrap());
        assert_eq!(catalog.stock_of(&id).await, Some(2));
    }

    #[tokio::test]
    async fn conditional_decrement_missing_product_returns_false() {
        let catalog = InMemoryCatalog::new();
        let id = ProductId::new("SKU-404");
        assert!(!catalog.conditional_decrement(&id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_decrements_never_oversell() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 10)).await.unwrap();
        let id = ProductId::new("SKU-001");

        let mut handles = Vec::new();
        for _ in 0..20 {
            let catalog = catalog.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                catalog.conditional_decrement(&id, 1).await.unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 10);
        assert_eq!(catalog.stock_of(&id).await, Some(0));
    }

    #[tokio::test]
    async fn increment_restocks() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 1)).await.unwrap();

        let id = ProductId::new("SKU-001");
        catalog.increment(&id, 4).await.unwrap();
        assert_eq!(catalog.stock_of(&id).await, Some(5));
    }

    #[tokio::test]
    async fn update_applies_patch() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 5)).await.unwrap();

        let patch = ProductPatch {
            price: Some(Money::zero()),
            description: Some("clearance".to_string()),
            ..Default::default()
        };
        let updated = catalog
            .update(&ProductId::new("SKU-001"), patch)
            .await
            .unwrap();

        assert_eq!(updated.price, Money::zero());
        assert_eq!(updated.description, "clearance");
        assert_eq!(updated.name, "Tulip");
    }

    #[tokio::test]
    async fn remove_and_count() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("SKU-001", 1)).await.unwrap();
        catalog.insert(product("SKU-002", 1)).await.unwrap();
        assert_eq!(catalog.count().await.unwrap(), 2);

        catalog.remove(&ProductId::new("SKU-001")).await.unwrap();
        assert_eq!(catalog.count().await.unwrap(), 1);

        let result = catalog.remove(&ProductId::new("SKU-001")).await;
        assert!(matches!(result, Err(CatalogError::ProductNotFound { .. })));
    }
}
