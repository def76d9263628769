//! Catalog store trait.

use async_trait::async_trait;
use common::ProductId;

use crate::error::Result;
use crate::product::{Product, ProductPatch};

/// Durable store for product records.
///
/// Stock is never updated via read-then-write in application code:
/// `conditional_decrement` must be atomic with respect to concurrent
/// callers so that two reservations racing for the last unit cannot both
/// succeed.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetches a product by ID.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Lists all products.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Inserts a new product. Fails if the ID is already taken.
    async fn insert(&self, product: Product) -> Result<()>;

    /// Applies a partial update and returns the updated product.
    ///
    /// Fields absent from the patch are left unchanged; explicit zero and
    /// empty values are applied as given.
    async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<Product>;

    /// Removes a product from the catalog.
    async fn remove(&self, id: &ProductId) -> Result<()>;

    /// Atomically decrements stock if at least `quantity` units remain.
    ///
    /// Returns `false` when stock is insufficient (nothing is changed) or
    /// the product does not exist.
    async fn conditional_decrement(&self, id: &ProductId, quantity: u32) -> Result<bool>;

    /// Increments stock (reservation release or admin restock).
    async fn increment(&self, id: &ProductId, quantity: u32) -> Result<()>;

    /// Returns the number of products in the catalog.
    async fn count(&self) -> Result<u64>;
}
