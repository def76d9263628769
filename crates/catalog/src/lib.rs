//! Product catalog store for the storefront backend.
//!
//! Products are the only hot shared mutable resource in the system: stock
//! counters are decremented by concurrent reservations. Both store
//! implementations therefore expose an atomic decrement-if-available
//! operation instead of a read-then-write update.

mod error;
mod memory;
mod postgres;
mod product;
mod store;

pub use error::{CatalogError, Result};
pub use memory::InMemoryCatalog;
pub use postgres::PostgresCatalog;
pub use product::{Product, ProductCategory, ProductPatch};
pub use store::CatalogStore;
