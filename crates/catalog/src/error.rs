use common::ProductId;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product exists with the given ID.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A product with the given ID already exists.
    #[error("Product already exists: {product_id}")]
    ProductAlreadyExists { product_id: ProductId },

    /// The product record failed validation.
    #[error("Invalid product: {reason}")]
    InvalidProduct { reason: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
