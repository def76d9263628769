use catalog::CatalogError;
use common::ProductId;
use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur while placing or advancing an order.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The order has no items.
    #[error("No items to order")]
    EmptyOrder,

    /// The delivery address is blank.
    #[error("Address is required")]
    MissingAddress,

    /// A line item has a non-positive quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// A line item references a product that does not exist.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// A line item asks for more units than are in stock.
    #[error("Insufficient stock for product: {name}. Available: {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// The acting principal is not allowed to perform this operation.
    #[error("Only admins may change order status")]
    Forbidden,

    /// An error occurred in the order ledger.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// A storage-level catalog failure (retryable by the caller).
    #[error("Catalog error: {0}")]
    Catalog(CatalogError),
}

impl FulfillmentError {
    /// Returns true when the caller may simply retry the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FulfillmentError::Catalog(CatalogError::Database(_))
                | FulfillmentError::Ledger(LedgerError::Database(_))
        )
    }

    /// Short label for the rejection metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FulfillmentError::EmptyOrder => "empty_order",
            FulfillmentError::MissingAddress => "missing_address",
            FulfillmentError::InvalidQuantity { .. } => "invalid_quantity",
            FulfillmentError::ProductNotFound { .. } => "product_not_found",
            FulfillmentError::InsufficientStock { .. } => "insufficient_stock",
            FulfillmentError::Forbidden => "forbidden",
            FulfillmentError::Ledger(_) => "ledger",
            FulfillmentError::Catalog(_) => "catalog",
        }
    }
}

impl From<CatalogError> for FulfillmentError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound { product_id } => {
                FulfillmentError::ProductNotFound { product_id }
            }
            other => FulfillmentError::Catalog(other),
        }
    }
}
