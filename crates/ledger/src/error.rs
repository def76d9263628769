use common::OrderId;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No order exists with the given ID.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// The requested status change is not an allowed edge.
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The order is in a terminal state and cannot be mutated.
    #[error("Order {order_id} is closed ({status}); no further mutation allowed")]
    OrderClosed {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
