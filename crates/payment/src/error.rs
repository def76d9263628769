use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway rejected or failed the request.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// An error occurred in the order ledger.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
