//! Payment gateway integration and reconciliation.
//!
//! Reconciliation matches a gateway-reported payment to a local order via
//! keyed-hash signature verification. The check fails closed: a bad
//! signature or a missing local order both leave the ledger untouched and
//! report a generic failure.

mod error;
mod gateway;
mod reconciler;
mod signature;

pub use error::PaymentError;
pub use gateway::{GatewayConfig, GatewayOrder, MockGateway, PaymentGateway};
pub use reconciler::{PaymentReconciler, PaymentVerification};
pub use signature::SignatureVerifier;
