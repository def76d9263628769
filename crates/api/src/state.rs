//! Shared application state.

use std::sync::Arc;

use catalog::CatalogStore;
use fulfillment::FulfillmentService;
use ledger::{OrderLedger, OrderStore};
use payment::{PaymentGateway, PaymentReconciler};

/// Shared application state accessible from all handlers.
pub struct AppState<C: CatalogStore + 'static, S: OrderStore + Clone> {
    pub catalog: Arc<C>,
    pub ledger: OrderLedger<S>,
    pub fulfillment: FulfillmentService<C, S>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// Public key identifier handed to clients for checkout.
    pub gateway_key_id: String,
    pub reconciler: PaymentReconciler<S>,
}
