//! Payment reconciliation against the order ledger.

use common::OrderId;
use ledger::{OrderLedger, OrderStore};

use crate::error::PaymentError;
use crate::signature::SignatureVerifier;

/// A gateway-reported payment awaiting verification.
///
/// Ephemeral: the record is not persisted beyond the check.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaymentVerification {
    /// Gateway order reference.
    pub gateway_order_id: String,
    /// Gateway payment reference.
    pub gateway_payment_id: String,
    /// Client-supplied hex signature.
    pub signature: String,
    /// The local order this payment targets.
    pub order_id: OrderId,
}

/// Matches gateway-reported payments to local orders.
#[derive(Clone)]
pub struct PaymentReconciler<S: OrderStore> {
    ledger: OrderLedger<S>,
    verifier: SignatureVerifier,
}

impl<S: OrderStore + Clone> PaymentReconciler<S> {
    /// Creates a new reconciler over the given ledger.
    pub fn new(ledger: OrderLedger<S>, verifier: SignatureVerifier) -> Self {
        Self { ledger, verifier }
    }

    /// Verifies a payment and marks the local order as paid.
    ///
    /// Returns `true` only when the signature matches, in which case the
    /// order's paid flag is settled (idempotently). A signature mismatch
    /// and a missing local order both return `false` through the same
    /// path, so a caller cannot distinguish the two failure causes.
    /// Storage failures surface as errors; they are not a verification
    /// outcome.
    #[tracing::instrument(skip(self, verification), fields(order_id = %verification.order_id))]
    pub async fn verify_and_mark_paid(
        &self,
        verification: PaymentVerification,
    ) -> Result<bool, PaymentError> {
        let order = self.ledger.get(verification.order_id).await?;

        let verified = order.is_some()
            && self.verifier.verify(
                &verification.gateway_order_id,
                &verification.gateway_payment_id,
                &verification.signature,
            );

        if !verified {
            metrics::counter!("payment_verifications_total", "outcome" => "rejected").increment(1);
            tracing::warn!(
                gateway_order_id = %verification.gateway_order_id,
                "payment verification rejected"
            );
            return Ok(false);
        }

        self.ledger.mark_paid(verification.order_id).await?;
        metrics::counter!("payment_verifications_total", "outcome" => "verified").increment(1);
        tracing::info!(
            gateway_order_id = %verification.gateway_order_id,
            "payment verified, order marked paid"
        );
        Ok(true)
    }
}
