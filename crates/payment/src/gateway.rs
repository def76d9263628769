//! Payment gateway client trait and mock implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;

use crate::error::PaymentError;

/// Gateway credentials, constructed explicitly and passed to the client.
///
/// No module-level globals: the client owns its configuration for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key identifier.
    pub key_id: String,
    /// Server-held secret used for signature verification.
    pub key_secret: String,
}

impl GatewayConfig {
    /// Creates a new gateway configuration.
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }
}

/// An order created at the gateway, to be settled by the customer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GatewayOrder {
    /// Gateway-assigned order reference.
    pub gateway_order_id: String,
    /// Amount in minor units, as forwarded to the gateway.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Caller-supplied receipt reference.
    pub receipt: String,
}

/// Trait for the payment gateway client.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a gateway order for the given amount.
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError>;
}

#[derive(Debug, Default)]
struct MockGatewayState {
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory gateway for tests and the default backend.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<RwLock<MockGatewayState>>,
}

impl MockGateway {
    /// Creates a new mock gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail on the next create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of gateway orders created.
    pub fn created_count(&self) -> u32 {
        self.state.read().unwrap().next_id
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount: Money,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, PaymentError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(PaymentError::Gateway("gateway unavailable".to_string()));
        }

        state.next_id += 1;
        Ok(GatewayOrder {
            gateway_order_id: format!("order_GW{:04}", state.next_id),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        })
    }
}
