//! Keyed-hash payment signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::gateway::GatewayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Verifies gateway payment signatures.
///
/// The signed body is `"{gateway_order_id}|{gateway_payment_id}"` and the
/// signature is the hex-encoded HMAC-SHA256 under the server-held secret.
/// Comparison is constant-time via [`Mac::verify_slice`].
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    /// Creates a verifier from a raw secret.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Creates a verifier from gateway credentials.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.key_secret.as_bytes().to_vec())
    }

    fn mac(&self, gateway_order_id: &str, gateway_payment_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(gateway_payment_id.as_bytes());
        Some(mac)
    }

    /// Computes the hex signature the gateway would produce.
    ///
    /// Used by the mock gateway and tests to simulate a settled payment.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        let mac = self
            .mac(gateway_order_id, gateway_payment_id)
            .expect("HMAC-SHA256 accepts keys of any length");
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a client-supplied hex signature, in constant time.
    ///
    /// Any malformed input yields `false`; no distinction is made between
    /// a bad encoding and a wrong signature.
    pub fn verify(
        &self,
        gateway_order_id: &str,
        gateway_payment_id: &str,
        signature_hex: &str,
    ) -> bool {
        let Ok(signature) = hex::decode(signature_hex) else {
            return false;
        };
        let Some(mac) = self.mac(gateway_order_id, gateway_payment_id) else {
            return false;
        };
        mac.verify_slice(&signature).is_ok()
    }
}
