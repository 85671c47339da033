use crate::application::payments::PaymentReconciler;
use crate::error::{DepotError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::{info, warn};

/// The gateway's asynchronous status callback payload.
///
/// `gross_amount` arrives as a string because that is how the gateway signs
/// it; parsing it to a number before recomputing the signature would break
/// verification for amounts like `"40000.00"`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct GatewayNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
}

/// Recomputes the signature the gateway attached: a SHA-512 digest over the
/// order reference, status code and gross amount concatenated with the
/// shared server key, hex-encoded.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Guards the unauthenticated webhook endpoint.
///
/// Verifies the payload signature before anything else touches state, then
/// hands the status over to the reconciler. Replayed deliveries come out as
/// no-op successes, so the gateway can redeliver freely.
pub struct WebhookVerifier {
    reconciler: PaymentReconciler,
    server_key: String,
}

impl WebhookVerifier {
    pub fn new(reconciler: PaymentReconciler, server_key: impl Into<String>) -> Self {
        Self {
            reconciler,
            server_key: server_key.into(),
        }
    }

    pub async fn verify_and_dispatch(&self, raw_payload: &[u8]) -> Result<()> {
        let notification: GatewayNotification =
            serde_json::from_slice(raw_payload).map_err(|err| {
                DepotError::Validation(format!("malformed gateway payload: {err}"))
            })?;

        let expected = notification_signature(
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
            &self.server_key,
        );
        if notification.signature_key != expected {
            warn!(order_id = %notification.order_id, "webhook signature mismatch");
            return Err(DepotError::SignatureMismatch);
        }

        info!(order_id = %notification.order_id,
              transaction_status = %notification.transaction_status,
              "verified gateway callback");
        self.reconciler
            .confirm_from_gateway(&notification.order_id, &notification.transaction_status)
            .await
    }
}
