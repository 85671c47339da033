use crate::domain::ports::{CheckoutRequest, PaymentGateway};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// A local stand-in for the external payment gateway.
///
/// Mints opaque snap-style tokens without any network round trip. Used by
/// the replay binary and by tests; a production deployment would swap in an
/// HTTP-backed implementation of `PaymentGateway`.
#[derive(Default, Clone)]
pub struct OfflineGateway;

impl OfflineGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for OfflineGateway {
    async fn create_token(&self, request: CheckoutRequest) -> Result<String> {
        let token = format!("snap-{}", Uuid::new_v4().simple());
        debug!(reference = %request.reference, gross_amount = %request.gross_amount,
               "issued offline payment token");
        Ok(token)
    }
}
