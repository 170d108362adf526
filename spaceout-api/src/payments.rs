use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use spaceout_core::payment::{PaymentConfirmation, PaymentStatus, PaymentVerifier};
use spaceout_core::{CoreError, CoreResult};
use tracing::warn;

/// Body of the HS256 receipt the payment provider signs.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReceiptClaims {
    /// Provider's payment reference.
    pub sub: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub exp: usize,
}

/// Checks provider receipts offline against a shared secret.
pub struct ReceiptVerifier {
    key: DecodingKey,
}

impl ReceiptVerifier {
    pub fn new(secret: &str) -> Self {
        Self { key: DecodingKey::from_secret(secret.as_bytes()) }
    }
}

#[async_trait]
impl PaymentVerifier for ReceiptVerifier {
    async fn verify(&self, confirmation: &PaymentConfirmation) -> CoreResult<PaymentStatus> {
        let data = decode::<ReceiptClaims>(&confirmation.receipt, &self.key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                warn!("Rejected receipt for payment {}: {}", confirmation.reference, e);
                CoreError::PaymentNotConfirmed("receipt could not be verified".to_string())
            })?;
        let claims = data.claims;

        if claims.sub != confirmation.reference
            || claims.amount_minor != confirmation.amount_minor
            || !claims.currency.eq_ignore_ascii_case(&confirmation.currency)
        {
            warn!("Receipt for payment {} does not match the confirmation", confirmation.reference);
            return Err(CoreError::PaymentNotConfirmed("receipt does not match the payment".to_string()));
        }

        Ok(claims.status)
    }
}
