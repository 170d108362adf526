use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::CoreResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    RequiresPaymentMethod,
    RequiresAction,
    Processing,
    Succeeded,
    Canceled,
    Failed,
}

/// What the client hands back after the provider's checkout completes.
/// `receipt` is the provider-signed proof; nothing else here is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Check the provider's proof and report the payment's real status.
    async fn verify(&self, confirmation: &PaymentConfirmation) -> CoreResult<PaymentStatus>;
}
