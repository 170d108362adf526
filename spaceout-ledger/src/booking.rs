use serde::Serialize;
use spaceout_catalog::{PriceBreakdown, PricingEngine, TripConfiguration};
use spaceout_core::launch::LaunchWindowOffer;
use spaceout_core::payment::{PaymentConfirmation, PaymentStatus, PaymentVerifier};
use spaceout_core::{CoreError, CoreResult, UserIdentity};
use spaceout_shared::models::events::{BookingConfirmedEvent, DomainEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;
use crate::ledger::BudgetLedger;

/// What is being bought.
#[derive(Debug, Clone)]
pub enum BookingItem {
    /// A configured trip, charged at its computed total.
    Trip(TripConfiguration),
    /// A published departure, charged at its base price.
    LaunchWindow(LaunchWindowOffer),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingQuote {
    pub total_minor: i64,
    pub breakdown: Option<PriceBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub payment_reference: String,
    pub total_minor: i64,
    pub currency: String,
    pub balance_after_minor: i64,
    pub launch_window_id: Option<Uuid>,
    /// This payment had already been booked; nothing was charged again.
    pub replayed: bool,
}

/// Turns a verified payment into a budget deduction.
pub struct BookingDesk {
    pricing: PricingEngine,
    ledger: Arc<BudgetLedger>,
    verifier: Arc<dyn PaymentVerifier>,
    events: Option<broadcast::Sender<DomainEvent>>,
}

impl BookingDesk {
    pub fn new(pricing: PricingEngine, ledger: Arc<BudgetLedger>, verifier: Arc<dyn PaymentVerifier>) -> Self {
        Self { pricing, ledger, verifier, events: None }
    }

    pub fn with_events(mut self, tx: broadcast::Sender<DomainEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn quote(&self, item: &BookingItem) -> CoreResult<BookingQuote> {
        match item {
            BookingItem::Trip(trip) => {
                let breakdown = self.pricing.price(trip)?;
                Ok(BookingQuote { total_minor: breakdown.total_minor, breakdown: Some(breakdown) })
            }
            BookingItem::LaunchWindow(offer) => {
                if offer.base_price_minor < 0 {
                    return Err(CoreError::InvalidParameter(format!(
                        "launch window {} has a negative price",
                        offer.id
                    )));
                }
                Ok(BookingQuote { total_minor: offer.base_price_minor, breakdown: None })
            }
        }
    }

    /// Charge the user's budget for `item` once the provider confirms the
    /// payment. The booking id is derived from the payment reference, so a
    /// resubmitted confirmation never charges twice.
    pub async fn book(
        &self,
        user: &UserIdentity,
        item: &BookingItem,
        payment: &PaymentConfirmation,
    ) -> CoreResult<BookingReceipt> {
        let quote = self.quote(item)?;
        let currency = &self.ledger.settings().currency;

        if payment.amount_minor != quote.total_minor {
            warn!(
                "Payment {} amount {} does not match quote {}",
                payment.reference, payment.amount_minor, quote.total_minor
            );
            return Err(CoreError::PaymentNotConfirmed(format!(
                "paid {} but the booking costs {}",
                payment.amount_minor, quote.total_minor
            )));
        }
        if !payment.currency.eq_ignore_ascii_case(currency) {
            return Err(CoreError::PaymentNotConfirmed(format!(
                "paid in {} but budgets are held in {}",
                payment.currency, currency
            )));
        }

        let status = self.verifier.verify(payment).await?;
        if status != PaymentStatus::Succeeded {
            warn!("Payment {} not confirmed: {:?}", payment.reference, status);
            return Err(CoreError::PaymentNotConfirmed(format!("payment status is {:?}", status)));
        }

        let booking_id = booking_id_for(&payment.reference);
        let deduction = self.ledger.deduct(user, quote.total_minor, booking_id).await?;

        let launch_window_id = match item {
            BookingItem::LaunchWindow(offer) => Some(offer.id),
            BookingItem::Trip(_) => None,
        };

        if !deduction.replayed {
            info!("Booking {} confirmed for user {}", booking_id, user.id);
            if let Some(tx) = &self.events {
                let _ = tx.send(DomainEvent::BookingConfirmed(BookingConfirmedEvent {
                    booking_id,
                    user_id: user.id.to_string(),
                    payment_reference: payment.reference.clone(),
                    total_minor: quote.total_minor,
                    currency: currency.clone(),
                    launch_window_id,
                    timestamp: chrono::Utc::now().timestamp(),
                }));
            }
        }

        Ok(BookingReceipt {
            booking_id,
            payment_reference: payment.reference.clone(),
            total_minor: quote.total_minor,
            currency: currency.clone(),
            balance_after_minor: deduction.budget.balance_minor,
            launch_window_id,
            replayed: deduction.replayed,
        })
    }
}

/// Stable id for the booking paid by `reference`.
pub fn booking_id_for(reference: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("payment:{}", reference).as_bytes())
}
