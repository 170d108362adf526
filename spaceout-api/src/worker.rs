use spaceout_shared::models::events::DomainEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Drain domain events into the structured log until the channel closes.
pub async fn start_event_logger(mut rx: broadcast::Receiver<DomainEvent>) {
    info!("Event logger started");

    loop {
        match rx.recv().await {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(skipped)) => warn!("Event logger lagged, {} events dropped", skipped),
            Err(RecvError::Closed) => break,
        }
    }

    info!("Event logger stopped");
}

fn log_event(event: &DomainEvent) {
    match event {
        DomainEvent::BudgetAllocated(e) => {
            info!(topic = event.topic(), user = %e.user_id, amount_minor = e.amount_minor, "budget allocated")
        }
        DomainEvent::BudgetDeducted(e) => info!(
            topic = event.topic(),
            user = %e.user_id,
            request_id = %e.request_id,
            amount_minor = e.amount_minor,
            balance_after_minor = e.balance_after_minor,
            "budget deducted"
        ),
        DomainEvent::BookingConfirmed(e) => info!(
            topic = event.topic(),
            booking_id = %e.booking_id,
            user = %e.user_id,
            total_minor = e.total_minor,
            "booking confirmed"
        ),
    }
}
