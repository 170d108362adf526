use uuid::Uuid;

/// Published once, when a user's budget record is first created.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BudgetAllocatedEvent {
    pub user_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BudgetDeductedEvent {
    pub user_id: String,
    pub request_id: Uuid,
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub user_id: String,
    pub payment_reference: String,
    pub total_minor: i64,
    pub currency: String,
    pub launch_window_id: Option<Uuid>,
    pub timestamp: i64,
}

/// Envelope carried on the in-process broadcast channel.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    BudgetAllocated(BudgetAllocatedEvent),
    BudgetDeducted(BudgetDeductedEvent),
    BookingConfirmed(BookingConfirmedEvent),
}

impl DomainEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::BudgetAllocated(_) => "budget.allocated",
            DomainEvent::BudgetDeducted(_) => "budget.deducted",
            DomainEvent::BookingConfirmed(_) => "booking.confirmed",
        }
    }
}
