pub mod retry;
pub mod ledger;
pub mod session;
pub mod memory;
pub mod booking;

pub use retry::RetryPolicy;
pub use ledger::{BudgetAccess, BudgetLedger, Deduction, LedgerSettings, MAX_AMOUNT_MINOR};
pub use session::{CachedBalance, LedgerSession};
pub use memory::{InMemoryBudgetRepository, InMemoryLaunchWindowRepository};
pub use booking::{booking_id_for, BookingDesk, BookingItem, BookingQuote, BookingReceipt};
