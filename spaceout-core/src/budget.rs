use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::identity::UserId;

/// A user's travel budget as held by the store. Amounts are minor units
/// (1/100 of the base currency unit).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserBudget {
    pub user_id: UserId,
    pub email: Option<String>,
    pub balance_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seed for a first-access insert.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub user_id: UserId,
    pub email: Option<String>,
    pub balance_minor: i64,
    pub currency: String,
    /// Recorded on the allocation entry, so a retried insert can tell that
    /// its own earlier attempt created the record.
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    InitialAllocation,
    Adjustment,
    Deduction,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::InitialAllocation => "INITIAL_ALLOCATION",
            EntryKind::Adjustment => "ADJUSTMENT",
            EntryKind::Deduction => "DEDUCTION",
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIAL_ALLOCATION" => Ok(EntryKind::InitialAllocation),
            "ADJUSTMENT" => Ok(EntryKind::Adjustment),
            "DEDUCTION" => Ok(EntryKind::Deduction),
            other => Err(format!("unknown ledger entry kind: {}", other)),
        }
    }
}

/// Append-only audit row written in the same transaction as the balance
/// change it describes. `request_id` is unique per user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub request_id: Uuid,
    pub kind: EntryKind,
    /// Signed change applied to the balance.
    pub delta_minor: i64,
    pub balance_after_minor: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of the atomic `balance >= amount` decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// `replayed` is set when `request_id` had already been applied; the
    /// balance was not touched a second time.
    Applied { budget: UserBudget, replayed: bool },
    Insufficient { available_minor: i64 },
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_wire_names() {
        for kind in [EntryKind::InitialAllocation, EntryKind::Adjustment, EntryKind::Deduction] {
            let parsed: EntryKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("REFUND".parse::<EntryKind>().is_err());
    }
}
