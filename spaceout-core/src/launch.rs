use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Rows returned when the caller does not ask for a page size.
pub const DEFAULT_OFFER_LIMIT: u32 = 3;
pub const MAX_OFFER_LIMIT: u32 = 50;

/// Clamp a requested page size into `1..=MAX_OFFER_LIMIT`.
pub fn effective_limit(requested: Option<u32>) -> u32 {
    requested.unwrap_or(DEFAULT_OFFER_LIMIT).clamp(1, MAX_OFFER_LIMIT)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    Optimal,
    Suboptimal,
    Available,
}

impl WindowStatus {
    /// Unknown statuses are shown as plain availability.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "optimal" => WindowStatus::Optimal,
            "suboptimal" => WindowStatus::Suboptimal,
            _ => WindowStatus::Available,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindowStatus::Optimal => "Optimal",
            WindowStatus::Suboptimal => "Sub-optimal",
            WindowStatus::Available => "Available",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityBand {
    High,
    Medium,
    Low,
}

impl AvailabilityBand {
    pub fn from_percentage(percentage: i32) -> Self {
        if percentage >= 80 {
            AvailabilityBand::High
        } else if percentage >= 50 {
            AvailabilityBand::Medium
        } else {
            AvailabilityBand::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyRef {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationRef {
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub station_type: String,
}

/// A scheduled departure between two stations, joined with its body and
/// station lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaunchWindowOffer {
    pub id: Uuid,
    pub origin_body: BodyRef,
    pub destination_body: BodyRef,
    pub origin_station: StationRef,
    pub destination_station: StationRef,
    pub departure_at: DateTime<Utc>,
    pub arrival_at: DateTime<Utc>,
    pub distance: f64,
    pub duration_days: i32,
    pub status: WindowStatus,
    pub availability_percentage: i32,
    pub base_price_minor: i64,
}

impl LaunchWindowOffer {
    pub fn availability_band(&self) -> AvailabilityBand {
        AvailabilityBand::from_percentage(self.availability_percentage)
    }
}
