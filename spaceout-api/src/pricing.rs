use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use spaceout_catalog::currency::{format_base, format_ntc};
use spaceout_catalog::{Destination, PriceBreakdown, TravelClass};
use spaceout_core::CoreError;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub destination: String,
    pub travel_class: String,
    #[serde(default)]
    pub hibernation_days: i64,
    #[serde(default)]
    pub cargo_kg: i64,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub destination: Destination,
    pub travel_class: TravelClass,
    pub hibernation_days: u32,
    pub cargo_kg: u32,
    pub distance_pkm: f64,
    pub duration_days: u32,
    pub breakdown: PriceBreakdown,
    pub total_ntc: String,
    pub total_base: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/pricing/quote", post(quote))
}

/// Counts arrive as JSON numbers; anything outside `u32` is a bad parameter
/// rather than a deserialization failure.
pub(crate) fn non_negative(name: &str, value: i64) -> Result<u32, CoreError> {
    u32::try_from(value).map_err(|_| CoreError::InvalidParameter(format!("{} must be between 0 and {}, got {}", name, u32::MAX, value)))
}

async fn quote(State(state): State<AppState>, Json(req): Json<QuoteRequest>) -> Result<Json<QuoteResponse>, AppError> {
    let destination: Destination = req.destination.parse()?;
    let travel_class: TravelClass = req.travel_class.parse()?;
    let hibernation_days = non_negative("hibernation_days", req.hibernation_days)?;
    let cargo_kg = non_negative("cargo_kg", req.cargo_kg)?;

    let breakdown = state
        .pricing
        .compute_price(destination, travel_class, hibernation_days, cargo_kg)?;

    Ok(Json(QuoteResponse {
        destination,
        travel_class,
        hibernation_days,
        cargo_kg,
        distance_pkm: destination.distance(),
        duration_days: destination.nominal_days(),
        breakdown,
        total_ntc: format_ntc(breakdown.total_minor),
        total_base: format_base(breakdown.total_minor),
    }))
}
