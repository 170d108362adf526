use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use spaceout_catalog::{Destination, TravelClass};
use spaceout_core::identity::{require_user, ResolvedIdentity};
use spaceout_core::payment::PaymentConfirmation;
use spaceout_core::CoreError;
use spaceout_ledger::{BookingItem, BookingReceipt};
use uuid::Uuid;
use crate::{error::AppError, pricing::non_negative, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemRequest {
    Trip {
        destination: String,
        travel_class: String,
        #[serde(default)]
        hibernation_days: i64,
        #[serde(default)]
        cargo_kg: i64,
    },
    LaunchWindow {
        launch_window_id: Uuid,
    },
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub item: ItemRequest,
    pub payment: PaymentConfirmation,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings", post(create_booking))
}

async fn resolve_item(state: &AppState, item: ItemRequest) -> Result<BookingItem, CoreError> {
    match item {
        ItemRequest::Trip { destination, travel_class, hibernation_days, cargo_kg } => {
            let destination: Destination = destination.parse()?;
            let travel_class: TravelClass = travel_class.parse()?;
            let trip = state.pricing.configure_trip(
                destination,
                travel_class,
                non_negative("hibernation_days", hibernation_days)?,
                non_negative("cargo_kg", cargo_kg)?,
            )?;
            Ok(BookingItem::Trip(trip))
        }
        ItemRequest::LaunchWindow { launch_window_id } => state
            .launch_windows
            .find_offer(launch_window_id)
            .await?
            .map(BookingItem::LaunchWindow)
            .ok_or_else(|| CoreError::InvalidParameter(format!("unknown launch window {}", launch_window_id))),
    }
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), AppError> {
    let user = require_user(&identity).await?;
    let item = resolve_item(&state, req.item).await?;
    let receipt = state.bookings.book(&user, &item, &req.payment).await?;

    let status = if receipt.replayed { StatusCode::OK } else { StatusCode::CREATED };
    Ok((status, Json(receipt)))
}
