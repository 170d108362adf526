use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spaceout_catalog::currency::format_base;
use spaceout_core::launch::{effective_limit, AvailabilityBand, LaunchWindowOffer};
use spaceout_core::CoreError;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LaunchWindowView {
    #[serde(flatten)]
    pub offer: LaunchWindowOffer,
    pub status_label: &'static str,
    pub availability: AvailabilityBand,
    pub price_display: String,
}

impl From<LaunchWindowOffer> for LaunchWindowView {
    fn from(offer: LaunchWindowOffer) -> Self {
        Self {
            status_label: offer.status.label(),
            availability: offer.availability_band(),
            price_display: format_base(offer.base_price_minor),
            offer,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/launch-windows", get(list_launch_windows))
}

async fn list_launch_windows(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<LaunchWindowView>>, AppError> {
    let limit = effective_limit(params.limit);
    let offers = state
        .launch_windows
        .list_offers(limit)
        .await
        .map_err(CoreError::from)?;

    Ok(Json(offers.into_iter().map(LaunchWindowView::from).collect()))
}
