use axum::{
    http::Method,
    middleware::from_fn_with_state,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod budget;
pub mod error;
pub mod launch_windows;
pub mod middleware;
pub mod payments;
pub mod pricing;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Everything touching a budget needs a signed-in traveller.
    let protected = Router::new()
        .merge(budget::routes())
        .merge(bookings::routes())
        .route_layer(from_fn_with_state(state.clone(), middleware::customer_auth_middleware));

    Router::new()
        .merge(auth::routes())
        .merge(pricing::routes())
        .merge(launch_windows::routes())
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .with_state(state)
}
