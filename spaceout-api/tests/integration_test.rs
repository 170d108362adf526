use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use spaceout_api::payments::{ReceiptClaims, ReceiptVerifier};
use spaceout_api::state::{AppState, AuthConfig, Services};
use spaceout_api::app;
use spaceout_catalog::PricingConfig;
use spaceout_core::launch::{BodyRef, LaunchWindowOffer, StationRef, WindowStatus};
use spaceout_core::payment::PaymentStatus;
use spaceout_core::LaunchWindowRepository;
use spaceout_ledger::{
    InMemoryBudgetRepository, InMemoryLaunchWindowRepository, LedgerSettings, RetryPolicy, MAX_AMOUNT_MINOR,
};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const JWT_SECRET: &str = "test-jwt-secret";
const RECEIPT_SECRET: &str = "test-receipt-secret";

struct Harness {
    app: Router,
    budgets: Arc<InMemoryBudgetRepository>,
    offers: Vec<LaunchWindowOffer>,
}

fn offer(days_out: i64, price_minor: i64, status: WindowStatus, availability: i32) -> LaunchWindowOffer {
    let departure = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap() + Duration::days(days_out);
    LaunchWindowOffer {
        id: Uuid::new_v4(),
        origin_body: BodyRef { name: "Earth".into(), code: "EAR".into() },
        destination_body: BodyRef { name: "Mars".into(), code: "MAR".into() },
        origin_station: StationRef { name: "Sriharikota".into(), code: "SHR".into(), station_type: "ground".into() },
        destination_station: StationRef { name: "Olympus Port".into(), code: "OLY".into(), station_type: "orbital".into() },
        departure_at: departure,
        arrival_at: departure + Duration::days(180),
        distance: 120.0,
        duration_days: 180,
        status,
        availability_percentage: availability,
        base_price_minor: price_minor,
    }
}

fn harness_with(initial_minor: i64, launch_windows: Arc<dyn LaunchWindowRepository>, offers: Vec<LaunchWindowOffer>) -> Harness {
    let budgets = Arc::new(InMemoryBudgetRepository::new());
    let services = Services {
        pricing: PricingConfig::default(),
        ledger: LedgerSettings {
            initial_allocation_minor: initial_minor,
            currency: "INR".into(),
            retry: RetryPolicy { max_retries: 1, backoff_base_ms: 1, backoff_max_ms: 1 },
        },
        budgets: budgets.clone(),
        launch_windows,
        verifier: Arc::new(ReceiptVerifier::new(RECEIPT_SECRET)),
    };
    let auth = AuthConfig { secret: JWT_SECRET.into(), expiration: 3600 };
    let state = AppState::new(services, auth, None).unwrap();
    Harness { app: app(state), budgets, offers }
}

fn harness() -> Harness {
    let offers = vec![
        offer(40, 900_000, WindowStatus::Available, 20),
        offer(10, 250_000, WindowStatus::Optimal, 85),
        offer(30, 700_000, WindowStatus::Suboptimal, 55),
        offer(20, 500_000, WindowStatus::Optimal, 90),
        offer(50, 1_100_000, WindowStatus::Available, 5),
    ];
    let repo = Arc::new(InMemoryLaunchWindowRepository::new(offers.clone()));
    harness_with(1_000_000_000, repo, offers)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn guest_token(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn receipt(reference: &str, amount_minor: i64, status: PaymentStatus) -> String {
    let claims = ReceiptClaims {
        sub: reference.into(),
        amount_minor,
        currency: "INR".into(),
        status,
        exp: (Utc::now().timestamp() + 600) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(RECEIPT_SECRET.as_bytes())).unwrap()
}

fn payment(reference: &str, amount_minor: i64, status: PaymentStatus) -> Value {
    json!({
        "reference": reference,
        "amount_minor": amount_minor,
        "currency": "INR",
        "receipt": receipt(reference, amount_minor, status),
    })
}

#[tokio::test]
async fn test_quote_mars_comfort() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/v1/pricing/quote",
        None,
        Some(json!({ "destination": "mars", "travel_class": "comfort", "hibernation_days": 90, "cargo_kg": 50 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breakdown"]["base_travel_minor"], 40_500_000_000i64);
    assert_eq!(body["breakdown"]["tax_minor"], 7_350_390_000i64);
    assert_eq!(body["breakdown"]["total_minor"], 48_200_890_000i64);
    assert_eq!(body["total_ntc"], "4820089.00 NTC");
    assert_eq!(body["total_base"], "₹48,20,08,900");
    assert_eq!(body["duration_days"], 180);
}

#[tokio::test]
async fn test_quote_rejects_out_of_range_parameters() {
    let h = harness();
    for payload in [
        json!({ "destination": "mars", "travel_class": "comfort", "hibernation_days": 181, "cargo_kg": 0 }),
        json!({ "destination": "mars", "travel_class": "comfort", "hibernation_days": 0, "cargo_kg": 201 }),
        json!({ "destination": "mars", "travel_class": "comfort", "hibernation_days": 0, "cargo_kg": -5 }),
        json!({ "destination": "pluto", "travel_class": "comfort" }),
        json!({ "destination": "moon", "travel_class": "steerage" }),
    ] {
        let (status, body) = send(&h.app, Method::POST, "/v1/pricing/quote", None, Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_launch_windows_default_to_three_earliest() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/v1/launch-windows", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["base_price_minor"], 250_000);
    assert_eq!(rows[0]["status_label"], "Optimal");
    assert_eq!(rows[0]["availability"], "high");
    assert_eq!(rows[0]["origin_station"]["type"], "ground");
    assert_eq!(rows[2]["status_label"], "Sub-optimal");
    assert_eq!(rows[2]["availability"], "medium");

    let (_, one) = send(&h.app, Method::GET, "/v1/launch-windows?limit=1", None, None).await;
    assert_eq!(one.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_launch_windows_store_outage_is_503() {
    let h = harness_with(100, Arc::new(InMemoryLaunchWindowRepository::unavailable()), Vec::new());
    let (status, body) = send(&h.app, Method::GET, "/v1/launch-windows", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_budget_requires_a_valid_token() {
    let h = harness();
    let (status, _) = send(&h.app, Method::GET, "/v1/budget", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&h.app, Method::GET, "/v1/budget", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.budgets.record_count(), 0);
}

#[tokio::test]
async fn test_budget_lifecycle() {
    let h = harness();
    let token = guest_token(&h.app).await;

    let (status, first) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["created"], true);
    assert_eq!(first["balance_minor"], 1_000_000_000i64);
    assert_eq!(first["balance_base"], "₹1,00,00,000");

    let (_, second) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(second["created"], false);

    let (status, set) = send(&h.app, Method::PUT, "/v1/budget", Some(&token), Some(json!({ "amount_minor": 100 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(set["balance_minor"], 100);

    let (status, deducted) =
        send(&h.app, Method::POST, "/v1/budget/deduct", Some(&token), Some(json!({ "amount_minor": 80 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deducted["budget"]["balance_minor"], 20);

    let (status, refused) =
        send(&h.app, Method::POST, "/v1/budget/deduct", Some(&token), Some(json!({ "amount_minor": 30 }))).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(refused["available_minor"], 20);
    assert_eq!(refused["requested_minor"], 30);

    let (_, after) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(after["balance_minor"], 20);

    let (status, entries) = send(&h.app, Method::GET, "/v1/budget/entries", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = entries.as_array().unwrap().iter().map(|e| e["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["DEDUCTION", "ADJUSTMENT", "INITIAL_ALLOCATION"]);
}

#[tokio::test]
async fn test_negative_amounts_are_rejected() {
    let h = harness();
    let token = guest_token(&h.app).await;

    let (status, _) = send(&h.app, Method::PUT, "/v1/budget", Some(&token), Some(json!({ "amount_minor": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&h.app, Method::POST, "/v1/budget/deduct", Some(&token), Some(json!({ "amount_minor": -10 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_budget_is_rejected_and_account_stays_readable() {
    let h = harness();
    let token = guest_token(&h.app).await;

    let (status, _) =
        send(&h.app, Method::PUT, "/v1/budget", Some(&token), Some(json!({ "amount_minor": i64::MAX }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, budget) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(budget["balance_minor"], 1_000_000_000i64);

    let (status, ceiling) = send(
        &h.app,
        Method::PUT,
        "/v1/budget",
        Some(&token),
        Some(json!({ "amount_minor": MAX_AMOUNT_MINOR })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ceiling["balance_ntc"], "100000000000000.00 NTC");

    let (status, _) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_resubmitted_deduction_applies_once() {
    let h = harness();
    let token = guest_token(&h.app).await;
    let request = json!({ "amount_minor": 1_000, "request_id": Uuid::new_v4() });

    let (_, first) = send(&h.app, Method::POST, "/v1/budget/deduct", Some(&token), Some(request.clone())).await;
    let (_, second) = send(&h.app, Method::POST, "/v1/budget/deduct", Some(&token), Some(request)).await;

    assert_eq!(first["replayed"], false);
    assert_eq!(second["replayed"], true);
    assert_eq!(second["budget"]["balance_minor"], 1_000_000_000i64 - 1_000);
}

#[tokio::test]
async fn test_store_outage_surfaces_as_retryable() {
    let h = harness();
    let token = guest_token(&h.app).await;
    send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;

    h.budgets.inject_failures(5);
    let (status, body) =
        send(&h.app, Method::POST, "/v1/budget/deduct", Some(&token), Some(json!({ "amount_minor": 10 }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retryable"], true);

    h.budgets.inject_failures(0);
    let (_, after) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(after["balance_minor"], 1_000_000_000i64);
}

#[tokio::test]
async fn test_launch_window_booking_with_verified_payment() {
    let h = harness();
    let token = guest_token(&h.app).await;
    let window = &h.offers[1];

    let booking = json!({
        "item": { "type": "launch_window", "launch_window_id": window.id },
        "payment": payment("pay_window", window.base_price_minor, PaymentStatus::Succeeded),
    });

    let (status, receipt) = send(&h.app, Method::POST, "/v1/bookings", Some(&token), Some(booking.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["launch_window_id"], window.id.to_string());
    assert_eq!(receipt["balance_after_minor"], 1_000_000_000i64 - window.base_price_minor);

    let (status, again) = send(&h.app, Method::POST, "/v1/bookings", Some(&token), Some(booking)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["replayed"], true);
    assert_eq!(again["booking_id"], receipt["booking_id"]);
    assert_eq!(again["balance_after_minor"], receipt["balance_after_minor"]);
}

#[tokio::test]
async fn test_trip_booking_charges_quoted_total() {
    let offers = Vec::new();
    let h = harness_with(100_000_000_000, Arc::new(InMemoryLaunchWindowRepository::new(offers.clone())), offers);
    let token = guest_token(&h.app).await;

    let booking = json!({
        "item": { "type": "trip", "destination": "mars", "travel_class": "comfort", "hibernation_days": 90, "cargo_kg": 50 },
        "payment": payment("pay_trip", 48_200_890_000, PaymentStatus::Succeeded),
    });

    let (status, receipt) = send(&h.app, Method::POST, "/v1/bookings", Some(&token), Some(booking)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["total_minor"], 48_200_890_000i64);
    assert_eq!(receipt["balance_after_minor"], 100_000_000_000i64 - 48_200_890_000);
}

#[tokio::test]
async fn test_unverified_payments_do_not_book() {
    let h = harness();
    let token = guest_token(&h.app).await;
    let window = &h.offers[0];

    let pending = json!({
        "item": { "type": "launch_window", "launch_window_id": window.id },
        "payment": payment("pay_pending", window.base_price_minor, PaymentStatus::Processing),
    });
    let (status, _) = send(&h.app, Method::POST, "/v1/bookings", Some(&token), Some(pending)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let mut forged = payment("pay_forged", window.base_price_minor, PaymentStatus::Succeeded);
    forged["receipt"] = json!("eyJhbGciOiJIUzI1NiJ9.e30.invalid");
    let forged = json!({ "item": { "type": "launch_window", "launch_window_id": window.id }, "payment": forged });
    let (status, _) = send(&h.app, Method::POST, "/v1/bookings", Some(&token), Some(forged)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let unknown = json!({
        "item": { "type": "launch_window", "launch_window_id": Uuid::new_v4() },
        "payment": payment("pay_unknown", 1, PaymentStatus::Succeeded),
    });
    let (status, _) = send(&h.app, Method::POST, "/v1/bookings", Some(&token), Some(unknown)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, budget) = send(&h.app, Method::GET, "/v1/budget", Some(&token), None).await;
    assert_eq!(budget["balance_minor"], 1_000_000_000i64);
}
