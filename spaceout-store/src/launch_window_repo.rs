use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use spaceout_core::launch::{BodyRef, LaunchWindowOffer, StationRef, WindowStatus};
use spaceout_core::{LaunchWindowRepository, StoreError};
use uuid::Uuid;
use crate::database::map_sqlx_error;

pub struct PostgresLaunchWindowRepository {
    pool: PgPool,
}

impl PostgresLaunchWindowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    departure_date: DateTime<Utc>,
    arrival_date: DateTime<Utc>,
    distance: f64,
    duration_days: i32,
    status: String,
    availability_percentage: i32,
    base_price_minor: i64,
    origin_body_name: String,
    origin_body_code: String,
    destination_body_name: String,
    destination_body_code: String,
    origin_station_name: String,
    origin_station_code: String,
    origin_station_type: String,
    destination_station_name: String,
    destination_station_code: String,
    destination_station_type: String,
}

impl From<OfferRow> for LaunchWindowOffer {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            origin_body: BodyRef { name: row.origin_body_name, code: row.origin_body_code },
            destination_body: BodyRef { name: row.destination_body_name, code: row.destination_body_code },
            origin_station: StationRef {
                name: row.origin_station_name,
                code: row.origin_station_code,
                station_type: row.origin_station_type,
            },
            destination_station: StationRef {
                name: row.destination_station_name,
                code: row.destination_station_code,
                station_type: row.destination_station_type,
            },
            departure_at: row.departure_date,
            arrival_at: row.arrival_date,
            distance: row.distance,
            duration_days: row.duration_days,
            status: WindowStatus::parse_lenient(&row.status),
            availability_percentage: row.availability_percentage,
            base_price_minor: row.base_price_minor,
        }
    }
}

const OFFER_QUERY: &str = r#"
    SELECT lw.id, lw.departure_date, lw.arrival_date, lw.distance, lw.duration_days,
           lw.status, lw.availability_percentage, lw.base_price_minor,
           op.name AS origin_body_name, op.code AS origin_body_code,
           dp.name AS destination_body_name, dp.code AS destination_body_code,
           os.name AS origin_station_name, os.code AS origin_station_code,
           os.type AS origin_station_type,
           ds.name AS destination_station_name, ds.code AS destination_station_code,
           ds.type AS destination_station_type
    FROM launch_windows lw
    JOIN planets op ON op.id = lw.origin_planet_id
    JOIN planets dp ON dp.id = lw.destination_planet_id
    JOIN stations os ON os.id = lw.origin_station_id
    JOIN stations ds ON ds.id = lw.destination_station_id
"#;

#[async_trait]
impl LaunchWindowRepository for PostgresLaunchWindowRepository {
    async fn list_offers(&self, limit: u32) -> Result<Vec<LaunchWindowOffer>, StoreError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "{} ORDER BY lw.departure_date ASC LIMIT $1",
            OFFER_QUERY
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LaunchWindowOffer::from).collect())
    }

    async fn find_offer(&self, id: Uuid) -> Result<Option<LaunchWindowOffer>, StoreError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!("{} WHERE lw.id = $1", OFFER_QUERY))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(LaunchWindowOffer::from))
    }
}
