//! # Trip Repository
//!
//! Append-only history of finished trips.
//!
//! ## Trip History Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Trip History Flow                                 │
//! │                                                                         │
//! │  1. FINISH                                                             │
//! │     └── FareMeter::stop() → StopOutcome::Finished(FinishedTrip)        │
//! │                                                                         │
//! │  2. RECORD                                                             │
//! │     └── NewTrip::from_finished(&trip, name)                            │
//! │     └── record_trip() → TripRecord (fare rounded to cents)             │
//! │                                                                         │
//! │  3. LIST                                                               │
//! │     └── list_trips() / recent_trips(n) → newest first                  │
//! │                                                                         │
//! │  Idle stops and abandoned trips never reach this repository.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use taxi_core::money::{round_to, FARE_DECIMALS};
use taxi_core::validation::validate_customer_name;
use taxi_core::{Fare, FinishedTrip, LevelId, TripRecord, TRIP_DATE_FORMAT};

// =============================================================================
// Input and Row Types
// =============================================================================

/// A finished trip about to be written to the history.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub id: Uuid,
    pub customer_name: String,
    pub fare: Fare,
    pub level: LevelId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl NewTrip {
    /// Builds the history entry for a trip the meter just finalized.
    pub fn from_finished(trip: &FinishedTrip, customer_name: impl Into<String>) -> Self {
        NewTrip {
            id: trip.trip_id,
            customer_name: customer_name.into(),
            fare: trip.fare,
            level: trip.level,
            started_at: trip.started_at,
            finished_at: trip.finished_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TripRow {
    id: String,
    customer_name: String,
    fare: f64,
    level: i64,
    finished_at: DateTime<Utc>,
}

impl From<TripRow> for TripRecord {
    fn from(row: TripRow) -> Self {
        TripRecord {
            id: row.id,
            date: row.finished_at.format(TRIP_DATE_FORMAT).to_string(),
            name: row.customer_name,
            fare: row.fare,
            level: u32::try_from(row.level).unwrap_or(LevelId::DEFAULT.get()),
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for trip-history operations.
#[derive(Debug, Clone)]
pub struct TripRepository {
    pool: SqlitePool,
}

impl TripRepository {
    /// Creates a new TripRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TripRepository { pool }
    }

    /// Appends a finished trip to the history.
    ///
    /// The fare is stored rounded to cents; the returned record is exactly
    /// what `list_trips` will later yield for it.
    pub async fn record_trip(&self, trip: &NewTrip) -> DbResult<TripRecord> {
        let name = validate_customer_name(&trip.customer_name)?;
        let fare = round_to(trip.fare.amount(), FARE_DECIMALS);
        let id = trip.id.to_string();

        debug!(id = %id, name = %name, fare, level = %trip.level, "Recording trip");

        sqlx::query(
            r#"
            INSERT INTO trips (id, customer_name, fare, level, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(&name)
        .bind(fare)
        .bind(i64::from(trip.level.get()))
        .bind(trip.started_at)
        .bind(trip.finished_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &id),
            other => other,
        })?;

        Ok(TripRecord {
            id,
            date: trip.finished_at.format(TRIP_DATE_FORMAT).to_string(),
            name,
            fare,
            level: trip.level.get(),
        })
    }

    /// Lists every recorded trip, newest first.
    pub async fn list_trips(&self) -> DbResult<Vec<TripRecord>> {
        let rows: Vec<TripRow> = sqlx::query_as(
            r#"
            SELECT id, customer_name, fare, level, finished_at
            FROM trips
            ORDER BY seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TripRecord::from).collect())
    }

    /// Lists at most `limit` trips, newest first.
    pub async fn recent_trips(&self, limit: u32) -> DbResult<Vec<TripRecord>> {
        let rows: Vec<TripRow> = sqlx::query_as(
            r#"
            SELECT id, customer_name, fare, level, finished_at
            FROM trips
            ORDER BY seq DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TripRecord::from).collect())
    }

    /// Number of recorded trips.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trips")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
