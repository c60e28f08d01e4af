//! PostgreSQL store backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, ReservationId, SpotId, TimeWindow, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    config::StoreConfig,
    error::{Result, StoreError},
    reservation::{NewReservation, Reservation, ReservationStatus},
    spot::{Spot, SpotDirectory},
    store::ReservationStore,
};

/// Name of the exclusion constraint that rejects a second Confirmed row
/// whose window overlaps an existing Confirmed row on the same spot.
const CONFIRMED_OVERLAP_CONSTRAINT: &str = "reservations_no_confirmed_overlap";

const RESERVATION_COLUMNS: &str =
    "id, spot_id, renter_id, start_time, end_time, total_price_cents, status, created_at";

/// PostgreSQL-backed reservation store and spot directory.
///
/// `create` wraps the confirmed-overlap check and the insert in one
/// transaction holding the spot row `FOR SHARE`; `update_status` is a
/// row-locked compare-and-swap that takes the spot row `FOR UPDATE` when
/// confirming. The shared/exclusive pair orders creates against
/// confirmations on the same spot, and the
/// `reservations_no_confirmed_overlap` exclusion constraint remains the
/// authoritative guard against two Confirmed rows sharing a window. A
/// lost race therefore surfaces as [`StoreError::ConfirmedOverlap`],
/// never as silent double-booking.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool from the given configuration.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Inserts or replaces a spot record.
    pub async fn insert_spot(&self, spot: Spot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO spots (id, host_id, hourly_rate_cents, daily_rate_cents, is_available)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                host_id = EXCLUDED.host_id,
                hourly_rate_cents = EXCLUDED.hourly_rate_cents,
                daily_rate_cents = EXCLUDED.daily_rate_cents,
                is_available = EXCLUDED.is_available
            "#,
        )
        .bind(spot.id.as_uuid())
        .bind(spot.host_id.as_uuid())
        .bind(spot.hourly_rate.cents())
        .bind(spot.daily_rate.cents())
        .bind(spot.is_available)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flips a spot's availability flag. Returns false if the spot does
    /// not exist.
    pub async fn set_spot_available(&self, id: SpotId, available: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE spots SET is_available = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(available)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_reservation(row: PgRow) -> Result<Reservation> {
        let status_str: String = row.try_get("status")?;
        let status = ReservationStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Decode(format!("unknown status: {status_str}")))?;

        Ok(Reservation {
            id: ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            spot_id: SpotId::from_uuid(row.try_get::<Uuid, _>("spot_id")?),
            renter_id: UserId::from_uuid(row.try_get::<Uuid, _>("renter_id")?),
            window: TimeWindow::new(
                row.try_get::<DateTime<Utc>, _>("start_time")?,
                row.try_get::<DateTime<Utc>, _>("end_time")?,
            ),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl SpotDirectory for PostgresStore {
    async fn get_spot(&self, id: SpotId) -> Result<Option<Spot>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, host_id, hourly_rate_cents, daily_rate_cents, is_available
            FROM spots
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Spot {
                id: SpotId::from_uuid(row.try_get::<Uuid, _>("id")?),
                host_id: UserId::from_uuid(row.try_get::<Uuid, _>("host_id")?),
                hourly_rate: Money::from_cents(row.try_get("hourly_rate_cents")?),
                daily_rate: Money::from_cents(row.try_get("daily_rate_cents")?),
                is_available: row.try_get("is_available")?,
            })),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ReservationStore for PostgresStore {
    async fn create(&self, new: NewReservation) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        // The exclusion constraint only covers Confirmed rows, so it
        // cannot catch a Pending insert that raced a confirmation. A
        // shared lock on the spot row orders this check-and-insert
        // against confirmations, which take the same lock exclusively;
        // concurrent creates still run in parallel.
        sqlx::query("SELECT id FROM spots WHERE id = $1 FOR SHARE")
            .bind(new.spot_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let conflict: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM reservations
            WHERE spot_id = $1
              AND status = 'confirmed'
              AND start_time < $3
              AND $2 < end_time
            LIMIT 1
            "#,
        )
        .bind(new.spot_id.as_uuid())
        .bind(new.window.start)
        .bind(new.window.end)
        .fetch_optional(&mut *tx)
        .await?;

        if conflict.is_some() {
            return Err(StoreError::ConfirmedOverlap {
                spot_id: new.spot_id,
            });
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO reservations
                (id, spot_id, renter_id, start_time, end_time, total_price_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', now())
            RETURNING {RESERVATION_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(new.spot_id.as_uuid())
        .bind(new.renter_id.as_uuid())
        .bind(new.window.start)
        .bind(new.window.end)
        .bind(new.total_price.cents())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::row_to_reservation(row)
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1",
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reservation).transpose()
    }

    async fn update_status(
        &self,
        id: ReservationId,
        expected: &[ReservationStatus],
        target: ReservationStatus,
    ) -> Result<Reservation> {
        let expected_names: Vec<&str> = expected.iter().map(|s| s.as_str()).collect();

        let mut tx = self.pool.begin().await?;

        // Lock the row so a racing update waits, then loses the status
        // check instead of clobbering the winner.
        let current: Option<PgRow> = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE",
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(row) => Self::row_to_reservation(row)?,
            None => return Err(StoreError::NotFound(id)),
        };

        if !expected.contains(&current.status) {
            return Err(StoreError::UnexpectedStatus {
                id,
                actual: current.status,
            });
        }

        let spot_id = current.spot_id;

        // Confirming takes the spot row exclusively so an in-flight
        // create on the same spot sees this confirmation (or finishes
        // first); the exclusion constraint stays the backstop against a
        // second Confirmed holder.
        if target == ReservationStatus::Confirmed {
            sqlx::query("SELECT id FROM spots WHERE id = $1 FOR UPDATE")
                .bind(spot_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE reservations SET status = $2
            WHERE id = $1 AND status = ANY($3)
            RETURNING {RESERVATION_COLUMNS}
            "#,
        ))
        .bind(id.as_uuid())
        .bind(target.as_str())
        .bind(&expected_names)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            // The exclusion constraint fires when this update would make a
            // second Confirmed row overlap an existing one.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(CONFIRMED_OVERLAP_CONSTRAINT)
            {
                return StoreError::ConfirmedOverlap { spot_id };
            }
            StoreError::Database(e)
        })?;

        tx.commit().await?;
        Self::row_to_reservation(row)
    }

    async fn find_confirmed_overlapping(
        &self,
        spot_id: SpotId,
        window: TimeWindow,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE spot_id = $1
              AND status = 'confirmed'
              AND start_time < $3
              AND $2 < end_time
              AND ($4::uuid IS NULL OR id <> $4)
            ORDER BY start_time ASC, created_at ASC
            "#,
        ))
        .bind(spot_id.as_uuid())
        .bind(window.start)
        .bind(window.end)
        .bind(exclude.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn list_by_renter(&self, renter_id: UserId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE renter_id = $1
            ORDER BY start_time ASC, created_at ASC
            "#,
        ))
        .bind(renter_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn list_by_host(&self, host_id: UserId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.spot_id, r.renter_id, r.start_time, r.end_time,
                   r.total_price_cents, r.status, r.created_at
            FROM reservations r
            JOIN spots s ON s.id = r.spot_id
            WHERE s.host_id = $1
            ORDER BY r.start_time ASC, r.created_at ASC
            "#,
        )
        .bind(host_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn exists_for_spot_and_renter(
        &self,
        spot_id: SpotId,
        renter_id: UserId,
        status: ReservationStatus,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE spot_id = $1 AND renter_id = $2 AND status = $3
            )
            "#,
        )
        .bind(spot_id.as_uuid())
        .bind(renter_id.as_uuid())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn confirmed_ending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE status = 'confirmed' AND end_time <= $1
            ORDER BY end_time ASC, created_at ASC
            "#,
        ))
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }
}
