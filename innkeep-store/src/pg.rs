use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tracing::error;

use innkeep_core::models::{NewReservation, RestrictionKind, Room};
use innkeep_core::repository::{ReservationStore, StoreError};

/// Fixed deadline for every store query; elapsing yields `StoreError::Timeout`.
const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    error!("database error: {}", e);
    StoreError::Database(e.to_string())
}

async fn timed<T, F>(fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout),
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i64,
    room_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Room {
            id: row.id,
            room_name: row.room_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError> {
        timed(async {
            let rows: Vec<RoomRow> = sqlx::query_as(
                "SELECT id, room_name, created_at, updated_at FROM rooms ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

            Ok(rows.into_iter().map(Room::from).collect())
        })
        .await
    }

    async fn get_room_by_id(&self, id: i64) -> Result<Room, StoreError> {
        timed(async {
            let row: Option<RoomRow> = sqlx::query_as(
                "SELECT id, room_name, created_at, updated_at FROM rooms WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

            row.map(Room::from).ok_or(StoreError::RoomNotFound(id))
        })
        .await
    }

    async fn search_availability_by_room(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        room_id: i64,
    ) -> Result<bool, StoreError> {
        timed(async {
            let overlapping: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(id)
                FROM room_restrictions
                WHERE room_id = $1 AND $2 < end_date AND $3 > start_date
                "#,
            )
            .bind(room_id)
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

            Ok(overlapping == 0)
        })
        .await
    }

    async fn search_availability_for_all_rooms(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Room>, StoreError> {
        timed(async {
            let rows: Vec<RoomRow> = sqlx::query_as(
                r#"
                SELECT r.id, r.room_name, r.created_at, r.updated_at
                FROM rooms r
                WHERE r.id NOT IN (
                    SELECT rr.room_id
                    FROM room_restrictions rr
                    WHERE $1 < rr.end_date AND $2 > rr.start_date
                )
                ORDER BY r.id
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

            Ok(rows.into_iter().map(Room::from).collect())
        })
        .await
    }

    async fn create_booking(
        &self,
        reservation: NewReservation,
        kind: RestrictionKind,
    ) -> Result<i64, StoreError> {
        timed(async {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            // Lock the room row so concurrent commits for it serialize.
            let room: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(reservation.room_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
            if room.is_none() {
                return Err(StoreError::RoomNotFound(reservation.room_id));
            }

            // Re-check availability inside the transaction; a double-submit or
            // a search gone stale aborts here with nothing written.
            let overlapping: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(id)
                FROM room_restrictions
                WHERE room_id = $1 AND $2 < end_date AND $3 > start_date
                "#,
            )
            .bind(reservation.room_id)
            .bind(reservation.start_date)
            .bind(reservation.end_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
            if overlapping > 0 {
                return Err(StoreError::DatesTaken);
            }

            let now = Utc::now();
            let reservation_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO reservations
                    (first_name, last_name, email, phone, start_date, end_date, room_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                "#,
            )
            .bind(&reservation.first_name)
            .bind(&reservation.last_name)
            .bind(&reservation.email)
            .bind(&reservation.phone)
            .bind(reservation.start_date)
            .bind(reservation.end_date)
            .bind(reservation.room_id)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

            sqlx::query(
                r#"
                INSERT INTO room_restrictions
                    (start_date, end_date, room_id, reservation_id, restriction_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(reservation.start_date)
            .bind(reservation.end_date)
            .bind(reservation.room_id)
            .bind(reservation_id)
            .bind(kind.as_i32())
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            tx.commit().await.map_err(db_error)?;

            Ok(reservation_id)
        })
        .await
    }

    async fn insert_owner_block(
        &self,
        room_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError> {
        timed(async {
            let mut tx = self.pool.begin().await.map_err(db_error)?;

            let room: Option<i64> = sqlx::query_scalar("SELECT id FROM rooms WHERE id = $1 FOR UPDATE")
                .bind(room_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
            if room.is_none() {
                return Err(StoreError::RoomNotFound(room_id));
            }

            let overlapping: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(id)
                FROM room_restrictions
                WHERE room_id = $1 AND $2 < end_date AND $3 > start_date
                "#,
            )
            .bind(room_id)
            .bind(start)
            .bind(end)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
            if overlapping > 0 {
                return Err(StoreError::DatesTaken);
            }

            let now = Utc::now();
            let restriction_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO room_restrictions
                    (start_date, end_date, room_id, reservation_id, restriction_id, created_at, updated_at)
                VALUES ($1, $2, $3, NULL, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(start)
            .bind(end)
            .bind(room_id)
            .bind(RestrictionKind::OwnerBlock.as_i32())
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

            tx.commit().await.map_err(db_error)?;

            Ok(restriction_id)
        })
        .await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError> {
        let row: Option<(i64, String)> = timed(async {
            sqlx::query_as("SELECT id, password FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)
        })
        .await?;

        // Unknown email and wrong password collapse into the same error.
        let (id, hash) = row.ok_or(StoreError::InvalidCredentials)?;

        match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(id),
            Ok(false) => Err(StoreError::InvalidCredentials),
            Err(e) => {
                error!("bcrypt verification failed: {}", e);
                Err(StoreError::Database(e.to_string()))
            }
        }
    }
}
