use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{NewReservation, RestrictionKind, Room};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("room {0} not found")]
    RoomNotFound(i64),

    /// The requested dates gained a conflicting restriction between the
    /// search and the commit. The booking was not persisted.
    #[error("the requested dates are no longer available")]
    DatesTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    /// The query did not complete within the store's fixed deadline. Callers
    /// must treat this as "unknown", never as "unavailable".
    #[error("store query timed out")]
    Timeout,

    #[error("database failure: {0}")]
    Database(String),
}

/// Persistence boundary for rooms, reservations and restrictions.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError>;

    async fn get_room_by_id(&self, id: i64) -> Result<Room, StoreError>;

    /// True iff no restriction for `room_id` overlaps `[start, end)`.
    async fn search_availability_by_room(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        room_id: i64,
    ) -> Result<bool, StoreError>;

    /// Rooms with no overlapping restriction in the range, ordered by id.
    /// An empty result is a valid "no vacancy" answer, not an error.
    async fn search_availability_for_all_rooms(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Room>, StoreError>;

    /// Atomically re-checks availability, inserts the reservation row and its
    /// restriction row, and returns the new reservation id. Either both rows
    /// become visible or neither does; a conflicting restriction aborts with
    /// `StoreError::DatesTaken`.
    async fn create_booking(
        &self,
        reservation: NewReservation,
        kind: RestrictionKind,
    ) -> Result<i64, StoreError>;

    /// Inserts an administrative hold: a restriction with no reservation
    /// behind it, under the same conflict rules as a booking.
    async fn insert_owner_block(
        &self,
        room_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError>;

    /// Verifies credentials and returns the user id. Unknown email and wrong
    /// password are indistinguishable to the caller.
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError>;
}
