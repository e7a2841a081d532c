//! In-memory twins of the Postgres store and the Redis session store.
//!
//! Used by the test suites and by single-node development setups; they
//! implement the same traits with the same conflict and atomicity semantics.
//! The store guards all state behind one lock, so a commit is atomic by
//! construction; `fail_next_restriction_for_room` injects a failure between
//! the two writes of a commit to exercise rollback behaviour.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use innkeep_core::models::{NewReservation, Reservation, RestrictionKind, Room, RoomRestriction};
use innkeep_core::repository::{ReservationStore, StoreError};
use innkeep_core::session::{SessionError, SessionRecord, SessionStore};

struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
}

#[derive(Default)]
struct Inner {
    rooms: Vec<Room>,
    reservations: Vec<Reservation>,
    restrictions: Vec<RoomRestriction>,
    users: Vec<UserRow>,
    next_reservation_id: i64,
    next_restriction_id: i64,
    restriction_failpoint: Option<i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn overlaps(restriction: &RoomRestriction, start: NaiveDate, end: NaiveDate) -> bool {
    restriction.start_date < end && restriction.end_date > start
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_room(&self, id: i64, room_name: &str) {
        let now = Utc::now();
        self.inner.lock().await.rooms.push(Room {
            id,
            room_name: room_name.to_string(),
            created_at: now,
            updated_at: now,
        });
    }

    /// Hashes with a low cost factor; these credentials only ever live in
    /// tests and development setups.
    pub async fn seed_user(&self, id: i64, email: &str, password: &str) {
        let password_hash = bcrypt::hash(password, 4).expect("bcrypt hash");
        self.inner.lock().await.users.push(UserRow {
            id,
            email: email.to_string(),
            password_hash,
        });
    }

    pub async fn seed_restriction(
        &self,
        room_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        kind: RestrictionKind,
    ) {
        let mut inner = self.inner.lock().await;
        inner.next_restriction_id += 1;
        let id = inner.next_restriction_id;
        inner.restrictions.push(RoomRestriction {
            id,
            room_id,
            reservation_id: None,
            kind,
            start_date: start,
            end_date: end,
        });
    }

    /// Makes the next commit for `room_id` fail between its two writes.
    pub async fn fail_next_restriction_for_room(&self, room_id: i64) {
        self.inner.lock().await.restriction_failpoint = Some(room_id);
    }

    pub async fn reservations(&self) -> Vec<Reservation> {
        self.inner.lock().await.reservations.clone()
    }

    pub async fn restrictions(&self) -> Vec<RoomRestriction> {
        self.inner.lock().await.restrictions.clone()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn all_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms = self.inner.lock().await.rooms.clone();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn get_room_by_id(&self, id: i64) -> Result<Room, StoreError> {
        self.inner
            .lock()
            .await
            .rooms
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::RoomNotFound(id))
    }

    async fn search_availability_by_room(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        room_id: i64,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(!inner
            .restrictions
            .iter()
            .any(|r| r.room_id == room_id && overlaps(r, start, end)))
    }

    async fn search_availability_for_all_rooms(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Room>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rooms: Vec<Room> = inner
            .rooms
            .iter()
            .filter(|room| {
                !inner
                    .restrictions
                    .iter()
                    .any(|r| r.room_id == room.id && overlaps(r, start, end))
            })
            .cloned()
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn create_booking(
        &self,
        reservation: NewReservation,
        kind: RestrictionKind,
    ) -> Result<i64, StoreError> {
        // One lock across the whole commit: check and both writes are atomic.
        let mut inner = self.inner.lock().await;

        if !inner.rooms.iter().any(|r| r.id == reservation.room_id) {
            return Err(StoreError::RoomNotFound(reservation.room_id));
        }

        let conflict = inner.restrictions.iter().any(|r| {
            r.room_id == reservation.room_id
                && overlaps(r, reservation.start_date, reservation.end_date)
        });
        if conflict {
            return Err(StoreError::DatesTaken);
        }

        let now = Utc::now();
        inner.next_reservation_id += 1;
        let reservation_id = inner.next_reservation_id;
        inner.reservations.push(Reservation {
            id: reservation_id,
            first_name: reservation.first_name.clone(),
            last_name: reservation.last_name.clone(),
            email: reservation.email.clone(),
            phone: reservation.phone.clone(),
            room_id: reservation.room_id,
            start_date: reservation.start_date,
            end_date: reservation.end_date,
            created_at: now,
            updated_at: now,
        });

        if inner.restriction_failpoint == Some(reservation.room_id) {
            // Simulated failure between the two writes: roll the first back.
            inner.restriction_failpoint = None;
            inner.reservations.pop();
            return Err(StoreError::Database("injected restriction failure".into()));
        }

        inner.next_restriction_id += 1;
        let restriction_id = inner.next_restriction_id;
        inner.restrictions.push(RoomRestriction {
            id: restriction_id,
            room_id: reservation.room_id,
            reservation_id: Some(reservation_id),
            kind,
            start_date: reservation.start_date,
            end_date: reservation.end_date,
        });

        Ok(reservation_id)
    }

    async fn insert_owner_block(
        &self,
        room_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;

        if !inner.rooms.iter().any(|r| r.id == room_id) {
            return Err(StoreError::RoomNotFound(room_id));
        }
        if inner
            .restrictions
            .iter()
            .any(|r| r.room_id == room_id && overlaps(r, start, end))
        {
            return Err(StoreError::DatesTaken);
        }

        inner.next_restriction_id += 1;
        let id = inner.next_restriction_id;
        inner.restrictions.push(RoomRestriction {
            id,
            room_id,
            reservation_id: None,
            kind: RestrictionKind::OwnerBlock,
            start_date: start,
            end_date: end,
        });
        Ok(id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;
        let user = inner
            .users
            .iter()
            .find(|u| u.email == email)
            .ok_or(StoreError::InvalidCredentials)?;

        match bcrypt::verify(password, &user.password_hash) {
            Ok(true) => Ok(user.id),
            Ok(false) => Err(StoreError::InvalidCredentials),
            Err(e) => Err(StoreError::Database(e.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<String, (SessionRecord, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut inner = self.inner.lock().await;
        match inner.get(id) {
            Some((record, expires)) if *expires > Instant::now() => Ok(Some(record.clone())),
            Some(_) => {
                inner.remove(id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), SessionError> {
        self.inner
            .lock()
            .await
            .insert(id.to_string(), (record.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.inner.lock().await.remove(id);
        Ok(())
    }
}
