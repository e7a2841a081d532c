pub mod draft;
pub mod forms;
pub mod models;
pub mod repository;
pub mod session;

pub use draft::{DraftError, ReservationDraft};
pub use models::{NewReservation, Reservation, RestrictionKind, Room, RoomRestriction, User};
pub use repository::{ReservationStore, StoreError};
pub use session::{SessionError, SessionRecord, SessionStore};
