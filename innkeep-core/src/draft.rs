//! The in-progress reservation a visitor builds up across several pages.
//!
//! The draft lives in the session record and only moves forward:
//! `DatesChosen` -> `RoomChosen` -> `DetailsEntered`. "Persisted" is the
//! removal of the draft from the session once the summary page has rendered;
//! going back in the browser re-enters the machine at `DatesChosen` via a new
//! search.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("check-in date must fall before check-out date")]
    InvalidDateRange,
    #[error("a room can only be chosen after dates are selected")]
    RoomBeforeDates,
    #[error("contact details require a chosen room")]
    DetailsBeforeRoom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ReservationDraft {
    DatesChosen {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    RoomChosen {
        start_date: NaiveDate,
        end_date: NaiveDate,
        room_id: i64,
        room_name: String,
    },
    DetailsEntered {
        start_date: NaiveDate,
        end_date: NaiveDate,
        room_id: i64,
        room_name: String,
        contact: ContactDetails,
    },
}

impl ReservationDraft {
    /// Starts a fresh draft from a date-range search, discarding whatever
    /// draft the session held before.
    pub fn begin(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, DraftError> {
        if start_date >= end_date {
            return Err(DraftError::InvalidDateRange);
        }
        Ok(ReservationDraft::DatesChosen { start_date, end_date })
    }

    /// Attaches a room. Re-choosing from `RoomChosen` is allowed; choosing a
    /// room after details were entered is not a transition this machine has.
    pub fn choose_room(self, room_id: i64, room_name: String) -> Result<Self, DraftError> {
        match self {
            ReservationDraft::DatesChosen { start_date, end_date }
            | ReservationDraft::RoomChosen { start_date, end_date, .. } => {
                Ok(ReservationDraft::RoomChosen { start_date, end_date, room_id, room_name })
            }
            ReservationDraft::DetailsEntered { .. } => Err(DraftError::RoomBeforeDates),
        }
    }

    /// Records the validated contact fields. Only valid once a room is chosen.
    pub fn enter_details(self, contact: ContactDetails) -> Result<Self, DraftError> {
        match self {
            ReservationDraft::RoomChosen { start_date, end_date, room_id, room_name } => {
                Ok(ReservationDraft::DetailsEntered { start_date, end_date, room_id, room_name, contact })
            }
            _ => Err(DraftError::DetailsBeforeRoom),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        match self {
            ReservationDraft::DatesChosen { start_date, .. }
            | ReservationDraft::RoomChosen { start_date, .. }
            | ReservationDraft::DetailsEntered { start_date, .. } => *start_date,
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        match self {
            ReservationDraft::DatesChosen { end_date, .. }
            | ReservationDraft::RoomChosen { end_date, .. }
            | ReservationDraft::DetailsEntered { end_date, .. } => *end_date,
        }
    }

    pub fn room_id(&self) -> Option<i64> {
        match self {
            ReservationDraft::DatesChosen { .. } => None,
            ReservationDraft::RoomChosen { room_id, .. }
            | ReservationDraft::DetailsEntered { room_id, .. } => Some(*room_id),
        }
    }

    pub fn room_name(&self) -> Option<&str> {
        match self {
            ReservationDraft::DatesChosen { .. } => None,
            ReservationDraft::RoomChosen { room_name, .. }
            | ReservationDraft::DetailsEntered { room_name, .. } => Some(room_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn begin_rejects_inverted_and_empty_ranges() {
        assert_eq!(
            ReservationDraft::begin(d("2024-06-03"), d("2024-06-01")),
            Err(DraftError::InvalidDateRange)
        );
        assert_eq!(
            ReservationDraft::begin(d("2024-06-01"), d("2024-06-01")),
            Err(DraftError::InvalidDateRange)
        );
    }

    #[test]
    fn happy_path_walks_forward() {
        let draft = ReservationDraft::begin(d("2024-06-01"), d("2024-06-03")).unwrap();
        let draft = draft.choose_room(1, "General's Quarters".into()).unwrap();
        assert_eq!(draft.room_id(), Some(1));

        let contact = ContactDetails {
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            email: "alice@example.com".into(),
            phone: "555-0100".into(),
        };
        let draft = draft.enter_details(contact).unwrap();
        assert!(matches!(draft, ReservationDraft::DetailsEntered { .. }));
        assert_eq!(draft.start_date(), d("2024-06-01"));
        assert_eq!(draft.end_date(), d("2024-06-03"));
    }

    #[test]
    fn details_require_a_chosen_room() {
        let draft = ReservationDraft::begin(d("2024-06-01"), d("2024-06-03")).unwrap();
        let contact = ContactDetails {
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            email: "alice@example.com".into(),
            phone: String::new(),
        };
        assert_eq!(draft.enter_details(contact), Err(DraftError::DetailsBeforeRoom));
    }

    #[test]
    fn room_can_be_rechosen_before_details() {
        let draft = ReservationDraft::begin(d("2024-06-01"), d("2024-06-03")).unwrap();
        let draft = draft.choose_room(1, "General's Quarters".into()).unwrap();
        let draft = draft.choose_room(2, "Major's Suite".into()).unwrap();
        assert_eq!(draft.room_id(), Some(2));
        assert_eq!(draft.room_name(), Some("Major's Suite"));
    }
}
