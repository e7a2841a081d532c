use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use innkeep_core::draft::{ContactDetails, ReservationDraft};
use innkeep_core::forms::{ContactForm, FieldErrors};
use innkeep_core::models::{NewReservation, RestrictionKind};
use innkeep_core::repository::StoreError;

use crate::error::AppError;
use crate::notify::MailData;
use crate::session::SessionId;
use crate::state::AppState;
use crate::views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/make-reservation", get(reservation_form).post(post_reservation))
        .route("/choose-room/{id}", get(choose_room))
        .route("/book-room", get(book_room))
        .route("/reservation-summary", get(reservation_summary))
}

/// The draft is missing or at the wrong stage for this page: flash an error
/// and send the visitor somewhere safe instead of crashing.
async fn session_state_error(state: &AppState, sid: &str, message: &str) -> Response {
    warn!("session state error: {}", message);
    state.sessions.flash_error(sid, message).await;
    Redirect::to("/").into_response()
}

async fn reservation_form(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Response {
    let draft = match state.sessions.peek_draft(&sid).await {
        Some(draft @ ReservationDraft::RoomChosen { .. }) => draft,
        _ => return session_state_error(&state, &sid, "Can't get reservation from session").await,
    };

    let room_name = draft.room_name().unwrap_or_default().to_string();
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::reservation_form_page(
        &flashes,
        &room_name,
        draft.start_date(),
        draft.end_date(),
        &ContactForm::default(),
        &FieldErrors::new(),
    ))
    .into_response()
}

async fn post_reservation(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let draft = match state.sessions.peek_draft(&sid).await {
        Some(draft @ ReservationDraft::RoomChosen { .. }) => draft,
        _ => {
            return Ok(session_state_error(&state, &sid, "Can't get reservation from session").await)
        }
    };
    let room_name = draft.room_name().unwrap_or_default().to_string();
    let (start, end) = (draft.start_date(), draft.end_date());

    // Validation failures redisplay the form with the entered values; nothing
    // is persisted.
    let errors = form.validate();
    if !errors.is_empty() {
        let flashes = state.sessions.take_flashes(&sid).await;
        return Ok(Html(views::reservation_form_page(
            &flashes, &room_name, start, end, &form, &errors,
        ))
        .into_response());
    }

    let room_id = draft
        .room_id()
        .ok_or_else(|| AppError::Internal("room chosen draft without room id".into()))?;

    let reservation = NewReservation {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
        phone: form.phone.clone(),
        room_id,
        start_date: start,
        end_date: end,
    };

    let reservation_id = match state
        .store
        .create_booking(reservation, RestrictionKind::Reservation)
        .await
    {
        Ok(id) => id,
        Err(StoreError::DatesTaken) => {
            state
                .sessions
                .flash_error(&sid, "That room is no longer available for those dates")
                .await;
            return Ok(Redirect::to("/search-availability").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    info!(reservation_id, room_id, "reservation committed");

    // Best-effort notifications; a full queue never unwinds the booking.
    let guest_message = MailData {
        to: form.email.clone(),
        from: state.mail_from.clone(),
        subject: "Reservation Confirmation".into(),
        content: format!(
            "<strong>Reservation Confirmation</strong><br>\
             Dear {}, <br>\
             This is to confirm your reservation from {} to {}.",
            form.first_name,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        ),
        template: None,
    };
    state.mail.enqueue(guest_message).await;

    let owner_message = MailData {
        to: state.owner_address.clone(),
        from: state.mail_from.clone(),
        subject: "Reservation Notification".into(),
        content: format!(
            "<strong>Reservation Notification</strong><br>\
             A reservation has been made for {} from {} to {}.",
            room_name,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        ),
        template: Some("basic.html".into()),
    };
    state.mail.enqueue(owner_message).await;

    let contact = ContactDetails {
        first_name: form.first_name,
        last_name: form.last_name,
        email: form.email,
        phone: form.phone,
    };
    let persisted = draft
        .enter_details(contact)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.sessions.put_draft(&sid, persisted).await;

    Ok(Redirect::to("/reservation-summary").into_response())
}

async fn choose_room(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Path(room_id): Path<i64>,
) -> Result<Response, AppError> {
    let draft = match state.sessions.peek_draft(&sid).await {
        Some(draft @ (ReservationDraft::DatesChosen { .. } | ReservationDraft::RoomChosen { .. })) => {
            draft
        }
        _ => {
            return Ok(session_state_error(&state, &sid, "Can't get reservation from session").await)
        }
    };

    let room = match state.store.get_room_by_id(room_id).await {
        Ok(room) => room,
        Err(StoreError::RoomNotFound(_)) => {
            return Ok(session_state_error(&state, &sid, "Can't find that room").await)
        }
        Err(e) => return Err(e.into()),
    };

    let draft = draft
        .choose_room(room.id, room.room_name)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.sessions.put_draft(&sid, draft).await;

    Ok(Redirect::to("/make-reservation").into_response())
}

#[derive(Debug, Deserialize)]
struct BookRoomParams {
    id: i64,
    s: String,
    e: String,
}

/// Entry point from a room page: dates and room arrive as query parameters
/// and the draft is built in one step.
async fn book_room(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Query(params): Query<BookRoomParams>,
) -> Result<Response, AppError> {
    let parsed = (
        NaiveDate::parse_from_str(params.s.trim(), "%Y-%m-%d"),
        NaiveDate::parse_from_str(params.e.trim(), "%Y-%m-%d"),
    );
    let (start, end) = match parsed {
        (Ok(start), Ok(end)) => (start, end),
        _ => {
            state
                .sessions
                .flash_error(&sid, "Enter both dates as YYYY-MM-DD")
                .await;
            return Ok(Redirect::to("/search-availability").into_response());
        }
    };

    let room = match state.store.get_room_by_id(params.id).await {
        Ok(room) => room,
        Err(StoreError::RoomNotFound(_)) => {
            return Ok(session_state_error(&state, &sid, "Can't find that room").await)
        }
        Err(e) => return Err(e.into()),
    };

    let draft = match ReservationDraft::begin(start, end) {
        Ok(draft) => draft,
        Err(e) => {
            state.sessions.flash_error(&sid, &e.to_string()).await;
            return Ok(Redirect::to("/search-availability").into_response());
        }
    };
    let draft = draft
        .choose_room(room.id, room.room_name)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state.sessions.put_draft(&sid, draft).await;

    Ok(Redirect::to("/make-reservation").into_response())
}

async fn reservation_summary(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Response {
    // Taking the draft is the terminal step; revisiting this page finds no
    // draft and lands in the session-state error path.
    match state.sessions.take_draft(&sid).await {
        Some(ReservationDraft::DetailsEntered {
            start_date,
            end_date,
            room_name,
            contact,
            ..
        }) => {
            let flashes = state.sessions.take_flashes(&sid).await;
            Html(views::summary_page(
                &flashes,
                &room_name,
                start_date,
                end_date,
                &contact.first_name,
                &contact.last_name,
                &contact.email,
                &contact.phone,
            ))
            .into_response()
        }
        Some(other) => {
            // A draft at an earlier stage has no business on this page; put it
            // back and bounce.
            state.sessions.put_draft(&sid, other).await;
            session_state_error(&state, &sid, "Can't get reservation from session").await
        }
        None => session_state_error(&state, &sid, "Can't get reservation from session").await,
    }
}
