use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;

use innkeep_core::draft::ReservationDraft;

use crate::error::AppError;
use crate::session::SessionId;
use crate::state::AppState;
use crate::views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/search-availability", get(search_form).post(post_search))
        .route("/search-availability-json", post(search_json))
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

async fn search_form(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::search_page(&flashes))
}

async fn post_search(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    Form(form): Form<SearchForm>,
) -> Result<Response, AppError> {
    let (start, end) = match (parse_date(&form.start), parse_date(&form.end)) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            state
                .sessions
                .flash_error(&sid, "Enter both dates as YYYY-MM-DD")
                .await;
            return Ok(Redirect::to("/search-availability").into_response());
        }
    };

    // Entering DatesChosen discards whatever draft the session held.
    let draft = match ReservationDraft::begin(start, end) {
        Ok(draft) => draft,
        Err(e) => {
            state.sessions.flash_error(&sid, &e.to_string()).await;
            return Ok(Redirect::to("/search-availability").into_response());
        }
    };

    let rooms = state.store.search_availability_for_all_rooms(start, end).await?;
    if rooms.is_empty() {
        state.sessions.flash_error(&sid, "No availability").await;
        return Ok(Redirect::to("/search-availability").into_response());
    }

    state.sessions.put_draft(&sid, draft).await;

    let flashes = state.sessions.take_flashes(&sid).await;
    Ok(Html(views::choose_room_page(&flashes, &rooms)).into_response())
}

#[derive(Debug, Deserialize)]
struct SearchJsonForm {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
    #[serde(default)]
    room_id: String,
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    ok: bool,
    message: String,
    room_id: String,
    start_date: String,
    end_date: String,
}

impl AvailabilityResponse {
    fn reject(form: &SearchJsonForm, message: &str) -> Json<Self> {
        Json(Self {
            ok: false,
            message: message.to_string(),
            room_id: form.room_id.clone(),
            start_date: form.start.clone(),
            end_date: form.end.clone(),
        })
    }
}

async fn search_json(
    State(state): State<AppState>,
    Form(form): Form<SearchJsonForm>,
) -> Json<AvailabilityResponse> {
    let (start, end) = match (parse_date(&form.start), parse_date(&form.end)) {
        (Some(start), Some(end)) => (start, end),
        _ => return AvailabilityResponse::reject(&form, "Enter both dates as YYYY-MM-DD"),
    };
    if start >= end {
        return AvailabilityResponse::reject(&form, "Starting date must fall before ending date");
    }
    let room_id: i64 = match form.room_id.parse() {
        Ok(id) => id,
        Err(_) => return AvailabilityResponse::reject(&form, "Invalid room id"),
    };

    match state.store.search_availability_by_room(start, end, room_id).await {
        Ok(available) => Json(AvailabilityResponse {
            ok: available,
            message: String::new(),
            room_id: form.room_id,
            start_date: form.start,
            end_date: form.end,
        }),
        // A failed or timed-out query is "unknown", not "unavailable": ok is
        // false but the message tells the caller no answer was reached.
        Err(e) => {
            error!("availability query failed: {}", e);
            AvailabilityResponse::reject(&form, "Error querying availability")
        }
    }
}
