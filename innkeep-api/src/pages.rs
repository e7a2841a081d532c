use axum::{
    extract::State,
    response::Html,
    routing::get,
    Extension, Router,
};

use crate::session::SessionId;
use crate::state::AppState;
use crate::views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/contact", get(contact))
        .route("/rooms/generals-quarters", get(generals_quarters))
        .route("/rooms/majors-suite", get(majors_suite))
}

async fn home(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::home_page(&flashes))
}

async fn about(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::about_page(&flashes))
}

async fn contact(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::contact_page(&flashes))
}

async fn generals_quarters(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::room_page(&flashes, "General's Quarters"))
}

async fn majors_suite(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::room_page(&flashes, "Major's Suite"))
}
