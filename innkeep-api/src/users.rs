use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use innkeep_core::forms::{FieldErrors, LoginForm};
use innkeep_core::repository::StoreError;

use crate::error::AppError;
use crate::session::{new_session_id, session_cookie, SessionId};
use crate::state::AppState;
use crate::views;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/login", get(login_form).post(post_login))
        .route("/user/logout", get(logout))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/dashboard", get(dashboard))
}

async fn login_form(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(&sid).await;
    Html(views::login_page(
        &flashes,
        &LoginForm::default(),
        &FieldErrors::new(),
    ))
}

async fn post_login(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let errors = form.validate();
    if !errors.is_empty() {
        let flashes = state.sessions.take_flashes(&sid).await;
        return Ok(Html(views::login_page(&flashes, &form, &errors)).into_response());
    }

    let user_id = match state.store.authenticate(&form.email, &form.password).await {
        Ok(id) => id,
        Err(StoreError::InvalidCredentials) => {
            // Identical answer for unknown email and wrong password.
            state
                .sessions
                .flash_error(&sid, "Invalid login credentials")
                .await;
            return Ok(Redirect::to("/user/login").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    // Renew the session id on privilege change; the record moves to the new
    // id and the old one is gone.
    let new_sid = new_session_id();
    let mut record = state.sessions.record(&sid).await;
    record.user_id = Some(user_id);
    record.flash = Some("Logged in successfully".into());
    state.sessions.save(&new_sid, &record).await;
    state.sessions.delete(&sid).await;

    info!(user_id, "user logged in");

    let jar = jar.add(session_cookie(&new_sid, state.cookie_secure));
    Ok((jar, Redirect::to("/")).into_response())
}

async fn logout(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
    jar: CookieJar,
) -> Response {
    state.sessions.delete(&sid).await;

    let new_sid = new_session_id();
    let jar = jar.add(session_cookie(&new_sid, state.cookie_secure));
    (jar, Redirect::to("/user/login")).into_response()
}

async fn dashboard(
    State(state): State<AppState>,
    Extension(SessionId(sid)): Extension<SessionId>,
) -> Result<Html<String>, AppError> {
    let rooms = state.store.all_rooms().await?;
    let flashes = state.sessions.take_flashes(&sid).await;
    Ok(Html(views::dashboard_page(&flashes, &rooms)))
}
