use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::session::SessionId;
use crate::state::AppState;

/// Guard for the admin area: no logged-in user means a flash and a redirect
/// to the login page.
pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(SessionId(sid)) = req.extensions().get::<SessionId>().cloned() else {
        return Redirect::to("/user/login").into_response();
    };

    if state.sessions.user_id(&sid).await.is_none() {
        state.sessions.flash_error(&sid, "Login first!").await;
        return Redirect::to("/user/login").into_response();
    }

    next.run(req).await
}
