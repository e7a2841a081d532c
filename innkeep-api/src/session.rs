//! Cookie-backed sessions: the middleware resolves (or mints) the session id
//! cookie; handlers go through the `Sessions` facade for the typed record.
//!
//! Concurrent requests in one session are last-write-wins. A double-submitted
//! booking form is therefore possible at this layer; the commit transaction in
//! the store is what guarantees only one of them persists.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, warn};
use uuid::Uuid;

use innkeep_core::draft::ReservationDraft;
use innkeep_core::session::{SessionError, SessionRecord, SessionStore};

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "innkeep_session";

/// The request's session id, injected by `session_middleware`.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// One-shot messages taken out of the session for rendering.
#[derive(Debug, Default, Clone)]
pub struct Flashes {
    pub flash: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct Sessions {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Loads the record, or a fresh one when the session is new. A corrupt or
    /// unreadable record is reported server-side and replaced; the visitor
    /// starts over rather than seeing an error they cannot act on.
    pub async fn record(&self, id: &str) -> SessionRecord {
        match self.store.load(id).await {
            Ok(Some(record)) => record,
            Ok(None) => SessionRecord::default(),
            Err(SessionError::Backend(e)) => {
                error!("session backend unavailable, serving fresh session: {}", e);
                SessionRecord::default()
            }
            Err(e) => {
                warn!("discarding undecodable session record for {}: {}", id, e);
                SessionRecord::default()
            }
        }
    }

    pub async fn save(&self, id: &str, record: &SessionRecord) {
        if let Err(e) = self.store.save(id, record, self.ttl).await {
            error!("failed to save session {}: {}", id, e);
        }
    }

    pub async fn delete(&self, id: &str) {
        if let Err(e) = self.store.delete(id).await {
            error!("failed to delete session {}: {}", id, e);
        }
    }

    pub async fn put_draft(&self, id: &str, draft: ReservationDraft) {
        let mut record = self.record(id).await;
        record.draft = Some(draft);
        self.save(id, &record).await;
    }

    pub async fn peek_draft(&self, id: &str) -> Option<ReservationDraft> {
        self.record(id).await.draft
    }

    /// Removes and returns the draft; the terminal transition of the draft
    /// lifecycle.
    pub async fn take_draft(&self, id: &str) -> Option<ReservationDraft> {
        let mut record = self.record(id).await;
        let draft = record.draft.take();
        if draft.is_some() {
            self.save(id, &record).await;
        }
        draft
    }

    pub async fn flash(&self, id: &str, message: &str) {
        let mut record = self.record(id).await;
        record.flash = Some(message.to_string());
        self.save(id, &record).await;
    }

    pub async fn flash_error(&self, id: &str, message: &str) {
        let mut record = self.record(id).await;
        record.error = Some(message.to_string());
        self.save(id, &record).await;
    }

    pub async fn flash_warning(&self, id: &str, message: &str) {
        let mut record = self.record(id).await;
        record.warning = Some(message.to_string());
        self.save(id, &record).await;
    }

    /// Takes the one-shot message slots for rendering, clearing them.
    pub async fn take_flashes(&self, id: &str) -> Flashes {
        let mut record = self.record(id).await;
        let flashes = Flashes {
            flash: record.flash.take(),
            error: record.error.take(),
            warning: record.warning.take(),
        };
        if flashes.flash.is_some() || flashes.error.is_some() || flashes.warning.is_some() {
            self.save(id, &record).await;
        }
        flashes
    }

    pub async fn user_id(&self, id: &str) -> Option<i64> {
        self.record(id).await.user_id
    }
}

pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn session_cookie(id: &str, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

/// Resolves the session cookie, minting an id (and Set-Cookie) for first-time
/// visitors, and exposes the id to handlers as a request extension.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> (CookieJar, Response) {
    let (session_id, is_new) = match jar.get(SESSION_COOKIE) {
        Some(cookie) => (cookie.value().to_string(), false),
        None => (new_session_id(), true),
    };

    req.extensions_mut().insert(SessionId(session_id.clone()));
    let response = next.run(req).await;

    // A handler that renewed the session id has already set the cookie; do
    // not overwrite it with the stale one.
    let handler_set_cookie = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|v| v.to_str().is_ok_and(|v| v.starts_with(SESSION_COOKIE)));

    let jar = if is_new && !handler_set_cookie {
        jar.add(session_cookie(&session_id, state.cookie_secure))
    } else {
        jar
    };

    (jar, response)
}
