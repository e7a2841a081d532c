use std::sync::Arc;

use innkeep_core::repository::ReservationStore;

use crate::notify::Dispatcher;
use crate::session::Sessions;

/// Everything the handlers need, built once in `main` and injected through
/// axum's state. There is no process-global repository handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReservationStore>,
    pub sessions: Sessions,
    pub mail: Dispatcher,
    pub mail_from: String,
    pub owner_address: String,
    pub cookie_secure: bool,
}
