use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub mod availability;
pub mod booking;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod pages;
pub mod session;
pub mod state;
pub mod users;
pub mod views;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let admin = users::admin_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::require_auth,
    ));

    Router::new()
        .merge(pages::routes())
        .merge(availability::routes())
        .merge(booking::routes())
        .merge(users::routes())
        .merge(admin)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        // Nothing may crash a request worker; a panic becomes a 500.
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
