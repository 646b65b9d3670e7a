//! HTTP + WebSocket edge (C7): the axum router and the types it is built
//! from. `main.rs` is the composition root; this crate root just exposes
//! the pieces a test (or an alternate binary) would need to build its own
//! router against a different `AppState`.

pub mod auth_extractor;
pub mod config;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Request-level timeout applied to every handler, independent of the
/// lock's own `wait_budget`.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", routes::auth::router())
        .nest("/api/auctions", routes::auctions::router())
        .nest("/api/categories", routes::categories::router())
        .route("/hubs/auction", get(routes::ws::upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
