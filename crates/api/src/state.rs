//! The composition root's shared state: one `Arc<AppState>` cloned into
//! every handler via axum's `State` extractor.

use crate::rate_limit::RateLimiter;
use auction_auth::AuthService;
use auction_coordinator::CoordinatorDeps;
use auction_events::EventBus;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub deps: CoordinatorDeps,
    pub auth: Arc<AuthService>,
    pub events: Arc<dyn EventBus>,
    pub bid_rate_limiter: Arc<RateLimiter>,
}
