//! Composition root: reads configuration, wires concrete implementations
//! of each component into one `CoordinatorDeps`, starts the background
//! sweeper, and serves the axum router.

use auction_api::config::AppConfig;
use auction_api::rate_limit::RateLimiter;
use auction_api::state::AppState;
use auction_auth::{AuthService, PgAuthRepository};
use auction_coordinator::{CoordinatorDeps, Sweeper};
use auction_domain::SystemClock;
use auction_events::EventHub;
use auction_lock::InProcessLock;
use auction_store::PgBidStore;
use std::net::SocketAddr;
use std::sync::Arc;

/// Per-client cap on `POST /api/auctions/{id}/bids`, grounded in the
/// teacher's `rate_limit_per_minute` default of 100.
const BID_RATE_LIMIT_PER_MINUTE: u32 = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    if let Err(message) = config.validate() {
        tracing::error!("invalid configuration: {message}");
        std::process::exit(1);
    }

    let clock = Arc::new(SystemClock::new());
    let store = Arc::new(PgBidStore::connect(&config.database_url).await?);
    let events = Arc::new(EventHub::new());

    let lock: Arc<dyn auction_lock::LockService> = build_lock(&config).await?;

    let deps = CoordinatorDeps {
        lock,
        store: store.clone(),
        events: events.clone(),
        clock: clock.clone(),
    };

    let auth_repo = Arc::new(PgAuthRepository::new(store.pool().clone()));
    let auth = Arc::new(AuthService::new(
        auth_repo,
        clock.clone(),
        config.auth_signing_key.clone(),
        config.auth_token_issuer.clone(),
        config.auth_token_audience.clone(),
    ));

    let sweeper = Sweeper::new(deps.clone());
    sweeper.start();

    let state = AppState {
        deps,
        auth,
        events,
        bid_rate_limiter: Arc::new(RateLimiter::new(BID_RATE_LIMIT_PER_MINUTE)),
    };

    let router = auction_api::build_router(state);
    let addr: SocketAddr = config.http_bind_addr.parse()?;

    tracing::info!(%addr, "starting bidup auction service");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

async fn build_lock(config: &AppConfig) -> anyhow::Result<Arc<dyn auction_lock::LockService>> {
    if config.lock_backend_enabled {
        let lock = auction_lock::RedisLock::connect(&config.lock_redis_url).await?;
        Ok(Arc::new(lock))
    } else {
        Ok(Arc::new(InProcessLock::new()))
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter);

    if cfg!(debug_assertions) {
        builder.init();
    } else {
        builder.json().init();
    }
}
