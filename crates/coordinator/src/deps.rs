//! The capabilities the coordinator depends on, injected as trait objects.
//! `auction-api::main` is the composition root that builds one of these
//! from concrete implementations; tests build one from in-process fakes.

use auction_domain::Clock;
use auction_events::EventBus;
use auction_lock::LockService;
use auction_store::BidStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct CoordinatorDeps {
    pub lock: Arc<dyn LockService>,
    pub store: Arc<dyn BidStore>,
    pub events: Arc<dyn EventBus>,
    pub clock: Arc<dyn Clock>,
}
