//! The Bid Coordinator (C4) and the Auction Lifecycle state machine (C5).
//!
//! This crate is the orchestration layer: it owns no state of its own,
//! coordinating `auction-lock`, `auction-store`, and `auction-events`
//! behind the algorithms `auction-domain` describes in pure form.

mod coordinator;
mod deps;
mod lifecycle;
mod lock_guard;
mod support;
mod sweeper;

pub use coordinator::{place_bid, BidOutcome};
pub use deps::CoordinatorDeps;
pub use lifecycle::{activate_auction, cancel_auction, create_auction, expire_auction, NewAuction};
pub use sweeper::Sweeper;

#[cfg(test)]
mod test_support {
    use crate::deps::CoordinatorDeps;
    use auction_domain::SystemClock;
    use auction_events::EventHub;
    use auction_lock::InProcessLock;
    use auction_store::InMemoryBidStore;
    use std::sync::Arc;

    /// A fresh set of in-process fakes: real in-memory implementations of
    /// each trait, not network-backed, so the coordinator's tests never
    /// need a database, Redis, or a socket.
    pub fn test_deps() -> CoordinatorDeps {
        CoordinatorDeps {
            lock: Arc::new(InProcessLock::new()),
            store: Arc::new(InMemoryBidStore::new()),
            events: Arc::new(EventHub::new()),
            clock: Arc::new(SystemClock::new()),
        }
    }
}
