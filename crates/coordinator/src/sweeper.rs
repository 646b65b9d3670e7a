//! Background time-driven expiry (the time-driven half of C5), grounded in
//! the teacher's pattern of spawning a `JoinHandle` background loop from an
//! `Arc<Self>`. Polls for auctions whose `end_at` has passed and runs them
//! through the same lock-guarded `expire_auction` transition a bid would
//! use, so a bid mid-flight and an expiry sweep can never interleave
//! unsafely.

use crate::deps::CoordinatorDeps;
use crate::lifecycle;
use auction_domain::Clock;
use std::sync::Arc;
use std::time::Duration;

/// How often the sweeper polls for ended auctions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

pub struct Sweeper {
    deps: CoordinatorDeps,
}

impl Sweeper {
    pub fn new(deps: CoordinatorDeps) -> Arc<Self> {
        Arc::new(Self { deps })
    }

    /// Spawn the sweep loop. The returned handle can be aborted on
    /// shutdown; dropping it without aborting leaves the loop running.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let sweeper = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                sweeper.sweep_once().await;
            }
        })
    }

    async fn sweep_once(&self) {
        let now = self.deps.clock.now();
        let ending = match self.deps.store.ending_before(now).await {
            Ok(auctions) => auctions,
            Err(err) => {
                tracing::warn!("sweeper failed to list ending auctions: {err}");
                return;
            }
        };
        for auction in ending {
            if let Err(err) = lifecycle::expire_auction(&self.deps, auction.id).await {
                tracing::warn!(auction_id = %auction.id, "sweeper failed to expire auction: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_deps;
    use auction_domain::clock::FixedClock;
    use auction_domain::lifecycle::NewAuction;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn sweep_expires_ended_auctions() {
        let mut deps = test_deps();
        let now = deps.clock.now();
        let fixed = std::sync::Arc::new(FixedClock::new(now));
        deps.clock = fixed.clone();

        let auction = lifecycle::create_auction(
            &deps,
            NewAuction {
                seller_id: auction_domain::UserId::new(),
                category_id: auction_domain::CategoryId::new(),
                title: "Vintage camera".into(),
                description: "Mint condition".into(),
                image_url: None,
                starting_price: dec!(100.00),
                reserve_price: None,
                min_increment: dec!(5.00),
                start_at: now,
                end_at: now + chrono::Duration::minutes(1),
            },
        )
        .await
        .unwrap();

        fixed.advance(chrono::Duration::minutes(2));
        let sweeper = Sweeper::new(deps.clone());
        sweeper.sweep_once().await;

        let (reloaded, _) = deps.store.load_auction_with_top_bid(auction.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, auction_domain::AuctionStatus::Expired);
    }
}
