//! Auction Lifecycle orchestration (C5): wraps the pure transition
//! functions in `auction_domain::lifecycle` with locking, persistence, and
//! event publication. Every transition except `create` goes through the
//! same per-auction lock a bid would use.

use crate::deps::CoordinatorDeps;
use crate::lock_guard::LockGuard;
use crate::support::{acquire_or_transient, map_store_err};
use auction_domain::events::{AuctionStatusChangedEvent, Event};
use auction_domain::{lifecycle, Auction, AuctionId, Clock, CoreError, CoreResult, UserId};

pub use auction_domain::lifecycle::NewAuction;

/// Create a new auction. No lock is needed: nothing else can reference an
/// id that doesn't exist yet.
pub async fn create_auction(deps: &CoordinatorDeps, fields: NewAuction) -> CoreResult<Auction> {
    let now = deps.clock.now();
    let auction = lifecycle::create(fields, now)?;
    deps.store.create_auction(auction).await.map_err(map_store_err)
}

/// Pending -> Active. Only the seller may activate.
pub async fn activate_auction(deps: &CoordinatorDeps, auction_id: AuctionId, caller_id: UserId) -> CoreResult<Auction> {
    run_under_lock(deps, auction_id, |auction| {
        if auction.seller_id != caller_id {
            return Err(CoreError::Auth("only the seller may activate this auction".into()));
        }
        Ok(())
    }, |auction, now| lifecycle::activate(auction, now), |auction| AuctionStatusChangedEvent {
        auction_id: auction.id,
        status: auction.status,
        message: "auction is now active".to_string(),
        winner_bid: None,
    })
    .await
}

/// Seller-initiated cancellation, legal only while zero bids exist.
pub async fn cancel_auction(deps: &CoordinatorDeps, auction_id: AuctionId, caller_id: UserId) -> CoreResult<Auction> {
    run_under_lock(deps, auction_id, |auction| {
        if auction.seller_id != caller_id {
            return Err(CoreError::Auth("only the seller may cancel this auction".into()));
        }
        Ok(())
    }, |auction, now| lifecycle::cancel(auction, now), |auction| AuctionStatusChangedEvent {
        auction_id: auction.id,
        status: auction.status,
        message: "auction was cancelled by the seller".to_string(),
        winner_bid: None,
    })
    .await
}

/// Time-driven expiry, invoked by the sweeper. No caller-identity check:
/// this transition fires once `now >= end_at`, regardless of who asks.
pub async fn expire_auction(deps: &CoordinatorDeps, auction_id: AuctionId) -> CoreResult<Auction> {
    let key = auction_id.to_string();
    let token = acquire_or_transient(deps, &key).await?;
    let guard = LockGuard::new(deps.lock.clone(), key, token);

    let result = async {
        let (auction, top) = deps
            .store
            .load_auction_with_top_bid(auction_id)
            .await
            .map_err(map_store_err)?
            .ok_or_else(|| CoreError::not_found("auction", auction_id))?;

        let expected_updated_at = auction.updated_at;
        let now = deps.clock.now();
        let winner_bid_id = top.as_ref().map(|b| b.id);
        let ended = lifecycle::expire(auction, winner_bid_id, now)?;

        deps.store
            .save_auction(ended.clone(), expected_updated_at)
            .await
            .map_err(map_store_err)?;

        let message = if ended.winner_bid_id.is_some() {
            "auction completed"
        } else {
            "auction expired with no bids"
        };
        deps.events.publish_room(
            ended.id,
            Event::AuctionEnded(AuctionStatusChangedEvent {
                auction_id: ended.id,
                status: ended.status,
                message: message.to_string(),
                winner_bid: top,
            }),
        );
        Ok(ended)
    }
    .await;

    guard.release().await;
    result
}

/// Shared shape for the two seller-initiated transitions: acquire the
/// lock, load the auction, run a caller-supplied precheck, apply the pure
/// transition, persist, and publish `AuctionStatusChanged`.
async fn run_under_lock(
    deps: &CoordinatorDeps,
    auction_id: AuctionId,
    precheck: impl FnOnce(&Auction) -> CoreResult<()>,
    transition: impl FnOnce(Auction, chrono::DateTime<chrono::Utc>) -> CoreResult<Auction>,
    event: impl FnOnce(&Auction) -> AuctionStatusChangedEvent,
) -> CoreResult<Auction> {
    let key = auction_id.to_string();
    let token = acquire_or_transient(deps, &key).await?;
    let guard = LockGuard::new(deps.lock.clone(), key, token);

    let result = async {
        let (auction, _) = deps
            .store
            .load_auction_with_top_bid(auction_id)
            .await
            .map_err(map_store_err)?
            .ok_or_else(|| CoreError::not_found("auction", auction_id))?;

        precheck(&auction)?;
        let expected_updated_at = auction.updated_at;
        let now = deps.clock.now();
        let transitioned = transition(auction, now)?;

        deps.store
            .save_auction(transitioned.clone(), expected_updated_at)
            .await
            .map_err(map_store_err)?;

        deps.events.publish_room(transitioned.id, Event::AuctionStatusChanged(event(&transitioned)));
        Ok(transitioned)
    }
    .await;

    guard.release().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_deps;
    use rust_decimal_macros::dec;

    fn fields(now: chrono::DateTime<chrono::Utc>, start_in_future: bool) -> NewAuction {
        NewAuction {
            seller_id: UserId::new(),
            category_id: auction_domain::CategoryId::new(),
            title: "Vintage camera".into(),
            description: "Mint condition".into(),
            image_url: None,
            starting_price: dec!(100.00),
            reserve_price: None,
            min_increment: dec!(5.00),
            start_at: if start_in_future { now + chrono::Duration::minutes(10) } else { now },
            end_at: now + chrono::Duration::hours(1) + if start_in_future { chrono::Duration::minutes(10) } else { chrono::Duration::zero() },
        }
    }

    #[tokio::test]
    async fn activate_requires_seller() {
        let deps = test_deps();
        let now = deps.clock.now();
        let mut f = fields(now, true);
        let seller = f.seller_id;
        f.seller_id = seller;
        let auction = create_auction(&deps, f).await.unwrap();
        assert_eq!(auction.status, auction_domain::AuctionStatus::Pending);

        let err = activate_auction(&deps, auction.id, UserId::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(_)));

        let activated = activate_auction(&deps, auction.id, seller).await.unwrap();
        assert_eq!(activated.status, auction_domain::AuctionStatus::Active);
    }

    #[tokio::test]
    async fn cancel_refused_once_a_bid_exists() {
        let deps = test_deps();
        let now = deps.clock.now();
        let f = fields(now, false);
        let seller = f.seller_id;
        let auction = create_auction(&deps, f).await.unwrap();

        crate::coordinator::place_bid(&deps, auction.id, UserId::new(), dec!(100.00), None)
            .await
            .unwrap();

        let err = cancel_auction(&deps, auction.id, seller).await.unwrap_err();
        assert!(matches!(err, CoreError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn expire_with_no_bids_is_expired() {
        let deps = test_deps();
        let now = deps.clock.now();
        let f = fields(now, false);
        let auction = create_auction(&deps, f).await.unwrap();

        let fixed = std::sync::Arc::new(auction_domain::clock::FixedClock::new(
            auction.end_at + chrono::Duration::minutes(1),
        ));
        let mut deps = deps;
        deps.clock = fixed;

        let ended = expire_auction(&deps, auction.id).await.unwrap();
        assert_eq!(ended.status, auction_domain::AuctionStatus::Expired);
    }

    #[tokio::test]
    async fn expire_with_bids_completes_with_winner() {
        let deps = test_deps();
        let now = deps.clock.now();
        let f = fields(now, false);
        let auction = create_auction(&deps, f).await.unwrap();

        let outcome = crate::coordinator::place_bid(&deps, auction.id, UserId::new(), dec!(100.00), None)
            .await
            .unwrap();

        let fixed = std::sync::Arc::new(auction_domain::clock::FixedClock::new(
            auction.end_at + chrono::Duration::minutes(1),
        ));
        let mut deps = deps;
        deps.clock = fixed;

        let ended = expire_auction(&deps, auction.id).await.unwrap();
        assert_eq!(ended.status, auction_domain::AuctionStatus::Completed);
        assert_eq!(ended.winner_bid_id, Some(outcome.bid.id));
    }
}
