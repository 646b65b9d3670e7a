//! The Bid Coordinator (C4) — the correctness heart of the service.
//!
//! `place_bid` is the one operation every other piece of this workspace
//! exists to support: it serializes concurrent offers against one auction
//! behind the C1 lock, validates and records the winner through C2 in a
//! single transaction, and fans the result out through C3, all inside the
//! same critical section.

use crate::deps::CoordinatorDeps;
use crate::lock_guard::LockGuard;
use crate::support::{acquire_or_transient, map_store_err};
use auction_domain::events::{Event, NewBidEvent, OutbidEvent};
use auction_domain::{money, Auction, AuctionId, AuctionStatus, Bid, Clock, CoreError, CoreResult, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// The result of an accepted bid.
#[derive(Debug, Clone)]
pub struct BidOutcome {
    pub bid: Bid,
    pub new_current_price: Decimal,
    pub previous_top_bidder: Option<UserId>,
}

/// Validate, admit, and record a bid against `auction_id`. Preconditions
/// (authenticated identity, `amount > 0`, well-formed auction id) are the
/// caller's responsibility; everything else happens here.
pub async fn place_bid(
    deps: &CoordinatorDeps,
    auction_id: AuctionId,
    bidder_id: UserId,
    amount: Decimal,
    source_address: Option<String>,
) -> CoreResult<BidOutcome> {
    let key = auction_id.to_string();
    let token = acquire_or_transient(deps, &key).await?;
    let guard = LockGuard::new(deps.lock.clone(), key, token);

    let result = place_bid_under_lock(deps, auction_id, bidder_id, amount, source_address).await;

    // The guard is held until events have been published, so the order a
    // room's subscribers observe `NewBid` events in matches acceptance
    // order.
    guard.release().await;
    result
}

async fn place_bid_under_lock(
    deps: &CoordinatorDeps,
    auction_id: AuctionId,
    bidder_id: UserId,
    amount: Decimal,
    source_address: Option<String>,
) -> CoreResult<BidOutcome> {
    let (auction, top) = deps
        .store
        .load_auction_with_top_bid(auction_id)
        .await
        .map_err(map_store_err)?
        .ok_or_else(|| CoreError::not_found("auction", auction_id))?;

    let now = deps.clock.now();
    validate(&auction, top.as_ref(), bidder_id, amount, now)?;

    let new_bid = Bid::new_winning(auction_id, bidder_id, amount, now, source_address);

    deps.store
        .insert_bid_and_update_auction(&new_bid, top.as_ref().map(|b| b.id), new_bid.amount, auction.updated_at)
        .await
        .map_err(map_store_err)?;

    publish_bid_events(deps, &auction, &new_bid, top.as_ref());

    Ok(BidOutcome {
        bid: new_bid.clone(),
        new_current_price: new_bid.amount,
        previous_top_bidder: top.map(|b| b.bidder_id),
    })
}

fn validate(
    auction: &Auction,
    top: Option<&Bid>,
    bidder_id: UserId,
    amount: Decimal,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if auction.status != AuctionStatus::Active {
        return Err(CoreError::NotActive);
    }
    if now >= auction.end_at {
        return Err(CoreError::Ended);
    }
    if bidder_id == auction.seller_id {
        return Err(CoreError::SelfBid);
    }
    let min_required = auction.min_required_bid(top.map(|b| b.amount));
    if !money::at_least(amount, min_required) {
        return Err(CoreError::Insufficient {
            offered: amount,
            min_required,
        });
    }
    Ok(())
}

fn publish_bid_events(deps: &CoordinatorDeps, auction: &Auction, new_bid: &Bid, top: Option<&Bid>) {
    let time_remaining_secs = (auction.end_at - new_bid.timestamp).num_seconds().max(0);
    deps.events.publish_room(
        auction.id,
        Event::NewBid(NewBidEvent {
            auction_id: auction.id,
            bid: new_bid.clone(),
            new_current_price: new_bid.amount,
            total_bids: auction.total_bids + 1,
            time_remaining_secs,
        }),
    );

    // Outbid carries the prior top bid's actual persisted amount, never a
    // value reconstructed from current_price - min_increment.
    if let Some(prior_top) = top {
        if prior_top.bidder_id != new_bid.bidder_id {
            deps.events.publish_user(
                prior_top.bidder_id,
                Event::Outbid(OutbidEvent {
                    auction_id: auction.id,
                    auction_title: auction.title.clone(),
                    your_bid: prior_top.amount,
                    new_highest_bid: new_bid.amount,
                    minimum_next_bid: money::next_minimum(new_bid.amount, auction.min_increment),
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_deps;
    use auction_domain::clock::FixedClock;
    use auction_domain::lifecycle;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn seeded_auction(deps: &CoordinatorDeps, seller_id: UserId) -> Auction {
        let now = deps.clock.now();
        let fields = lifecycle::NewAuction {
            seller_id,
            category_id: auction_domain::CategoryId::new(),
            title: "Vintage camera".into(),
            description: "Mint condition".into(),
            image_url: None,
            starting_price: dec!(100.00),
            reserve_price: None,
            min_increment: dec!(5.00),
            start_at: now,
            end_at: now + chrono::Duration::hours(1),
        };
        let auction = lifecycle::create(fields, now).unwrap();
        deps.store.create_auction(auction).await.unwrap()
    }

    #[tokio::test]
    async fn first_bid_must_meet_starting_price() {
        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;

        let err = place_bid(&deps, auction.id, UserId::new(), dec!(50.00), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Insufficient { .. }));
    }

    #[tokio::test]
    async fn accepted_bid_updates_price_and_notifies_room() {
        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;
        let mut room = deps.events.join_room(auction.id);

        let outcome = place_bid(&deps, auction.id, UserId::new(), dec!(100.00), None)
            .await
            .unwrap();
        assert_eq!(outcome.new_current_price, dec!(100.00));
        assert!(outcome.previous_top_bidder.is_none());

        let event = room.recv().await.unwrap();
        assert!(matches!(event, Event::NewBid(_)));
    }

    #[tokio::test]
    async fn second_bidder_outbids_the_first() {
        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;
        let first_bidder = UserId::new();

        place_bid(&deps, auction.id, first_bidder, dec!(100.00), None)
            .await
            .unwrap();

        let (_sub, mut inbox) = deps.events.register_user(first_bidder);
        place_bid(&deps, auction.id, UserId::new(), dec!(105.00), None)
            .await
            .unwrap();

        let event = inbox.recv().await.unwrap();
        match event {
            Event::Outbid(e) => {
                assert_eq!(e.your_bid, dec!(100.00));
                assert_eq!(e.new_highest_bid, dec!(105.00));
            }
            other => panic!("expected Outbid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn below_minimum_increment_is_rejected() {
        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;
        place_bid(&deps, auction.id, UserId::new(), dec!(100.00), None).await.unwrap();

        let err = place_bid(&deps, auction.id, UserId::new(), dec!(102.00), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Insufficient { .. }));
    }

    #[tokio::test]
    async fn seller_cannot_bid_on_own_auction() {
        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;

        let err = place_bid(&deps, auction.id, seller, dec!(100.00), None).await.unwrap_err();
        assert_eq!(err, CoreError::SelfBid);
    }

    #[tokio::test]
    async fn bid_after_end_at_is_rejected() {
        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;

        let fixed = Arc::new(FixedClock::new(auction.end_at + chrono::Duration::minutes(1)));
        let mut deps = deps;
        deps.clock = fixed;

        let err = place_bid(&deps, auction.id, UserId::new(), dec!(100.00), None)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Ended);
    }

    #[tokio::test]
    async fn concurrent_bids_leave_exactly_one_winner() {
        use std::sync::Arc as StdArc;

        let deps = test_deps();
        let seller = UserId::new();
        let auction = seeded_auction(&deps, seller).await;
        let deps = StdArc::new(deps);

        let mut handles = Vec::new();
        for i in 0..10u32 {
            let deps = deps.clone();
            let auction_id = auction.id;
            handles.push(tokio::spawn(async move {
                place_bid(&deps, auction_id, UserId::new(), dec!(100.00) + Decimal::from(i) * dec!(5.00), None).await
            }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert!(accepted >= 1);

        let (final_auction, top) = deps.store.load_auction_with_top_bid(auction.id).await.unwrap().unwrap();
        let top = top.unwrap();
        assert!(top.is_winning);
        assert_eq!(final_auction.current_price, top.amount);
    }
}

#[cfg(test)]
mod properties {
    use super::*;
    use crate::test_support::test_deps;
    use auction_domain::lifecycle::{self, NewAuction};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const STARTING_PRICE: Decimal = Decimal::from_parts(10000, 0, 0, false, 2);
    const MIN_INCREMENT: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

    async fn run_bid_sequence(deltas: Vec<i64>) -> Vec<Decimal> {
        let deps = test_deps();
        let now = deps.clock.now();
        let auction = lifecycle::create(
            NewAuction {
                seller_id: UserId::new(),
                category_id: auction_domain::CategoryId::new(),
                title: "Item".into(),
                description: "Description".into(),
                image_url: None,
                starting_price: STARTING_PRICE,
                reserve_price: None,
                min_increment: MIN_INCREMENT,
                start_at: now,
                end_at: now + chrono::Duration::hours(1),
            },
            now,
        )
        .unwrap();
        let auction = deps.store.create_auction(auction).await.unwrap();

        let mut accepted = Vec::new();
        for delta in deltas {
            let amount = STARTING_PRICE + Decimal::from(delta);
            if let Ok(outcome) = place_bid(&deps, auction.id, UserId::new(), amount, None).await {
                accepted.push(outcome.new_current_price);
            }
        }
        accepted
    }

    proptest! {
        // The concurrency property from the testable-properties section:
        // whatever subset of offered amounts gets accepted, consecutive
        // accepted bids differ by at least `min_increment`.
        #[test]
        fn accepted_bids_form_a_strictly_increasing_sequence(deltas in prop::collection::vec(1i64..200, 1..16)) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let accepted = runtime.block_on(run_bid_sequence(deltas));
            for window in accepted.windows(2) {
                prop_assert!(window[1] >= window[0] + MIN_INCREMENT);
            }
        }
    }
}
