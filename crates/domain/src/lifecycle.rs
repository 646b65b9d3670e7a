//! Pure transition functions for the auction state machine. No I/O: the
//! coordinator crate is responsible for locking, persistence, and
//! publishing; this module only decides whether a transition is legal and
//! what the resulting `Auction` looks like.
//!
//! ```text
//!                activate
//!    Pending ─────────────▶ Active ──┬────▶ Completed   (end reached, >=1 bid)
//!       │                            ├────▶ Expired     (end reached, 0 bids)
//!       │                            └────▶ Cancelled   (seller, 0 bids only)
//!       └──▶ Cancelled                                  (seller, while Pending)
//! ```

use crate::auction::{Auction, AuctionStatus, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, MAX_URL_LEN, START_TIME_SKEW_TOLERANCE};
use crate::error::{CoreError, CoreResult};
use crate::ids::{AuctionId, CategoryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Fields required to create a new auction.
pub struct NewAuction {
    pub seller_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub starting_price: Decimal,
    pub reserve_price: Option<Decimal>,
    pub min_increment: Decimal,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Validate a creation request and materialize the initial `Auction`.
/// Status is derived from `start_at` relative to `now`, never passed in.
pub fn create(fields: NewAuction, now: DateTime<Utc>) -> CoreResult<Auction> {
    if fields.title.is_empty() || fields.title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "title must be 1-{MAX_TITLE_LEN} characters"
        )));
    }
    if fields.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if let Some(url) = &fields.image_url {
        if url.chars().count() > MAX_URL_LEN {
            return Err(CoreError::Validation(format!(
                "image_url must be at most {MAX_URL_LEN} characters"
            )));
        }
    }
    if fields.starting_price <= Decimal::ZERO {
        return Err(CoreError::Validation("starting_price must be positive".into()));
    }
    if fields.min_increment <= Decimal::ZERO {
        return Err(CoreError::Validation("min_increment must be positive".into()));
    }
    if let Some(reserve) = fields.reserve_price {
        if reserve < fields.starting_price {
            return Err(CoreError::Validation(
                "reserve_price may not be below starting_price".into(),
            ));
        }
    }
    if fields.end_at <= fields.start_at {
        return Err(CoreError::Validation("end_at must be after start_at".into()));
    }
    if fields.start_at < now - START_TIME_SKEW_TOLERANCE {
        return Err(CoreError::Validation(
            "start_at may not be in the past beyond the clock-skew tolerance".into(),
        ));
    }

    let status = if fields.start_at > now {
        AuctionStatus::Pending
    } else {
        AuctionStatus::Active
    };

    Ok(Auction {
        id: AuctionId::new(),
        seller_id: fields.seller_id,
        category_id: fields.category_id,
        title: fields.title,
        description: fields.description,
        image_url: fields.image_url,
        starting_price: fields.starting_price,
        current_price: fields.starting_price,
        reserve_price: fields.reserve_price,
        min_increment: fields.min_increment,
        start_at: fields.start_at,
        end_at: fields.end_at,
        status,
        winner_bid_id: None,
        total_bids: 0,
        created_at: now,
        updated_at: now,
    })
}

/// Pending -> Active. The caller has already confirmed `caller_id == seller_id`.
pub fn activate(mut auction: Auction, now: DateTime<Utc>) -> CoreResult<Auction> {
    if auction.status != AuctionStatus::Pending {
        return Err(CoreError::BusinessRule(
            "only a pending auction may be activated".into(),
        ));
    }
    if auction.end_at <= now {
        return Err(CoreError::BusinessRule(
            "cannot activate an auction whose end time has already passed".into(),
        ));
    }
    auction.start_at = now;
    auction.status = AuctionStatus::Active;
    auction.updated_at = now;
    Ok(auction)
}

/// Seller-initiated cancellation. Legal only while zero bids exist.
pub fn cancel(mut auction: Auction, now: DateTime<Utc>) -> CoreResult<Auction> {
    if auction.status.is_terminal() {
        return Err(CoreError::BusinessRule("auction is already closed".into()));
    }
    if auction.has_bids() {
        return Err(CoreError::BusinessRule(
            "cannot cancel an auction with bids".into(),
        ));
    }
    auction.status = AuctionStatus::Cancelled;
    auction.updated_at = now;
    Ok(auction)
}

/// Time-driven expiry of an `Active` auction whose `end_at` has passed.
/// Returns the auction transitioned to `Completed` (carrying
/// `winner_bid_id`) when bids exist, or `Expired` otherwise.
pub fn expire(mut auction: Auction, winner_bid_id: Option<crate::ids::BidId>, now: DateTime<Utc>) -> CoreResult<Auction> {
    if auction.status != AuctionStatus::Active {
        return Err(CoreError::BusinessRule(
            "only an active auction can expire".into(),
        ));
    }
    if !auction.has_ended(now) {
        return Err(CoreError::BusinessRule("auction has not reached end_at yet".into()));
    }

    if auction.has_bids() {
        auction.status = AuctionStatus::Completed;
        auction.winner_bid_id = winner_bid_id;
    } else {
        auction.status = AuctionStatus::Expired;
    }
    auction.updated_at = now;
    Ok(auction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fields(now: DateTime<Utc>) -> NewAuction {
        NewAuction {
            seller_id: UserId::new(),
            category_id: CategoryId::new(),
            title: "Vintage camera".into(),
            description: "Mint condition".into(),
            image_url: None,
            starting_price: dec!(100.00),
            reserve_price: None,
            min_increment: dec!(5.00),
            start_at: now,
            end_at: now + chrono::Duration::hours(1),
        }
    }

    #[test]
    fn create_active_when_start_at_now() {
        let now = Utc::now();
        let auction = create(fields(now), now).unwrap();
        assert_eq!(auction.status, AuctionStatus::Active);
        assert_eq!(auction.current_price, dec!(100.00));
    }

    #[test]
    fn create_pending_when_start_in_future() {
        let now = Utc::now();
        let mut f = fields(now);
        f.start_at = now + chrono::Duration::minutes(10);
        f.end_at = f.start_at + chrono::Duration::hours(1);
        let auction = create(f, now).unwrap();
        assert_eq!(auction.status, AuctionStatus::Pending);
    }

    #[test]
    fn create_rejects_end_before_start() {
        let now = Utc::now();
        let mut f = fields(now);
        f.end_at = f.start_at - chrono::Duration::minutes(1);
        assert!(create(f, now).is_err());
    }

    #[test]
    fn cancel_refused_once_bids_exist() {
        let now = Utc::now();
        let mut auction = create(fields(now), now).unwrap();
        auction.total_bids = 1;
        let err = cancel(auction, now).unwrap_err();
        assert_eq!(err, CoreError::BusinessRule("cannot cancel an auction with bids".into()));
    }

    #[test]
    fn expire_without_bids_is_expired() {
        let now = Utc::now();
        let auction = create(fields(now), now).unwrap();
        let ended = expire(auction, None, now + chrono::Duration::hours(2)).unwrap();
        assert_eq!(ended.status, AuctionStatus::Expired);
        assert!(ended.winner_bid_id.is_none());
    }

    #[test]
    fn expire_with_bids_is_completed_with_winner() {
        let now = Utc::now();
        let mut auction = create(fields(now), now).unwrap();
        auction.total_bids = 2;
        let winner = crate::ids::BidId::new();
        let ended = expire(auction, Some(winner), now + chrono::Duration::hours(2)).unwrap();
        assert_eq!(ended.status, AuctionStatus::Completed);
        assert_eq!(ended.winner_bid_id, Some(winner));
    }
}
