//! The `Bid` value type.

use crate::ids::{AuctionId, BidId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound on the recorded source address, matching `VARCHAR(45)`
/// (long enough for an IPv6 literal plus a zone id).
pub const MAX_SOURCE_ADDRESS_LEN: usize = 45;

/// An immutable, timestamped offer of a monetary amount by a user
/// against an auction. Bids are never mutated after insert except for
/// `is_winning`, which only the coordinator flips, under the auction lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub is_winning: bool,
    pub source_address: Option<String>,
    /// Reserved for proxy/auto-bidding, out of scope for this service;
    /// always `false`.
    pub is_auto_bid: bool,
}

impl Bid {
    /// Construct a freshly accepted bid. Coordinators are the only callers;
    /// this does not touch storage or winning flags on sibling bids.
    pub fn new_winning(
        auction_id: AuctionId,
        bidder_id: UserId,
        amount: Decimal,
        timestamp: DateTime<Utc>,
        source_address: Option<String>,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder_id,
            amount: crate::money::round_money(amount),
            timestamp,
            is_winning: true,
            source_address,
            is_auto_bid: false,
        }
    }
}
