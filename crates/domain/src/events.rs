//! Typed payloads for the six events the messaging fabric carries. Kept in
//! `auction-domain` (rather than `auction-events`) so the coordinator can
//! construct them without depending on the transport crate.

use crate::auction::AuctionStatus;
use crate::bid::Bid;
use crate::ids::AuctionId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A new bid was accepted for an auction. Published to the auction's room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBidEvent {
    pub auction_id: AuctionId,
    pub bid: Bid,
    pub new_current_price: Decimal,
    pub total_bids: i64,
    pub time_remaining_secs: i64,
}

/// The bidder who previously held the top bid has been outbid. Published
/// only to that bidder's live connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutbidEvent {
    pub auction_id: AuctionId,
    pub auction_title: String,
    pub your_bid: Decimal,
    pub new_highest_bid: Decimal,
    pub minimum_next_bid: Decimal,
}

/// Auction status changed by a lifecycle transition (activate/cancel/expire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionStatusChangedEvent {
    pub auction_id: AuctionId,
    pub status: AuctionStatus,
    pub message: String,
    pub winner_bid: Option<Bid>,
}

/// A periodic nudge so clients can resynchronize their countdown timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSyncEvent {
    pub auction_id: AuctionId,
    pub end_at: DateTime<Utc>,
    pub time_remaining_secs: i64,
    pub server_time: DateTime<Utc>,
}

/// Advisory, in-process gauge of service-wide activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStatsUpdatedEvent {
    pub active_auctions: u64,
    pub connected_users: u64,
    pub timestamp: DateTime<Utc>,
}

/// Every event the fabric can carry, tagged so a WebSocket client can
/// dispatch on `"type"` without a side channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    NewBid(NewBidEvent),
    Outbid(OutbidEvent),
    AuctionStatusChanged(AuctionStatusChangedEvent),
    AuctionEnded(AuctionStatusChangedEvent),
    TimerSync(TimerSyncEvent),
    LiveStatsUpdated(LiveStatsUpdatedEvent),
}

impl Event {
    /// The room this event belongs to, if it is a group event.
    pub fn room_auction_id(&self) -> Option<AuctionId> {
        match self {
            Event::NewBid(e) => Some(e.auction_id),
            Event::AuctionStatusChanged(e) => Some(e.auction_id),
            Event::AuctionEnded(e) => Some(e.auction_id),
            Event::TimerSync(e) => Some(e.auction_id),
            Event::Outbid(_) | Event::LiveStatsUpdated(_) => None,
        }
    }
}
