//! The `Auction` aggregate and its lifecycle status.

use crate::ids::{AuctionId, BidId, CategoryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upper bound on `title`, matching the `VARCHAR(200)` column.
pub const MAX_TITLE_LEN: usize = 200;
/// Upper bound on `description`, matching the `VARCHAR(2000)` column.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Upper bound on any stored URL (image reference).
pub const MAX_URL_LEN: usize = 500;
/// Clock-skew tolerance granted to `start_at` on creation.
pub const START_TIME_SKEW_TOLERANCE: chrono::Duration = chrono::Duration::minutes(5);

/// Where an auction sits in the Pending -> Active -> terminal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    /// Created but `start_at` has not yet arrived.
    Pending,
    /// Open for bids.
    Active,
    /// `end_at` reached with at least one accepted bid.
    Completed,
    /// Seller cancelled while zero bids existed.
    Cancelled,
    /// `end_at` reached with zero bids.
    Expired,
}

impl AuctionStatus {
    /// Terminal states never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }

    /// The column value this status is stored as; kept independent from
    /// `Debug`/serde so the database representation never shifts under a
    /// rename of the Rust variant's derive output.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => Self::Pending,
            "active" => Self::Active,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            "expired" => Self::Expired,
            _ => return None,
        })
    }
}

/// A time-bounded offering by a seller, against which bidders place
/// monotonically increasing bids until `end_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub seller_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub starting_price: Decimal,
    pub current_price: Decimal,
    /// Never exposed to bidders through the API.
    pub reserve_price: Option<Decimal>,
    pub min_increment: Decimal,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AuctionStatus,
    pub winner_bid_id: Option<BidId>,
    pub total_bids: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    /// The smallest amount a new bid must reach to be accepted, given the
    /// auction's current top bid (`None` for the first bid on the auction).
    pub fn min_required_bid(&self, top_bid_amount: Option<Decimal>) -> Decimal {
        match top_bid_amount {
            None => self.starting_price,
            Some(_) => crate::money::next_minimum(self.current_price, self.min_increment),
        }
    }

    /// `true` once `now` has reached or passed `end_at`.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_at
    }

    /// `self.current_price == starting_price` iff no bid has ever been accepted.
    pub fn has_bids(&self) -> bool {
        self.total_bids > 0
    }
}
