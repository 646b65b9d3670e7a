//! Transactional persistence of auctions and their bid history (C2).
//!
//! [`BidStore`] is the contract the coordinator depends on; [`PgBidStore`]
//! is the production implementation over PostgreSQL, and [`InMemoryBidStore`]
//! is a test double used by `auction-coordinator`'s unit tests so they never
//! need a live database.

mod memory;
mod pagination;
mod postgres;

pub use memory::InMemoryBidStore;
pub use pagination::Pagination;
pub use postgres::PgBidStore;

use async_trait::async_trait;
use auction_domain::{Auction, AuctionId, Bid, BidId, Category, CategoryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures the store can report. The coordinator maps `Conflict` onto
/// `CoreError::Conflict` and everything else onto `CoreError::Internal`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The row changed between read and write (optimistic concurrency).
    #[error("the target row was concurrently modified")]
    Conflict,

    /// A unique constraint was violated (duplicate email or category name).
    #[error("duplicate value for {0}")]
    Duplicate(String),

    /// Underlying database error.
    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The bid store contract (C2). All mutation goes through this trait; no
/// caller is allowed to hold a raw connection across an `await` point that
/// isn't already inside one of these methods.
#[async_trait]
pub trait BidStore: Send + Sync {
    async fn create_auction(&self, auction: Auction) -> StoreResult<Auction>;

    /// Single consistent read of the auction and its current top bid.
    async fn load_auction_with_top_bid(
        &self,
        auction_id: AuctionId,
    ) -> StoreResult<Option<(Auction, Option<Bid>)>>;

    /// Persist a lifecycle transition (activate/cancel/expire) computed by
    /// `auction_domain::lifecycle`. Fails with `Conflict` if `updated_at`
    /// no longer matches `expected_updated_at`.
    async fn save_auction(
        &self,
        auction: Auction,
        expected_updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Atomically inserts `new_bid` (already `is_winning = true`), flips
    /// `prior_top_bid_id` to `is_winning = false` when present, bumps
    /// `total_bids`, and sets `auction.current_price = new_current_price`.
    /// Fails with `Conflict` if the auction's `updated_at` no longer
    /// matches `expected_updated_at`.
    async fn insert_bid_and_update_auction(
        &self,
        new_bid: &Bid,
        prior_top_bid_id: Option<BidId>,
        new_current_price: Decimal,
        expected_updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn bid_history(&self, auction_id: AuctionId, page: Pagination) -> StoreResult<Vec<Bid>>;

    async fn active_auctions(&self, page: Pagination) -> StoreResult<Vec<Auction>>;

    async fn active_auctions_by_category(
        &self,
        category_id: CategoryId,
        page: Pagination,
    ) -> StoreResult<Vec<Auction>>;

    async fn seller_auctions(&self, seller_id: UserId, page: Pagination) -> StoreResult<Vec<Auction>>;

    async fn bidder_bids(&self, bidder_id: UserId, page: Pagination) -> StoreResult<Vec<Bid>>;

    /// Active auctions whose `end_at` has already passed, oldest first.
    /// Polled by the background sweeper described in the design notes.
    async fn ending_before(&self, now: DateTime<Utc>) -> StoreResult<Vec<Auction>>;

    async fn create_category(&self, category: Category) -> StoreResult<Category>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
}
