//! In-memory [`BidStore`] used by `auction-coordinator`'s unit tests and by
//! integration tests across the workspace that don't want a live database.

use crate::{BidStore, Pagination, StoreError, StoreResult};
use async_trait::async_trait;
use auction_domain::{Auction, AuctionId, Bid, BidId, Category, CategoryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    auctions: HashMap<AuctionId, Auction>,
    bids: HashMap<AuctionId, Vec<Bid>>,
    categories: HashMap<CategoryId, Category>,
}

/// A `Mutex`-guarded `HashMap` standing in for Postgres; every method takes
/// the same lock, so there is no cross-method atomicity to reason about.
#[derive(Default)]
pub struct InMemoryBidStore {
    inner: Mutex<Inner>,
}

impl InMemoryBidStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BidStore for InMemoryBidStore {
    async fn create_auction(&self, auction: Auction) -> StoreResult<Auction> {
        let mut inner = self.inner.lock().unwrap();
        inner.auctions.insert(auction.id, auction.clone());
        inner.bids.entry(auction.id).or_default();
        Ok(auction)
    }

    async fn load_auction_with_top_bid(
        &self,
        auction_id: AuctionId,
    ) -> StoreResult<Option<(Auction, Option<Bid>)>> {
        let inner = self.inner.lock().unwrap();
        let Some(auction) = inner.auctions.get(&auction_id).cloned() else {
            return Ok(None);
        };
        let top_bid = inner
            .bids
            .get(&auction_id)
            .and_then(|bids| bids.iter().max_by_key(|b| (b.amount, std::cmp::Reverse(b.timestamp))))
            .cloned();
        Ok(Some((auction, top_bid)))
    }

    async fn save_auction(
        &self,
        auction: Auction,
        expected_updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let existing = inner
            .auctions
            .get(&auction.id)
            .ok_or(StoreError::Conflict)?;
        if existing.updated_at != expected_updated_at {
            return Err(StoreError::Conflict);
        }
        inner.auctions.insert(auction.id, auction);
        Ok(())
    }

    async fn insert_bid_and_update_auction(
        &self,
        new_bid: &Bid,
        prior_top_bid_id: Option<BidId>,
        new_current_price: Decimal,
        expected_updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let auction = inner
            .auctions
            .get(&new_bid.auction_id)
            .ok_or(StoreError::Conflict)?;
        if auction.updated_at != expected_updated_at {
            return Err(StoreError::Conflict);
        }

        let bids = inner.bids.entry(new_bid.auction_id).or_default();
        if let Some(prior_id) = prior_top_bid_id {
            if let Some(prior) = bids.iter_mut().find(|b| b.id == prior_id) {
                prior.is_winning = false;
            }
        }
        bids.push(new_bid.clone());

        let auction = inner.auctions.get_mut(&new_bid.auction_id).unwrap();
        auction.current_price = new_current_price;
        auction.total_bids += 1;
        auction.updated_at = new_bid.timestamp;
        Ok(())
    }

    async fn bid_history(&self, auction_id: AuctionId, page: Pagination) -> StoreResult<Vec<Bid>> {
        let inner = self.inner.lock().unwrap();
        let mut bids = inner.bids.get(&auction_id).cloned().unwrap_or_default();
        bids.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(paginate(bids, page))
    }

    async fn active_auctions(&self, page: Pagination) -> StoreResult<Vec<Auction>> {
        let inner = self.inner.lock().unwrap();
        let mut auctions: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| a.status == auction_domain::AuctionStatus::Active)
            .cloned()
            .collect();
        auctions.sort_by_key(|a| a.end_at);
        Ok(paginate(auctions, page))
    }

    async fn active_auctions_by_category(
        &self,
        category_id: CategoryId,
        page: Pagination,
    ) -> StoreResult<Vec<Auction>> {
        let inner = self.inner.lock().unwrap();
        let mut auctions: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| {
                a.status == auction_domain::AuctionStatus::Active && a.category_id == category_id
            })
            .cloned()
            .collect();
        auctions.sort_by_key(|a| a.end_at);
        Ok(paginate(auctions, page))
    }

    async fn seller_auctions(&self, seller_id: UserId, page: Pagination) -> StoreResult<Vec<Auction>> {
        let inner = self.inner.lock().unwrap();
        let mut auctions: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| a.seller_id == seller_id)
            .cloned()
            .collect();
        auctions.sort_by_key(|a| std::cmp::Reverse(a.created_at));
        Ok(paginate(auctions, page))
    }

    async fn bidder_bids(&self, bidder_id: UserId, page: Pagination) -> StoreResult<Vec<Bid>> {
        let inner = self.inner.lock().unwrap();
        let mut bids: Vec<Bid> = inner
            .bids
            .values()
            .flatten()
            .filter(|b| b.bidder_id == bidder_id)
            .cloned()
            .collect();
        bids.sort_by_key(|b| std::cmp::Reverse(b.timestamp));
        Ok(paginate(bids, page))
    }

    async fn ending_before(&self, now: DateTime<Utc>) -> StoreResult<Vec<Auction>> {
        let inner = self.inner.lock().unwrap();
        let mut auctions: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| a.status == auction_domain::AuctionStatus::Active && a.end_at <= now)
            .cloned()
            .collect();
        auctions.sort_by_key(|a| a.end_at);
        Ok(auctions)
    }

    async fn create_category(&self, category: Category) -> StoreResult<Category> {
        let mut inner = self.inner.lock().unwrap();
        if inner.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Duplicate("name".to_string()));
        }
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let inner = self.inner.lock().unwrap();
        let mut categories: Vec<Category> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

fn paginate<T>(items: Vec<T>, page: Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_domain::Clock;
    use rust_decimal_macros::dec;

    fn make_auction(now: DateTime<Utc>) -> Auction {
        Auction {
            id: AuctionId::new(),
            seller_id: UserId::new(),
            category_id: CategoryId::new(),
            title: "Widget".to_string(),
            description: "A fine widget".to_string(),
            image_url: None,
            starting_price: dec!(10.00),
            current_price: dec!(10.00),
            reserve_price: None,
            min_increment: dec!(1.00),
            start_at: now,
            end_at: now + chrono::Duration::hours(1),
            status: auction_domain::AuctionStatus::Active,
            winner_bid_id: None,
            total_bids: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_bid_updates_price_and_total() {
        let store = InMemoryBidStore::new();
        let clock = auction_domain::SystemClock::default();
        let now = clock.now();
        let auction = store.create_auction(make_auction(now)).await.unwrap();

        let bid = Bid::new_winning(auction.id, UserId::new(), dec!(11.00), clock.now(), None);
        store
            .insert_bid_and_update_auction(&bid, None, dec!(11.00), auction.updated_at)
            .await
            .unwrap();

        let (loaded, top) = store
            .load_auction_with_top_bid(auction.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_price, dec!(11.00));
        assert_eq!(loaded.total_bids, 1);
        assert_eq!(top.unwrap().id, bid.id);
    }

    #[tokio::test]
    async fn stale_expected_updated_at_is_conflict() {
        let store = InMemoryBidStore::new();
        let clock = auction_domain::SystemClock::default();
        let now = clock.now();
        let auction = store.create_auction(make_auction(now)).await.unwrap();

        let bid = Bid::new_winning(auction.id, UserId::new(), dec!(11.00), clock.now(), None);
        let stale = auction.updated_at - chrono::Duration::seconds(1);
        let err = store
            .insert_bid_and_update_auction(&bid, None, dec!(11.00), stale)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn duplicate_category_name_is_rejected() {
        let store = InMemoryBidStore::new();
        let category = Category {
            id: CategoryId::new(),
            name: "Electronics".to_string(),
            description: None,
        };
        store.create_category(category.clone()).await.unwrap();
        let dup = Category {
            id: CategoryId::new(),
            ..category
        };
        let err = store.create_category(dup).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }
}
