//! PostgreSQL implementation of [`BidStore`] over `sqlx::PgPool`.

use crate::{BidStore, Pagination, StoreError, StoreResult};
use async_trait::async_trait;
use auction_domain::{Auction, AuctionId, AuctionStatus, Bid, BidId, Category, CategoryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

/// Connection-pooled handle to the Postgres-backed store.
#[derive(Clone)]
pub struct PgBidStore {
    pool: PgPool,
}

impl PgBidStore {
    /// Connect and run pending migrations, so a fresh environment is ready
    /// to serve traffic as soon as this returns.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            StoreError::Backend(sqlx::Error::Configuration(e.to_string().into()))
        })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn auction_from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Auction> {
        let status_str: String = row.try_get("status")?;
        let status = AuctionStatus::from_db_str(&status_str).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown auction status {status_str}").into())
        })?;
        Ok(Auction {
            id: AuctionId(row.try_get("id")?),
            seller_id: UserId(row.try_get("seller_id")?),
            category_id: CategoryId(row.try_get("category_id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            image_url: row.try_get("image_url")?,
            starting_price: row.try_get("starting_price")?,
            current_price: row.try_get("current_price")?,
            reserve_price: row.try_get("reserve_price")?,
            min_increment: row.try_get("min_increment")?,
            start_at: row.try_get("start_at")?,
            end_at: row.try_get("end_at")?,
            status,
            winner_bid_id: row
                .try_get::<Option<Uuid>, _>("winner_bid_id")?
                .map(BidId),
            total_bids: row.try_get("total_bids")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bid_from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Bid> {
        Ok(Bid {
            id: BidId(row.try_get("id")?),
            auction_id: AuctionId(row.try_get("auction_id")?),
            bidder_id: UserId(row.try_get("bidder_id")?),
            amount: row.try_get("amount")?,
            timestamp: row.try_get("timestamp")?,
            is_winning: row.try_get("is_winning")?,
            source_address: row.try_get("source_address")?,
            is_auto_bid: row.try_get("is_auto_bid")?,
        })
    }

    fn category_from_row(row: &sqlx::postgres::PgRow) -> sqlx::Result<Category> {
        Ok(Category {
            id: CategoryId(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn map_unique_violation(err: sqlx::Error, field: &str) -> StoreError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate(field.to_string());
            }
        }
        StoreError::Backend(err)
    }
}

#[async_trait]
impl BidStore for PgBidStore {
    async fn create_auction(&self, auction: Auction) -> StoreResult<Auction> {
        sqlx::query(
            r#"INSERT INTO auctions
                (id, seller_id, category_id, title, description, image_url,
                 starting_price, current_price, reserve_price, min_increment,
                 start_at, end_at, status, winner_bid_id, total_bids, created_at, updated_at)
               VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)"#,
        )
        .bind(auction.id.0)
        .bind(auction.seller_id.0)
        .bind(auction.category_id.0)
        .bind(&auction.title)
        .bind(&auction.description)
        .bind(&auction.image_url)
        .bind(auction.starting_price)
        .bind(auction.current_price)
        .bind(auction.reserve_price)
        .bind(auction.min_increment)
        .bind(auction.start_at)
        .bind(auction.end_at)
        .bind(auction.status.as_db_str())
        .bind(auction.winner_bid_id.map(|b| b.0))
        .bind(auction.total_bids)
        .bind(auction.created_at)
        .bind(auction.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(auction)
    }

    async fn load_auction_with_top_bid(
        &self,
        auction_id: AuctionId,
    ) -> StoreResult<Option<(Auction, Option<Bid>)>> {
        let Some(auction_row) = sqlx::query("SELECT * FROM auctions WHERE id = $1")
            .bind(auction_id.0)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let auction = Self::auction_from_row(&auction_row)?;

        let top_bid_row = sqlx::query(
            r#"SELECT * FROM bids WHERE auction_id = $1
               ORDER BY amount DESC, "timestamp" ASC LIMIT 1"#,
        )
        .bind(auction_id.0)
        .fetch_optional(&self.pool)
        .await?;
        let top_bid = top_bid_row.as_ref().map(Self::bid_from_row).transpose()?;

        Ok(Some((auction, top_bid)))
    }

    async fn save_auction(
        &self,
        auction: Auction,
        expected_updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE auctions SET
                status = $1, start_at = $2, winner_bid_id = $3, updated_at = $4
               WHERE id = $5 AND updated_at = $6"#,
        )
        .bind(auction.status.as_db_str())
        .bind(auction.start_at)
        .bind(auction.winner_bid_id.map(|b| b.0))
        .bind(auction.updated_at)
        .bind(auction.id.0)
        .bind(expected_updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }

    async fn insert_bid_and_update_auction(
        &self,
        new_bid: &Bid,
        prior_top_bid_id: Option<BidId>,
        new_current_price: Decimal,
        expected_updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let update_result = sqlx::query(
            r#"UPDATE auctions SET current_price = $1, total_bids = total_bids + 1, updated_at = $2
               WHERE id = $3 AND updated_at = $4"#,
        )
        .bind(new_current_price)
        .bind(new_bid.timestamp)
        .bind(new_bid.auction_id.0)
        .bind(expected_updated_at)
        .execute(&mut *tx)
        .await?;

        if update_result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::Conflict);
        }

        if let Some(prior_id) = prior_top_bid_id {
            sqlx::query("UPDATE bids SET is_winning = false WHERE id = $1")
                .bind(prior_id.0)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"INSERT INTO bids
                (id, auction_id, bidder_id, amount, "timestamp", is_winning, source_address, is_auto_bid)
               VALUES ($1,$2,$3,$4,$5,$6,$7,$8)"#,
        )
        .bind(new_bid.id.0)
        .bind(new_bid.auction_id.0)
        .bind(new_bid.bidder_id.0)
        .bind(new_bid.amount)
        .bind(new_bid.timestamp)
        .bind(new_bid.is_winning)
        .bind(&new_bid.source_address)
        .bind(new_bid.is_auto_bid)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn bid_history(&self, auction_id: AuctionId, page: Pagination) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query(
            r#"SELECT * FROM bids WHERE auction_id = $1
               ORDER BY "timestamp" DESC LIMIT $2 OFFSET $3"#,
        )
        .bind(auction_id.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::bid_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }

    async fn active_auctions(&self, page: Pagination) -> StoreResult<Vec<Auction>> {
        let rows = sqlx::query(
            r#"SELECT * FROM auctions WHERE status = 'active' AND end_at > now()
               ORDER BY end_at ASC LIMIT $1 OFFSET $2"#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::auction_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }

    async fn active_auctions_by_category(
        &self,
        category_id: CategoryId,
        page: Pagination,
    ) -> StoreResult<Vec<Auction>> {
        let rows = sqlx::query(
            r#"SELECT * FROM auctions WHERE status = 'active' AND end_at > now() AND category_id = $1
               ORDER BY end_at ASC LIMIT $2 OFFSET $3"#,
        )
        .bind(category_id.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::auction_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }

    async fn seller_auctions(&self, seller_id: UserId, page: Pagination) -> StoreResult<Vec<Auction>> {
        let rows = sqlx::query(
            r#"SELECT * FROM auctions WHERE seller_id = $1
               ORDER BY created_at DESC LIMIT $2 OFFSET $3"#,
        )
        .bind(seller_id.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::auction_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }

    async fn bidder_bids(&self, bidder_id: UserId, page: Pagination) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query(
            r#"SELECT * FROM bids WHERE bidder_id = $1
               ORDER BY "timestamp" DESC LIMIT $2 OFFSET $3"#,
        )
        .bind(bidder_id.0)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::bid_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }

    async fn ending_before(&self, now: DateTime<Utc>) -> StoreResult<Vec<Auction>> {
        let rows = sqlx::query(
            r#"SELECT * FROM auctions WHERE status = 'active' AND end_at <= $1 ORDER BY end_at ASC"#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::auction_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }

    async fn create_category(&self, category: Category) -> StoreResult<Category> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category.id.0)
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_unique_violation(e, "name"))?;
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::category_from_row).transpose().map_err(Into::into)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::category_from_row).collect::<sqlx::Result<_>>().map_err(Into::into)
    }
}
