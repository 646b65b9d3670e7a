//! Request/response bodies for the HTTP surface. Validation rules mirror
//! the column bounds in `auction_domain` so a malformed request is
//! rejected before it reaches the coordinator.

use auction_domain::{Auction, AuctionId, AuctionStatus, Bid, Category, CategoryId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// `validator`'s numeric `range` validator only covers primitive float
/// and integer types; amounts are `Decimal`, so positivity is checked by
/// hand and wired in via `#[validate(custom(...))]`.
fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_positive() && !amount.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("amount must be greater than zero"))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAuctionRequest {
    pub category_id: CategoryId,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(max = 500))]
    pub image_url: Option<String>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub starting_price: Decimal,
    pub reserve_price: Option<Decimal>,
    #[validate(custom(function = "validate_positive_amount"))]
    pub min_increment: Decimal,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceBidRequest {
    #[validate(custom(function = "validate_positive_amount"))]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u32>,
}

/// Wire view of an auction: never carries `reserve_price`.
#[derive(Debug, Serialize)]
pub struct AuctionResponse {
    pub id: AuctionId,
    pub seller_id: UserId,
    pub category_id: CategoryId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub starting_price: Decimal,
    pub current_price: Decimal,
    pub min_increment: Decimal,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AuctionStatus,
    pub total_bids: i64,
    pub latest_bid: Option<BidResponse>,
}

impl AuctionResponse {
    pub fn from_domain(auction: Auction, latest_bid: Option<Bid>) -> Self {
        Self {
            id: auction.id,
            seller_id: auction.seller_id,
            category_id: auction.category_id,
            title: auction.title,
            description: auction.description,
            image_url: auction.image_url,
            starting_price: auction.starting_price,
            current_price: auction.current_price,
            min_increment: auction.min_increment,
            start_at: auction.start_at,
            end_at: auction.end_at,
            status: auction.status,
            total_bids: auction.total_bids,
            latest_bid: latest_bid.map(BidResponse::from_domain),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BidResponse {
    pub id: auction_domain::BidId,
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub is_winning: bool,
}

impl BidResponse {
    pub fn from_domain(bid: Bid) -> Self {
        Self {
            id: bid.id,
            auction_id: bid.auction_id,
            bidder_id: bid.bidder_id,
            amount: bid.amount,
            timestamp: bid.timestamp,
            is_winning: bid.is_winning,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

impl CategoryResponse {
    pub fn from_domain(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
        }
    }
}
