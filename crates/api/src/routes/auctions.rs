//! `/api/auctions` — browsing, creation, lifecycle transitions, and the
//! core bid-submission endpoint.

use crate::auth_extractor::AuthUser;
use crate::dto::{AuctionResponse, BidResponse, CreateAuctionRequest, PageQuery, PlaceBidRequest};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;
use auction_coordinator::{self as coordinator, NewAuction};
use auction_domain::{AuctionId, CategoryId};
use auction_store::Pagination;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active).post(create))
        .route("/my-auctions", get(my_auctions))
        .route("/my-bids", get(my_bids))
        .route("/category/:id", get(list_by_category))
        .route("/:id", get(detail).delete(cancel))
        .route("/:id/activate", post(activate))
        .route("/:id/bids", get(bid_history).post(place_bid))
}

fn pagination(q: &PageQuery) -> Pagination {
    Pagination::new(q.page.unwrap_or(1), q.page_size.unwrap_or(20))
}

async fn list_active(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Envelope<Vec<AuctionResponse>>>, ApiError> {
    let auctions = state.deps.store.active_auctions(pagination(&q)).await?;
    Ok(Json(Envelope::ok("auctions", to_responses(auctions))))
}

async fn list_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Envelope<Vec<AuctionResponse>>>, ApiError> {
    let auctions = state
        .deps
        .store
        .active_auctions_by_category(category_id, pagination(&q))
        .await?;
    Ok(Json(Envelope::ok("auctions", to_responses(auctions))))
}

async fn my_auctions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<Envelope<Vec<AuctionResponse>>>, ApiError> {
    let auctions = state.deps.store.seller_auctions(user_id, pagination(&q)).await?;
    Ok(Json(Envelope::ok("your auctions", to_responses(auctions))))
}

async fn my_bids(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PageQuery>,
) -> Result<Json<Envelope<Vec<BidResponse>>>, ApiError> {
    let bids = state.deps.store.bidder_bids(user_id, pagination(&q)).await?;
    let response = bids.into_iter().map(BidResponse::from_domain).collect();
    Ok(Json(Envelope::ok("your bids", response)))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<AuctionId>,
) -> Result<Json<Envelope<AuctionResponse>>, ApiError> {
    let (auction, top) = state
        .deps
        .store
        .load_auction_with_top_bid(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("auction {id}")))?;
    Ok(Json(Envelope::ok("auction", AuctionResponse::from_domain(auction, top))))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(seller_id): AuthUser,
    Json(body): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<Envelope<AuctionResponse>>), ApiError> {
    body.validate()?;
    let fields = NewAuction {
        seller_id,
        category_id: body.category_id,
        title: body.title,
        description: body.description,
        image_url: body.image_url,
        starting_price: body.starting_price,
        reserve_price: body.reserve_price,
        min_increment: body.min_increment,
        start_at: body.start_at,
        end_at: body.end_at,
    };
    let auction = coordinator::create_auction(&state.deps, fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("auction created", AuctionResponse::from_domain(auction, None))),
    ))
}

async fn activate(
    State(state): State<AppState>,
    AuthUser(seller_id): AuthUser,
    Path(id): Path<AuctionId>,
) -> Result<Json<Envelope<AuctionResponse>>, ApiError> {
    let auction = coordinator::activate_auction(&state.deps, id, seller_id).await?;
    Ok(Json(Envelope::ok("auction activated", AuctionResponse::from_domain(auction, None))))
}

async fn cancel(
    State(state): State<AppState>,
    AuthUser(seller_id): AuthUser,
    Path(id): Path<AuctionId>,
) -> Result<Json<Envelope<AuctionResponse>>, ApiError> {
    let auction = coordinator::cancel_auction(&state.deps, id, seller_id).await?;
    Ok(Json(Envelope::ok("auction cancelled", AuctionResponse::from_domain(auction, None))))
}

async fn bid_history(
    State(state): State<AppState>,
    Path(id): Path<AuctionId>,
    Query(q): Query<PageQuery>,
) -> Result<Json<Envelope<Vec<BidResponse>>>, ApiError> {
    let bids = state.deps.store.bid_history(id, pagination(&q)).await?;
    let response = bids.into_iter().map(BidResponse::from_domain).collect();
    Ok(Json(Envelope::ok("bid history", response)))
}

async fn place_bid(
    State(state): State<AppState>,
    AuthUser(bidder_id): AuthUser,
    Path(id): Path<AuctionId>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<PlaceBidRequest>,
) -> Result<(StatusCode, Json<Envelope<BidResponse>>), ApiError> {
    body.validate()?;
    if !state.bid_rate_limiter.is_allowed(&bidder_id.to_string()) {
        return Err(ApiError::RateLimited);
    }
    let outcome = coordinator::place_bid(&state.deps, id, bidder_id, body.amount, Some(addr.ip().to_string())).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("bid accepted", BidResponse::from_domain(outcome.bid))),
    ))
}

fn to_responses(auctions: Vec<auction_domain::Auction>) -> Vec<AuctionResponse> {
    auctions.into_iter().map(|a| AuctionResponse::from_domain(a, None)).collect()
}
