//! `/api/categories` — browse and create.

use crate::auth_extractor::AuthUser;
use crate::dto::{CategoryResponse, CreateCategoryRequest};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;
use auction_domain::{Category, CategoryId};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use validator::Validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one))
}

async fn list(State(state): State<AppState>) -> Result<Json<Envelope<Vec<CategoryResponse>>>, ApiError> {
    let categories = state.deps.store.list_categories().await?;
    let response = categories.into_iter().map(CategoryResponse::from_domain).collect();
    Ok(Json(Envelope::ok("categories", response)))
}

async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Envelope<CategoryResponse>>, ApiError> {
    let category = state
        .deps
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category {id}")))?;
    Ok(Json(Envelope::ok("category", CategoryResponse::from_domain(category))))
}

async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Envelope<CategoryResponse>>), ApiError> {
    body.validate()?;
    let category = Category {
        id: CategoryId::new(),
        name: body.name,
        description: body.description,
    };
    let created = state.deps.store.create_category(category).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok("category created", CategoryResponse::from_domain(created)))))
}
