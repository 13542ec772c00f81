use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use crate::auth::AuthUser;
use crate::catalog::CatalogSearchHit;
use crate::error::AppError;
use crate::state::AppState;

use super::dto::{DeriveFoodRequest, ManualFoodRequest, ResolveFoodRequest, SearchQuery};
use super::repo::FoodRecord;
use super::resolver::{self, ManualFood};

#[instrument(skip(state))]
pub async fn search_catalog(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<CatalogSearchHit>>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".into()));
    }
    let hits = state.catalog.search(query).await?;
    Ok(Json(hits))
}

#[instrument(skip(state))]
pub async fn resolve_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<ResolveFoodRequest>,
) -> Result<Json<FoodRecord>, AppError> {
    let record = resolver::resolve_by_external_id(
        state.foods.as_ref(),
        state.catalog.as_ref(),
        body.external_id,
    )
    .await?;
    Ok(Json(record))
}

#[instrument(skip(state, body))]
pub async fn create_manual_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<ManualFoodRequest>,
) -> Result<(StatusCode, Json<FoodRecord>), AppError> {
    let record = resolver::resolve_manual(state.foods.as_ref(), body.into()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state, body))]
pub async fn derive_food(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(body): Json<DeriveFoodRequest>,
) -> Result<(StatusCode, Json<FoodRecord>), AppError> {
    let manual = ManualFood {
        description: body.description,
        brand_name: body.brand_name,
        serving_size: body.serving_size,
        serving_unit: body.serving_unit,
        nutrients: body.nutrients,
    };
    let record = resolver::derive_from_logged_nutrients(
        state.foods.as_ref(),
        manual,
        body.quantity,
        body.external_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
