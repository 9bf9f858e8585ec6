//! Category listing.

use std::sync::Arc;

use application::{CategoryView, GetUserCategories};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use common::Id;
use serde::Deserialize;
use store::Backend;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CategoriesParams {
    pub user_id: Id,
    #[serde(rename = "type")]
    pub category_type: String,
}

/// GET /categories?user_id=..&type=income|expense
#[tracing::instrument(skip_all)]
pub async fn list<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    params: Result<Query<CategoriesParams>, QueryRejection>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    let Query(params) = params?;
    let query = GetUserCategories::new(params.user_id, &params.category_type)?;
    let ctx = state.context(&headers);
    let categories = state.get_user_categories.handle(&ctx, query).await?;
    Ok(Json(categories))
}
