//! User registration, lookup, and default category seeding.

use std::sync::Arc;

use application::{
    CreateDefaultCategories, DefaultCategoriesCreated, GetUser, Registration, RegisterUser,
    UserView,
};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;
use store::Backend;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub provider: String,
    pub external_id: String,
}

/// POST /users: register a user, or return the one already linked to the account.
#[tracing::instrument(skip_all)]
pub async fn register<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    body: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let Json(req) = body?;
    let command = RegisterUser::new(&req.name, &req.provider, &req.external_id)?;
    let ctx = state.context(&headers);
    let registration = state.register_user.handle(&ctx, command).await?;

    let status = if registration.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(registration)))
}

/// GET /users/{provider}/{external_id}
#[tracing::instrument(skip_all)]
pub async fn get<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Json<UserView>, ApiError> {
    let Path((provider, external_id)) = path?;
    let query = GetUser::new(&provider, &external_id)?;
    let ctx = state.context(&headers);
    let user = state.get_user.handle(&ctx, query).await?;
    Ok(Json(user))
}

/// POST /users/{provider}/{external_id}/categories/default
#[tracing::instrument(skip_all)]
pub async fn create_default_categories<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<(StatusCode, Json<DefaultCategoriesCreated>), ApiError> {
    let Path((provider, external_id)) = path?;
    let command = CreateDefaultCategories::new(&provider, &external_id)?;
    let ctx = state.context(&headers);
    let created = state.create_default_categories.handle(&ctx, command).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
