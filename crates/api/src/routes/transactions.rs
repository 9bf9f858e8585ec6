//! Transaction recording.

use std::sync::Arc;

use application::RecordTransaction;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use common::Id;
use serde::{Deserialize, Serialize};
use store::Backend;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RecordTransactionRequest {
    pub user_id: Id,
    pub category_id: Id,
    /// Decimal string, `"12.50"` or `"12,50"`.
    pub amount: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
}

#[derive(Serialize)]
pub struct TransactionRecordedResponse {
    pub transaction_id: Id,
}

/// POST /transactions
#[tracing::instrument(skip_all)]
pub async fn record<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    headers: HeaderMap,
    body: Result<Json<RecordTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionRecordedResponse>), ApiError> {
    let Json(req) = body?;
    let command = RecordTransaction::new(
        req.user_id,
        req.category_id,
        &req.amount,
        &req.transaction_type,
    )?;
    let ctx = state.context(&headers);
    let transaction_id = state.record_transaction.handle(&ctx, command).await?;
    Ok((
        StatusCode::CREATED,
        Json(TransactionRecordedResponse { transaction_id }),
    ))
}
