//! Evaluation routes
//!
//! The lowest-price preview is a recommendation; the award is the binding,
//! exactly-once decision. The winner view is public, like the original
//! tender notice board.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::{RequireAuth, Role};
use crate::domain::{EvaluationSuggestion, TenderResponse, WinnerResponse};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AwardRequest {
    pub bid_id: Uuid,
}

/// GET /evaluation/:tender_id/lowest
///
/// Read-only preview; commits nothing.
pub async fn lowest(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Evaluator)?;

    let bid = state.evaluation.evaluate_lowest(tender_id).await?;

    Ok(DataResponse::new(EvaluationSuggestion {
        bid_id: bid.id,
        price: bid.price,
        proposal: bid.proposal,
    }))
}

/// POST /evaluation/:tender_id/award
pub async fn award(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
    Json(req): Json<AwardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Evaluator)?;

    let tender = state
        .evaluation
        .award(tender_id, req.bid_id, Utc::now())
        .await?;

    tracing::info!(
        tender_id = %tender_id,
        bid_id = %req.bid_id,
        evaluator = %auth.email,
        "Winner committed"
    );

    Ok(DataResponse::new(TenderResponse::from(tender)))
}

/// GET /evaluation/:tender_id/winner
pub async fn winner(
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bid = state.evaluation.winner(tender_id).await?;

    Ok(DataResponse::new(WinnerResponse {
        bid_id: bid.id,
        bidder_id: bid.bidder_id,
        price: bid.price,
        proposal: bid.proposal,
    }))
}
