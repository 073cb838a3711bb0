//! Tender routes
//!
//! Officers publish and maintain tenders; listing and detail reads are
//! public so bidders can browse without a token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, NoContent, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{RequireAuth, Role};
use crate::domain::{CreateTenderRequest, TenderPatch, TenderResponse};
use crate::error::ApiError;

/// POST /tenders
pub async fn create_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTenderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Officer)?;

    let tender = req.build(auth.user_id, auth.email.clone(), Utc::now())?;
    let tender = state.store.create_tender(tender).await?;

    tracing::info!(
        tender_id = %tender.id,
        officer = %auth.email,
        title = %tender.title,
        deadline = %tender.deadline,
        "Tender created"
    );

    Ok((
        StatusCode::CREATED,
        DataResponse::new(TenderResponse::from(tender)),
    ))
}

/// GET /tenders
///
/// Tenders still accepting bids, newest deadline first.
pub async fn list_open_tenders(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let tenders = state.store.list_open_tenders(Utc::now()).await?;

    let total = tenders.len() as u64;
    let data: Vec<TenderResponse> = tenders
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .map(Into::into)
        .collect();

    Ok(Paginated::new(data, &pagination, total))
}

/// GET /tenders/:id
pub async fn get_tender(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let tender = state
        .store
        .get_tender(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tender {id} not found")))?;

    Ok(DataResponse::new(TenderResponse::from(tender)))
}

/// PUT /tenders/:id
pub async fn update_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TenderPatch>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Officer)?;
    patch.validate()?;

    let tender = state.store.update_tender(id, patch, Utc::now()).await?;

    tracing::info!(tender_id = %tender.id, officer = %auth.email, "Tender updated");

    Ok(DataResponse::new(TenderResponse::from(tender)))
}

/// DELETE /tenders/:id
///
/// Removes the tender and all bids submitted against it.
pub async fn delete_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Officer)?;

    state.store.delete_tender(id).await?;

    tracing::info!(tender_id = %id, officer = %auth.email, "Tender deleted");

    Ok(NoContent)
}
