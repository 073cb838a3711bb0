//! Bid routes
//!
//! Submission goes through the admission engine; reads are role-scoped so
//! bidders only ever see their own bids.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{DataResponse, Paginated, PaginationParams};
use crate::app::AppState;
use crate::auth::{RequireAuth, Role};
use crate::domain::{BidDetailsResponse, BidResponse, MyBidResponse, SubmitBidRequest};
use crate::error::ApiError;

/// POST /tenders/:tender_id/bids
pub async fn submit_bid(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
    Json(req): Json<SubmitBidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Bidder)?;

    let bid = state
        .admission
        .submit(tender_id, auth.user_id, req, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        DataResponse::new(BidResponse::from(bid)),
    ))
}

/// GET /tenders/:tender_id/bids
///
/// All bids for a tender, lowest price first.
pub async fn list_bids_for_tender(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(tender_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Officer)?;

    state
        .store
        .get_tender(tender_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tender {tender_id} not found")))?;

    let bids = state.store.list_bids(tender_id).await?;

    let total = bids.len() as u64;
    let data: Vec<BidResponse> = bids
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit() as usize)
        .map(Into::into)
        .collect();

    Ok(Paginated::new(data, &pagination, total))
}

/// GET /bids/my
pub async fn my_bids(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_role(Role::Bidder)?;

    let now = Utc::now();
    let bids = state.store.list_bids_by_bidder(auth.user_id).await?;

    let mut data = Vec::with_capacity(bids.len());
    for bid in bids {
        let Some(tender) = state.store.get_tender(bid.tender_id).await? else {
            continue;
        };
        data.push(MyBidResponse {
            id: bid.id,
            tender_id: bid.tender_id,
            tender_title: tender.title,
            price: bid.price,
            status: bid.status,
            submitted_at: bid.submitted_at,
            tender_deadline: tender.deadline,
            days_remaining: (tender.deadline - now).num_days(),
        });
    }

    Ok(DataResponse::new(data))
}

/// GET /bids/:id
///
/// Bidders may only read their own bids; officers and evaluators see any.
pub async fn get_bid_details(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bid = state
        .store
        .get_bid(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Bid {id} not found")))?;

    if !auth.may_view_bid(bid.bidder_id) {
        return Err(ApiError::forbidden("You may only view your own bids"));
    }

    let tender = state
        .store
        .get_tender(bid.tender_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tender {} not found", bid.tender_id)))?;

    Ok(DataResponse::new(BidDetailsResponse {
        id: bid.id,
        tender_id: bid.tender_id,
        tender_title: tender.title,
        bidder_id: bid.bidder_id,
        proposal: bid.proposal,
        price: bid.price,
        status: bid.status,
        submitted_at: bid.submitted_at,
        tender_deadline: tender.deadline,
    }))
}
