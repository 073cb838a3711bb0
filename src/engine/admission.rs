//! Bid admission
//!
//! Validates a submission, stamps the submission instant, and hands the
//! atomic deadline/uniqueness check to the record store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Bid, BidStatus, SubmitBidRequest};
use crate::error::{ApiError, ApiResult};
use crate::store::RecordStore;

pub struct BidAdmission {
    store: Arc<dyn RecordStore>,
}

impl BidAdmission {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Accept a priced proposal from a bidder.
    ///
    /// The deadline and one-bid-per-bidder checks run inside the store's
    /// atomic insert, so two interleaved submissions for the same
    /// (tender, bidder) pair cannot both succeed.
    pub async fn submit(
        &self,
        tender_id: Uuid,
        bidder_id: Uuid,
        req: SubmitBidRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<Bid> {
        if req.price < Decimal::ZERO {
            return Err(ApiError::invalid_input("price must not be negative"));
        }

        let bid = Bid {
            id: Uuid::new_v4(),
            tender_id,
            bidder_id,
            proposal: req
                .proposal
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            price: req.price,
            submitted_at: now,
            status: BidStatus::Submitted,
        };

        let bid = self.store.insert_bid(bid).await?;

        tracing::info!(
            bid_id = %bid.id,
            tender_id = %tender_id,
            bidder_id = %bidder_id,
            price = %bid.price,
            "Bid submitted"
        );

        Ok(bid)
    }
}
