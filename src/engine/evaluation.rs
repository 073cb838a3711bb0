//! Evaluation engine
//!
//! Computes the lowest-price recommendation for a closed tender and commits
//! the winner exactly once. The award need not follow the recommendation
//! unless the `award_requires_lowest` policy is enabled.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Bid, Tender};
use crate::error::{ApiError, ApiResult};
use crate::store::RecordStore;

pub struct Evaluation {
    store: Arc<dyn RecordStore>,
    require_lowest: bool,
}

impl Evaluation {
    pub fn new(store: Arc<dyn RecordStore>, require_lowest: bool) -> Self {
        Self {
            store,
            require_lowest,
        }
    }

    /// Lowest-price recommendation. Read-only, so it can be called any
    /// number of times before committing. Ties break by earliest
    /// submission, then bid id, which makes the result deterministic for
    /// an unchanged bid set.
    pub async fn evaluate_lowest(&self, tender_id: Uuid) -> ApiResult<Bid> {
        let tender = self.require_tender(tender_id).await?;
        let bids = self.store.list_bids(tender.id).await?;

        bids.into_iter()
            .min_by(|a, b| {
                a.price
                    .cmp(&b.price)
                    .then_with(|| a.submitted_at.cmp(&b.submitted_at))
                    .then_with(|| a.id.cmp(&b.id))
            })
            .ok_or_else(|| ApiError::not_found("No bids for this tender"))
    }

    /// Commit `bid_id` as the tender's winner.
    ///
    /// The store rejects the call while the bidding window is open, and
    /// again once a winner exists, so the decision is exactly-once.
    pub async fn award(
        &self,
        tender_id: Uuid,
        bid_id: Uuid,
        now: DateTime<Utc>,
    ) -> ApiResult<Tender> {
        if self.require_lowest {
            let recommended = self.evaluate_lowest(tender_id).await?;
            if recommended.id != bid_id {
                return Err(ApiError::conflict(
                    "awarded bid must match the lowest-price recommendation",
                ));
            }
        }

        let tender = self.store.award(tender_id, bid_id, now).await?;

        tracing::info!(
            tender_id = %tender_id,
            bid_id = %bid_id,
            "Tender awarded"
        );

        Ok(tender)
    }

    /// The winning bid, once an award has been committed.
    pub async fn winner(&self, tender_id: Uuid) -> ApiResult<Bid> {
        let tender = self.require_tender(tender_id).await?;
        let winning_bid_id = tender
            .winning_bid_id
            .ok_or_else(|| ApiError::not_found("No winner selected yet"))?;

        self.store
            .get_bid(winning_bid_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Bid {winning_bid_id} not found")))
    }

    async fn require_tender(&self, tender_id: Uuid) -> ApiResult<Tender> {
        self.store
            .get_tender(tender_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Tender {tender_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BidStatus, SubmitBidRequest, Tender};
    use crate::engine::BidAdmission;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn fixed(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 11, hour, 0, 0).unwrap()
    }

    fn tender(deadline: DateTime<Utc>) -> Tender {
        Tender {
            id: Uuid::new_v4(),
            title: "Fleet maintenance".to_string(),
            description: String::new(),
            budget: Decimal::from(80_000),
            deadline,
            category: String::new(),
            kind: "Open".to_string(),
            location: String::new(),
            created_by: Uuid::new_v4(),
            created_by_email: "officer@example.com".to_string(),
            winning_bid_id: None,
            created_at: fixed(0),
            updated_at: fixed(0),
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        admission: BidAdmission,
        evaluation: Evaluation,
        tender_id: Uuid,
    }

    async fn setup(deadline: DateTime<Utc>, require_lowest: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let t = store.create_tender(tender(deadline)).await.unwrap();
        Fixture {
            admission: BidAdmission::new(store.clone()),
            evaluation: Evaluation::new(store.clone(), require_lowest),
            store,
            tender_id: t.id,
        }
    }

    async fn submit(fx: &Fixture, price: i64, at: DateTime<Utc>) -> Bid {
        fx.admission
            .submit(
                fx.tender_id,
                Uuid::new_v4(),
                SubmitBidRequest {
                    proposal: None,
                    price: Decimal::from(price),
                },
                at,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn lowest_price_wins() {
        let fx = setup(fixed(12), false).await;
        submit(&fx, 200, fixed(9)).await;
        let expected = submit(&fx, 100, fixed(10)).await;
        submit(&fx, 150, fixed(11)).await;

        let winner = fx.evaluation.evaluate_lowest(fx.tender_id).await.unwrap();
        assert_eq!(winner.id, expected.id);
        assert_eq!(winner.price, Decimal::from(100));

        // Idempotent: a second call over the unchanged bid set agrees.
        let again = fx.evaluation.evaluate_lowest(fx.tender_id).await.unwrap();
        assert_eq!(again.id, winner.id);
    }

    #[tokio::test]
    async fn price_ties_break_by_submission_instant_then_id() {
        let fx = setup(fixed(12), false).await;
        let later = submit(&fx, 100, fixed(11)).await;
        let earlier = submit(&fx, 100, fixed(10)).await;

        let winner = fx.evaluation.evaluate_lowest(fx.tender_id).await.unwrap();
        assert_eq!(winner.id, earlier.id);
        assert_ne!(winner.id, later.id);

        // Same price and instant: the smaller bid id wins.
        let fx = setup(fixed(12), false).await;
        let a = submit(&fx, 100, fixed(10)).await;
        let b = submit(&fx, 100, fixed(10)).await;
        let expected = if a.id < b.id { a.id } else { b.id };
        let winner = fx.evaluation.evaluate_lowest(fx.tender_id).await.unwrap();
        assert_eq!(winner.id, expected);
    }

    #[tokio::test]
    async fn evaluate_lowest_without_bids_is_not_found() {
        let fx = setup(fixed(12), false).await;
        let err = fx.evaluation.evaluate_lowest(fx.tender_id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = fx.evaluation.evaluate_lowest(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn award_before_deadline_is_rejected() {
        let fx = setup(fixed(12), false).await;
        let bid = submit(&fx, 100, fixed(10)).await;

        let err = fx
            .evaluation
            .award(fx.tender_id, bid.id, fixed(11))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::WindowStillOpen));
    }

    #[tokio::test]
    async fn award_is_exactly_once() {
        let fx = setup(fixed(12), false).await;
        let bid100 = submit(&fx, 100, fixed(10)).await;
        let bid150 = submit(&fx, 150, fixed(11)).await;

        let tender = fx
            .evaluation
            .award(fx.tender_id, bid100.id, fixed(13))
            .await
            .unwrap();
        assert_eq!(tender.winning_bid_id, Some(bid100.id));

        let won = fx.store.get_bid(bid100.id).await.unwrap().unwrap();
        assert_eq!(won.status, BidStatus::Won);

        // Losing bids keep their submitted status.
        let losing = fx.store.get_bid(bid150.id).await.unwrap().unwrap();
        assert_eq!(losing.status, BidStatus::Submitted);

        // A second award fails regardless of which bid is chosen.
        let err = fx
            .evaluation
            .award(fx.tender_id, bid150.id, fixed(13))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyAwarded));
        let err = fx
            .evaluation
            .award(fx.tender_id, bid100.id, fixed(13))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyAwarded));
    }

    #[tokio::test]
    async fn award_rejects_bid_from_another_tender() {
        let fx = setup(fixed(12), false).await;
        submit(&fx, 100, fixed(10)).await;

        let other = fx.store.create_tender(tender(fixed(12))).await.unwrap();
        let foreign = fx
            .admission
            .submit(
                other.id,
                Uuid::new_v4(),
                SubmitBidRequest {
                    proposal: None,
                    price: Decimal::from(10),
                },
                fixed(10),
            )
            .await
            .unwrap();

        let err = fx
            .evaluation
            .award(fx.tender_id, foreign.id, fixed(13))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn award_may_override_the_recommendation_by_default() {
        let fx = setup(fixed(12), false).await;
        submit(&fx, 100, fixed(10)).await;
        let pricier = submit(&fx, 150, fixed(11)).await;

        let tender = fx
            .evaluation
            .award(fx.tender_id, pricier.id, fixed(13))
            .await
            .unwrap();
        assert_eq!(tender.winning_bid_id, Some(pricier.id));
    }

    #[tokio::test]
    async fn strict_policy_pins_award_to_the_recommendation() {
        let fx = setup(fixed(12), true).await;
        let lowest = submit(&fx, 100, fixed(10)).await;
        let pricier = submit(&fx, 150, fixed(11)).await;

        let err = fx
            .evaluation
            .award(fx.tender_id, pricier.id, fixed(13))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        fx.evaluation
            .award(fx.tender_id, lowest.id, fixed(13))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn winner_is_not_found_until_awarded() {
        let fx = setup(fixed(12), false).await;
        let bid = submit(&fx, 100, fixed(10)).await;

        let err = fx.evaluation.winner(fx.tender_id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        fx.evaluation
            .award(fx.tender_id, bid.id, fixed(13))
            .await
            .unwrap();
        let winner = fx.evaluation.winner(fx.tender_id).await.unwrap();
        assert_eq!(winner.id, bid.id);
        assert_eq!(winner.status, BidStatus::Won);
    }
}
