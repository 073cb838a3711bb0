//! In-memory record store
//!
//! Backs local development without Postgres and serves as the storage
//! double in unit tests. One mutex guards the whole state, so every
//! check-then-write below runs as a single linearizable step.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::domain::{Bid, BidStatus, Tender, TenderPatch};

#[derive(Default)]
struct Inner {
    tenders: HashMap<Uuid, Tender>,
    bids: HashMap<Uuid, Bid>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bid_order(a: &Bid, b: &Bid) -> std::cmp::Ordering {
    a.price
        .cmp(&b.price)
        .then_with(|| a.submitted_at.cmp(&b.submitted_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create_tender(&self, tender: Tender) -> StoreResult<Tender> {
        self.inner.lock().tenders.insert(tender.id, tender.clone());
        Ok(tender)
    }

    async fn get_tender(&self, id: Uuid) -> StoreResult<Option<Tender>> {
        Ok(self.inner.lock().tenders.get(&id).cloned())
    }

    async fn list_open_tenders(&self, now: DateTime<Utc>) -> StoreResult<Vec<Tender>> {
        let mut tenders: Vec<Tender> = self
            .inner
            .lock()
            .tenders
            .values()
            .filter(|t| t.deadline > now)
            .cloned()
            .collect();
        tenders.sort_by(|a, b| b.deadline.cmp(&a.deadline));
        Ok(tenders)
    }

    async fn update_tender(
        &self,
        id: Uuid,
        patch: TenderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Tender> {
        let mut inner = self.inner.lock();
        let tender = inner
            .tenders
            .get_mut(&id)
            .ok_or(StoreError::TenderNotFound(id))?;
        if tender.winning_bid_id.is_some() {
            return Err(StoreError::AlreadyAwarded);
        }
        patch.apply(tender, now);
        Ok(tender.clone())
    }

    async fn delete_tender(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner
            .tenders
            .remove(&id)
            .ok_or(StoreError::TenderNotFound(id))?;
        inner.bids.retain(|_, bid| bid.tender_id != id);
        Ok(())
    }

    async fn get_bid(&self, id: Uuid) -> StoreResult<Option<Bid>> {
        Ok(self.inner.lock().bids.get(&id).cloned())
    }

    async fn find_bid(&self, tender_id: Uuid, bidder_id: Uuid) -> StoreResult<Option<Bid>> {
        Ok(self
            .inner
            .lock()
            .bids
            .values()
            .find(|b| b.tender_id == tender_id && b.bidder_id == bidder_id)
            .cloned())
    }

    async fn list_bids(&self, tender_id: Uuid) -> StoreResult<Vec<Bid>> {
        let mut bids: Vec<Bid> = self
            .inner
            .lock()
            .bids
            .values()
            .filter(|b| b.tender_id == tender_id)
            .cloned()
            .collect();
        bids.sort_by(bid_order);
        Ok(bids)
    }

    async fn list_bids_by_bidder(&self, bidder_id: Uuid) -> StoreResult<Vec<Bid>> {
        let mut bids: Vec<Bid> = self
            .inner
            .lock()
            .bids
            .values()
            .filter(|b| b.bidder_id == bidder_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bids)
    }

    async fn insert_bid(&self, bid: Bid) -> StoreResult<Bid> {
        let mut inner = self.inner.lock();

        let tender = inner
            .tenders
            .get(&bid.tender_id)
            .ok_or(StoreError::TenderNotFound(bid.tender_id))?;
        if !tender.can_accept_bid(bid.submitted_at) {
            return Err(StoreError::WindowClosed);
        }
        if inner
            .bids
            .values()
            .any(|b| b.tender_id == bid.tender_id && b.bidder_id == bid.bidder_id)
        {
            return Err(StoreError::DuplicateBid);
        }

        inner.bids.insert(bid.id, bid.clone());
        Ok(bid)
    }

    async fn award(&self, tender_id: Uuid, bid_id: Uuid, now: DateTime<Utc>) -> StoreResult<Tender> {
        let mut inner = self.inner.lock();

        {
            let tender = inner
                .tenders
                .get(&tender_id)
                .ok_or(StoreError::TenderNotFound(tender_id))?;
            let bid = inner.bids.get(&bid_id).ok_or(StoreError::BidNotFound(bid_id))?;
            if bid.tender_id != tender_id {
                return Err(StoreError::BidNotFound(bid_id));
            }
            if tender.winning_bid_id.is_some() {
                return Err(StoreError::AlreadyAwarded);
            }
            if !tender.can_award(now) {
                return Err(StoreError::WindowStillOpen);
            }
        }

        if let Some(bid) = inner.bids.get_mut(&bid_id) {
            bid.status = BidStatus::Won;
        }
        let tender = inner
            .tenders
            .get_mut(&tender_id)
            .ok_or(StoreError::TenderNotFound(tender_id))?;
        tender.winning_bid_id = Some(bid_id);
        tender.updated_at = now;

        Ok(tender.clone())
    }

    async fn health(&self) -> bool {
        true
    }
}
