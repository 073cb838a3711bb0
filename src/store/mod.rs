//! Record store seam
//!
//! The engines talk to storage through [`RecordStore`], so the admission and
//! award invariants can be exercised against the in-memory backend in tests
//! and local development while production runs on Postgres.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Bid, Tender, TenderPatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tender {0} not found")]
    TenderNotFound(Uuid),

    #[error("bid {0} not found")]
    BidNotFound(Uuid),

    #[error("a bid for this tender and bidder already exists")]
    DuplicateBid,

    #[error("bidding window is closed")]
    WindowClosed,

    #[error("bidding window is still open")]
    WindowStillOpen,

    #[error("tender already has a winning bid")]
    AlreadyAwarded,

    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for tenders and bids.
///
/// `insert_bid` and `award` are the two invariant-bearing writes: each runs
/// its checks and its mutation as one atomic step, so concurrent callers
/// serialize per tender (and per bidder for submissions). A request dropped
/// before that step commits leaves no partial state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_tender(&self, tender: Tender) -> StoreResult<Tender>;

    async fn get_tender(&self, id: Uuid) -> StoreResult<Option<Tender>>;

    /// Tenders whose deadline is strictly in the future, newest deadline
    /// first.
    async fn list_open_tenders(&self, now: DateTime<Utc>) -> StoreResult<Vec<Tender>>;

    /// Apply a metadata patch. Fails with `AlreadyAwarded` once a winner is
    /// set; the award reference itself is immutable through this path.
    async fn update_tender(
        &self,
        id: Uuid,
        patch: TenderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Tender>;

    /// Delete a tender and cascade to its bids.
    async fn delete_tender(&self, id: Uuid) -> StoreResult<()>;

    async fn get_bid(&self, id: Uuid) -> StoreResult<Option<Bid>>;

    async fn find_bid(&self, tender_id: Uuid, bidder_id: Uuid) -> StoreResult<Option<Bid>>;

    /// Bids for a tender ordered by price, then submission instant, then id.
    async fn list_bids(&self, tender_id: Uuid) -> StoreResult<Vec<Bid>>;

    async fn list_bids_by_bidder(&self, bidder_id: Uuid) -> StoreResult<Vec<Bid>>;

    /// Admit a bid: re-checks tender existence, the deadline against
    /// `bid.submitted_at`, and the one-bid-per-bidder rule, then inserts —
    /// all in one atomic step. Two interleaved submissions for the same
    /// (tender, bidder) pair cannot both succeed.
    async fn insert_bid(&self, bid: Bid) -> StoreResult<Bid>;

    /// Commit the winner: verifies the bid belongs to the tender, that no
    /// winner is set yet, and that the bidding window has closed, then sets
    /// the winner reference and marks the bid `Won` in the same step.
    async fn award(&self, tender_id: Uuid, bid_id: Uuid, now: DateTime<Utc>) -> StoreResult<Tender>;

    async fn health(&self) -> bool;
}
