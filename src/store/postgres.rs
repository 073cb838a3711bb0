//! Postgres record store
//!
//! Admission and award run inside transactions: the tender row is locked
//! `FOR UPDATE` so the deadline and winner checks cannot race the write,
//! and the `ux_bids_tender_bidder` unique index backstops the
//! one-bid-per-bidder rule against concurrent inserts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::domain::{Bid, BidStatus, Tender, TenderPatch};

const TENDER_COLUMNS: &str = "id, title, description, budget, deadline, category, kind, location, \
     created_by, created_by_email, winning_bid_id, created_at, updated_at";

const BID_COLUMNS: &str = "id, tender_id, bidder_id, proposal, price, submitted_at, status";

#[derive(Debug, sqlx::FromRow)]
struct TenderRow {
    id: Uuid,
    title: String,
    description: String,
    budget: Decimal,
    deadline: DateTime<Utc>,
    category: String,
    kind: String,
    location: String,
    created_by: Uuid,
    created_by_email: String,
    winning_bid_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenderRow> for Tender {
    fn from(row: TenderRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            budget: row.budget,
            deadline: row.deadline,
            category: row.category,
            kind: row.kind,
            location: row.location,
            created_by: row.created_by,
            created_by_email: row.created_by_email,
            winning_bid_id: row.winning_bid_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BidRow {
    id: Uuid,
    tender_id: Uuid,
    bidder_id: Uuid,
    proposal: String,
    price: Decimal,
    submitted_at: DateTime<Utc>,
    status: String,
}

impl From<BidRow> for Bid {
    fn from(row: BidRow) -> Self {
        Self {
            id: row.id,
            tender_id: row.tender_id,
            bidder_id: row.bidder_id,
            proposal: row.proposal,
            price: row.price,
            submitted_at: row.submitted_at,
            status: BidStatus::parse(&row.status).unwrap_or(BidStatus::Submitted),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn create_tender(&self, tender: Tender) -> StoreResult<Tender> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "INSERT INTO tenders ({TENDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {TENDER_COLUMNS}"
        ))
        .bind(tender.id)
        .bind(&tender.title)
        .bind(&tender.description)
        .bind(tender.budget)
        .bind(tender.deadline)
        .bind(&tender.category)
        .bind(&tender.kind)
        .bind(&tender.location)
        .bind(tender.created_by)
        .bind(&tender.created_by_email)
        .bind(tender.winning_bid_id)
        .bind(tender.created_at)
        .bind(tender.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_tender(&self, id: Uuid) -> StoreResult<Option<Tender>> {
        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_open_tenders(&self, now: DateTime<Utc>) -> StoreResult<Vec<Tender>> {
        let rows = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE deadline > $1 ORDER BY deadline DESC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_tender(
        &self,
        id: Uuid,
        patch: TenderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Tender> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::TenderNotFound(id))?;

        let mut tender: Tender = row.into();
        if tender.winning_bid_id.is_some() {
            return Err(StoreError::AlreadyAwarded);
        }
        patch.apply(&mut tender, now);

        sqlx::query(
            "UPDATE tenders SET title = $2, description = $3, budget = $4, deadline = $5, \
             category = $6, kind = $7, location = $8, updated_at = $9 WHERE id = $1",
        )
        .bind(tender.id)
        .bind(&tender.title)
        .bind(&tender.description)
        .bind(tender.budget)
        .bind(tender.deadline)
        .bind(&tender.category)
        .bind(&tender.kind)
        .bind(&tender.location)
        .bind(tender.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tender)
    }

    async fn delete_tender(&self, id: Uuid) -> StoreResult<()> {
        // Bids go with the tender via the ON DELETE CASCADE foreign key.
        let result = sqlx::query("DELETE FROM tenders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TenderNotFound(id));
        }
        Ok(())
    }

    async fn get_bid(&self, id: Uuid) -> StoreResult<Option<Bid>> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_bid(&self, tender_id: Uuid, bidder_id: Uuid) -> StoreResult<Option<Bid>> {
        let row = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE tender_id = $1 AND bidder_id = $2"
        ))
        .bind(tender_id)
        .bind(bidder_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_bids(&self, tender_id: Uuid) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE tender_id = $1 \
             ORDER BY price ASC, submitted_at ASC, id ASC"
        ))
        .bind(tender_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_bids_by_bidder(&self, bidder_id: Uuid) -> StoreResult<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE bidder_id = $1 \
             ORDER BY submitted_at ASC, id ASC"
        ))
        .bind(bidder_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_bid(&self, bid: Bid) -> StoreResult<Bid> {
        let mut tx = self.pool.begin().await?;

        // Lock the tender row so the deadline check and the insert are one
        // step from the point of view of concurrent submitters.
        let tender: Tender = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1 FOR UPDATE"
        ))
        .bind(bid.tender_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::TenderNotFound(bid.tender_id))?
        .into();

        if !tender.can_accept_bid(bid.submitted_at) {
            return Err(StoreError::WindowClosed);
        }

        let row = sqlx::query_as::<_, BidRow>(&format!(
            "INSERT INTO bids ({BID_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {BID_COLUMNS}"
        ))
        .bind(bid.id)
        .bind(bid.tender_id)
        .bind(bid.bidder_id)
        .bind(&bid.proposal)
        .bind(bid.price)
        .bind(bid.submitted_at)
        .bind(bid.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "ux_bids_tender_bidder") {
                StoreError::DuplicateBid
            } else {
                StoreError::Backend(e)
            }
        })?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn award(&self, tender_id: Uuid, bid_id: Uuid, now: DateTime<Utc>) -> StoreResult<Tender> {
        let mut tx = self.pool.begin().await?;

        let mut tender: Tender = sqlx::query_as::<_, TenderRow>(&format!(
            "SELECT {TENDER_COLUMNS} FROM tenders WHERE id = $1 FOR UPDATE"
        ))
        .bind(tender_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::TenderNotFound(tender_id))?
        .into();

        let bid: Bid = sqlx::query_as::<_, BidRow>(&format!(
            "SELECT {BID_COLUMNS} FROM bids WHERE id = $1"
        ))
        .bind(bid_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::BidNotFound(bid_id))?
        .into();

        if bid.tender_id != tender_id {
            return Err(StoreError::BidNotFound(bid_id));
        }
        if tender.winning_bid_id.is_some() {
            return Err(StoreError::AlreadyAwarded);
        }
        if !tender.can_award(now) {
            return Err(StoreError::WindowStillOpen);
        }

        sqlx::query("UPDATE tenders SET winning_bid_id = $2, updated_at = $3 WHERE id = $1")
            .bind(tender_id)
            .bind(bid_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE bids SET status = $2 WHERE id = $1")
            .bind(bid_id)
            .bind(BidStatus::Won.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tender.winning_bid_id = Some(bid_id);
        tender.updated_at = now;
        Ok(tender)
    }

    async fn health(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}
