use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Temporal state of a tender, computed from the deadline and the award
/// mark at the instant of evaluation. Never stored: a cached status column
/// would go stale the moment the deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenderPhase {
    /// Deadline ahead, no winner set; accepting bids.
    Open,
    /// Deadline passed, no winner set; awaiting evaluation.
    Expired,
    /// Winner committed. Terminal.
    Awarded,
}

/// Tender entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tender {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: Decimal,
    pub deadline: DateTime<Utc>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub created_by: Uuid,
    pub created_by_email: String,
    pub winning_bid_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tender {
    pub fn phase(&self, now: DateTime<Utc>) -> TenderPhase {
        if self.winning_bid_id.is_some() {
            TenderPhase::Awarded
        } else if now < self.deadline {
            TenderPhase::Open
        } else {
            TenderPhase::Expired
        }
    }

    /// Bids are admissible only while the tender is open.
    pub fn can_accept_bid(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) == TenderPhase::Open
    }

    /// Awarding requires the bidding window to have fully closed first,
    /// so a result cannot be locked in while bids are still arriving.
    pub fn can_award(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) == TenderPhase::Expired
    }
}

/// Request DTO for creating a tender
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenderRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub budget: Decimal,
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl CreateTenderRequest {
    /// Validate and build the tender entity on behalf of the creating
    /// officer.
    pub fn build(
        self,
        created_by: Uuid,
        created_by_email: String,
        now: DateTime<Utc>,
    ) -> Result<Tender, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::invalid_input("title must not be empty"));
        }
        if self.budget < Decimal::ZERO {
            return Err(ApiError::invalid_input("budget must not be negative"));
        }

        Ok(Tender {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description.unwrap_or_default(),
            budget: self.budget,
            deadline: self.deadline,
            category: self.category.unwrap_or_default(),
            kind: self.kind.unwrap_or_else(|| "Open".to_string()),
            location: self.location.unwrap_or_default(),
            created_by,
            created_by_email,
            winning_bid_id: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for a tender; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenderPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl TenderPatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ApiError::invalid_input("title must not be empty"));
            }
        }
        if let Some(budget) = self.budget {
            if budget < Decimal::ZERO {
                return Err(ApiError::invalid_input("budget must not be negative"));
            }
        }
        Ok(())
    }

    /// Apply the patch to an existing tender, stamping `updated_at`.
    pub fn apply(self, tender: &mut Tender, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            tender.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            tender.description = description;
        }
        if let Some(budget) = self.budget {
            tender.budget = budget;
        }
        if let Some(deadline) = self.deadline {
            tender.deadline = deadline;
        }
        if let Some(category) = self.category {
            tender.category = category;
        }
        if let Some(kind) = self.kind {
            tender.kind = kind;
        }
        if let Some(location) = self.location {
            tender.location = location;
        }
        tender.updated_at = now;
    }
}

/// Response DTO for tender
#[derive(Debug, Clone, Serialize)]
pub struct TenderResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub budget: Decimal,
    pub deadline: DateTime<Utc>,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub created_by_email: String,
    pub winning_bid_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tender> for TenderResponse {
    fn from(t: Tender) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            budget: t.budget,
            deadline: t.deadline,
            category: t.category,
            kind: t.kind,
            location: t.location,
            created_by_email: t.created_by_email,
            winning_bid_id: t.winning_bid_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
