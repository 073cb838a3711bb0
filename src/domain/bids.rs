use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bid status
///
/// `Won` is set exclusively by the award path. `Rejected` is part of the
/// model but nothing sets it automatically; losing bids stay `Submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Submitted,
    Rejected,
    Won,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Rejected => "rejected",
            Self::Won => "won",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(Self::Submitted),
            "rejected" => Some(Self::Rejected),
            "won" => Some(Self::Won),
            _ => None,
        }
    }
}

/// Bid entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub bidder_id: Uuid,
    pub proposal: String,
    pub price: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub status: BidStatus,
}

/// Request DTO for submitting a bid
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBidRequest {
    #[serde(default)]
    pub proposal: Option<String>,
    pub price: Decimal,
}

/// Response DTO for bid
#[derive(Debug, Clone, Serialize)]
pub struct BidResponse {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub bidder_id: Uuid,
    pub proposal: String,
    pub price: Decimal,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<Bid> for BidResponse {
    fn from(b: Bid) -> Self {
        Self {
            id: b.id,
            tender_id: b.tender_id,
            bidder_id: b.bidder_id,
            proposal: b.proposal,
            price: b.price,
            status: b.status,
            submitted_at: b.submitted_at,
        }
    }
}

/// Bidder-facing view of an own bid with its tender's context
#[derive(Debug, Clone, Serialize)]
pub struct MyBidResponse {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub tender_title: String,
    pub price: Decimal,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
    pub tender_deadline: DateTime<Utc>,
    pub days_remaining: i64,
}

/// Full bid details with tender context, role-gated at the handler
#[derive(Debug, Clone, Serialize)]
pub struct BidDetailsResponse {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub tender_title: String,
    pub bidder_id: Uuid,
    pub proposal: String,
    pub price: Decimal,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
    pub tender_deadline: DateTime<Utc>,
}

/// Lowest-price recommendation returned by the evaluation preview
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSuggestion {
    pub bid_id: Uuid,
    pub price: Decimal,
    pub proposal: String,
}

/// Winner summary for a tender once the award has been committed
#[derive(Debug, Clone, Serialize)]
pub struct WinnerResponse {
    pub bid_id: Uuid,
    pub bidder_id: Uuid,
    pub price: Decimal,
    pub proposal: String,
}
