use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Claims;
use crate::error::ApiError;

/// Role carried by the identity token.
///
/// The identity service is the single source of truth for roles; this
/// service only reads the claim and never re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bidder,
    Officer,
    Evaluator,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bidder" => Some(Self::Bidder),
            "officer" => Some(Self::Officer),
            "evaluator" => Some(Self::Evaluator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bidder => "bidder",
            Self::Officer => "officer",
            Self::Evaluator => "evaluator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity attached to a request after token verification.
/// Ephemeral: supplied per request, never persisted.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

impl Principal {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
        let role = Role::parse(&claims.role).ok_or("Unknown role in token")?;

        Ok(Self {
            user_id,
            role,
            email: claims.email.clone(),
        })
    }

    /// Authorization predicate: the operation requires exactly `role`.
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("{role} role required")))
        }
    }

    /// Bid details are visible to officers and evaluators, and to the
    /// bidder who owns the bid.
    pub fn may_view_bid(&self, bidder_id: Uuid) -> bool {
        match self.role {
            Role::Officer | Role::Evaluator => true,
            Role::Bidder => self.user_id == bidder_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role,
            email: "user@example.com".to_string(),
        }
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse("Officer"), Some(Role::Officer));
        assert_eq!(Role::parse("bidder"), Some(Role::Bidder));
        assert_eq!(Role::parse("EVALUATOR"), Some(Role::Evaluator));
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn require_role_rejects_other_roles() {
        assert!(principal(Role::Officer).require_role(Role::Officer).is_ok());
        assert!(principal(Role::Bidder).require_role(Role::Officer).is_err());
        assert!(principal(Role::Evaluator).require_role(Role::Bidder).is_err());
    }

    #[test]
    fn bidders_only_see_their_own_bids() {
        let bidder = principal(Role::Bidder);
        assert!(bidder.may_view_bid(bidder.user_id));
        assert!(!bidder.may_view_bid(Uuid::new_v4()));

        assert!(principal(Role::Officer).may_view_bid(Uuid::new_v4()));
        assert!(principal(Role::Evaluator).may_view_bid(Uuid::new_v4()));
    }
}
