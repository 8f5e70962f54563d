use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Domain model representing a reward redemption
///
/// `redeemed_points` snapshots the reward's cost at redemption time; a
/// reversal always refunds this snapshot, never the reward's current cost.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Redemption {
    pub id: i64,
    pub loyalty_customer_id: i64,
    pub reward_id: i64,
    pub order_id: i64,
    pub redeemed_points: i64,
    pub redeemed_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for redeeming a reward
///
/// The debit amount is never part of the request; it always comes from the
/// reward itself.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RedeemRequest {
    #[validate(range(min = 1, message = "loyalty_customer_id must be positive"))]
    pub loyalty_customer_id: i64,
    #[validate(range(min = 1, message = "reward_id must be positive"))]
    pub reward_id: i64,
    #[validate(range(min = 1, message = "order_id must be positive"))]
    pub order_id: i64,
}

/// Request payload for re-pointing a redemption's references
///
/// Reference updates never move points.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRedemptionRequest {
    #[validate(range(min = 1, message = "reward_id must be positive"))]
    pub reward_id: Option<i64>,
    #[validate(range(min = 1, message = "order_id must be positive"))]
    pub order_id: Option<i64>,
}

/// How a redeem request was satisfied, used for response wording only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemAction {
    Created,
    Reactivated,
}

impl RedeemAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedeemAction::Created => "created",
            RedeemAction::Reactivated => "reactivated",
        }
    }
}

/// Response payload for a redeem call
#[derive(Debug, Clone, Serialize)]
pub struct RedeemResponse {
    pub action: RedeemAction,
    #[serde(flatten)]
    pub redemption: Redemption,
}

/// Classification of an existing redemption row for the business key
/// (customer, reward, order)
///
/// The reactivate-instead-of-insert idempotency pattern: an active row is a
/// duplicate, an inactive row is the reactivation target, no row means a
/// plain insert.
#[derive(Debug, Clone)]
pub enum KeyLookup {
    Absent,
    ActiveConflict(Redemption),
    Reactivatable(Redemption),
}

impl KeyLookup {
    /// Classify the (at most one) row found for a business key
    pub fn classify(existing: Option<Redemption>) -> Self {
        match existing {
            None => KeyLookup::Absent,
            Some(row) if row.is_active => KeyLookup::ActiveConflict(row),
            Some(row) => KeyLookup::Reactivatable(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redemption(is_active: bool) -> Redemption {
        Redemption {
            id: 11,
            loyalty_customer_id: 1,
            reward_id: 2,
            order_id: 3,
            redeemed_points: 50,
            redeemed_at: Utc::now(),
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_classify_absent() {
        assert!(matches!(KeyLookup::classify(None), KeyLookup::Absent));
    }

    #[test]
    fn test_classify_active_row_is_conflict() {
        match KeyLookup::classify(Some(redemption(true))) {
            KeyLookup::ActiveConflict(row) => assert_eq!(row.id, 11),
            other => panic!("Unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_inactive_row_is_reactivation_target() {
        match KeyLookup::classify(Some(redemption(false))) {
            KeyLookup::Reactivatable(row) => assert_eq!(row.id, 11),
            other => panic!("Unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_redeem_action_labels() {
        assert_eq!(RedeemAction::Created.as_str(), "created");
        assert_eq!(RedeemAction::Reactivated.as_str(), "reactivated");
    }
}
