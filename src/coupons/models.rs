use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Coupon status enum
///
/// Orthogonal to the `is_active` soft-delete flag: status records what
/// happened to the coupon, `is_active` records whether the row is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Redeemed,
    Cancelled,
}

impl CouponStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => "active",
            CouponStatus::Redeemed => "redeemed",
            CouponStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for CouponStatus {
    fn default() -> Self {
        CouponStatus::Active
    }
}

impl std::fmt::Display for CouponStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a discount coupon
///
/// Coupons are independent of the points ledger: redeeming a coupon moves no
/// points.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Coupon {
    pub id: i64,
    pub loyalty_customer_id: i64,
    pub reward_id: i64,
    pub order_id: Option<i64>,
    pub code: String,
    pub status: CouponStatus,
    pub discount_value: Option<Decimal>,
    pub expires_at: Option<DateTime<Utc>>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for issuing a coupon
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IssueCouponRequest {
    #[validate(range(min = 1, message = "loyalty_customer_id must be positive"))]
    pub loyalty_customer_id: i64,
    #[validate(range(min = 1, message = "reward_id must be positive"))]
    pub reward_id: i64,
    #[validate(length(min = 1, max = 64, message = "Code must be 1-64 characters"))]
    pub code: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// Defaults to the reward's own discount/cashback value when omitted
    pub discount_value: Option<Decimal>,
}

/// Request payload for updating a coupon
///
/// A transition to `redeemed` requires an order id and stamps `redeemed_at`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCouponRequest {
    pub status: Option<CouponStatus>,
    #[validate(range(min = 1, message = "order_id must be positive"))]
    pub order_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub discount_value: Option<Decimal>,
}

/// How an issue request was satisfied, used for response wording only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    Created,
    Reactivated,
}

impl IssueAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueAction::Created => "created",
            IssueAction::Reactivated => "reactivated",
        }
    }
}

/// Response payload for an issue call
#[derive(Debug, Clone, Serialize)]
pub struct IssueCouponResponse {
    pub action: IssueAction,
    #[serde(flatten)]
    pub coupon: Coupon,
}

/// Classification of an existing coupon row for a code
///
/// Same reactivate-instead-of-insert pattern as redemptions, keyed on the
/// coupon code: active row is a conflict, inactive row is the reactivation
/// target.
#[derive(Debug, Clone)]
pub enum CodeLookup {
    Absent,
    ActiveConflict(Coupon),
    Reactivatable(Coupon),
}

impl CodeLookup {
    /// Classify the (at most one) row found for a code
    pub fn classify(existing: Option<Coupon>) -> Self {
        match existing {
            None => CodeLookup::Absent,
            Some(row) if row.is_active => CodeLookup::ActiveConflict(row),
            Some(row) => CodeLookup::Reactivatable(row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coupon(is_active: bool) -> Coupon {
        Coupon {
            id: 5,
            loyalty_customer_id: 1,
            reward_id: 2,
            order_id: None,
            code: "WELCOME10".to_string(),
            status: CouponStatus::Active,
            discount_value: Some(dec!(10.00)),
            expires_at: None,
            redeemed_at: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_classify_absent() {
        assert!(matches!(CodeLookup::classify(None), CodeLookup::Absent));
    }

    #[test]
    fn test_classify_active_row_is_conflict() {
        match CodeLookup::classify(Some(coupon(true))) {
            CodeLookup::ActiveConflict(row) => assert_eq!(row.id, 5),
            other => panic!("Unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_inactive_row_is_reactivation_target() {
        match CodeLookup::classify(Some(coupon(false))) {
            CodeLookup::Reactivatable(row) => assert_eq!(row.id, 5),
            other => panic!("Unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&CouponStatus::Redeemed).unwrap(),
            "\"redeemed\""
        );
    }
}
