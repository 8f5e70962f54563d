use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Source of a point transaction, recorded on every ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    Earn,
    Redemption,
    ManualAdjust,
}

impl TransactionSource {
    /// Convert source to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Earn => "earn",
            TransactionSource::Redemption => "redemption",
            TransactionSource::ManualAdjust => "manual_adjust",
        }
    }
}

impl std::fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a customer enrolled in a loyalty program
///
/// `current_points` and `lifetime_points` are mutated only through
/// ledger-backed deltas; `tier_id` only through tier evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyCustomer {
    pub id: i64,
    pub program_id: i64,
    pub customer_id: i64,
    pub current_points: i64,
    pub lifetime_points: i64,
    pub tier_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model representing one immutable ledger row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PointTransaction {
    pub id: i64,
    pub loyalty_customer_id: i64,
    pub order_id: Option<i64>,
    pub source: TransactionSource,
    pub points: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload for enrolling a customer into a program
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnrollCustomerRequest {
    #[validate(range(min = 1, message = "program_id must be positive"))]
    pub program_id: i64,
    #[validate(range(min = 1, message = "customer_id must be positive"))]
    pub customer_id: i64,
}

/// Request payload for awarding points from a purchase amount
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EarnPointsRequest {
    #[validate(range(min = 1, message = "order_id must be positive"))]
    pub order_id: Option<i64>,
    pub amount: Decimal,
}

/// Request payload for a manual point adjustment
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustPointsRequest {
    pub points: i64,
    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: String,
}
