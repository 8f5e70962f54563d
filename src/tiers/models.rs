use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Domain model representing a loyalty tier
///
/// `level` is derived by dense rank over the program's thresholds and is
/// never accepted from a client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyTier {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub level: i32,
    pub min_points: i64,
    pub multiplier: Decimal,
    pub benefits: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a tier
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTierRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, message = "min_points must be non-negative"))]
    pub min_points: i64,
    pub multiplier: Option<Decimal>,
    pub benefits: Option<serde_json::Value>,
}

/// Request payload for updating a tier
///
/// Omitted fields keep their current values. `level` is absent on purpose.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTierRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "min_points must be non-negative"))]
    pub min_points: Option<i64>,
    pub multiplier: Option<Decimal>,
    pub benefits: Option<serde_json::Value>,
}
