use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Reward type enum describing what a reward grants when redeemed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Discount,
    Cashback,
    FreeProduct,
}

impl RewardType {
    /// Convert reward type to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Discount => "discount",
            RewardType::Cashback => "cashback",
            RewardType::FreeProduct => "free_product",
        }
    }
}

impl std::fmt::Display for RewardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a loyalty program owned by one merchant
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyProgram {
    pub id: i64,
    pub merchant_id: i64,
    pub name: String,
    pub points_per_currency: Decimal,
    pub min_points_to_redeem: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model representing a redeemable reward within a program
///
/// `cost_points` is the canonical debit amount for a redemption; callers
/// never supply a cost of their own.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoyaltyReward {
    pub id: i64,
    pub program_id: i64,
    pub name: String,
    pub reward_type: RewardType,
    pub cost_points: i64,
    pub discount_value: Option<Decimal>,
    pub cashback_value: Option<Decimal>,
    pub free_product_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoyaltyReward {
    /// Default coupon discount for this reward: the discount payload when
    /// present, otherwise the cashback payload.
    pub fn default_discount(&self) -> Option<Decimal> {
        self.discount_value.or(self.cashback_value)
    }
}

/// Domain model for an order reference resolved within a merchant scope
///
/// Orders live outside the loyalty core; only the scoped lookup is needed
/// here to validate redemption and coupon references.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderRef {
    pub id: i64,
    pub merchant_id: i64,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reward(discount: Option<Decimal>, cashback: Option<Decimal>) -> LoyaltyReward {
        LoyaltyReward {
            id: 1,
            program_id: 1,
            name: "Free espresso".to_string(),
            reward_type: RewardType::Discount,
            cost_points: 50,
            discount_value: discount,
            cashback_value: cashback,
            free_product_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_discount_prefers_discount_value() {
        let r = reward(Some(dec!(5.00)), Some(dec!(2.00)));
        assert_eq!(r.default_discount(), Some(dec!(5.00)));
    }

    #[test]
    fn test_default_discount_falls_back_to_cashback() {
        let r = reward(None, Some(dec!(2.00)));
        assert_eq!(r.default_discount(), Some(dec!(2.00)));
    }

    #[test]
    fn test_default_discount_none_when_no_payload() {
        let r = reward(None, None);
        assert_eq!(r.default_discount(), None);
    }

    #[test]
    fn test_reward_type_serialization() {
        let json = serde_json::to_string(&RewardType::FreeProduct).unwrap();
        assert_eq!(json, "\"free_product\"");
    }
}
