use sqlx::PgPool;

use crate::programs::{LoyaltyProgram, LoyaltyReward, OrderRef};

/// Repository for loyalty program lookups
///
/// Programs carry the merchant id, so every other loyalty table is scoped
/// by joining through this one.
#[derive(Clone)]
pub struct ProgramsRepository {
    pool: PgPool,
}

impl ProgramsRepository {
    /// Create a new ProgramsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active program by id within a merchant scope
    pub async fn find_by_id_scoped(
        &self,
        program_id: i64,
        merchant_id: i64,
    ) -> Result<Option<LoyaltyProgram>, sqlx::Error> {
        let program = sqlx::query_as::<_, LoyaltyProgram>(
            r#"
            SELECT id, merchant_id, name, points_per_currency, min_points_to_redeem,
                   is_active, created_at, updated_at
            FROM loyalty_programs
            WHERE id = $1 AND merchant_id = $2 AND is_active
            "#,
        )
        .bind(program_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(program)
    }
}

/// Repository for reward lookups
#[derive(Clone)]
pub struct RewardsRepository {
    pool: PgPool,
}

impl RewardsRepository {
    /// Create a new RewardsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active reward by id within a merchant scope, joined through
    /// the owning program
    pub async fn find_by_id_scoped(
        &self,
        reward_id: i64,
        merchant_id: i64,
    ) -> Result<Option<LoyaltyReward>, sqlx::Error> {
        let reward = sqlx::query_as::<_, LoyaltyReward>(
            r#"
            SELECT r.id, r.program_id, r.name, r.reward_type, r.cost_points,
                   r.discount_value, r.cashback_value, r.free_product_id,
                   r.is_active, r.created_at, r.updated_at
            FROM loyalty_rewards r
            JOIN loyalty_programs p ON p.id = r.program_id
            WHERE r.id = $1 AND p.merchant_id = $2 AND r.is_active
            "#,
        )
        .bind(reward_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }
}

/// Repository for order reference lookups
///
/// The loyalty core never mutates orders; it only resolves them inside the
/// caller's merchant scope before linking a redemption or coupon to one.
#[derive(Clone)]
pub struct OrdersRepository {
    pool: PgPool,
}

impl OrdersRepository {
    /// Create a new OrdersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an order by id within a merchant scope
    pub async fn find_by_id_scoped(
        &self,
        order_id: i64,
        merchant_id: i64,
    ) -> Result<Option<OrderRef>, sqlx::Error> {
        let order = sqlx::query_as::<_, OrderRef>(
            r#"
            SELECT id, merchant_id, total_amount, created_at
            FROM orders
            WHERE id = $1 AND merchant_id = $2
            "#,
        )
        .bind(order_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods are exercised through the service layers against a
    // live database; unit coverage lives with the pure logic in each module.
}
