use sqlx::PgPool;

use crate::customers::{ledger, TransactionSource};
use crate::redemptions::error::RedemptionError;
use crate::redemptions::Redemption;

const REDEMPTION_COLUMNS: &str = "id, loyalty_customer_id, reward_id, order_id, redeemed_points, \
                                  redeemed_at, is_active, created_at, updated_at";

/// Repository for redemption operations
///
/// The mutating methods own the transaction boundary: the point delta, the
/// balance update and the redemption row commit together or not at all.
#[derive(Clone)]
pub struct RedemptionsRepository {
    pool: PgPool,
}

impl RedemptionsRepository {
    /// Create a new RedemptionsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active redemption by id within a merchant scope
    ///
    /// Reversed (inactive) redemptions are not visible here; reversing one
    /// twice reports NotFound.
    pub async fn find_by_id_scoped(
        &self,
        redemption_id: i64,
        merchant_id: i64,
    ) -> Result<Option<Redemption>, RedemptionError> {
        let redemption = sqlx::query_as::<_, Redemption>(
            r#"
            SELECT r.id, r.loyalty_customer_id, r.reward_id, r.order_id, r.redeemed_points,
                   r.redeemed_at, r.is_active, r.created_at, r.updated_at
            FROM loyalty_reward_redemptions r
            JOIN loyalty_customers c ON c.id = r.loyalty_customer_id
            JOIN loyalty_programs p ON p.id = c.program_id
            WHERE r.id = $1 AND p.merchant_id = $2 AND r.is_active
            "#,
        )
        .bind(redemption_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(redemption)
    }

    /// Find the row holding the business key (customer, reward, order)
    ///
    /// At most one active row exists per key; among inactive rows the most
    /// recently touched one is the reactivation candidate.
    pub async fn find_by_key(
        &self,
        loyalty_customer_id: i64,
        reward_id: i64,
        order_id: i64,
    ) -> Result<Option<Redemption>, RedemptionError> {
        let redemption = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM loyalty_reward_redemptions
            WHERE loyalty_customer_id = $1 AND reward_id = $2 AND order_id = $3
            ORDER BY is_active DESC, updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(loyalty_customer_id)
        .bind(reward_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(redemption)
    }

    /// List a customer's redemptions, newest first
    pub async fn list_by_customer(
        &self,
        loyalty_customer_id: i64,
    ) -> Result<Vec<Redemption>, RedemptionError> {
        let redemptions = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM loyalty_reward_redemptions
            WHERE loyalty_customer_id = $1
            ORDER BY redeemed_at DESC, id DESC
            "#
        ))
        .bind(loyalty_customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(redemptions)
    }

    /// Debit the customer and insert a new active redemption, atomically
    pub async fn redeem_new(
        &self,
        loyalty_customer_id: i64,
        reward_id: i64,
        order_id: i64,
        cost_points: i64,
        description: &str,
    ) -> Result<Redemption, RedemptionError> {
        let mut tx = self.pool.begin().await?;

        ledger::apply_delta(
            &mut tx,
            loyalty_customer_id,
            -cost_points,
            TransactionSource::Redemption,
            Some(order_id),
            description,
        )
        .await?;

        let redemption = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            INSERT INTO loyalty_reward_redemptions
                (loyalty_customer_id, reward_id, order_id, redeemed_points)
            VALUES ($1, $2, $3, $4)
            RETURNING {REDEMPTION_COLUMNS}
            "#
        ))
        .bind(loyalty_customer_id)
        .bind(reward_id)
        .bind(order_id)
        .bind(cost_points)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(redemption)
    }

    /// Debit the customer and resurrect an inactive redemption row, atomically
    ///
    /// The snapshot fields are refreshed: the row records the cost charged
    /// now, not the cost charged when the row was first created.
    pub async fn redeem_reactivate(
        &self,
        redemption_id: i64,
        loyalty_customer_id: i64,
        order_id: i64,
        cost_points: i64,
        description: &str,
    ) -> Result<Redemption, RedemptionError> {
        let mut tx = self.pool.begin().await?;

        ledger::apply_delta(
            &mut tx,
            loyalty_customer_id,
            -cost_points,
            TransactionSource::Redemption,
            Some(order_id),
            description,
        )
        .await?;

        let redemption = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE loyalty_reward_redemptions
            SET is_active = TRUE,
                redeemed_points = $1,
                redeemed_at = NOW(),
                updated_at = NOW()
            WHERE id = $2
            RETURNING {REDEMPTION_COLUMNS}
            "#
        ))
        .bind(cost_points)
        .bind(redemption_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RedemptionError::NotFound)?;

        tx.commit().await?;

        Ok(redemption)
    }

    /// Refund the snapshot and deactivate the redemption, atomically
    pub async fn reverse(&self, redemption: &Redemption) -> Result<Redemption, RedemptionError> {
        let mut tx = self.pool.begin().await?;

        ledger::apply_delta(
            &mut tx,
            redemption.loyalty_customer_id,
            redemption.redeemed_points,
            TransactionSource::ManualAdjust,
            Some(redemption.order_id),
            &format!("Refund for redemption {}", redemption.id),
        )
        .await?;

        let reversed = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE loyalty_reward_redemptions
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active
            RETURNING {REDEMPTION_COLUMNS}
            "#
        ))
        .bind(redemption.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RedemptionError::NotFound)?;

        tx.commit().await?;

        Ok(reversed)
    }

    /// Re-point a redemption's reward/order references without moving points
    pub async fn update_refs(
        &self,
        redemption_id: i64,
        reward_id: i64,
        order_id: i64,
    ) -> Result<Redemption, RedemptionError> {
        let redemption = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE loyalty_reward_redemptions
            SET reward_id = $1, order_id = $2, updated_at = NOW()
            WHERE id = $3 AND is_active
            RETURNING {REDEMPTION_COLUMNS}
            "#
        ))
        .bind(reward_id)
        .bind(order_id)
        .bind(redemption_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RedemptionError::NotFound)?;

        Ok(redemption)
    }
}

#[cfg(test)]
mod tests {
    // Transactional paths require a live database; the key classification
    // and the balance guard they depend on are unit tested in models.rs and
    // customers/ledger.rs.
}
