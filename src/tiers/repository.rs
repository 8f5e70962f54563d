use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::tiers::error::TierError;
use crate::tiers::LoyaltyTier;

const TIER_COLUMNS: &str = "id, program_id, name, level, min_points, multiplier, benefits, \
                            is_active, created_at, updated_at";

/// Repository for tier operations
#[derive(Clone)]
pub struct TiersRepository {
    pool: PgPool,
}

impl TiersRepository {
    /// Create a new TiersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active tier by id within a merchant scope
    pub async fn find_by_id_scoped(
        &self,
        tier_id: i64,
        merchant_id: i64,
    ) -> Result<Option<LoyaltyTier>, TierError> {
        let tier = sqlx::query_as::<_, LoyaltyTier>(
            r#"
            SELECT t.id, t.program_id, t.name, t.level, t.min_points, t.multiplier,
                   t.benefits, t.is_active, t.created_at, t.updated_at
            FROM loyalty_tiers t
            JOIN loyalty_programs p ON p.id = t.program_id
            WHERE t.id = $1 AND p.merchant_id = $2 AND t.is_active
            "#,
        )
        .bind(tier_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tier)
    }

    /// Find all active tiers of a program, highest threshold first
    pub async fn find_active_by_program(
        &self,
        program_id: i64,
    ) -> Result<Vec<LoyaltyTier>, TierError> {
        let tiers = sqlx::query_as::<_, LoyaltyTier>(&format!(
            r#"
            SELECT {TIER_COLUMNS}
            FROM loyalty_tiers
            WHERE program_id = $1 AND is_active
            ORDER BY min_points DESC, id
            "#
        ))
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// Check whether an active tier with the given name exists in a program,
    /// optionally excluding one tier id (for updates)
    pub async fn name_exists(
        &self,
        program_id: i64,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, TierError> {
        let exists: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loyalty_tiers
                WHERE program_id = $1 AND name = $2 AND is_active
                  AND ($3::BIGINT IS NULL OR id != $3)
            )
            "#,
        )
        .bind(program_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    /// Insert a new active tier
    pub async fn create(
        &self,
        program_id: i64,
        name: &str,
        min_points: i64,
        multiplier: Decimal,
        benefits: serde_json::Value,
    ) -> Result<LoyaltyTier, TierError> {
        let tier = sqlx::query_as::<_, LoyaltyTier>(&format!(
            r#"
            INSERT INTO loyalty_tiers (program_id, name, min_points, multiplier, benefits)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TIER_COLUMNS}
            "#
        ))
        .bind(program_id)
        .bind(name)
        .bind(min_points)
        .bind(multiplier)
        .bind(benefits)
        .fetch_one(&self.pool)
        .await?;

        Ok(tier)
    }

    /// Update a tier's client-settable fields
    pub async fn update(
        &self,
        tier_id: i64,
        name: &str,
        min_points: i64,
        multiplier: Decimal,
        benefits: serde_json::Value,
    ) -> Result<LoyaltyTier, TierError> {
        let tier = sqlx::query_as::<_, LoyaltyTier>(&format!(
            r#"
            UPDATE loyalty_tiers
            SET name = $1, min_points = $2, multiplier = $3, benefits = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {TIER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(min_points)
        .bind(multiplier)
        .bind(benefits)
        .bind(tier_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TierError::NotFound)?;

        Ok(tier)
    }

    /// Soft-delete a tier
    pub async fn soft_delete(&self, tier_id: i64) -> Result<(), TierError> {
        let result = sqlx::query(
            "UPDATE loyalty_tiers SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(tier_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TierError::NotFound);
        }

        Ok(())
    }

    /// Persist recomputed levels for a program's tiers in one transaction
    ///
    /// Ranks are relative, so a partial write would leave the catalog
    /// inconsistent; all assignments commit or none do.
    pub async fn update_levels(&self, assignments: &[(i64, i32)]) -> Result<(), TierError> {
        let mut tx = self.pool.begin().await?;

        for (tier_id, level) in assignments {
            sqlx::query("UPDATE loyalty_tiers SET level = $1, updated_at = NOW() WHERE id = $2")
                .bind(level)
                .bind(tier_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run against a live database and are covered through
    // the service layer; the dense-rank logic they persist is unit tested in
    // ranking.rs.
}
