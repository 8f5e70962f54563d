use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::coupons::error::CouponError;
use crate::coupons::{Coupon, CouponStatus};

const COUPON_COLUMNS: &str = "id, loyalty_customer_id, reward_id, order_id, code, status, \
                              discount_value, expires_at, redeemed_at, is_active, \
                              created_at, updated_at";

/// Repository for coupon operations
#[derive(Clone)]
pub struct CouponsRepository {
    pool: PgPool,
}

impl CouponsRepository {
    /// Create a new CouponsRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by id within a merchant scope
    pub async fn find_by_id_scoped(
        &self,
        coupon_id: i64,
        merchant_id: i64,
    ) -> Result<Option<Coupon>, CouponError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT k.id, k.loyalty_customer_id, k.reward_id, k.order_id, k.code, k.status,
                   k.discount_value, k.expires_at, k.redeemed_at, k.is_active,
                   k.created_at, k.updated_at
            FROM loyalty_coupons k
            JOIN loyalty_customers c ON c.id = k.loyalty_customer_id
            JOIN loyalty_programs p ON p.id = c.program_id
            WHERE k.id = $1 AND p.merchant_id = $2 AND k.is_active
            "#,
        )
        .bind(coupon_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Find the row holding a code
    ///
    /// Codes are unique among active coupons only; among inactive rows the
    /// most recently touched one is the reactivation candidate.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, CouponError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            SELECT {COUPON_COLUMNS}
            FROM loyalty_coupons
            WHERE code = $1
            ORDER BY is_active DESC, updated_at DESC
            LIMIT 1
            "#
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// List a customer's coupons, newest first
    pub async fn list_by_customer(
        &self,
        loyalty_customer_id: i64,
    ) -> Result<Vec<Coupon>, CouponError> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            SELECT {COUPON_COLUMNS}
            FROM loyalty_coupons
            WHERE loyalty_customer_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(loyalty_customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Insert a new active coupon
    pub async fn create(
        &self,
        loyalty_customer_id: i64,
        reward_id: i64,
        code: &str,
        discount_value: Option<Decimal>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Coupon, CouponError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            INSERT INTO loyalty_coupons
                (loyalty_customer_id, reward_id, code, discount_value, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(loyalty_customer_id)
        .bind(reward_id)
        .bind(code)
        .bind(discount_value)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(coupon)
    }

    /// Resurrect a soft-deleted coupon row in place
    ///
    /// The row keeps its id; ownership, payload and status are reset as if
    /// freshly issued.
    pub async fn reactivate(
        &self,
        coupon_id: i64,
        loyalty_customer_id: i64,
        reward_id: i64,
        discount_value: Option<Decimal>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Coupon, CouponError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            UPDATE loyalty_coupons
            SET is_active = TRUE,
                loyalty_customer_id = $1,
                reward_id = $2,
                order_id = NULL,
                status = 'active',
                discount_value = $3,
                expires_at = $4,
                redeemed_at = NULL,
                updated_at = NOW()
            WHERE id = $5
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(loyalty_customer_id)
        .bind(reward_id)
        .bind(discount_value)
        .bind(expires_at)
        .bind(coupon_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CouponError::NotFound)?;

        Ok(coupon)
    }

    /// Persist a coupon update
    pub async fn update(
        &self,
        coupon_id: i64,
        status: CouponStatus,
        order_id: Option<i64>,
        discount_value: Option<Decimal>,
        expires_at: Option<DateTime<Utc>>,
        redeemed_at: Option<DateTime<Utc>>,
    ) -> Result<Coupon, CouponError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            UPDATE loyalty_coupons
            SET status = $1,
                order_id = $2,
                discount_value = $3,
                expires_at = $4,
                redeemed_at = $5,
                updated_at = NOW()
            WHERE id = $6 AND is_active
            RETURNING {COUPON_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(order_id)
        .bind(discount_value)
        .bind(expires_at)
        .bind(redeemed_at)
        .bind(coupon_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CouponError::NotFound)?;

        Ok(coupon)
    }

    /// Soft-delete a coupon, freeing its code
    pub async fn soft_delete(&self, coupon_id: i64) -> Result<(), CouponError> {
        let result = sqlx::query(
            "UPDATE loyalty_coupons SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(coupon_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CouponError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Repository methods run against a live database; the code lookup
    // classification and the status machine they serve are unit tested in
    // models.rs and status_machine.rs.
}
