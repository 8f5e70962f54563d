use sqlx::PgPool;

use crate::customers::error::CustomerError;
use crate::customers::ledger::{self, LedgerError};
use crate::customers::{LoyaltyCustomer, PointTransaction, TransactionSource};

const CUSTOMER_COLUMNS: &str = "id, program_id, customer_id, current_points, lifetime_points, \
                                tier_id, is_active, created_at, updated_at";

/// Repository for loyalty customer operations
#[derive(Clone)]
pub struct CustomersRepository {
    pool: PgPool,
}

impl CustomersRepository {
    /// Create a new CustomersRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active loyalty customer by id within a merchant scope
    pub async fn find_by_id_scoped(
        &self,
        loyalty_customer_id: i64,
        merchant_id: i64,
    ) -> Result<Option<LoyaltyCustomer>, CustomerError> {
        let customer = sqlx::query_as::<_, LoyaltyCustomer>(
            r#"
            SELECT c.id, c.program_id, c.customer_id, c.current_points, c.lifetime_points,
                   c.tier_id, c.is_active, c.created_at, c.updated_at
            FROM loyalty_customers c
            JOIN loyalty_programs p ON p.id = c.program_id
            WHERE c.id = $1 AND p.merchant_id = $2 AND c.is_active
            "#,
        )
        .bind(loyalty_customer_id)
        .bind(merchant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Check whether a customer is already enrolled in a program
    pub async fn enrollment_exists(
        &self,
        program_id: i64,
        customer_id: i64,
    ) -> Result<bool, CustomerError> {
        let exists: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loyalty_customers
                WHERE program_id = $1 AND customer_id = $2
            )
            "#,
        )
        .bind(program_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.unwrap_or(false))
    }

    /// Enroll a customer with a zero balance and an initial tier
    pub async fn enroll(
        &self,
        program_id: i64,
        customer_id: i64,
        tier_id: i64,
    ) -> Result<LoyaltyCustomer, CustomerError> {
        let customer = sqlx::query_as::<_, LoyaltyCustomer>(&format!(
            r#"
            INSERT INTO loyalty_customers (program_id, customer_id, tier_id)
            VALUES ($1, $2, $3)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(program_id)
        .bind(customer_id)
        .bind(tier_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Assign a customer's tier
    pub async fn set_tier(
        &self,
        loyalty_customer_id: i64,
        tier_id: i64,
    ) -> Result<LoyaltyCustomer, CustomerError> {
        let customer = sqlx::query_as::<_, LoyaltyCustomer>(&format!(
            r#"
            UPDATE loyalty_customers
            SET tier_id = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(tier_id)
        .bind(loyalty_customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(CustomerError::NotFound)?;

        Ok(customer)
    }

    /// Apply a signed point delta as its own transaction
    ///
    /// Used for earns and manual adjustments, where the delta is the only
    /// write. Redemptions run the same primitive inside their own wider
    /// transaction instead.
    pub async fn apply_delta(
        &self,
        loyalty_customer_id: i64,
        delta: i64,
        source: TransactionSource,
        order_id: Option<i64>,
        description: &str,
    ) -> Result<LoyaltyCustomer, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let customer = ledger::apply_delta(
            &mut tx,
            loyalty_customer_id,
            delta,
            source,
            order_id,
            description,
        )
        .await?;

        tx.commit().await?;

        Ok(customer)
    }
}

/// Repository for reading the append-only points ledger
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Create a new LedgerRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a customer's ledger rows, newest first
    pub async fn list_by_customer(
        &self,
        loyalty_customer_id: i64,
    ) -> Result<Vec<PointTransaction>, CustomerError> {
        let transactions = sqlx::query_as::<_, PointTransaction>(
            r#"
            SELECT id, loyalty_customer_id, order_id, source, points, description, created_at
            FROM loyalty_point_transactions
            WHERE loyalty_customer_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(loyalty_customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    // Repository methods are exercised through the service layer against a
    // live database; the delta guard they rely on is unit tested in ledger.rs.
}
