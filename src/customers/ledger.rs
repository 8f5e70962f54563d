// Points ledger primitive
//
// Every balance change goes through apply_delta: one balance update plus one
// immutable ledger row, inside the caller's transaction. The customer row is
// locked FOR UPDATE first, so the sufficiency check for debits always runs
// against the committed balance and concurrent redemptions serialize instead
// of overdrawing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use thiserror::Error;

use crate::customers::{LoyaltyCustomer, TransactionSource};

/// Error types for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Debit would take the balance below zero
    #[error("Insufficient points: have {available}, need {required}")]
    InsufficientPoints { available: i64, required: i64 },

    /// The balance row to debit/credit does not exist
    #[error("Loyalty customer not found: {0}")]
    CustomerMissing(i64),

    /// Delta would push the balance outside the representable range
    #[error("Point delta {delta} is out of range for balance {current_points}")]
    DeltaOutOfRange { current_points: i64, delta: i64 },

    /// Point amount could not be computed from a currency amount
    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Validate a signed delta against the current balance
///
/// Returns the resulting balance, `InsufficientPoints` when a debit would
/// go below zero, or `DeltaOutOfRange` when the sum cannot be represented.
pub fn guard_delta(current_points: i64, delta: i64) -> Result<i64, LedgerError> {
    let next = current_points
        .checked_add(delta)
        .ok_or(LedgerError::DeltaOutOfRange {
            current_points,
            delta,
        })?;
    if next < 0 {
        return Err(LedgerError::InsufficientPoints {
            available: current_points,
            required: delta.saturating_neg(),
        });
    }
    Ok(next)
}

/// Convert a currency amount into whole points
///
/// `amount * rate * multiplier`, floor-rounded — fractional points are never
/// awarded.
pub fn points_for_amount(
    amount: Decimal,
    rate: Decimal,
    multiplier: Decimal,
) -> Result<i64, LedgerError> {
    (amount * rate * multiplier)
        .floor()
        .to_i64()
        .ok_or_else(|| {
            LedgerError::CalculationError(format!(
                "Point amount out of range for amount {} at rate {}",
                amount, rate
            ))
        })
}

/// Apply a signed point delta to a customer inside the caller's transaction
///
/// Locks the customer row, validates the delta, updates `current_points`
/// (and `lifetime_points` for positive earn deltas), then appends the ledger
/// row. Has no transaction boundary of its own: the caller commits or rolls
/// back everything together.
pub async fn apply_delta(
    tx: &mut Transaction<'_, Postgres>,
    loyalty_customer_id: i64,
    delta: i64,
    source: TransactionSource,
    order_id: Option<i64>,
    description: &str,
) -> Result<LoyaltyCustomer, LedgerError> {
    let customer = sqlx::query_as::<_, LoyaltyCustomer>(
        r#"
        SELECT id, program_id, customer_id, current_points, lifetime_points,
               tier_id, is_active, created_at, updated_at
        FROM loyalty_customers
        WHERE id = $1 AND is_active
        FOR UPDATE
        "#,
    )
    .bind(loyalty_customer_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(LedgerError::CustomerMissing(loyalty_customer_id))?;

    let new_balance = guard_delta(customer.current_points, delta)?;

    // Lifetime points only ever grow, and only through earnings
    let lifetime_delta = if source == TransactionSource::Earn && delta > 0 {
        delta
    } else {
        0
    };

    let updated = sqlx::query_as::<_, LoyaltyCustomer>(
        r#"
        UPDATE loyalty_customers
        SET current_points = $1,
            lifetime_points = lifetime_points + $2,
            updated_at = NOW()
        WHERE id = $3
        RETURNING id, program_id, customer_id, current_points, lifetime_points,
                  tier_id, is_active, created_at, updated_at
        "#,
    )
    .bind(new_balance)
    .bind(lifetime_delta)
    .bind(loyalty_customer_id)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO loyalty_point_transactions
            (loyalty_customer_id, order_id, source, points, description)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(loyalty_customer_id)
    .bind(order_id)
    .bind(source)
    .bind(delta)
    .bind(description)
    .execute(&mut **tx)
    .await?;

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_guard_allows_credit() {
        assert_eq!(guard_delta(100, 50).unwrap(), 150);
    }

    #[test]
    fn test_guard_allows_exact_debit() {
        assert_eq!(guard_delta(50, -50).unwrap(), 0);
    }

    #[test]
    fn test_guard_rejects_overdraw() {
        let err = guard_delta(40, -50).unwrap_err();
        match err {
            LedgerError::InsufficientPoints {
                available,
                required,
            } => {
                assert_eq!(available, 40);
                assert_eq!(required, 50);
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_guard_zero_balance_zero_delta() {
        assert_eq!(guard_delta(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_guard_rejects_credit_overflow() {
        let err = guard_delta(1, i64::MAX).unwrap_err();
        match err {
            LedgerError::DeltaOutOfRange {
                current_points,
                delta,
            } => {
                assert_eq!(current_points, 1);
                assert_eq!(delta, i64::MAX);
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_guard_rejects_debit_overflow() {
        let err = guard_delta(-1 + i64::MIN / 2, i64::MIN / 2).unwrap_err();
        assert!(matches!(err, LedgerError::DeltaOutOfRange { .. }));
    }

    #[test]
    fn test_guard_extreme_debit_reports_insufficient() {
        // i64::MIN negates without wrapping in the error payload
        let err = guard_delta(0, i64::MIN).unwrap_err();
        match err {
            LedgerError::InsufficientPoints {
                available,
                required,
            } => {
                assert_eq!(available, 0);
                assert!(required > 0);
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_points_for_amount_floor_rounds() {
        // 105.5 * 0.1 = 10.55 → 10 points
        let points = points_for_amount(dec!(105.5), dec!(0.1), Decimal::ONE).unwrap();
        assert_eq!(points, 10);
    }

    #[test]
    fn test_points_for_amount_applies_multiplier() {
        // 100 * 1.0 * 1.5 = 150
        let points = points_for_amount(dec!(100), Decimal::ONE, dec!(1.5)).unwrap();
        assert_eq!(points, 150);
    }

    #[test]
    fn test_points_for_amount_zero_amount() {
        let points = points_for_amount(Decimal::ZERO, dec!(0.1), Decimal::ONE).unwrap();
        assert_eq!(points, 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // The guard never admits a negative resulting balance
            #[test]
            fn prop_guard_never_goes_negative(
                current in 0i64..1_000_000,
                delta in -1_000_000i64..1_000_000,
            ) {
                match guard_delta(current, delta) {
                    Ok(next) => prop_assert!(next >= 0),
                    Err(_) => prop_assert!(current + delta < 0),
                }
            }

            // A debit followed by the matching credit restores the balance
            #[test]
            fn prop_debit_credit_symmetry(
                current in 0i64..1_000_000,
                debit in 0i64..1_000_000,
            ) {
                if let Ok(after_debit) = guard_delta(current, -debit) {
                    let restored = guard_delta(after_debit, debit).unwrap();
                    prop_assert_eq!(restored, current);
                }
            }
        }
    }
}
