use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::coupons::{
    CodeLookup, Coupon, CouponError, CouponStatus, CouponsRepository, IssueAction,
    IssueCouponRequest, StatusMachine, UpdateCouponRequest,
};
use crate::customers::CustomersRepository;
use crate::programs::{OrdersRepository, RewardsRepository};

/// Service for coupon issuance and lifecycle
///
/// Coupons share the redemptions' reactivate-instead-of-insert idempotency
/// pattern, keyed on the coupon code, but never touch the points ledger.
#[derive(Clone)]
pub struct CouponService {
    coupons_repo: CouponsRepository,
    customers_repo: CustomersRepository,
    rewards_repo: RewardsRepository,
    orders_repo: OrdersRepository,
}

impl CouponService {
    /// Create a new CouponService
    pub fn new(
        coupons_repo: CouponsRepository,
        customers_repo: CustomersRepository,
        rewards_repo: RewardsRepository,
        orders_repo: OrdersRepository,
    ) -> Self {
        Self {
            coupons_repo,
            customers_repo,
            rewards_repo,
            orders_repo,
        }
    }

    /// Issue a coupon for a customer and reward
    ///
    /// # Validation
    /// - Customer and reward must resolve within the merchant scope and
    ///   belong to the same program
    /// - An active coupon with the same code is a conflict; an inactive one
    ///   is reactivated in place (same row id)
    /// - discount_value defaults to the reward's own discount/cashback value
    pub async fn issue(
        &self,
        merchant_id: i64,
        request: IssueCouponRequest,
    ) -> Result<(Coupon, IssueAction), CouponError> {
        request
            .validate()
            .map_err(|e| CouponError::ValidationError(e.to_string()))?;

        let customer = self
            .customers_repo
            .find_by_id_scoped(request.loyalty_customer_id, merchant_id)
            .await
            .map_err(|e| CouponError::DatabaseError(e.to_string()))?
            .ok_or(CouponError::CustomerNotFound)?;

        let reward = self
            .rewards_repo
            .find_by_id_scoped(request.reward_id, merchant_id)
            .await?
            .ok_or(CouponError::RewardNotFound)?;

        if customer.program_id != reward.program_id {
            return Err(CouponError::ProgramMismatch);
        }

        let discount_value = request.discount_value.or_else(|| reward.default_discount());

        match CodeLookup::classify(self.coupons_repo.find_by_code(&request.code).await?) {
            CodeLookup::ActiveConflict(row) => {
                warn!(
                    "Duplicate coupon code '{}' (existing coupon {})",
                    request.code, row.id
                );
                Err(CouponError::DuplicateCode(Some(request.code)))
            }
            CodeLookup::Reactivatable(row) => {
                let coupon = self
                    .coupons_repo
                    .reactivate(
                        row.id,
                        customer.id,
                        reward.id,
                        discount_value,
                        request.expires_at,
                    )
                    .await?;
                info!(
                    "Reactivated coupon {} with code '{}' for customer {}",
                    coupon.id, coupon.code, customer.id
                );
                Ok((coupon, IssueAction::Reactivated))
            }
            CodeLookup::Absent => {
                let coupon = self
                    .coupons_repo
                    .create(
                        customer.id,
                        reward.id,
                        &request.code,
                        discount_value,
                        request.expires_at,
                    )
                    .await?;
                info!(
                    "Issued coupon {} with code '{}' for customer {}",
                    coupon.id, coupon.code, customer.id
                );
                Ok((coupon, IssueAction::Created))
            }
        }
    }

    /// Get a coupon by id
    pub async fn get_coupon(
        &self,
        coupon_id: i64,
        merchant_id: i64,
    ) -> Result<Coupon, CouponError> {
        if coupon_id <= 0 {
            return Err(CouponError::InvalidId(coupon_id));
        }

        self.coupons_repo
            .find_by_id_scoped(coupon_id, merchant_id)
            .await?
            .ok_or(CouponError::NotFound)
    }

    /// Update a coupon
    ///
    /// A transition to `redeemed` requires an order id (resolved within the
    /// merchant scope) and stamps `redeemed_at`. Status transitions are
    /// checked by the status machine; the points ledger is never involved.
    pub async fn update(
        &self,
        coupon_id: i64,
        merchant_id: i64,
        request: UpdateCouponRequest,
    ) -> Result<Coupon, CouponError> {
        request
            .validate()
            .map_err(|e| CouponError::ValidationError(e.to_string()))?;

        let existing = self.get_coupon(coupon_id, merchant_id).await?;

        let new_status = request.status.unwrap_or(existing.status);
        StatusMachine::transition(existing.status, new_status)
            .map_err(CouponError::InvalidTransition)?;

        let becomes_redeemed =
            new_status == CouponStatus::Redeemed && existing.status != CouponStatus::Redeemed;

        let order_id = request.order_id.or(existing.order_id);
        if becomes_redeemed {
            let order_id = order_id.ok_or(CouponError::MissingOrderId)?;
            self.orders_repo
                .find_by_id_scoped(order_id, merchant_id)
                .await?
                .ok_or(CouponError::OrderNotFound(order_id))?;
        }

        let redeemed_at = if becomes_redeemed {
            Some(Utc::now())
        } else {
            existing.redeemed_at
        };

        let coupon = self
            .coupons_repo
            .update(
                coupon_id,
                new_status,
                order_id,
                request.discount_value.or(existing.discount_value),
                request.expires_at.or(existing.expires_at),
                redeemed_at,
            )
            .await?;

        info!("Updated coupon {} (status {})", coupon.id, coupon.status);
        Ok(coupon)
    }

    /// Revoke a coupon: soft delete, freeing its code
    ///
    /// Orthogonal to status - a redeemed coupon can still be revoked, and
    /// the status it had is preserved on the dead row.
    pub async fn revoke(&self, coupon_id: i64, merchant_id: i64) -> Result<(), CouponError> {
        let existing = self.get_coupon(coupon_id, merchant_id).await?;

        self.coupons_repo.soft_delete(existing.id).await?;
        info!(
            "Revoked coupon {} (code '{}' is free for reuse)",
            existing.id, existing.code
        );

        Ok(())
    }

    /// List a customer's coupons, newest first
    pub async fn list_for_customer(
        &self,
        loyalty_customer_id: i64,
        merchant_id: i64,
    ) -> Result<Vec<Coupon>, CouponError> {
        let customer = self
            .customers_repo
            .find_by_id_scoped(loyalty_customer_id, merchant_id)
            .await
            .map_err(|e| CouponError::DatabaseError(e.to_string()))?
            .ok_or(CouponError::CustomerNotFound)?;

        self.coupons_repo.list_by_customer(customer.id).await
    }
}

#[cfg(test)]
mod tests {
    // Pure decision points are unit tested in status_machine.rs (transition
    // legality) and models.rs (code classification); the persistence paths
    // run against a live database.
}
