use tracing::{info, warn};
use validator::Validate;

use crate::customers::CustomersRepository;
use crate::programs::{OrdersRepository, ProgramsRepository, RewardsRepository};
use crate::redemptions::{
    KeyLookup, RedeemAction, RedeemRequest, Redemption, RedemptionError, RedemptionsRepository,
    UpdateRedemptionRequest,
};

/// Service coordinating reward redemptions
///
/// Validation happens before any transaction is opened; the debit, the
/// ledger row and the redemption row then commit atomically. The balance
/// sufficiency check runs a second time under the row lock inside the
/// transaction, closing the check-then-act window between concurrent
/// redemptions.
#[derive(Clone)]
pub struct RedemptionService {
    redemptions_repo: RedemptionsRepository,
    customers_repo: CustomersRepository,
    programs_repo: ProgramsRepository,
    rewards_repo: RewardsRepository,
    orders_repo: OrdersRepository,
}

impl RedemptionService {
    /// Create a new RedemptionService
    pub fn new(
        redemptions_repo: RedemptionsRepository,
        customers_repo: CustomersRepository,
        programs_repo: ProgramsRepository,
        rewards_repo: RewardsRepository,
        orders_repo: OrdersRepository,
    ) -> Self {
        Self {
            redemptions_repo,
            customers_repo,
            programs_repo,
            rewards_repo,
            orders_repo,
        }
    }

    /// Redeem a reward: debit the customer and record the redemption
    ///
    /// # Validation
    /// - Customer, reward and order must resolve within the merchant scope
    /// - Customer and reward must belong to the same program
    /// - The debit amount is the reward's current cost, never client-supplied
    /// - Balance must cover the cost and meet the program's redeem minimum
    /// - An active redemption for the same (customer, reward, order) key is
    ///   a conflict; an inactive one is reactivated instead of duplicated
    pub async fn redeem(
        &self,
        merchant_id: i64,
        request: RedeemRequest,
    ) -> Result<(Redemption, RedeemAction), RedemptionError> {
        request
            .validate()
            .map_err(|e| RedemptionError::ValidationError(e.to_string()))?;

        let customer = self
            .customers_repo
            .find_by_id_scoped(request.loyalty_customer_id, merchant_id)
            .await
            .map_err(|e| RedemptionError::DatabaseError(e.to_string()))?
            .ok_or(RedemptionError::CustomerNotFound)?;

        let reward = self
            .rewards_repo
            .find_by_id_scoped(request.reward_id, merchant_id)
            .await?
            .ok_or(RedemptionError::RewardNotFound)?;

        self.orders_repo
            .find_by_id_scoped(request.order_id, merchant_id)
            .await?
            .ok_or(RedemptionError::OrderNotFound(request.order_id))?;

        if customer.program_id != reward.program_id {
            return Err(RedemptionError::ProgramMismatch);
        }

        let program = self
            .programs_repo
            .find_by_id_scoped(customer.program_id, merchant_id)
            .await?
            .ok_or_else(|| {
                RedemptionError::DatabaseError(format!(
                    "Program {} missing for scoped customer {}",
                    customer.program_id, customer.id
                ))
            })?;

        if customer.current_points < program.min_points_to_redeem {
            return Err(RedemptionError::BelowRedeemMinimum {
                available: customer.current_points,
                minimum: program.min_points_to_redeem,
            });
        }

        let cost = reward.cost_points;

        // Fail fast on an obviously short balance; the authoritative check
        // reruns under the row lock inside the transaction.
        if customer.current_points < cost {
            return Err(RedemptionError::InsufficientPoints {
                available: customer.current_points,
                required: cost,
            });
        }

        let existing = self
            .redemptions_repo
            .find_by_key(customer.id, reward.id, request.order_id)
            .await?;

        let description = format!("Redeemed reward '{}' ({} points)", reward.name, cost);

        match KeyLookup::classify(existing) {
            KeyLookup::ActiveConflict(row) => {
                warn!(
                    "Duplicate redemption attempt for customer {} reward {} order {} (existing {})",
                    customer.id, reward.id, request.order_id, row.id
                );
                Err(RedemptionError::DuplicateRedemption)
            }
            KeyLookup::Reactivatable(row) => {
                let redemption = self
                    .redemptions_repo
                    .redeem_reactivate(row.id, customer.id, request.order_id, cost, &description)
                    .await?;
                info!(
                    "Reactivated redemption {} for customer {} (-{} points)",
                    redemption.id, customer.id, cost
                );
                Ok((redemption, RedeemAction::Reactivated))
            }
            KeyLookup::Absent => {
                let redemption = self
                    .redemptions_repo
                    .redeem_new(customer.id, reward.id, request.order_id, cost, &description)
                    .await?;
                info!(
                    "Created redemption {} for customer {} (-{} points)",
                    redemption.id, customer.id, cost
                );
                Ok((redemption, RedeemAction::Created))
            }
        }
    }

    /// Reverse a redemption: refund the snapshot and deactivate the row
    ///
    /// The refund is always `redeemed_points`, so a reversal undoes exactly
    /// the original debit even if the reward has since been re-priced.
    pub async fn reverse(
        &self,
        redemption_id: i64,
        merchant_id: i64,
    ) -> Result<Redemption, RedemptionError> {
        if redemption_id <= 0 {
            return Err(RedemptionError::InvalidId(redemption_id));
        }

        let redemption = self
            .redemptions_repo
            .find_by_id_scoped(redemption_id, merchant_id)
            .await?
            .ok_or(RedemptionError::NotFound)?;

        let reversed = self.redemptions_repo.reverse(&redemption).await?;
        info!(
            "Reversed redemption {} (+{} points to customer {})",
            reversed.id, reversed.redeemed_points, reversed.loyalty_customer_id
        );

        Ok(reversed)
    }

    /// Re-point a redemption's reward/order references
    ///
    /// Only re-validates that the new references resolve within the merchant
    /// scope and the same program; no points move.
    pub async fn update(
        &self,
        redemption_id: i64,
        merchant_id: i64,
        request: UpdateRedemptionRequest,
    ) -> Result<Redemption, RedemptionError> {
        if redemption_id <= 0 {
            return Err(RedemptionError::InvalidId(redemption_id));
        }
        request
            .validate()
            .map_err(|e| RedemptionError::ValidationError(e.to_string()))?;

        let existing = self
            .redemptions_repo
            .find_by_id_scoped(redemption_id, merchant_id)
            .await?
            .ok_or(RedemptionError::NotFound)?;

        let customer = self
            .customers_repo
            .find_by_id_scoped(existing.loyalty_customer_id, merchant_id)
            .await
            .map_err(|e| RedemptionError::DatabaseError(e.to_string()))?
            .ok_or(RedemptionError::CustomerNotFound)?;

        if let Some(reward_id) = request.reward_id {
            let reward = self
                .rewards_repo
                .find_by_id_scoped(reward_id, merchant_id)
                .await?
                .ok_or(RedemptionError::RewardNotFound)?;
            if reward.program_id != customer.program_id {
                return Err(RedemptionError::ProgramMismatch);
            }
        }

        if let Some(order_id) = request.order_id {
            self.orders_repo
                .find_by_id_scoped(order_id, merchant_id)
                .await?
                .ok_or(RedemptionError::OrderNotFound(order_id))?;
        }

        let updated = self
            .redemptions_repo
            .update_refs(
                redemption_id,
                request.reward_id.unwrap_or(existing.reward_id),
                request.order_id.unwrap_or(existing.order_id),
            )
            .await?;

        info!("Updated redemption {} references", redemption_id);
        Ok(updated)
    }

    /// List a customer's redemptions, newest first
    pub async fn list_for_customer(
        &self,
        loyalty_customer_id: i64,
        merchant_id: i64,
    ) -> Result<Vec<Redemption>, RedemptionError> {
        let customer = self
            .customers_repo
            .find_by_id_scoped(loyalty_customer_id, merchant_id)
            .await
            .map_err(|e| RedemptionError::DatabaseError(e.to_string()))?
            .ok_or(RedemptionError::CustomerNotFound)?;

        self.redemptions_repo.list_by_customer(customer.id).await
    }
}

#[cfg(test)]
mod tests {
    // The coordinator's decision points are unit tested where they are pure:
    // KeyLookup::classify in models.rs, the balance guard in
    // customers/ledger.rs, the error mapping in error.rs. The transactional
    // paths run against a live database.
}
