use rust_decimal::Decimal;
use tracing::{debug, info};
use validator::Validate;

use crate::programs::ProgramsRepository;
use crate::tiers::{
    ranking, CreateTierRequest, LoyaltyTier, TierError, TiersRepository, UpdateTierRequest,
};

/// Service for tier catalog business logic
///
/// Owns level recomputation: any change to the set of active tiers or their
/// thresholds re-ranks the whole program.
#[derive(Clone)]
pub struct TierService {
    tiers_repo: TiersRepository,
    programs_repo: ProgramsRepository,
}

impl TierService {
    /// Create a new TierService
    pub fn new(tiers_repo: TiersRepository, programs_repo: ProgramsRepository) -> Self {
        Self {
            tiers_repo,
            programs_repo,
        }
    }

    /// List the active tiers of a program, highest threshold first
    pub async fn list_tiers(
        &self,
        program_id: i64,
        merchant_id: i64,
    ) -> Result<Vec<LoyaltyTier>, TierError> {
        self.require_program(program_id, merchant_id).await?;
        self.tiers_repo.find_active_by_program(program_id).await
    }

    /// Create a tier and re-rank the program
    ///
    /// # Validation
    /// - Program must exist within the caller's merchant scope
    /// - Name must be unique among the program's active tiers
    /// - Level is always derived, never taken from the request
    pub async fn create_tier(
        &self,
        program_id: i64,
        merchant_id: i64,
        request: CreateTierRequest,
    ) -> Result<LoyaltyTier, TierError> {
        request
            .validate()
            .map_err(|e| TierError::ValidationError(e.to_string()))?;

        self.require_program(program_id, merchant_id).await?;

        if self
            .tiers_repo
            .name_exists(program_id, &request.name, None)
            .await?
        {
            return Err(TierError::DuplicateName(request.name));
        }

        let tier = self
            .tiers_repo
            .create(
                program_id,
                &request.name,
                request.min_points,
                request.multiplier.unwrap_or(Decimal::ONE),
                request.benefits.unwrap_or_else(|| serde_json::json!([])),
            )
            .await?;

        self.recalc_levels(program_id).await?;
        info!("Created tier {} in program {}", tier.id, program_id);

        // Re-read for the freshly assigned level
        self.tiers_repo
            .find_by_id_scoped(tier.id, merchant_id)
            .await?
            .ok_or(TierError::NotFound)
    }

    /// Update a tier; a threshold change re-ranks the program
    pub async fn update_tier(
        &self,
        tier_id: i64,
        merchant_id: i64,
        request: UpdateTierRequest,
    ) -> Result<LoyaltyTier, TierError> {
        if tier_id <= 0 {
            return Err(TierError::InvalidId(tier_id));
        }
        request
            .validate()
            .map_err(|e| TierError::ValidationError(e.to_string()))?;

        let existing = self
            .tiers_repo
            .find_by_id_scoped(tier_id, merchant_id)
            .await?
            .ok_or(TierError::NotFound)?;

        if let Some(ref new_name) = request.name {
            if new_name != &existing.name
                && self
                    .tiers_repo
                    .name_exists(existing.program_id, new_name, Some(tier_id))
                    .await?
            {
                return Err(TierError::DuplicateName(new_name.clone()));
            }
        }

        let min_points = request.min_points.unwrap_or(existing.min_points);
        let threshold_changed = min_points != existing.min_points;

        self.tiers_repo
            .update(
                tier_id,
                request.name.as_deref().unwrap_or(&existing.name),
                min_points,
                request.multiplier.unwrap_or(existing.multiplier),
                request.benefits.unwrap_or(existing.benefits),
            )
            .await?;

        if threshold_changed {
            self.recalc_levels(existing.program_id).await?;
        }

        info!("Updated tier {}", tier_id);
        self.tiers_repo
            .find_by_id_scoped(tier_id, merchant_id)
            .await?
            .ok_or(TierError::NotFound)
    }

    /// Soft-delete a tier and re-rank the remaining ones
    pub async fn delete_tier(&self, tier_id: i64, merchant_id: i64) -> Result<(), TierError> {
        if tier_id <= 0 {
            return Err(TierError::InvalidId(tier_id));
        }

        let existing = self
            .tiers_repo
            .find_by_id_scoped(tier_id, merchant_id)
            .await?
            .ok_or(TierError::NotFound)?;

        self.tiers_repo.soft_delete(tier_id).await?;
        self.recalc_levels(existing.program_id).await?;
        info!("Deactivated tier {}", tier_id);

        Ok(())
    }

    /// Return the program's base tier, creating one if the program has no
    /// active tiers
    ///
    /// The base tier is the one with the smallest threshold; a brand-new
    /// customer is enrolled into it.
    pub async fn find_or_create_base_tier(
        &self,
        program_id: i64,
    ) -> Result<LoyaltyTier, TierError> {
        let tiers = self.tiers_repo.find_active_by_program(program_id).await?;

        if let Some(base) = tiers.iter().min_by_key(|tier| tier.min_points) {
            return Ok(base.clone());
        }

        debug!("Program {} has no tiers, seeding base tier", program_id);
        let base = self
            .tiers_repo
            .create(program_id, "Base", 0, Decimal::ONE, serde_json::json!([]))
            .await?;
        self.recalc_levels(program_id).await?;

        Ok(base)
    }

    /// Find the tier a customer's lifetime points qualify for
    ///
    /// Recomputes the correct tier for the given total — this may demote as
    /// well as promote. Returns `None` when no tier qualifies or the winner
    /// is already the customer's current tier.
    pub async fn evaluate_upgrade(
        &self,
        program_id: i64,
        lifetime_points: i64,
        current_tier_id: Option<i64>,
    ) -> Result<Option<LoyaltyTier>, TierError> {
        let tiers = self.tiers_repo.find_active_by_program(program_id).await?;

        Ok(ranking::tier_change(&tiers, lifetime_points, current_tier_id).cloned())
    }

    /// Recompute and persist dense-rank levels for a whole program
    async fn recalc_levels(&self, program_id: i64) -> Result<(), TierError> {
        let tiers = self.tiers_repo.find_active_by_program(program_id).await?;
        let thresholds: Vec<(i64, i64)> = tiers
            .iter()
            .map(|tier| (tier.id, tier.min_points))
            .collect();

        let assignments = ranking::assign_levels(&thresholds);
        self.tiers_repo.update_levels(&assignments).await?;
        debug!(
            "Recomputed levels for program {} ({} tiers)",
            program_id,
            assignments.len()
        );

        Ok(())
    }

    async fn require_program(&self, program_id: i64, merchant_id: i64) -> Result<(), TierError> {
        self.programs_repo
            .find_by_id_scoped(program_id, merchant_id)
            .await
            .map_err(|e| TierError::DatabaseError(e.to_string()))?
            .ok_or(TierError::ProgramNotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // Service methods orchestrate repository calls against a live database;
    // the ranking and eligibility rules they apply are unit tested in
    // ranking.rs.
}
