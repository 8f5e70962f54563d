// Dense-rank level assignment for loyalty tiers
//
// Levels are relative: adding, removing, or re-thresholding any tier can
// shift every other tier's rank, so callers always recompute the whole
// program's levels rather than patching a single row.

use crate::tiers::LoyaltyTier;

/// Display ceiling for tier levels; computed ranks beyond this are clamped
pub const MAX_TIER_LEVEL: i32 = 10;

/// Assign dense-rank levels to the given (tier_id, min_points) pairs
///
/// Tiers are ranked descending by threshold: the highest distinct
/// `min_points` value gets level 1, and each lower distinct value increments
/// the level by one. Tiers sharing a threshold share a level. Levels are
/// clamped at [`MAX_TIER_LEVEL`].
///
/// # Returns
/// One `(tier_id, level)` assignment per input pair.
pub fn assign_levels(thresholds: &[(i64, i64)]) -> Vec<(i64, i32)> {
    let mut ordered: Vec<(i64, i64)> = thresholds.to_vec();
    ordered.sort_by(|a, b| b.1.cmp(&a.1));

    let mut assignments = Vec::with_capacity(ordered.len());
    let mut level = 0;
    let mut previous_points: Option<i64> = None;

    for (tier_id, min_points) in ordered {
        if previous_points != Some(min_points) {
            level += 1;
            previous_points = Some(min_points);
        }
        assignments.push((tier_id, level.min(MAX_TIER_LEVEL)));
    }

    assignments
}

/// Find the tier a point total qualifies for
///
/// Picks the tier with the largest `min_points` not exceeding
/// `lifetime_points`. Returns `None` when no tier qualifies. Ties on
/// `min_points` resolve to whichever comes first; [`assign_levels`] already
/// merged equal thresholds into one level, so the choice is immaterial.
pub fn eligible_tier(tiers: &[LoyaltyTier], lifetime_points: i64) -> Option<&LoyaltyTier> {
    tiers
        .iter()
        .filter(|tier| tier.min_points <= lifetime_points)
        .max_by_key(|tier| tier.min_points)
}

/// Decide whether a point total moves a customer off their current tier
///
/// Returns the qualifying tier only when it differs from the current
/// assignment. Re-running against an unchanged point total is a no-op: once
/// the customer sits on the winning tier, further evaluations return `None`.
pub fn tier_change<'a>(
    tiers: &'a [LoyaltyTier],
    lifetime_points: i64,
    current_tier_id: Option<i64>,
) -> Option<&'a LoyaltyTier> {
    let winner = eligible_tier(tiers, lifetime_points)?;
    if current_tier_id == Some(winner.id) {
        return None;
    }
    Some(winner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn tier(id: i64, min_points: i64) -> LoyaltyTier {
        LoyaltyTier {
            id,
            program_id: 1,
            name: format!("Tier {}", id),
            level: 1,
            min_points,
            multiplier: dec!(1.0),
            benefits: serde_json::json!([]),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_dense_ranking_with_duplicate_thresholds() {
        // {0, 100, 100, 500}: highest threshold is level 1, the two 100s
        // share level 2, the base tier lands at level 3
        let assignments = assign_levels(&[(1, 0), (2, 100), (3, 100), (4, 500)]);

        let level_of = |id: i64| assignments.iter().find(|(t, _)| *t == id).unwrap().1;
        assert_eq!(level_of(4), 1);
        assert_eq!(level_of(2), 2);
        assert_eq!(level_of(3), 2);
        assert_eq!(level_of(1), 3);
    }

    #[test]
    fn test_single_tier_gets_level_one() {
        assert_eq!(assign_levels(&[(7, 0)]), vec![(7, 1)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(assign_levels(&[]).is_empty());
    }

    #[test]
    fn test_level_clamped_at_ten() {
        // Twelve distinct thresholds: the lowest two would rank 11 and 12
        let thresholds: Vec<(i64, i64)> = (0..12).map(|i| (i, (12 - i) * 100)).collect();
        let assignments = assign_levels(&thresholds);

        assert!(assignments.iter().all(|(_, level)| *level <= MAX_TIER_LEVEL));
        let clamped = assignments
            .iter()
            .filter(|(_, level)| *level == MAX_TIER_LEVEL)
            .count();
        assert_eq!(clamped, 3);
    }

    #[test]
    fn test_eligible_tier_picks_highest_qualifying() {
        // Base(0), Silver(100), Gold(500); 120 lifetime points → Silver
        let tiers = vec![tier(1, 0), tier(2, 100), tier(3, 500)];
        let winner = eligible_tier(&tiers, 120).unwrap();
        assert_eq!(winner.id, 2);
    }

    #[test]
    fn test_eligible_tier_exact_threshold_qualifies() {
        let tiers = vec![tier(1, 0), tier(2, 100)];
        assert_eq!(eligible_tier(&tiers, 100).unwrap().id, 2);
    }

    #[test]
    fn test_eligible_tier_none_when_below_all_thresholds() {
        let tiers = vec![tier(1, 50), tier(2, 100)];
        assert!(eligible_tier(&tiers, 10).is_none());
    }

    #[test]
    fn test_eligible_tier_empty_catalog() {
        assert!(eligible_tier(&[], 1000).is_none());
    }

    #[test]
    fn test_tier_change_promotes_past_threshold() {
        let tiers = vec![tier(1, 0), tier(2, 100), tier(3, 500)];
        let winner = tier_change(&tiers, 120, Some(1)).unwrap();
        assert_eq!(winner.id, 2);
    }

    #[test]
    fn test_tier_change_idempotent_on_unchanged_points() {
        // Re-evaluating after the assignment took effect changes nothing
        let tiers = vec![tier(1, 0), tier(2, 100), tier(3, 500)];
        let winner = tier_change(&tiers, 120, Some(1)).unwrap();
        assert!(tier_change(&tiers, 120, Some(winner.id)).is_none());
    }

    #[test]
    fn test_tier_change_from_unassigned_customer() {
        let tiers = vec![tier(1, 0), tier(2, 100)];
        assert_eq!(tier_change(&tiers, 50, None).unwrap().id, 1);
    }

    #[test]
    fn test_tier_change_none_when_no_tier_qualifies() {
        let tiers = vec![tier(1, 50), tier(2, 100)];
        assert!(tier_change(&tiers, 10, Some(1)).is_none());
    }
}
