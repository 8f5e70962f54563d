use crate::coupons::CouponStatus;

/// Service for managing coupon status transitions
///
/// Status is orthogonal to the soft-delete flag: a redeemed coupon can still
/// be revoked, and revoking never touches the status.
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Active → Redeemed, Cancelled
    /// - Redeemed → (terminal)
    /// - Cancelled → (terminal)
    /// - Any status → Same status (idempotent)
    pub fn is_valid_transition(from: CouponStatus, to: CouponStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            (CouponStatus::Active, CouponStatus::Redeemed) => true,
            (CouponStatus::Active, CouponStatus::Cancelled) => true,

            // Redeemed and Cancelled are terminal
            (CouponStatus::Redeemed, _) => false,
            (CouponStatus::Cancelled, _) => false,

            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: CouponStatus, to: CouponStatus) -> Result<CouponStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!(
                "Invalid coupon status transition from {} to {}",
                from, to
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_to_redeemed_is_valid() {
        assert!(StatusMachine::is_valid_transition(
            CouponStatus::Active,
            CouponStatus::Redeemed
        ));
    }

    #[test]
    fn test_active_to_cancelled_is_valid() {
        assert!(StatusMachine::is_valid_transition(
            CouponStatus::Active,
            CouponStatus::Cancelled
        ));
    }

    #[test]
    fn test_redeemed_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            CouponStatus::Redeemed,
            CouponStatus::Active
        ));
        assert!(!StatusMachine::is_valid_transition(
            CouponStatus::Redeemed,
            CouponStatus::Cancelled
        ));
    }

    #[test]
    fn test_cancelled_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            CouponStatus::Cancelled,
            CouponStatus::Active
        ));
        assert!(!StatusMachine::is_valid_transition(
            CouponStatus::Cancelled,
            CouponStatus::Redeemed
        ));
    }

    #[test]
    fn test_same_status_is_idempotent() {
        for status in [
            CouponStatus::Active,
            CouponStatus::Redeemed,
            CouponStatus::Cancelled,
        ] {
            assert!(StatusMachine::is_valid_transition(status, status));
        }
    }

    #[test]
    fn test_transition_returns_error_message() {
        let err = StatusMachine::transition(CouponStatus::Cancelled, CouponStatus::Active)
            .unwrap_err();
        assert!(err.contains("cancelled"));
        assert!(err.contains("active"));
    }
}
