use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::customers::LedgerError;

/// Error types for redemption operations
#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Redemption not found")]
    NotFound,

    #[error("Loyalty customer not found")]
    CustomerNotFound,

    #[error("Reward not found")]
    RewardNotFound,

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Customer and reward must belong to the same program")]
    ProgramMismatch,

    #[error("Insufficient points: have {available}, need {required}")]
    InsufficientPoints { available: i64, required: i64 },

    #[error("Balance of {available} is below the program minimum of {minimum} to redeem")]
    BelowRedeemMinimum { available: i64, minimum: i64 },

    #[error("An active redemption already exists for this customer, reward and order")]
    DuplicateRedemption,

    #[error("Invalid id: {0}")]
    InvalidId(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for RedemptionError {
    fn from(err: sqlx::Error) -> Self {
        // A concurrent insert can slip past the pre-check and trip the
        // partial unique index; report it as the same conflict.
        if let sqlx::Error::Database(ref db_err) = err {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                return RedemptionError::DuplicateRedemption;
            }
        }
        RedemptionError::DatabaseError(err.to_string())
    }
}

impl From<LedgerError> for RedemptionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientPoints {
                available,
                required,
            } => RedemptionError::InsufficientPoints {
                available,
                required,
            },
            LedgerError::CustomerMissing(_) => RedemptionError::CustomerNotFound,
            err @ LedgerError::DeltaOutOfRange { .. } => {
                RedemptionError::ValidationError(err.to_string())
            }
            LedgerError::CalculationError(msg) => RedemptionError::ValidationError(msg),
            LedgerError::Database(e) => RedemptionError::DatabaseError(e.to_string()),
        }
    }
}

impl IntoResponse for RedemptionError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            RedemptionError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            RedemptionError::NotFound => {
                (StatusCode::NOT_FOUND, "Redemption not found".to_string())
            }
            RedemptionError::CustomerNotFound => (
                StatusCode::NOT_FOUND,
                "Loyalty customer not found".to_string(),
            ),
            RedemptionError::RewardNotFound => {
                (StatusCode::NOT_FOUND, "Reward not found".to_string())
            }
            RedemptionError::OrderNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Order {} not found", id))
            }
            RedemptionError::ProgramMismatch => (
                StatusCode::BAD_REQUEST,
                "Customer and reward must belong to the same program".to_string(),
            ),
            RedemptionError::InsufficientPoints {
                available,
                required,
            } => (
                StatusCode::BAD_REQUEST,
                format!("Insufficient points: have {}, need {}", available, required),
            ),
            RedemptionError::BelowRedeemMinimum { available, minimum } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Balance of {} is below the program minimum of {} to redeem",
                    available, minimum
                ),
            ),
            RedemptionError::DuplicateRedemption => (
                StatusCode::CONFLICT,
                "An active redemption already exists for this customer, reward and order"
                    .to_string(),
            ),
            RedemptionError::InvalidId(id) => {
                (StatusCode::BAD_REQUEST, format!("Invalid id: {}", id))
            }
            RedemptionError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_redemption_is_conflict() {
        let response = RedemptionError::DuplicateRedemption.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_program_mismatch_is_bad_request() {
        let response = RedemptionError::ProgramMismatch.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scoped_lookups_report_not_found() {
        // Cross-tenant misses surface as 404, never 403
        for err in [
            RedemptionError::NotFound,
            RedemptionError::CustomerNotFound,
            RedemptionError::RewardNotFound,
            RedemptionError::OrderNotFound(5),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn test_unique_violation_maps_to_duplicate() {
        let err: RedemptionError = sqlx::Error::Database(Box::new(UniqueViolation)).into();
        assert!(matches!(err, RedemptionError::DuplicateRedemption));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_other_sqlx_errors_stay_internal() {
        let err: RedemptionError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RedemptionError::DatabaseError(_)));
    }

    #[test]
    fn test_ledger_insufficiency_converts_losslessly() {
        let err: RedemptionError = LedgerError::InsufficientPoints {
            available: 40,
            required: 50,
        }
        .into();
        match err {
            RedemptionError::InsufficientPoints {
                available,
                required,
            } => {
                assert_eq!(available, 40);
                assert_eq!(required, 50);
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
