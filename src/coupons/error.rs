use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for coupon operations
#[derive(Debug, thiserror::Error)]
pub enum CouponError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Coupon not found")]
    NotFound,

    #[error("Loyalty customer not found")]
    CustomerNotFound,

    #[error("Reward not found")]
    RewardNotFound,

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Customer and reward must belong to the same program")]
    ProgramMismatch,

    /// The code is carried when the conflict is caught by the pre-check;
    /// a concurrent insert tripping the unique index reports without it
    #[error("An active coupon with the requested code already exists")]
    DuplicateCode(Option<String>),

    #[error("An order id is required to redeem a coupon")]
    MissingOrderId,

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid id: {0}")]
    InvalidId(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for CouponError {
    fn from(err: sqlx::Error) -> Self {
        // A concurrent insert can slip past the pre-check and trip the
        // partial unique index; report it as the same conflict.
        if let sqlx::Error::Database(ref db_err) = err {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                return CouponError::DuplicateCode(None);
            }
        }
        CouponError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for CouponError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            CouponError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            CouponError::NotFound => (StatusCode::NOT_FOUND, "Coupon not found".to_string()),
            CouponError::CustomerNotFound => (
                StatusCode::NOT_FOUND,
                "Loyalty customer not found".to_string(),
            ),
            CouponError::RewardNotFound => {
                (StatusCode::NOT_FOUND, "Reward not found".to_string())
            }
            CouponError::OrderNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Order {} not found", id))
            }
            CouponError::ProgramMismatch => (
                StatusCode::BAD_REQUEST,
                "Customer and reward must belong to the same program".to_string(),
            ),
            CouponError::DuplicateCode(Some(code)) => (
                StatusCode::CONFLICT,
                format!("An active coupon with code '{}' already exists", code),
            ),
            CouponError::DuplicateCode(None) => (
                StatusCode::CONFLICT,
                "An active coupon with this code already exists".to_string(),
            ),
            CouponError::MissingOrderId => (
                StatusCode::BAD_REQUEST,
                "An order id is required to redeem a coupon".to_string(),
            ),
            CouponError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, msg),
            CouponError::InvalidId(id) => {
                (StatusCode::BAD_REQUEST, format!("Invalid id: {}", id))
            }
            CouponError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
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
    fn test_duplicate_code_is_conflict() {
        let response =
            CouponError::DuplicateCode(Some("SAVE5".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unique_violation_maps_to_duplicate() {
        let err: CouponError = sqlx::Error::Database(Box::new(UniqueViolation)).into();
        assert!(matches!(err, CouponError::DuplicateCode(None)));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_other_sqlx_errors_stay_internal() {
        let err: CouponError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, CouponError::DatabaseError(_)));
    }

    #[test]
    fn test_missing_order_id_is_bad_request() {
        let response = CouponError::MissingOrderId.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_transition_is_bad_request() {
        let response =
            CouponError::InvalidTransition("from cancelled to active".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_scoped_lookups_report_not_found() {
        for err in [
            CouponError::NotFound,
            CouponError::CustomerNotFound,
            CouponError::RewardNotFound,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        }
    }
}
