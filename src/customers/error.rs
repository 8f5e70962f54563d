use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::customers::ledger::LedgerError;
use crate::tiers::TierError;

/// Error types for loyalty customer operations
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Loyalty customer not found")]
    NotFound,

    #[error("Program not found")]
    ProgramNotFound,

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Customer is already enrolled in this program")]
    AlreadyEnrolled,

    #[error("Insufficient points: have {available}, need {required}")]
    InsufficientPoints { available: i64, required: i64 },

    #[error("Invalid id: {0}")]
    InvalidId(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for CustomerError {
    fn from(err: sqlx::Error) -> Self {
        CustomerError::DatabaseError(err.to_string())
    }
}

impl From<LedgerError> for CustomerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientPoints {
                available,
                required,
            } => CustomerError::InsufficientPoints {
                available,
                required,
            },
            LedgerError::CustomerMissing(_) => CustomerError::NotFound,
            err @ LedgerError::DeltaOutOfRange { .. } => {
                CustomerError::ValidationError(err.to_string())
            }
            LedgerError::CalculationError(msg) => CustomerError::ValidationError(msg),
            LedgerError::Database(e) => CustomerError::DatabaseError(e.to_string()),
        }
    }
}

impl From<TierError> for CustomerError {
    fn from(err: TierError) -> Self {
        match err {
            TierError::DatabaseError(msg) => CustomerError::DatabaseError(msg),
            other => CustomerError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for CustomerError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            CustomerError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            CustomerError::NotFound => (
                StatusCode::NOT_FOUND,
                "Loyalty customer not found".to_string(),
            ),
            CustomerError::ProgramNotFound => {
                (StatusCode::NOT_FOUND, "Program not found".to_string())
            }
            CustomerError::OrderNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Order {} not found", id))
            }
            CustomerError::AlreadyEnrolled => (
                StatusCode::CONFLICT,
                "Customer is already enrolled in this program".to_string(),
            ),
            CustomerError::InsufficientPoints {
                available,
                required,
            } => (
                StatusCode::BAD_REQUEST,
                format!("Insufficient points: have {}, need {}", available, required),
            ),
            CustomerError::InvalidId(id) => {
                (StatusCode::BAD_REQUEST, format!("Invalid id: {}", id))
            }
            CustomerError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
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
    fn test_insufficient_points_is_bad_request() {
        let err = CustomerError::InsufficientPoints {
            available: 10,
            required: 50,
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_already_enrolled_is_conflict() {
        let response = CustomerError::AlreadyEnrolled.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_ledger_insufficiency_converts_losslessly() {
        let err: CustomerError = LedgerError::InsufficientPoints {
            available: 30,
            required: 80,
        }
        .into();
        match err {
            CustomerError::InsufficientPoints {
                available,
                required,
            } => {
                assert_eq!(available, 30);
                assert_eq!(required, 80);
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_ledger_customer_is_not_found() {
        let err: CustomerError = LedgerError::CustomerMissing(9).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
