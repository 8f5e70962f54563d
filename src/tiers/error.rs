use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error types for tier catalog operations
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Tier not found")]
    NotFound,

    #[error("Program not found")]
    ProgramNotFound,

    #[error("Tier with name '{0}' already exists in this program")]
    DuplicateName(String),

    #[error("Invalid tier id: {0}")]
    InvalidId(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for TierError {
    fn from(err: sqlx::Error) -> Self {
        TierError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for TierError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            TierError::DatabaseError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            TierError::NotFound => (StatusCode::NOT_FOUND, "Tier not found".to_string()),
            TierError::ProgramNotFound => {
                (StatusCode::NOT_FOUND, "Program not found".to_string())
            }
            TierError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                format!("Tier with name '{}' already exists in this program", name),
            ),
            TierError::InvalidId(id) => {
                (StatusCode::BAD_REQUEST, format!("Invalid tier id: {}", id))
            }
            TierError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
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
    fn test_not_found_maps_to_404() {
        let response = TierError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_scope_mismatch_reported_as_not_found() {
        // Cross-tenant access must never surface as Forbidden
        let response = TierError::ProgramNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_name_maps_to_409() {
        let response = TierError::DuplicateName("Gold".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_id_maps_to_400() {
        let response = TierError::InvalidId(-1).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_maps_to_500() {
        let response = TierError::DatabaseError("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
