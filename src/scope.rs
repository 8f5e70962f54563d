// Merchant scoping for all loyalty routes
//
// Every query in the loyalty core joins through the owning program's
// merchant id; this extractor supplies that id from the X-Merchant-Id
// header set by the upstream gateway.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// Header carrying the tenant boundary for a request
pub const MERCHANT_HEADER: &str = "x-merchant-id";

/// Merchant scope extractor
///
/// Resolves the calling merchant's id from the request headers. Handlers
/// pass the id down to the service layer, which enforces it on every query.
#[derive(Debug, Clone, Copy)]
pub struct MerchantScope {
    pub merchant_id: i64,
}

/// Rejection for a missing or malformed merchant header
#[derive(Debug)]
pub struct ScopeRejection(String);

impl IntoResponse for ScopeRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.0 }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MerchantScope
where
    S: Send + Sync,
{
    type Rejection = ScopeRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(MERCHANT_HEADER)
            .ok_or_else(|| ScopeRejection("Missing X-Merchant-Id header".to_string()))?
            .to_str()
            .map_err(|_| ScopeRejection("Invalid X-Merchant-Id header".to_string()))?;

        let merchant_id: i64 = raw.parse().map_err(|_| {
            warn!("Rejected non-numeric merchant header: {}", raw);
            ScopeRejection("X-Merchant-Id must be a positive integer".to_string())
        })?;

        if merchant_id <= 0 {
            return Err(ScopeRejection(
                "X-Merchant-Id must be a positive integer".to_string(),
            ));
        }

        Ok(MerchantScope { merchant_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<MerchantScope, ScopeRejection> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(MERCHANT_HEADER, value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        MerchantScope::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_merchant_header() {
        let scope = extract(Some("42")).await.unwrap();
        assert_eq!(scope.merchant_id, 42);
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        assert!(extract(None).await.is_err());
    }

    #[tokio::test]
    async fn test_non_numeric_header_rejected() {
        assert!(extract(Some("abc")).await.is_err());
    }

    #[tokio::test]
    async fn test_non_positive_id_rejected() {
        assert!(extract(Some("0")).await.is_err());
        assert!(extract(Some("-3")).await.is_err());
    }
}
