// HTTP handlers for loyalty customer endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::customers::{
    AdjustPointsRequest, CustomerError, EarnPointsRequest, EnrollCustomerRequest,
    LoyaltyCustomer, PointTransaction,
};
use crate::scope::MerchantScope;
use crate::AppState;

/// Handler for POST /api/customers
/// Enrolls a customer into a loyalty program
pub async fn enroll_customer_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Json(request): Json<EnrollCustomerRequest>,
) -> Result<(StatusCode, Json<LoyaltyCustomer>), CustomerError> {
    let customer = state
        .customer_service
        .enroll(scope.merchant_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

/// Handler for GET /api/customers/:id
pub async fn get_customer_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(loyalty_customer_id): Path<i64>,
) -> Result<Json<LoyaltyCustomer>, CustomerError> {
    let customer = state
        .customer_service
        .get_customer(loyalty_customer_id, scope.merchant_id)
        .await?;

    Ok(Json(customer))
}

/// Handler for GET /api/customers/:id/transactions
/// Returns the customer's point ledger, newest first
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(loyalty_customer_id): Path<i64>,
) -> Result<Json<Vec<PointTransaction>>, CustomerError> {
    let transactions = state
        .customer_service
        .list_transactions(loyalty_customer_id, scope.merchant_id)
        .await?;

    Ok(Json(transactions))
}

/// Handler for POST /api/customers/:id/earn
/// Awards points for a purchase amount
pub async fn earn_points_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(loyalty_customer_id): Path<i64>,
    Json(request): Json<EarnPointsRequest>,
) -> Result<Json<LoyaltyCustomer>, CustomerError> {
    let customer = state
        .customer_service
        .earn(loyalty_customer_id, scope.merchant_id, request)
        .await?;

    Ok(Json(customer))
}

/// Handler for POST /api/customers/:id/adjust
/// Applies a manual, ledger-backed point correction
pub async fn adjust_points_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(loyalty_customer_id): Path<i64>,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<LoyaltyCustomer>, CustomerError> {
    let customer = state
        .customer_service
        .adjust(loyalty_customer_id, scope.merchant_id, request)
        .await?;

    Ok(Json(customer))
}
