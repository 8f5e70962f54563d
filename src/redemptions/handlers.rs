// HTTP handlers for redemption endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::redemptions::{
    RedeemRequest, RedeemResponse, Redemption, RedemptionError, UpdateRedemptionRequest,
};
use crate::scope::MerchantScope;
use crate::AppState;

/// Handler for POST /api/redemptions
/// Redeems a reward; returns 201 whether the row was created or reactivated
pub async fn redeem_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Json(request): Json<RedeemRequest>,
) -> Result<(StatusCode, Json<RedeemResponse>), RedemptionError> {
    let (redemption, action) = state
        .redemption_service
        .redeem(scope.merchant_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RedeemResponse { action, redemption }),
    ))
}

/// Handler for PUT /api/redemptions/:id
/// Re-points a redemption's reward/order references
pub async fn update_redemption_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(redemption_id): Path<i64>,
    Json(request): Json<UpdateRedemptionRequest>,
) -> Result<Json<Redemption>, RedemptionError> {
    let redemption = state
        .redemption_service
        .update(redemption_id, scope.merchant_id, request)
        .await?;

    Ok(Json(redemption))
}

/// Handler for DELETE /api/redemptions/:id
/// Reverses a redemption: refunds the snapshot and soft-deletes the row
pub async fn reverse_redemption_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(redemption_id): Path<i64>,
) -> Result<Json<Redemption>, RedemptionError> {
    let redemption = state
        .redemption_service
        .reverse(redemption_id, scope.merchant_id)
        .await?;

    Ok(Json(redemption))
}

/// Handler for GET /api/customers/:id/redemptions
pub async fn list_redemptions_handler(
    State(state): State<AppState>,
    scope: MerchantScope,
    Path(loyalty_customer_id): Path<i64>,
) -> Result<Json<Vec<Redemption>>, RedemptionError> {
    let redemptions = state
        .redemption_service
        .list_for_customer(loyalty_customer_id, scope.merchant_id)
        .await?;

    Ok(Json(redemptions))
}
